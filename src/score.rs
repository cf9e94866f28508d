//! Error-line construction and scoring for a single drawn stroke.

use crate::geometry::{Point, ReferenceLine, interpolate_at};

/// Sampling step along the reference line, in page units.
pub const DEFAULT_ACCURACY_JUMP: f64 = 5.0;

/// Horizontal gap between one end of the reference line and the nearest
/// end of the drawn stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlLine {
    pub reference_x: f64,
    pub drawn_x: f64,
    pub y: f64,
}

/// The control lines for both ends of the reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlLines {
    pub left: ControlLine,
    pub right: ControlLine,
}

/// Vertical offset of the drawn stroke at a sampled x. `offset` is signed
/// so a renderer can tell which side of the reference the stroke sits on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracySample {
    pub x: f64,
    pub y: f64,
    pub offset: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorLines {
    pub control: ControlLines,
    pub accuracy: Vec<AccuracySample>,
}

/// Aggregated error values for one attempt. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorValues {
    pub control: f64,
    pub accuracy: f64,
}

/// Builds the control and accuracy error lines for a drawn stroke.
///
/// The control lines connect each reference end to the corresponding
/// extreme of the stroke. Accuracy samples walk the reference from
/// `offset_x` in steps of `jump` and record the stroke's vertical offset
/// wherever it spans the sampled x.
pub fn error_lines(reference: &ReferenceLine, drawn: &[Point], jump: f64) -> ErrorLines {
    // Earliest point wins ties; an empty stroke keeps the infinite seeds.
    let mut leftmost = Point {
        x: f64::INFINITY,
        y: 0.0,
    };
    let mut rightmost = Point {
        x: f64::NEG_INFINITY,
        y: 0.0,
    };
    for &p in drawn {
        if p.x < leftmost.x {
            leftmost = p;
        }
        if p.x > rightmost.x {
            rightmost = p;
        }
    }

    let control = ControlLines {
        left: ControlLine {
            reference_x: reference.offset_x,
            drawn_x: leftmost.x,
            y: reference.y,
        },
        right: ControlLine {
            reference_x: reference.end_x(),
            drawn_x: rightmost.x,
            y: reference.y,
        },
    };

    // Interpolation expects points sorted by x; capture delivers them in
    // stroke order.
    let mut sorted = drawn.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x));

    let mut accuracy = Vec::new();
    let mut i = 0.0_f64;
    loop {
        let x = reference.offset_x + i * jump;
        if x > reference.end_x() {
            break;
        }
        if let Some(hit) = interpolate_at(&sorted, x) {
            accuracy.push(AccuracySample {
                x,
                y: reference.y,
                offset: hit.y - reference.y,
            });
        }
        i += 1.0;
    }

    ErrorLines { control, accuracy }
}

/// Collapses error lines into the two scalar errors an attempt is judged on.
///
/// Accuracy averages the sample magnitudes over every recorded sample, so
/// samples whose offset came out non-numeric still dilute the result. A
/// stroke with no usable samples scores NaN.
pub fn error_values(lines: &ErrorLines) -> ErrorValues {
    let (left, right) = (&lines.control.left, &lines.control.right);
    let control =
        (left.reference_x - left.drawn_x).abs() + (right.reference_x - right.drawn_x).abs();

    let usable: f64 = lines
        .accuracy
        .iter()
        .map(|s| s.offset.abs())
        .filter(|v| !v.is_nan())
        .sum();
    let accuracy = usable / lines.accuracy.len() as f64;

    ErrorValues { control, accuracy }
}

//! Renders a finished session as a standalone SVG practice sheet.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::Stars;
use crate::geometry::Point;
use crate::rating::{self, Star};
use crate::session::{Attempt, SessionPlan};

const FRAME_STYLE: &str = r#"stroke="black" stroke-opacity="0.3""#;
const REFERENCE_STYLE: &str = r#"stroke="blue" stroke-opacity="0.3""#;
const ERROR_STYLE: &str = r#"stroke="red""#;

fn star_color(star: Star) -> &'static str {
    match star {
        Star::Gold => "#FFD700",
        Star::Silver => "#C0C0C0",
        Star::Bronze => "#CD7F32",
    }
}

/// Builds the sheet: page frame, every attempt with its error markup and
/// star badge, then the summary block under the frame.
pub fn render(
    plan: &SessionPlan,
    attempts: &[Attempt],
    stars: &Stars,
    summary: &[String],
) -> String {
    let footer = 24.0 + summary.len() as f64 * 16.0;
    let total_height = plan.page_height + footer;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = plan.page_width,
        h = total_height
    );
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    push_frame(&mut svg, plan);
    for attempt in attempts {
        push_attempt(&mut svg, attempt, stars, plan);
    }

    for (i, line) in summary.iter().enumerate() {
        let y = plan.page_height + 16.0 * (i as f64 + 1.0);
        svg.push_str(&format!(
            r#"<text x="{:.2}" y="{y:.2}" font-size="12">{line}</text>"#,
            plan.margin
        ));
        svg.push('\n');
    }

    svg.push_str("</svg>\n");
    svg
}

pub fn write(path: &Path, svg: &str) -> Result<()> {
    fs::write(path, svg).with_context(|| format!("failed to write {}", path.display()))
}

fn push_frame(svg: &mut String, plan: &SessionPlan) {
    let m = plan.margin;
    let (w, h) = (plan.page_width, plan.page_height);
    push_line(svg, m, m, w - m, m, FRAME_STYLE);
    push_line(svg, m, m, m, h - m, FRAME_STYLE);
    push_line(svg, w / 2.0, m, w / 2.0, h - m, FRAME_STYLE);
    push_line(svg, w - m, m, w - m, h - m, FRAME_STYLE);
    push_line(svg, m, h - m, w - m, h - m, FRAME_STYLE);
}

fn push_attempt(svg: &mut String, attempt: &Attempt, stars: &Stars, plan: &SessionPlan) {
    let r = &attempt.reference;
    svg.push_str("<g>\n");
    push_line(svg, r.offset_x, r.y, r.end_x(), r.y, REFERENCE_STYLE);
    push_polyline(svg, &attempt.points);

    if let Some(lines) = &attempt.error_lines {
        for control in [&lines.control.left, &lines.control.right] {
            push_line(
                svg,
                control.reference_x,
                control.y,
                control.drawn_x,
                control.y,
                ERROR_STYLE,
            );
        }
        for sample in &lines.accuracy {
            push_line(
                svg,
                sample.x,
                sample.y,
                sample.x,
                sample.y + sample.offset,
                ERROR_STYLE,
            );
        }
    }

    if let Some(values) = &attempt.error_values {
        if let Some(star) = rating::star(values, stars) {
            svg.push_str(&format!(
                r#"<circle cx="{:.2}" cy="{:.2}" r="6" fill="{}"/>"#,
                plan.margin / 2.0,
                r.y,
                star_color(star)
            ));
            svg.push('\n');
        }
    }
    svg.push_str("</g>\n");
}

fn push_line(svg: &mut String, x1: f64, y1: f64, x2: f64, y2: f64, style: &str) {
    // degenerate scored data can carry non-finite ends; leave those out
    if [x1, y1, x2, y2].iter().any(|v| !v.is_finite()) {
        return;
    }
    svg.push_str(&format!(
        r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" {style}/>"#
    ));
    svg.push('\n');
}

fn push_polyline(svg: &mut String, points: &[Point]) {
    let coords: Vec<String> = points
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect();
    if coords.len() < 2 {
        return;
    }
    svg.push_str(&format!(
        r#"<polyline points="{}" fill="none" stroke="black"/>"#,
        coords.join(" ")
    ));
    svg.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ReferenceLine;

    fn plan_with(lines: Vec<ReferenceLine>) -> SessionPlan {
        SessionPlan {
            page_width: 630.0,
            page_height: 891.0,
            margin: 32.0,
            lines,
        }
    }

    fn default_stars() -> Stars {
        Stars {
            control: vec![6.0, 10.0, 14.0],
            accuracy: vec![1.0, 1.5, 2.0],
        }
    }

    fn reference() -> ReferenceLine {
        ReferenceLine {
            y: 100.0,
            width: 283.0,
            offset_x: 32.0,
        }
    }

    fn traced_stroke(r: &ReferenceLine) -> Vec<Point> {
        (0..5)
            .map(|i| Point {
                x: r.offset_x + f64::from(i) * r.width / 4.0,
                y: r.y,
            })
            .collect()
    }

    #[test]
    fn sheet_holds_frame_attempts_and_summary() {
        let r = reference();
        let attempt = Attempt::new(r, traced_stroke(&r), 5.0);
        let plan = plan_with(vec![r]);
        let summary = vec!["Invalid lines: 0".to_string(), "Time: 00:10:000".to_string()];
        let svg = render(&plan, &[attempt], &default_stars(), &summary);

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>\n"));
        assert_eq!(svg.matches("<g>").count(), 1);
        assert!(svg.contains(REFERENCE_STYLE));
        assert!(svg.contains("<polyline"));
        assert!(svg.contains("Invalid lines: 0"));
        assert!(svg.contains("Time: 00:10:000"));
    }

    #[test]
    fn a_perfect_trace_earns_a_gold_badge() {
        let r = reference();
        let attempt = Attempt::new(r, traced_stroke(&r), 5.0);
        let svg = render(&plan_with(vec![r]), &[attempt], &default_stars(), &[]);
        assert!(svg.contains("#FFD700"));
        assert!(svg.contains(ERROR_STYLE));
    }

    #[test]
    fn unscored_attempts_carry_no_error_markup() {
        let r = reference();
        let attempt = Attempt::new(r, traced_stroke(&r)[..2].to_vec(), 5.0);
        let svg = render(&plan_with(vec![r]), &[attempt], &default_stars(), &[]);
        assert!(!svg.contains("red"));
        assert!(!svg.contains("circle"));
    }

    #[test]
    fn degenerate_samples_never_reach_the_markup() {
        let r = ReferenceLine {
            y: 0.0,
            width: 10.0,
            offset_x: 0.0,
        };
        // vertical opening segment gives the first sample a non-numeric offset
        let points = vec![
            Point { x: 0.0, y: 1.0 },
            Point { x: 0.0, y: 6.0 },
            Point { x: 5.0, y: 3.0 },
            Point { x: 7.0, y: 4.0 },
            Point { x: 10.0, y: 5.0 },
        ];
        let attempt = Attempt::new(r, points, 5.0);
        assert!(attempt.is_scored());
        let svg = render(&plan_with(vec![r]), &[attempt], &default_stars(), &[]);
        assert!(!svg.contains("NaN"));
    }
}

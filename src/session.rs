//! Drill session planning, capture loop and reporting.

use std::sync::mpsc::Receiver;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;

use crate::capture::{CaptureOutcome, StrokeSource};
use crate::config::{Profile, SessionSettings, Stars};
use crate::geometry::{Point, ReferenceLine};
use crate::rating;
use crate::score::{self, ErrorLines, ErrorValues};
use crate::stats::{Stats, stats};
use crate::watch::SessionSignal;

pub const PAGE_WIDTH: f64 = 630.0;
pub const PAGE_HEIGHT: f64 = 891.0;

/// Strokes below this many points cannot be scored meaningfully.
pub const MIN_STROKE_POINTS: usize = 5;

const RANDOM_MARGIN: f64 = 64.0;
const RANDOM_LENGTH_RANGE: (f64, f64) = (0.25, 1.0);

pub fn page_size(landscape: bool) -> (f64, f64) {
    if landscape {
        (PAGE_HEIGHT, PAGE_WIDTH)
    } else {
        (PAGE_WIDTH, PAGE_HEIGHT)
    }
}

/// Vertical distance between consecutive ruled lines.
pub fn ruled_jump(s: &SessionSettings) -> f64 {
    let (_, page_h) = page_size(s.landscape_mode);
    ((page_h - 2.0 * s.margin - 2.0 * s.inner_offset) / f64::from(s.lines - 1)).floor()
}

/// The reference lines for one session, in drill order.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub lines: Vec<ReferenceLine>,
}

impl SessionPlan {
    /// Evenly ruled lines from top to bottom, like a practice sheet.
    pub fn ruled(profile: &Profile) -> SessionPlan {
        let s = &profile.session;
        let (page_width, page_height) = page_size(s.landscape_mode);
        let jump = ruled_jump(s);
        let divisor = if s.short_lines { 2.0 } else { 1.0 };
        let width = (page_width - 2.0 * s.margin) / divisor;
        let lines = (0..s.lines)
            .map(|i| ReferenceLine {
                y: s.margin + s.inner_offset + f64::from(i) * jump,
                width,
                offset_x: s.margin,
            })
            .collect();
        SessionPlan {
            page_width,
            page_height,
            margin: s.margin,
            lines,
        }
    }

    /// Lines of random length at random heights, all integer-valued and
    /// kept inside a fixed margin.
    pub fn random<R: Rng>(profile: &Profile, rng: &mut R) -> SessionPlan {
        let s = &profile.session;
        let (page_width, page_height) = page_size(s.landscape_mode);
        let w = page_width - 2.0 * RANDOM_MARGIN;
        let lines = (0..s.lines)
            .map(|_| {
                let y = rand_between(rng, RANDOM_MARGIN, page_height - RANDOM_MARGIN);
                let width = rand_between(
                    rng,
                    (w * RANDOM_LENGTH_RANGE.0).floor(),
                    (w * RANDOM_LENGTH_RANGE.1).floor(),
                );
                let offset_x = RANDOM_MARGIN + rand_between(rng, 0.0, w - width);
                ReferenceLine { y, width, offset_x }
            })
            .collect();
        SessionPlan {
            page_width,
            page_height,
            margin: RANDOM_MARGIN,
            lines,
        }
    }
}

/// Integer-valued uniform draw from `a..=b`.
fn rand_between<R: Rng>(rng: &mut R, a: f64, b: f64) -> f64 {
    (rng.gen_range(0.0..1.0) * (b - a + 1.0) + a).floor()
}

/// One reference line and the stroke drawn against it. Strokes shorter
/// than the gate stay unscored and count as invalid lines.
#[derive(Debug, Clone)]
pub struct Attempt {
    pub reference: ReferenceLine,
    pub points: Vec<Point>,
    pub error_lines: Option<ErrorLines>,
    pub error_values: Option<ErrorValues>,
}

impl Attempt {
    pub fn new(reference: ReferenceLine, points: Vec<Point>, accuracy_jump: f64) -> Attempt {
        let (error_lines, error_values) = if points.len() >= MIN_STROKE_POINTS {
            let lines = score::error_lines(&reference, &points, accuracy_jump);
            let values = score::error_values(&lines);
            (Some(lines), Some(values))
        } else {
            (None, None)
        };
        Attempt {
            reference,
            points,
            error_lines,
            error_values,
        }
    }

    pub fn is_scored(&self) -> bool {
        self.error_values.is_some()
    }
}

/// How one drill pass ended.
#[derive(Debug)]
pub enum DrillOutcome {
    Completed(Vec<Attempt>),
    Cancelled(Vec<Attempt>),
    ReloadRequested,
}

/// Runs one pass over the plan, drawing a stroke per reference line.
/// A reload signal abandons the pass; a cancel keeps what was drawn.
pub fn run_drill<S: StrokeSource>(
    source: &mut S,
    profile: &Profile,
    signals: &Receiver<SessionSignal>,
    plan: &SessionPlan,
) -> Result<DrillOutcome> {
    let total = plan.lines.len();
    let mut attempts = Vec::with_capacity(total);
    for (i, reference) in plan.lines.iter().enumerate() {
        println!("line {} of {}", i + 1, total);
        match source.next_stroke(signals)? {
            CaptureOutcome::Stroke(points) => {
                let attempt = Attempt::new(*reference, points, profile.scoring.accuracy_jump);
                print_attempt(&attempt, &profile.stars);
                attempts.push(attempt);
            }
            CaptureOutcome::Interrupted(SessionSignal::Cancel) => {
                return Ok(DrillOutcome::Cancelled(attempts));
            }
            CaptureOutcome::Interrupted(SessionSignal::Reload) => {
                return Ok(DrillOutcome::ReloadRequested);
            }
        }
    }
    Ok(DrillOutcome::Completed(attempts))
}

fn print_attempt(attempt: &Attempt, stars: &Stars) {
    match &attempt.error_values {
        Some(values) => {
            let medal = rating::star(values, stars)
                .map(|s| format!(" ({} star)", s.label()))
                .unwrap_or_default();
            println!(
                "  control: {}, accuracy: {:.2}{medal}",
                values.control, values.accuracy
            );
        }
        None => println!("  Invalid line"),
    }
}

/// Session totals derived from the attempt list alone.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub control: Stats,
    pub accuracy: Stats,
    /// Indexed by rank: gold, silver, bronze.
    pub star_counts: [usize; 3],
    pub valid: usize,
    pub invalid: usize,
    pub elapsed: Duration,
    pub complete: bool,
}

impl SessionReport {
    pub fn from_attempts(
        attempts: &[Attempt],
        stars: &Stars,
        elapsed: Duration,
        complete: bool,
    ) -> SessionReport {
        let values: Vec<&ErrorValues> = attempts
            .iter()
            .filter_map(|a| a.error_values.as_ref())
            .collect();
        let control_values: Vec<f64> = values.iter().map(|v| v.control).collect();
        let accuracy_values: Vec<f64> = values.iter().map(|v| v.accuracy).collect();

        let mut star_counts = [0usize; 3];
        for v in &values {
            let rank = rating::rank(v, stars);
            if rank < star_counts.len() {
                star_counts[rank] += 1;
            }
        }

        SessionReport {
            control: stats(&control_values),
            accuracy: stats(&accuracy_values),
            star_counts,
            valid: values.len(),
            invalid: attempts.iter().filter(|a| !a.is_scored()).count(),
            elapsed,
            complete,
        }
    }
}

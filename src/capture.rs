//! Pen stroke capture as a state machine over decoded tablet events.

use std::sync::mpsc::Receiver;

use anyhow::Result;

use crate::geometry::Point;
use crate::watch::SessionSignal;

/// One decoded tablet event, positions in raw device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenEvent {
    AbsX(i32),
    AbsY(i32),
    Contact(bool),
    Frame,
}

/// What a stroke source hands back to the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Stroke(Vec<Point>),
    Interrupted(SessionSignal),
}

/// Yields one stroke at a time, checking for session signals between
/// device reads.
pub trait StrokeSource {
    fn next_stroke(&mut self, signals: &Receiver<SessionSignal>) -> Result<CaptureOutcome>;
}

/// Accumulates pen events into page-space polylines.
#[derive(Debug)]
pub struct StrokeTracker {
    page_width: f64,
    page_height: f64,
    // normalization
    x_min: i32,
    x_max: i32,
    y_min: i32,
    y_max: i32,
    // pending raw position
    raw_x: i32,
    raw_y: i32,
    seen_x: bool,
    seen_y: bool,
    down: bool,
    points: Vec<Point>,
}

impl StrokeTracker {
    pub fn new(page_width: f64, page_height: f64) -> Self {
        Self {
            page_width,
            page_height,
            x_min: 0,
            x_max: 4096,
            y_min: 0,
            y_max: 4096,
            raw_x: 0,
            raw_y: 0,
            seen_x: false,
            seen_y: false,
            down: false,
            points: Vec::new(),
        }
    }

    pub fn set_axis_ranges(&mut self, x_min: i32, x_max: i32, y_min: i32, y_max: i32) {
        self.x_min = x_min;
        self.x_max = x_max.max(x_min + 1);
        self.y_min = y_min;
        self.y_max = y_max.max(y_min + 1);
    }

    /// Feeds one event through the machine. Returns the finished polyline
    /// when the pen lifts, however short it turned out.
    pub fn on_event(&mut self, ev: PenEvent) -> Option<Vec<Point>> {
        match ev {
            PenEvent::AbsX(raw) => {
                self.raw_x = raw;
                self.seen_x = true;
            }
            PenEvent::AbsY(raw) => {
                self.raw_y = raw;
                self.seen_y = true;
            }
            PenEvent::Contact(true) => {
                // repeated contact reports mid-stroke keep the stroke
                if !self.down {
                    self.down = true;
                    self.points.clear();
                }
            }
            PenEvent::Contact(false) => {
                if self.down {
                    self.down = false;
                    return Some(std::mem::take(&mut self.points));
                }
            }
            PenEvent::Frame => {
                // no point until both axes reported at least once
                if self.down && self.seen_x && self.seen_y {
                    let p = self.position();
                    if self.points.last() != Some(&p) {
                        self.points.push(p);
                    }
                }
            }
        }
        None
    }

    fn position(&self) -> Point {
        let nx = f64::from(self.raw_x - self.x_min) / f64::from(self.x_max - self.x_min);
        let ny = f64::from(self.raw_y - self.y_min) / f64::from(self.y_max - self.y_min);
        Point {
            x: (nx * self.page_width).clamp(0.0, self.page_width),
            y: (ny * self.page_height).clamp(0.0, self.page_height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> StrokeTracker {
        StrokeTracker::new(630.0, 891.0)
    }

    #[test]
    fn a_full_stroke_yields_its_points() {
        let mut t = tracker();
        assert_eq!(t.on_event(PenEvent::AbsX(0)), None);
        assert_eq!(t.on_event(PenEvent::AbsY(0)), None);
        assert_eq!(t.on_event(PenEvent::Contact(true)), None);
        assert_eq!(t.on_event(PenEvent::Frame), None);
        assert_eq!(t.on_event(PenEvent::AbsX(2048)), None);
        assert_eq!(t.on_event(PenEvent::AbsY(1024)), None);
        assert_eq!(t.on_event(PenEvent::Frame), None);
        let stroke = t.on_event(PenEvent::Contact(false)).unwrap();
        assert_eq!(
            stroke,
            vec![Point { x: 0.0, y: 0.0 }, Point { x: 315.0, y: 222.75 }]
        );
    }

    #[test]
    fn frames_before_contact_are_ignored() {
        let mut t = tracker();
        t.on_event(PenEvent::AbsX(100));
        t.on_event(PenEvent::AbsY(100));
        t.on_event(PenEvent::Frame);
        t.on_event(PenEvent::Contact(true));
        t.on_event(PenEvent::Frame);
        let stroke = t.on_event(PenEvent::Contact(false)).unwrap();
        assert_eq!(stroke.len(), 1);
    }

    #[test]
    fn frames_without_a_position_fix_emit_nothing() {
        let mut t = tracker();
        t.on_event(PenEvent::Contact(true));
        t.on_event(PenEvent::Frame);
        t.on_event(PenEvent::AbsX(500));
        t.on_event(PenEvent::Frame);
        t.on_event(PenEvent::AbsY(500));
        t.on_event(PenEvent::Frame);
        let stroke = t.on_event(PenEvent::Contact(false)).unwrap();
        assert_eq!(stroke.len(), 1);
    }

    #[test]
    fn a_held_pen_collapses_into_one_point() {
        let mut t = tracker();
        t.on_event(PenEvent::AbsX(2048));
        t.on_event(PenEvent::AbsY(2048));
        t.on_event(PenEvent::Contact(true));
        t.on_event(PenEvent::Frame);
        t.on_event(PenEvent::Frame);
        t.on_event(PenEvent::Frame);
        let stroke = t.on_event(PenEvent::Contact(false)).unwrap();
        assert_eq!(stroke.len(), 1);
    }

    #[test]
    fn repeated_contact_reports_keep_the_stroke() {
        let mut t = tracker();
        t.on_event(PenEvent::AbsX(0));
        t.on_event(PenEvent::AbsY(0));
        t.on_event(PenEvent::Contact(true));
        t.on_event(PenEvent::Frame);
        t.on_event(PenEvent::Contact(true));
        t.on_event(PenEvent::AbsX(4096));
        t.on_event(PenEvent::Frame);
        let stroke = t.on_event(PenEvent::Contact(false)).unwrap();
        assert_eq!(stroke.len(), 2);
    }

    #[test]
    fn coordinates_clamp_to_the_page() {
        let mut t = tracker();
        t.set_axis_ranges(0, 100, 0, 100);
        t.on_event(PenEvent::AbsX(150));
        t.on_event(PenEvent::AbsY(-20));
        t.on_event(PenEvent::Contact(true));
        t.on_event(PenEvent::Frame);
        let stroke = t.on_event(PenEvent::Contact(false)).unwrap();
        assert_eq!(stroke, vec![Point { x: 630.0, y: 0.0 }]);
    }

    #[test]
    fn degenerate_axis_ranges_are_widened() {
        let mut t = tracker();
        t.set_axis_ranges(10, 10, 10, 10);
        t.on_event(PenEvent::AbsX(11));
        t.on_event(PenEvent::AbsY(10));
        t.on_event(PenEvent::Contact(true));
        t.on_event(PenEvent::Frame);
        let stroke = t.on_event(PenEvent::Contact(false)).unwrap();
        assert_eq!(stroke, vec![Point { x: 630.0, y: 0.0 }]);
    }

    #[test]
    fn release_without_contact_yields_nothing() {
        let mut t = tracker();
        assert_eq!(t.on_event(PenEvent::Contact(false)), None);
    }
}

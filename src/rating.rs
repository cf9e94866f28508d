//! Star ratings derived from attempt error values.

use crate::config::Stars;
use crate::score::ErrorValues;

/// Medal awarded for a single attempt or for a session average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Star {
    Gold,
    Silver,
    Bronze,
}

impl Star {
    /// Maps a combined rank to a medal. Ranks past the bronze tier earn
    /// nothing.
    pub fn from_rank(rank: usize) -> Option<Star> {
        match rank {
            0 => Some(Star::Gold),
            1 => Some(Star::Silver),
            2 => Some(Star::Bronze),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Star::Gold => "gold",
            Star::Silver => "silver",
            Star::Bronze => "bronze",
        }
    }
}

/// Index of the first threshold the value stays within, or one past the
/// end when it beats none. Non-numeric values beat nothing.
pub fn threshold_rank(value: f64, thresholds: &[f64]) -> usize {
    thresholds
        .iter()
        .position(|&t| value <= t)
        .unwrap_or(thresholds.len())
}

/// Combined rank for a pair of error values. The weaker metric decides.
pub fn rank(values: &ErrorValues, stars: &Stars) -> usize {
    let control = threshold_rank(values.control, &stars.control);
    let accuracy = threshold_rank(values.accuracy, &stars.accuracy);
    control.max(accuracy)
}

/// Medal for a pair of error values under the given tier thresholds.
pub fn star(values: &ErrorValues, stars: &Stars) -> Option<Star> {
    Star::from_rank(rank(values, stars))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_stars() -> Stars {
        Stars {
            control: vec![6.0, 10.0, 14.0],
            accuracy: vec![1.0, 1.5, 2.0],
        }
    }

    fn values(control: f64, accuracy: f64) -> ErrorValues {
        ErrorValues { control, accuracy }
    }

    #[test]
    fn thresholds_are_inclusive() {
        let tiers = [6.0, 10.0, 14.0];
        assert_eq!(threshold_rank(6.0, &tiers), 0);
        assert_eq!(threshold_rank(6.01, &tiers), 1);
        assert_eq!(threshold_rank(10.0, &tiers), 1);
        assert_eq!(threshold_rank(14.0, &tiers), 2);
        assert_eq!(threshold_rank(14.01, &tiers), 3);
    }

    #[test]
    fn non_numeric_values_rank_worst() {
        let tiers = [1.0, 1.5, 2.0];
        assert_eq!(threshold_rank(f64::NAN, &tiers), 3);
        assert_eq!(threshold_rank(f64::INFINITY, &tiers), 3);
    }

    #[test]
    fn the_weaker_metric_decides() {
        let stars = default_stars();
        assert_eq!(star(&values(5.0, 0.8), &stars), Some(Star::Gold));
        assert_eq!(star(&values(5.0, 1.9), &stars), Some(Star::Bronze));
        assert_eq!(star(&values(12.0, 0.5), &stars), Some(Star::Bronze));
        assert_eq!(star(&values(5.0, 2.5), &stars), None);
    }

    #[test]
    fn ranks_past_bronze_get_no_medal() {
        assert_eq!(Star::from_rank(0), Some(Star::Gold));
        assert_eq!(Star::from_rank(1), Some(Star::Silver));
        assert_eq!(Star::from_rank(2), Some(Star::Bronze));
        assert_eq!(Star::from_rank(3), None);
        assert_eq!(Star::from_rank(17), None);
    }
}

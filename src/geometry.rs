//! Points, reference lines and piecewise-linear interpolation.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A horizontal target segment from `(offset_x, y)` to `(offset_x + width, y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceLine {
    pub y: f64,
    pub width: f64,
    pub offset_x: f64,
}

impl ReferenceLine {
    pub fn end_x(&self) -> f64 {
        self.offset_x + self.width
    }
}

/// Interpolates the y-value of a polyline at the given x position.
///
/// `points` must be sorted ascending by x. Scans adjacent pairs and solves
/// the line through the first pair that brackets `x`. Returns `None` when
/// fewer than two points exist or no pair brackets `x`. A duplicate-x pair
/// has no defined slope; the result then carries a non-finite y, which
/// callers treat as "no usable value".
pub fn interpolate_at(points: &[Point], x: f64) -> Option<Point> {
    for pair in points.windows(2) {
        let (left, right) = (pair[0], pair[1]);
        if left.x > x {
            continue;
        }
        if right.x < x {
            continue;
        }

        let m = (right.y - left.y) / (right.x - left.x);
        let b = right.y - m * right.x;
        return Some(Point { x, y: m * x + b });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point> {
        raw.iter().map(|&(x, y)| Point { x, y }).collect()
    }

    #[test]
    fn midpoint_interpolation_is_exact() {
        let points = pts(&[(2.0, 3.0), (4.0, 7.0)]);
        let p = interpolate_at(&points, 3.0).unwrap();
        assert_eq!(p.x, 3.0);
        assert_eq!(p.y, 5.0);
    }

    #[test]
    fn picks_the_bracketing_segment() {
        let points = pts(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]);
        assert_eq!(interpolate_at(&points, 5.0).unwrap().y, 5.0);
        assert_eq!(interpolate_at(&points, 15.0).unwrap().y, 5.0);
        assert!(interpolate_at(&points, 25.0).is_none());
    }

    #[test]
    fn vertices_resolve_through_the_first_bracketing_pair() {
        let points = pts(&[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]);
        assert_eq!(interpolate_at(&points, 0.0).unwrap().y, 0.0);
        assert_eq!(interpolate_at(&points, 10.0).unwrap().y, 10.0);
        assert_eq!(interpolate_at(&points, 20.0).unwrap().y, 0.0);
    }

    #[test]
    fn x_left_of_every_segment_finds_nothing() {
        let points = pts(&[(0.0, 0.0), (10.0, 10.0)]);
        assert!(interpolate_at(&points, -1.0).is_none());
    }

    #[test]
    fn too_few_points_interpolate_nothing() {
        assert!(interpolate_at(&[], 1.0).is_none());
        assert!(interpolate_at(&pts(&[(1.0, 1.0)]), 1.0).is_none());
    }

    #[test]
    fn duplicate_x_segment_yields_non_finite_y() {
        let points = pts(&[(5.0, 0.0), (5.0, 10.0)]);
        let p = interpolate_at(&points, 5.0).unwrap();
        assert!(!p.y.is_finite());
    }
}

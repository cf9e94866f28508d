/// Minimum, arithmetic mean and maximum of a series of error values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

/// Single-pass min/avg/max. Empty input yields `+inf` sentinels.
pub fn stats(values: &[f64]) -> Stats {
    if values.is_empty() {
        return Stats {
            min: f64::INFINITY,
            avg: f64::INFINITY,
            max: f64::INFINITY,
        };
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut accum = 0.0;
    for &v in values {
        min = min.min(v);
        max = max.max(v);
        accum += v;
    }
    Stats {
        min,
        avg: accum / values.len() as f64,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_infinite_sentinels() {
        let s = stats(&[]);
        assert_eq!(s.min, f64::INFINITY);
        assert_eq!(s.avg, f64::INFINITY);
        assert_eq!(s.max, f64::INFINITY);
    }

    #[test]
    fn single_value_is_its_own_extremes() {
        let s = stats(&[2.5]);
        assert_eq!(s.min, 2.5);
        assert_eq!(s.avg, 2.5);
        assert_eq!(s.max, 2.5);
    }

    #[test]
    fn mixed_values() {
        let s = stats(&[4.0, 1.0, 7.0, 2.0]);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.avg, 3.5);
        assert_eq!(s.max, 7.0);
    }
}

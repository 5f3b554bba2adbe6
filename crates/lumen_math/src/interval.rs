/// A closed range of ray parameters or coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// True when the interval holds no values (min > max, or a NaN bound).
    ///
    /// A single-point interval (min == max) is not empty.
    pub fn is_empty(&self) -> bool {
        self.min > self.max || self.min.is_nan() || self.max.is_nan()
    }

    /// Returns true if x is within the interval [min, max] (inclusive).
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_contains_is_inclusive() {
        let interval = Interval::new(0.0, 10.0);

        assert!(interval.contains(0.0));
        assert!(interval.contains(10.0));
        assert!(interval.contains(5.0));
        assert!(!interval.contains(-0.1));
        assert!(!interval.contains(10.1));
    }

    #[test]
    fn test_interval_point_is_not_empty() {
        let point = Interval::new(3.0, 3.0);
        assert!(!point.is_empty());
        assert!(point.contains(3.0));
    }

    #[test]
    fn test_inverted_interval_is_empty() {
        let inverted = Interval::new(2.0, 1.0);
        assert!(inverted.is_empty());
        assert!(!inverted.contains(1.5));
        assert!(Interval::new(f32::NAN, 1.0).is_empty());
    }
}

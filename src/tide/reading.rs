use chrono::{DateTime, Utc};

use crate::tide::TideError;

/// A single sea height observation plus the range it is scaled against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TideReading {
    pub current_height: f64,

    pub range_min: f64,

    pub range_max: f64,

    pub observed_at: DateTime<Utc>,
}

/// Where a backend takes `range_min` and `range_max` from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightRange {
    /// Min and max of every non-null sample in the fetched series.
    Observed,

    /// Configured low and high tide baselines in metres.
    Fixed { min: f64, max: f64 },
}

impl HeightRange {
    pub fn resolve(&self, heights: impl IntoIterator<Item = f64>) -> Result<(f64, f64), TideError> {
        match *self {
            HeightRange::Fixed { min, max } => Ok((min, max)),
            HeightRange::Observed => heights
                .into_iter()
                .fold(None, |acc: Option<(f64, f64)>, h| match acc {
                    None => Some((h, h)),
                    Some((min, max)) => Some((min.min(h), max.max(h))),
                })
                .ok_or(TideError::EmptySeries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_range_spans_all_samples() {
        let range = HeightRange::Observed
            .resolve([0.8, 0.2, 1.9, 1.1])
            .unwrap();

        assert_eq!(range, (0.2, 1.9));
    }

    #[test]
    fn observed_range_of_nothing_is_an_error() {
        let err = HeightRange::Observed.resolve([]).unwrap_err();

        assert!(matches!(err, TideError::EmptySeries));
    }

    #[test]
    fn fixed_range_ignores_samples() {
        let range = HeightRange::Fixed { min: 0.0, max: 2.0 }
            .resolve([5.0, -3.0])
            .unwrap();

        assert_eq!(range, (0.0, 2.0));
    }
}

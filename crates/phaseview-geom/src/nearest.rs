//! Nearest-sample search over a sampled curve

use serde::{Deserialize, Serialize};

use crate::point::Point2;

/// A sample found close to a query point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NearestSample {
    /// Index of the sample in the searched sequence
    pub index: usize,
    /// Euclidean distance from the query point
    pub distance: f64,
    /// The sample itself
    pub point: Point2,
}

/// Find the sample closest to `target`, provided it lies within `tolerance`
///
/// Ties resolve to the lowest index. Non-finite samples are skipped.
pub fn nearest_within(samples: &[Point2], target: Point2, tolerance: f64) -> Option<NearestSample> {
    let mut best: Option<NearestSample> = None;
    for (index, point) in samples.iter().enumerate() {
        if !(point.x.is_finite() && point.y.is_finite()) {
            continue;
        }
        let distance = point.distance(&target);
        if distance > tolerance {
            continue;
        }
        if best.map_or(true, |b| distance < b.distance) {
            best = Some(NearestSample {
                index,
                distance,
                point: *point,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ]
    }

    #[test]
    fn test_nearest_within_tolerance() {
        let hit = nearest_within(&samples(), Point2::new(1.05, 0.02), 0.1).unwrap();
        assert_eq!(hit.index, 1);
        assert!(hit.distance < 0.1);
    }

    #[test]
    fn test_nearest_outside_tolerance() {
        assert!(nearest_within(&samples(), Point2::new(1.5, 1.0), 0.1).is_none());
    }

    #[test]
    fn test_nearest_tie_prefers_first() {
        let hit = nearest_within(&samples(), Point2::new(1.5, 0.0), 1.0).unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn test_nearest_skips_nan() {
        let pts = vec![Point2::new(f64::NAN, 0.0), Point2::new(0.0, 0.05)];
        let hit = nearest_within(&pts, Point2::new(0.0, 0.0), 0.1).unwrap();
        assert_eq!(hit.index, 1);
    }
}

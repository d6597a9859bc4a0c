//! Interpolated curves kept alongside point data
//!
//! Point entries whose first coordinate increases strictly are mirrored as a
//! piecewise-linear curve `y(x)`, so a time-series layer can be sampled at
//! the current playback time. Building the curve is best effort: entries
//! that do not describe a function of their first coordinate simply get no
//! curve.

use serde::{Deserialize, Serialize};

use super::data::{Coords, EntryPayload};

/// Piecewise-linear interpolant of y over a strictly increasing x
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl Curve {
    /// Build from point data; `None` if the data cannot be interpolated
    pub fn from_coords(coords: &Coords) -> Option<Self> {
        let xs = coords.x();
        let ys = coords.y();
        if xs.len() < 2 {
            return None;
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return None;
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return None;
        }
        Some(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
        })
    }

    /// Build from an entry payload; only point data qualifies
    pub fn from_payload(payload: &EntryPayload) -> Option<Self> {
        match payload {
            EntryPayload::Points(coords) => Self::from_coords(coords),
            _ => None,
        }
    }

    /// Domain of the independent variable
    pub fn range(&self) -> [f64; 2] {
        [self.xs[0], self.xs[self.xs.len() - 1]]
    }

    /// Interpolated value, or `None` outside the sampled range
    pub fn eval(&self, x: f64) -> Option<f64> {
        let [lo, hi] = self.range();
        if !(lo..=hi).contains(&x) {
            return None;
        }
        // first index with xs[i] >= x
        let i = self.xs.partition_point(|&v| v < x);
        if i == 0 {
            return Some(self.ys[0]);
        }
        let (x0, x1) = (self.xs[i - 1], self.xs[i]);
        let (y0, y1) = (self.ys[i - 1], self.ys[i]);
        Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(x: &[f64], y: &[f64]) -> Coords {
        Coords::new(x.to_vec(), y.to_vec()).unwrap()
    }

    #[test]
    fn test_eval_interpolates() {
        let curve = Curve::from_coords(&coords(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0])).unwrap();
        assert_eq!(curve.eval(0.0), Some(0.0));
        assert_eq!(curve.eval(1.0), Some(1.0));
        assert_eq!(curve.eval(1.5), Some(2.5));
        assert_eq!(curve.eval(2.0), Some(4.0));
        assert_eq!(curve.eval(2.5), None);
        assert_eq!(curve.eval(-0.1), None);
    }

    #[test]
    fn test_rejects_non_monotone() {
        assert!(Curve::from_coords(&coords(&[0.0, 2.0, 1.0], &[0.0, 1.0, 2.0])).is_none());
        assert!(Curve::from_coords(&coords(&[0.0, 0.0], &[0.0, 1.0])).is_none());
    }

    #[test]
    fn test_rejects_short_or_nan() {
        assert!(Curve::from_coords(&coords(&[0.0], &[0.0])).is_none());
        assert!(Curve::from_coords(&coords(&[0.0, 1.0], &[f64::NAN, 1.0])).is_none());
    }

    #[test]
    fn test_text_payload_has_no_curve() {
        let payload = EntryPayload::Text {
            position: phaseview_geom::Point2::new(0.0, 0.0),
            text: "label".to_string(),
            axis_coords: false,
        };
        assert!(Curve::from_payload(&payload).is_none());
    }
}

//! Point snapshots across figures

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current time, index and time-series values of one figure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CapturedPoint {
    pub figure: String,
    pub t: Option<f64>,
    pub ix: Option<usize>,
    /// Entry name to its value at `t`, for data entries of time-correlated
    /// sub-plots
    pub values: BTreeMap<String, f64>,
    pub captured_at: DateTime<Utc>,
}

impl CapturedPoint {
    pub fn new(figure: impl Into<String>, t: Option<f64>, ix: Option<usize>) -> Self {
        Self {
            figure: figure.into(),
            t,
            ix,
            values: BTreeMap::new(),
            captured_at: Utc::now(),
        }
    }

    pub fn get(&self, entry: &str) -> Option<f64> {
        self.values.get(entry).copied()
    }
}

impl fmt::Display for CapturedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Figure: {}", self.figure)?;
        if let Some(t) = self.t {
            write!(f, " @ time = {:.3}", t)?;
        }
        for (name, value) in &self.values {
            write!(f, "\n  {}: {}", name, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let mut point = CapturedPoint::new("F", Some(0.5), Some(1));
        point.values.insert("x".to_string(), 2.0);
        assert_eq!(point.to_string(), "Figure: F @ time = 0.500\n  x: 2");
        assert_eq!(point.get("x"), Some(2.0));
        assert_eq!(point.get("y"), None);
    }

    #[test]
    fn test_json() {
        let point = CapturedPoint::new("F", None, None);
        let json = serde_json::to_string(&point).unwrap();
        let back: CapturedPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, point);
    }
}

//! Shared value types for the scene model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};

/// Optional fixed view limits per axis
///
/// A `None` side leaves the current view limit of that axis untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisScale {
    pub x: Option<[f64; 2]>,
    pub y: Option<[f64; 2]>,
}

impl AxisScale {
    pub fn new(x: [f64; 2], y: [f64; 2]) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
        }
    }

    pub fn x_only(x: [f64; 2]) -> Self {
        Self {
            x: Some(x),
            y: None,
        }
    }

    pub fn y_only(y: [f64; 2]) -> Self {
        Self {
            x: None,
            y: Some(y),
        }
    }

    /// True if neither axis carries a limit
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

/// Sub-plot grid shape of a figure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridShape {
    pub rows: u8,
    pub cols: u8,
}

impl GridShape {
    pub fn new(rows: u8, cols: u8) -> SceneResult<Self> {
        if rows == 0 || cols == 0 || rows > 9 || cols > 9 {
            return Err(SceneError::InvalidArgument(format!(
                "grid shape must be between [1, 1] and [9, 9], got [{}, {}]",
                rows, cols
            )));
        }
        Ok(Self { rows, cols })
    }

    /// Whether the position lies inside this grid
    pub fn contains(&self, position: PositionCode) -> bool {
        position.row <= self.rows && position.col <= self.cols
    }

    /// Row-major iteration over every cell
    pub fn positions(&self) -> impl Iterator<Item = PositionCode> + '_ {
        (1..=self.rows).flat_map(move |row| (1..=self.cols).map(move |col| PositionCode { row, col }))
    }

    /// One-based linear index of a cell, as used by grid layouts
    pub fn linear_index(&self, position: PositionCode) -> usize {
        (position.row as usize - 1) * self.cols as usize + position.col as usize
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self { rows: 1, cols: 1 }
    }
}

/// Sub-plot position within a grid, written as a two-digit code such as `"12"`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionCode {
    pub row: u8,
    pub col: u8,
}

impl PositionCode {
    pub fn new(row: u8, col: u8) -> SceneResult<Self> {
        if !(1..=9).contains(&row) || !(1..=9).contains(&col) {
            return Err(SceneError::InvalidArgument(format!(
                "position row and column must be in 1..=9, got ({}, {})",
                row, col
            )));
        }
        Ok(Self { row, col })
    }
}

impl FromStr for PositionCode {
    type Err = SceneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
        if s.chars().count() != 2 || digits.len() != 2 {
            return Err(SceneError::InvalidArgument(format!(
                "sub-plot position must be a two-digit code like \"11\", got {:?}",
                s
            )));
        }
        Self::new(digits[0] as u8, digits[1] as u8)
    }
}

impl TryFrom<String> for PositionCode {
    type Error = SceneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PositionCode> for String {
    fn from(value: PositionCode) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PositionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row, self.col)
    }
}

/// Axes projection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    #[default]
    Planar,
    #[serde(rename = "3d")]
    ThreeD,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_code_parse() {
        let code: PositionCode = "12".parse().unwrap();
        assert_eq!(code, PositionCode { row: 1, col: 2 });
        assert_eq!(code.to_string(), "12");
    }

    #[test]
    fn test_position_code_rejects_bad_input() {
        assert!("1".parse::<PositionCode>().is_err());
        assert!("123".parse::<PositionCode>().is_err());
        assert!("a1".parse::<PositionCode>().is_err());
        assert!("01".parse::<PositionCode>().is_err());
    }

    #[test]
    fn test_grid_contains() {
        let shape = GridShape::new(2, 1).unwrap();
        assert!(shape.contains("11".parse().unwrap()));
        assert!(shape.contains("21".parse().unwrap()));
        assert!(!shape.contains("12".parse().unwrap()));
    }

    #[test]
    fn test_grid_positions_row_major() {
        let shape = GridShape::new(2, 2).unwrap();
        let codes: Vec<String> = shape.positions().map(|p| p.to_string()).collect();
        assert_eq!(codes, vec!["11", "12", "21", "22"]);
        assert_eq!(shape.linear_index("21".parse().unwrap()), 3);
    }

    #[test]
    fn test_grid_shape_bounds() {
        assert!(GridShape::new(0, 1).is_err());
        assert!(GridShape::new(1, 10).is_err());
    }

    #[test]
    fn test_projection_serde() {
        let json = serde_json::to_string(&Projection::ThreeD).unwrap();
        assert_eq!(json, "\"3d\"");
    }
}

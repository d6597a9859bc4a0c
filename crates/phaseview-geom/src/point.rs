//! Points and rectangular domains

use serde::{Deserialize, Serialize};

/// A point in the plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn to_array(&self) -> [f64; 2] {
        [self.x, self.y]
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub(crate) fn sub(&self, other: &Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }

    pub(crate) fn cross(&self, other: &Point2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub(crate) fn dot(&self, other: &Point2) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

impl From<[f64; 2]> for Point2 {
    fn from(arr: [f64; 2]) -> Self {
        Self { x: arr[0], y: arr[1] }
    }
}

impl From<(f64, f64)> for Point2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<Point2> for [f64; 2] {
    fn from(p: Point2) -> Self {
        [p.x, p.y]
    }
}

/// Rectangular domain given as a pair of axis extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    /// `[lo, hi]` along the horizontal axis
    pub x: [f64; 2],
    /// `[lo, hi]` along the vertical axis
    pub y: [f64; 2],
}

impl Domain {
    pub fn new(x: [f64; 2], y: [f64; 2]) -> Self {
        Self { x, y }
    }

    /// Check whether a point lies inside (or on) the domain
    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.x[0] && p.x <= self.x[1] && p.y >= self.y[0] && p.y <= self.y[1]
    }

    /// The four boundary sides: left, bottom, top, right
    pub fn sides(&self) -> [(Point2, Point2); 4] {
        let [xlo, xhi] = self.x;
        let [ylo, yhi] = self.y;
        [
            (Point2::new(xlo, ylo), Point2::new(xlo, yhi)),
            (Point2::new(xlo, ylo), Point2::new(xhi, ylo)),
            (Point2::new(xhi, yhi), Point2::new(xlo, yhi)),
            (Point2::new(xhi, yhi), Point2::new(xhi, ylo)),
        ]
    }

    /// Grow the domain so it also covers `p`
    pub fn expand_to_include(&mut self, p: &Point2) {
        self.x[0] = self.x[0].min(p.x);
        self.x[1] = self.x[1].max(p.x);
        self.y[0] = self.y[0].min(p.y);
        self.y[1] = self.y[1].max(p.y);
    }
}

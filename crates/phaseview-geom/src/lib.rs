//! phaseview-geom - Planar geometry for trajectory exploration
//!
//! Small, allocation-free helpers used by the interactive viewer:
//!
//! - **Point2 / Domain**: 2D coordinates and rectangular axis extents
//! - **LineSegment**: length, angle, interpolation and signed distances
//! - **force_line_to_extent**: clip the infinite line through two points to a domain
//! - **nearest_within**: tolerance-bounded nearest-sample search

pub mod error;
pub mod line;
pub mod nearest;
pub mod point;

pub use error::{GeomError, GeomResult};
pub use line::*;
pub use nearest::*;
pub use point::*;

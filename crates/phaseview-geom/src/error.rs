//! Error types for geometric queries

use thiserror::Error;

/// Errors raised by geometric utilities
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// The infinite line does not cut the domain boundary twice
    #[error("No intersection between line and domain boundary")]
    NoIntersection,

    /// Both defining points coincide, so no line direction exists
    #[error("Degenerate line: defining points coincide at ({x}, {y})")]
    DegenerateLine { x: f64, y: f64 },
}

/// Result type alias for geometric operations
pub type GeomResult<T> = Result<T, GeomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geom_error_display() {
        let err = GeomError::DegenerateLine { x: 1.0, y: 2.0 };
        assert!(err.to_string().contains("(1, 2)"));
        assert!(GeomError::NoIntersection.to_string().contains("No intersection"));
    }
}

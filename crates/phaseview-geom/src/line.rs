//! Line segments and clipping of infinite lines against a domain

use serde::{Deserialize, Serialize};

use crate::error::{GeomError, GeomResult};
use crate::point::{Domain, Point2};

/// Tolerance below which two directions are treated as parallel
const PARALLEL_EPS: f64 = 1e-12;

/// Tolerance for accepting an intersection at a segment end point
const ENDPOINT_EPS: f64 = 1e-9;

/// A finite segment between two points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub p1: Point2,
    pub p2: Point2,
}

impl LineSegment {
    pub fn new(p1: Point2, p2: Point2) -> Self {
        Self { p1, p2 }
    }

    /// Same segment with the end points ordered so that `p1.x <= p2.x`
    pub fn ordered_by_x(self) -> Self {
        if self.p1.x > self.p2.x {
            Self::new(self.p2, self.p1)
        } else {
            self
        }
    }

    pub fn dx(&self) -> f64 {
        self.p2.x - self.p1.x
    }

    pub fn dy(&self) -> f64 {
        self.p2.y - self.p1.y
    }

    pub fn length(&self) -> f64 {
        self.dx().hypot(self.dy())
    }

    /// Angle relative to the horizontal, in radians
    pub fn angle(&self) -> f64 {
        self.dy().atan2(self.dx())
    }

    /// Position at fractional distance (0-1) from `p1` along the segment
    pub fn point_at_fraction(&self, fraction: f64) -> Point2 {
        Point2::new(
            self.p1.x + fraction * self.dx(),
            self.p1.y + fraction * self.dy(),
        )
    }

    /// Position at absolute distance from `p1` along the segment direction
    pub fn point_at_distance(&self, distance: f64) -> Point2 {
        let len = self.length();
        if len == 0.0 {
            return self.p1;
        }
        self.point_at_fraction(distance / len)
    }

    /// Shortest distance from `p` to any point of the segment
    pub fn distance_to_point(&self, p: &Point2) -> f64 {
        let d = self.p2.sub(&self.p1);
        let len_sq = d.dot(&d);
        if len_sq == 0.0 {
            return p.distance(&self.p1);
        }
        let u = (p.sub(&self.p1).dot(&d) / len_sq).clamp(0.0, 1.0);
        p.distance(&self.point_at_fraction(u))
    }

    /// Signed perpendicular distance from `p` to the infinite line through the segment
    ///
    /// Positive on the left of the direction `p1 -> p2`.
    pub fn signed_distance(&self, p: &Point2) -> f64 {
        let len = self.length();
        if len == 0.0 {
            return p.distance(&self.p1);
        }
        self.p2.sub(&self.p1).cross(&p.sub(&self.p1)) / len
    }

    /// Intersection of the infinite line through `a`/`b` with this segment
    fn intersect_line(&self, a: &Point2, b: &Point2) -> Option<Point2> {
        let d = b.sub(a);
        let e = self.p2.sub(&self.p1);
        let denom = d.cross(&e);
        if denom.abs() < PARALLEL_EPS {
            return None;
        }
        let w = self.p1.sub(a);
        let t = w.cross(&e) / denom;
        let u = w.cross(&d) / denom;
        if !(-ENDPOINT_EPS..=1.0 + ENDPOINT_EPS).contains(&u) {
            return None;
        }
        Some(Point2::new(a.x + t * d.x, a.y + t * d.y))
    }
}

/// Clip the infinite line through `a` and `b` to the boundary of `domain`
///
/// Each boundary side is tested as a finite segment. A boundary point is
/// assigned to whichever of `a`/`b` lies closer to that side, so the returned
/// pair keeps the orientation of the input points.
pub fn force_line_to_extent(a: Point2, b: Point2, domain: &Domain) -> GeomResult<(Point2, Point2)> {
    if a == b {
        return Err(GeomError::DegenerateLine { x: a.x, y: a.y });
    }

    let mut p1: Option<Point2> = None;
    let mut p2: Option<Point2> = None;

    for (lo, hi) in domain.sides() {
        let side = LineSegment::new(lo, hi);
        let Some(pt) = side.intersect_line(&a, &b) else {
            continue;
        };
        // a line through a corner meets two sides at the same point
        let seen = [p1, p2]
            .iter()
            .flatten()
            .any(|q| q.distance(&pt) < ENDPOINT_EPS);
        if seen {
            continue;
        }

        let dist1 = side.distance_to_point(&a);
        let dist2 = side.distance_to_point(&b);
        if dist1 > dist2 {
            if p2.is_none() {
                p2 = Some(pt);
            } else {
                p1 = Some(pt);
            }
        } else if p1.is_none() {
            p1 = Some(pt);
        } else {
            p2 = Some(pt);
        }
    }

    match (p1, p2) {
        (Some(p1), Some(p2)) => Ok((p1, p2)),
        _ => Err(GeomError::NoIntersection),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_domain() -> Domain {
        Domain::new([-1.0, 1.0], [-1.0, 1.0])
    }

    #[test]
    fn test_segment_length_and_angle() {
        let seg = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        assert!((seg.length() - 2f64.sqrt()).abs() < 1e-12);
        assert!((seg.angle() - std::f64::consts::FRAC_PI_4).abs() < 1e-12);
    }

    #[test]
    fn test_ordered_by_x() {
        let seg = LineSegment::new(Point2::new(2.0, 0.0), Point2::new(0.0, 0.0)).ordered_by_x();
        assert_eq!(seg.p1, Point2::new(0.0, 0.0));
        assert_eq!(seg.p2, Point2::new(2.0, 0.0));
        assert_eq!(seg.angle(), 0.0);
    }

    #[test]
    fn test_point_at_fraction_and_distance() {
        let seg = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(4.0, 0.0));
        assert_eq!(seg.point_at_fraction(0.25), Point2::new(1.0, 0.0));
        assert_eq!(seg.point_at_distance(3.0), Point2::new(3.0, 0.0));
    }

    #[test]
    fn test_distance_to_point_clamps_to_ends() {
        let seg = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        assert!((seg.distance_to_point(&Point2::new(0.5, 2.0)) - 2.0).abs() < 1e-12);
        assert!((seg.distance_to_point(&Point2::new(4.0, 4.0)) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_signed_distance_sides() {
        let seg = LineSegment::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0));
        assert!(seg.signed_distance(&Point2::new(0.3, 1.0)) > 0.0);
        assert!(seg.signed_distance(&Point2::new(0.3, -1.0)) < 0.0);
    }

    #[test]
    fn test_force_horizontal_line_to_extent() {
        let (p1, p2) =
            force_line_to_extent(Point2::new(0.0, 0.0), Point2::new(0.5, 0.0), &unit_domain())
                .unwrap();
        assert!((p1.x + 1.0).abs() < 1e-12 && p1.y.abs() < 1e-12);
        assert!((p2.x - 1.0).abs() < 1e-12 && p2.y.abs() < 1e-12);
    }

    #[test]
    fn test_force_line_keeps_orientation() {
        let (p1, p2) =
            force_line_to_extent(Point2::new(0.0, 0.5), Point2::new(0.0, 0.0), &unit_domain())
                .unwrap();
        assert!((p1.y - 1.0).abs() < 1e-12);
        assert!((p2.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_force_diagonal_through_corners() {
        let (p1, p2) =
            force_line_to_extent(Point2::new(0.0, 0.0), Point2::new(0.5, 0.5), &unit_domain())
                .unwrap();
        assert!(p1.distance(&Point2::new(-1.0, -1.0)) < 1e-9);
        assert!(p2.distance(&Point2::new(1.0, 1.0)) < 1e-9);
    }

    #[test]
    fn test_force_line_outside_domain() {
        let result =
            force_line_to_extent(Point2::new(5.0, 5.0), Point2::new(6.0, 5.0), &unit_domain());
        assert_eq!(result, Err(GeomError::NoIntersection));
    }

    #[test]
    fn test_force_degenerate_line() {
        let p = Point2::new(0.2, 0.2);
        assert!(matches!(
            force_line_to_extent(p, p, &unit_domain()),
            Err(GeomError::DegenerateLine { .. })
        ));
    }
}

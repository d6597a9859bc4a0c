//! Data entries and their coordinate payloads

use phaseview_geom::{Domain, Point2};
use serde::{Deserialize, Serialize};

use crate::error::{SceneError, SceneResult};
use crate::style::Style;
use crate::types::PositionCode;

/// Two or three parallel coordinate sequences of equal length
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    x: Vec<f64>,
    y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    z: Option<Vec<f64>>,
}

impl Coords {
    /// Planar coordinates
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> SceneResult<Self> {
        if x.len() != y.len() {
            return Err(SceneError::shape(format!(
                "x and y must have equal length, got {} and {}",
                x.len(),
                y.len()
            )));
        }
        Ok(Self { x, y, z: None })
    }

    /// Spatial coordinates
    pub fn new_3d(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> SceneResult<Self> {
        if x.len() != y.len() || x.len() != z.len() {
            return Err(SceneError::shape(format!(
                "x, y and z must have equal length, got {}, {} and {}",
                x.len(),
                y.len(),
                z.len()
            )));
        }
        Ok(Self { x, y, z: Some(z) })
    }

    /// Build from a list of 2 or 3 sequences
    pub fn from_columns(columns: Vec<Vec<f64>>) -> SceneResult<Self> {
        let count = columns.len();
        let mut iter = columns.into_iter();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(x), Some(y), None) => Self::new(x, y),
            (Some(x), Some(y), Some(z)) if count == 3 => Self::new_3d(x, y, z),
            _ => Err(SceneError::shape(format!(
                "data must contain 2 or 3 sequences of points, got {}",
                count
            ))),
        }
    }

    /// A single planar point
    pub fn point(p: Point2) -> Self {
        Self {
            x: vec![p.x],
            y: vec![p.y],
            z: None,
        }
    }

    /// A two-point polyline
    pub fn segment(p1: Point2, p2: Point2) -> Self {
        Self {
            x: vec![p1.x, p2.x],
            y: vec![p1.y, p2.y],
            z: None,
        }
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> Option<&[f64]> {
        self.z.as_deref()
    }

    /// Number of coordinate sequences (2 or 3)
    pub fn dims(&self) -> usize {
        if self.z.is_some() {
            3
        } else {
            2
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Planar points, ignoring any third coordinate
    pub fn points(&self) -> impl Iterator<Item = Point2> + '_ {
        self.x.iter().zip(&self.y).map(|(&x, &y)| Point2::new(x, y))
    }

    /// Append one planar point
    pub fn push(&mut self, p: Point2) -> SceneResult<()> {
        if self.z.is_some() {
            return Err(SceneError::shape("cannot append a 2-D point to 3-D data"));
        }
        self.x.push(p.x);
        self.y.push(p.y);
        Ok(())
    }

    /// Planar extent of the finite points, if there are any
    pub fn extent(&self) -> Option<Domain> {
        let mut finite = self.points().filter(|p| p.x.is_finite() && p.y.is_finite());
        let first = finite.next()?;
        let mut domain = Domain::new([first.x, first.x], [first.y, first.y]);
        for p in finite {
            domain.expand_to_include(&p);
        }
        Some(domain)
    }
}

/// Pre-built collection of independent line segments
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentCollection {
    pub segments: Vec<(Point2, Point2)>,
    /// Per-segment colors (may be empty for a uniform color)
    pub colors: Vec<String>,
}

impl SegmentCollection {
    /// Consecutive point pairs of a polyline
    pub fn from_polyline(coords: &Coords, colors: Vec<String>) -> SceneResult<Self> {
        let points: Vec<Point2> = coords.points().collect();
        let segments: Vec<(Point2, Point2)> = points.windows(2).map(|w| (w[0], w[1])).collect();
        if !colors.is_empty() && colors.len() != segments.len() {
            return Err(SceneError::shape(format!(
                "{} colors given for {} segments",
                colors.len(),
                segments.len()
            )));
        }
        Ok(Self { segments, colors })
    }
}

/// What a data entry holds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntryPayload {
    /// Point or line data
    Points(Coords),
    /// A text label
    Text {
        position: Point2,
        text: String,
        /// Position is in axes fractions rather than data coordinates
        axis_coords: bool,
    },
    /// One circle per point
    Patch {
        centers: Coords,
        radii: Vec<f64>,
        colors: Vec<String>,
    },
    /// Pre-built segment collection
    Segments(SegmentCollection),
}

impl EntryPayload {
    /// Point coordinates, if the payload is point data
    pub fn coords(&self) -> Option<&Coords> {
        match self {
            EntryPayload::Points(c) => Some(c),
            EntryPayload::Patch { centers, .. } => Some(centers),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            EntryPayload::Points(_) => "points",
            EntryPayload::Text { .. } => "text",
            EntryPayload::Patch { .. } => "patch",
            EntryPayload::Segments(_) => "segments",
        }
    }
}

/// One renderable dataset within a layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataEntry {
    pub name: String,
    pub payload: EntryPayload,
    pub style: Style,
    pub display: bool,
    /// Target sub-plot; resolved lazily on first render when unset
    pub subplot: Option<PositionCode>,
    /// Geometry changed since it was last pushed to a render handle
    #[serde(skip)]
    pub(crate) dirty: bool,
}

impl DataEntry {
    pub fn new(name: impl Into<String>, payload: EntryPayload, style: Style) -> Self {
        Self {
            name: name.into(),
            payload,
            style,
            display: true,
            subplot: None,
            dirty: false,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Options for adding a data entry
#[derive(Clone, Debug)]
pub struct DataSpec {
    pub payload: EntryPayload,
    pub name: Option<String>,
    pub style: Option<Style>,
    pub display: bool,
    pub subplot: Option<PositionCode>,
    /// Overwrite an existing entry of the same name
    pub force: bool,
}

impl DataSpec {
    pub fn new(payload: EntryPayload) -> Self {
        Self {
            payload,
            name: None,
            style: None,
            display: true,
            subplot: None,
            force: false,
        }
    }

    pub fn points(coords: Coords) -> Self {
        Self::new(EntryPayload::Points(coords))
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn style(mut self, style: impl Into<Style>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    pub fn subplot(mut self, position: PositionCode) -> Self {
        self.subplot = Some(position);
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coords_shape_validation() {
        assert!(Coords::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(Coords::new_3d(vec![0.0], vec![0.0], vec![]).is_err());
        assert!(Coords::from_columns(vec![vec![0.0]]).is_err());
        assert!(Coords::from_columns(vec![vec![0.0]; 4]).is_err());

        let c = Coords::from_columns(vec![vec![0.0, 1.0], vec![2.0, 3.0], vec![4.0, 5.0]]).unwrap();
        assert_eq!(c.dims(), 3);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_push_rejects_3d() {
        let mut c = Coords::new_3d(vec![0.0], vec![0.0], vec![0.0]).unwrap();
        assert!(matches!(
            c.push(Point2::new(1.0, 1.0)),
            Err(SceneError::InvalidShape { .. })
        ));

        let mut planar = Coords::default();
        planar.push(Point2::new(1.0, 2.0)).unwrap();
        assert_eq!(planar.x(), &[1.0]);
        assert_eq!(planar.y(), &[2.0]);
    }

    #[test]
    fn test_extent_skips_nan() {
        let c = Coords::new(vec![0.0, f64::NAN, 2.0], vec![-1.0, 5.0, 4.0]).unwrap();
        let extent = c.extent().unwrap();
        assert_eq!(extent.x, [0.0, 2.0]);
        assert_eq!(extent.y, [-1.0, 4.0]);
        assert!(Coords::default().extent().is_none());
    }

    #[test]
    fn test_segment_collection_from_polyline() {
        let c = Coords::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 0.0]).unwrap();
        let coll = SegmentCollection::from_polyline(&c, vec!["r".into(), "b".into()]).unwrap();
        assert_eq!(coll.segments.len(), 2);
        assert_eq!(coll.segments[1].0, Point2::new(1.0, 1.0));

        assert!(SegmentCollection::from_polyline(&c, vec!["r".into()]).is_err());
    }
}

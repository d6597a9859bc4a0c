//! Render backend interface and scene reconciliation
//!
//! The backend is an external collaborator: it owns figure surfaces, axes,
//! drawn primitives and widgets, and hands back opaque identifiers. The
//! [`RenderSync`] pass reconciles the scene model with those objects.

mod recording;
mod sync;

pub use recording::{RecordedAxes, RecordedPrimitive, RecordedWidget, RecordingBackend, WidgetKind};
pub use sync::{RenderSync, SyncOptions, SyncReport};

use std::fmt;
use std::path::Path;

use phaseview_geom::Point2;
use serde::{Deserialize, Serialize};

use crate::error::RenderResult;
use crate::scene::Coords;
use crate::style::Style;
use crate::types::{AxisScale, GridShape, PositionCode, Projection};

/// Identifier of a live axes object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AxesId(pub u64);

/// Identifier of a drawn primitive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandleId(pub u64);

/// Identifier of a widget (slider or button)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WidgetId(pub u64);

impl fmt::Display for AxesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "axes#{}", self.0)
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "widget#{}", self.0)
    }
}

/// Axes to create for one sub-plot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxesSpec {
    pub shape: GridShape,
    pub position: PositionCode,
    pub title: String,
    /// Axis labels, 2 or 3
    pub labels: Vec<String>,
    pub projection: Projection,
}

/// A drawing request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    /// Planar line/marker plot
    Line { x: Vec<f64>, y: Vec<f64> },
    /// Spatial line/marker plot
    Line3D { x: Vec<f64>, y: Vec<f64>, z: Vec<f64> },
    /// Text label
    Text {
        position: Point2,
        text: String,
        /// Position is in axes fractions
        axis_coords: bool,
    },
    /// Filled circle
    Circle {
        center: Point2,
        radius: f64,
        color: Option<String>,
    },
    /// Independent segments with optional per-segment colors
    Collection {
        segments: Vec<(Point2, Point2)>,
        colors: Vec<String>,
    },
    /// Vertical line spanning the axes height
    VerticalMarker { x: f64 },
}

impl Primitive {
    /// Line primitive matching the dimensionality of the coordinates
    pub fn from_coords(coords: &Coords) -> Self {
        match coords.z() {
            Some(z) => Primitive::Line3D {
                x: coords.x().to_vec(),
                y: coords.y().to_vec(),
                z: z.to_vec(),
            },
            None => Primitive::Line {
                x: coords.x().to_vec(),
                y: coords.y().to_vec(),
            },
        }
    }
}

/// Time slider declaration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SliderSpec {
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub initial: f64,
}

/// External rendering surface
///
/// Implementations own every object they create. Callbacks of widgets and
/// pointer interaction are not registered here: the event dispatcher
/// delivers them to the controller as [`crate::input::UiEvent`]s carrying
/// the identifiers handed out by these calls.
pub trait RenderBackend {
    /// Create the surface for a figure if it does not exist yet
    fn open_surface(&mut self, surface: u32, title: &str) -> RenderResult<()>;

    /// Destroy a surface and everything on it
    fn close_surface(&mut self, surface: u32) -> RenderResult<()>;

    /// Remove every axes of a surface except those owned by widgets
    fn clear_axes(&mut self, surface: u32) -> RenderResult<()>;

    /// Create axes for one sub-plot position
    fn add_axes(&mut self, surface: u32, spec: &AxesSpec) -> RenderResult<AxesId>;

    /// Draw a primitive with the given style
    fn draw(&mut self, axes: AxesId, primitive: &Primitive, style: &Style) -> RenderResult<HandleId>;

    fn set_visible(&mut self, handle: HandleId, visible: bool) -> RenderResult<()>;

    /// Replace the geometry of a line primitive
    fn set_data(&mut self, handle: HandleId, coords: &Coords) -> RenderResult<()>;

    /// Replace the text, and optionally the position, of a text primitive
    fn set_text(&mut self, handle: HandleId, text: &str, position: Option<Point2>) -> RenderResult<()>;

    /// Remove one primitive
    fn remove(&mut self, handle: HandleId) -> RenderResult<()>;

    /// Remove line and marker primitives from an axes, keeping labels
    fn clear_lines(&mut self, axes: AxesId) -> RenderResult<()>;

    /// Apply view limits
    fn set_limits(&mut self, axes: AxesId, scale: &AxisScale) -> RenderResult<()>;

    fn add_slider(&mut self, surface: u32, spec: &SliderSpec) -> RenderResult<WidgetId>;

    fn set_slider_value(&mut self, widget: WidgetId, value: f64) -> RenderResult<()>;

    fn add_button(&mut self, surface: u32, label: &str) -> RenderResult<WidgetId>;

    /// Flush pending changes to the screen
    fn redraw(&mut self, surface: u32) -> RenderResult<()>;

    /// Export a surface as an image
    fn save_image(&mut self, surface: u32, path: &Path, format: &str) -> RenderResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_from_coords_dims() {
        let planar = Coords::new(vec![0.0, 1.0], vec![2.0, 3.0]).unwrap();
        assert!(matches!(Primitive::from_coords(&planar), Primitive::Line { .. }));

        let spatial = Coords::new_3d(vec![0.0], vec![1.0], vec![2.0]).unwrap();
        assert!(matches!(Primitive::from_coords(&spatial), Primitive::Line3D { .. }));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(AxesId(4).to_string(), "axes#4");
        assert_eq!(HandleId(1).to_string(), "handle#1");
        assert_eq!(WidgetId(9).to_string(), "widget#9");
    }
}

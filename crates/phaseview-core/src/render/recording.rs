//! In-memory render backend
//!
//! Records every surface, axes, primitive and widget it is asked to create,
//! so scenes can be rendered and inspected without a display. Saving an
//! image writes a JSON description of the surface.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use phaseview_geom::Point2;
use serde::Serialize;

use super::{AxesId, AxesSpec, HandleId, Primitive, RenderBackend, SliderSpec, WidgetId};
use crate::error::{RenderError, RenderResult};
use crate::scene::Coords;
use crate::style::Style;
use crate::types::AxisScale;

/// A recorded axes object
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedAxes {
    pub id: AxesId,
    pub surface: u32,
    pub spec: AxesSpec,
    pub limits: AxisScale,
    /// Primitives drawn into this axes, in drawing order
    pub primitives: Vec<HandleId>,
}

/// A recorded primitive
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedPrimitive {
    pub id: HandleId,
    pub axes: AxesId,
    pub primitive: Primitive,
    pub style: Style,
    pub visible: bool,
    /// Number of in-place geometry or text updates
    pub updates: usize,
}

/// Widget flavor
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum WidgetKind {
    Slider { min: f64, max: f64, value: f64 },
    Button,
}

/// A recorded widget
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RecordedWidget {
    pub id: WidgetId,
    pub surface: u32,
    pub label: String,
    pub kind: WidgetKind,
}

#[derive(Clone, Debug, Default, Serialize)]
struct RecordedSurface {
    title: String,
    axes: Vec<AxesId>,
    widgets: Vec<WidgetId>,
    redraws: usize,
}

#[derive(Serialize)]
struct SurfaceSnapshot<'a> {
    surface: u32,
    title: &'a str,
    axes: Vec<AxesSnapshot<'a>>,
    widgets: Vec<&'a RecordedWidget>,
}

#[derive(Serialize)]
struct AxesSnapshot<'a> {
    axes: &'a RecordedAxes,
    primitives: Vec<&'a RecordedPrimitive>,
}

/// Render backend that keeps everything in memory
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_id: u64,
    surfaces: BTreeMap<u32, RecordedSurface>,
    axes: BTreeMap<AxesId, RecordedAxes>,
    primitives: BTreeMap<HandleId, RecordedPrimitive>,
    widgets: BTreeMap<WidgetId, RecordedWidget>,
    saved: Vec<PathBuf>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn surface_mut(&mut self, surface: u32) -> RenderResult<&mut RecordedSurface> {
        self.surfaces.get_mut(&surface).ok_or_else(|| RenderError::Backend {
            message: format!("no surface {}", surface),
        })
    }

    fn primitive_mut(&mut self, handle: HandleId) -> RenderResult<&mut RecordedPrimitive> {
        self.primitives.get_mut(&handle).ok_or_else(|| RenderError::Backend {
            message: format!("unknown {}", handle),
        })
    }

    fn drop_axes(&mut self, axes: AxesId) {
        if let Some(recorded) = self.axes.remove(&axes) {
            for handle in recorded.primitives {
                self.primitives.remove(&handle);
            }
        }
    }

    // ===== Inspection =====

    /// Open surface ids
    pub fn surfaces(&self) -> Vec<u32> {
        self.surfaces.keys().copied().collect()
    }

    pub fn surface_title(&self, surface: u32) -> Option<&str> {
        self.surfaces.get(&surface).map(|s| s.title.as_str())
    }

    /// Axes of a surface in creation order
    pub fn axes_of(&self, surface: u32) -> Vec<&RecordedAxes> {
        self.surfaces
            .get(&surface)
            .map(|s| s.axes.iter().filter_map(|id| self.axes.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn axes(&self, id: AxesId) -> Option<&RecordedAxes> {
        self.axes.get(&id)
    }

    pub fn primitive(&self, handle: HandleId) -> Option<&RecordedPrimitive> {
        self.primitives.get(&handle)
    }

    /// Live primitives of an axes in drawing order
    pub fn primitives_in(&self, axes: AxesId) -> Vec<&RecordedPrimitive> {
        self.axes
            .get(&axes)
            .map(|a| a.primitives.iter().filter_map(|h| self.primitives.get(h)).collect())
            .unwrap_or_default()
    }

    /// Number of live primitives across all surfaces
    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn widgets(&self) -> impl Iterator<Item = &RecordedWidget> {
        self.widgets.values()
    }

    pub fn widget(&self, id: WidgetId) -> Option<&RecordedWidget> {
        self.widgets.get(&id)
    }

    /// Widget by its label
    pub fn widget_by_label(&self, label: &str) -> Option<WidgetId> {
        self.widgets
            .values()
            .find(|w| w.label == label)
            .map(|w| w.id)
    }

    /// Paths written by `save_image`, in order
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }

    pub fn redraw_count(&self, surface: u32) -> usize {
        self.surfaces.get(&surface).map(|s| s.redraws).unwrap_or(0)
    }
}

impl RenderBackend for RecordingBackend {
    fn open_surface(&mut self, surface: u32, title: &str) -> RenderResult<()> {
        let entry = self.surfaces.entry(surface).or_default();
        entry.title = title.to_string();
        Ok(())
    }

    fn close_surface(&mut self, surface: u32) -> RenderResult<()> {
        if let Some(recorded) = self.surfaces.remove(&surface) {
            for axes in recorded.axes {
                self.drop_axes(axes);
            }
            for widget in recorded.widgets {
                self.widgets.remove(&widget);
            }
        }
        Ok(())
    }

    fn clear_axes(&mut self, surface: u32) -> RenderResult<()> {
        let axes = std::mem::take(&mut self.surface_mut(surface)?.axes);
        for id in axes {
            self.drop_axes(id);
        }
        Ok(())
    }

    fn add_axes(&mut self, surface: u32, spec: &AxesSpec) -> RenderResult<AxesId> {
        let id = AxesId(self.next_id());
        self.surface_mut(surface)?.axes.push(id);
        self.axes.insert(
            id,
            RecordedAxes {
                id,
                surface,
                spec: spec.clone(),
                limits: AxisScale::default(),
                primitives: Vec::new(),
            },
        );
        Ok(id)
    }

    fn draw(&mut self, axes: AxesId, primitive: &Primitive, style: &Style) -> RenderResult<HandleId> {
        let id = HandleId(self.next_id());
        let recorded = self.axes.get_mut(&axes).ok_or_else(|| RenderError::Backend {
            message: format!("unknown {}", axes),
        })?;
        recorded.primitives.push(id);
        self.primitives.insert(
            id,
            RecordedPrimitive {
                id,
                axes,
                primitive: primitive.clone(),
                style: style.clone(),
                visible: true,
                updates: 0,
            },
        );
        Ok(id)
    }

    fn set_visible(&mut self, handle: HandleId, visible: bool) -> RenderResult<()> {
        self.primitive_mut(handle)?.visible = visible;
        Ok(())
    }

    fn set_data(&mut self, handle: HandleId, coords: &Coords) -> RenderResult<()> {
        let recorded = self.primitive_mut(handle)?;
        match &mut recorded.primitive {
            Primitive::Line { x, y } => {
                *x = coords.x().to_vec();
                *y = coords.y().to_vec();
            }
            Primitive::Line3D { x, y, z } => {
                *x = coords.x().to_vec();
                *y = coords.y().to_vec();
                if let Some(new_z) = coords.z() {
                    *z = new_z.to_vec();
                }
            }
            Primitive::VerticalMarker { x } => {
                if let Some(&new_x) = coords.x().first() {
                    *x = new_x;
                }
            }
            Primitive::Circle { center, .. } => {
                if let Some(p) = coords.points().next() {
                    *center = p;
                }
            }
            other => {
                return Err(RenderError::Backend {
                    message: format!("cannot set data on {:?}", other),
                })
            }
        }
        recorded.updates += 1;
        Ok(())
    }

    fn set_text(&mut self, handle: HandleId, text: &str, position: Option<Point2>) -> RenderResult<()> {
        let recorded = self.primitive_mut(handle)?;
        match &mut recorded.primitive {
            Primitive::Text {
                text: current,
                position: pos,
                ..
            } => {
                *current = text.to_string();
                if let Some(p) = position {
                    *pos = p;
                }
            }
            other => {
                return Err(RenderError::Backend {
                    message: format!("cannot set text on {:?}", other),
                })
            }
        }
        recorded.updates += 1;
        Ok(())
    }

    fn remove(&mut self, handle: HandleId) -> RenderResult<()> {
        if let Some(recorded) = self.primitives.remove(&handle) {
            if let Some(axes) = self.axes.get_mut(&recorded.axes) {
                axes.primitives.retain(|h| *h != handle);
            }
        }
        Ok(())
    }

    fn clear_lines(&mut self, axes: AxesId) -> RenderResult<()> {
        let recorded = self.axes.get_mut(&axes).ok_or_else(|| RenderError::Backend {
            message: format!("unknown {}", axes),
        })?;
        let primitives = &mut self.primitives;
        recorded.primitives.retain(|h| {
            let is_line = matches!(
                primitives.get(h).map(|p| &p.primitive),
                Some(Primitive::Line { .. } | Primitive::Line3D { .. })
            );
            if is_line {
                primitives.remove(h);
            }
            !is_line
        });
        Ok(())
    }

    fn set_limits(&mut self, axes: AxesId, scale: &AxisScale) -> RenderResult<()> {
        let recorded = self.axes.get_mut(&axes).ok_or_else(|| RenderError::Backend {
            message: format!("unknown {}", axes),
        })?;
        if scale.x.is_some() {
            recorded.limits.x = scale.x;
        }
        if scale.y.is_some() {
            recorded.limits.y = scale.y;
        }
        Ok(())
    }

    fn add_slider(&mut self, surface: u32, spec: &SliderSpec) -> RenderResult<WidgetId> {
        let id = WidgetId(self.next_id());
        self.surface_mut(surface)?.widgets.push(id);
        self.widgets.insert(
            id,
            RecordedWidget {
                id,
                surface,
                label: spec.label.clone(),
                kind: WidgetKind::Slider {
                    min: spec.min,
                    max: spec.max,
                    value: spec.initial,
                },
            },
        );
        Ok(id)
    }

    fn set_slider_value(&mut self, widget: WidgetId, value: f64) -> RenderResult<()> {
        match self.widgets.get_mut(&widget).map(|w| &mut w.kind) {
            Some(WidgetKind::Slider { value: current, .. }) => {
                *current = value;
                Ok(())
            }
            _ => Err(RenderError::Backend {
                message: format!("{} is not a slider", widget),
            }),
        }
    }

    fn add_button(&mut self, surface: u32, label: &str) -> RenderResult<WidgetId> {
        let id = WidgetId(self.next_id());
        self.surface_mut(surface)?.widgets.push(id);
        self.widgets.insert(
            id,
            RecordedWidget {
                id,
                surface,
                label: label.to_string(),
                kind: WidgetKind::Button,
            },
        );
        Ok(id)
    }

    fn redraw(&mut self, surface: u32) -> RenderResult<()> {
        self.surface_mut(surface)?.redraws += 1;
        Ok(())
    }

    fn save_image(&mut self, surface: u32, path: &Path, _format: &str) -> RenderResult<()> {
        let recorded = self.surfaces.get(&surface).ok_or_else(|| RenderError::Backend {
            message: format!("no surface {}", surface),
        })?;
        let snapshot = SurfaceSnapshot {
            surface,
            title: &recorded.title,
            axes: recorded
                .axes
                .iter()
                .filter_map(|id| self.axes.get(id))
                .map(|axes| AxesSnapshot {
                    axes,
                    primitives: axes
                        .primitives
                        .iter()
                        .filter_map(|h| self.primitives.get(h))
                        .collect(),
                })
                .collect(),
            widgets: recorded
                .widgets
                .iter()
                .filter_map(|id| self.widgets.get(id))
                .collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot).map_err(|e| RenderError::Backend {
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| RenderError::Backend {
            message: format!("{}: {}", path.display(), e),
        })?;
        self.saved.push(path.to_path_buf());
        Ok(())
    }
}

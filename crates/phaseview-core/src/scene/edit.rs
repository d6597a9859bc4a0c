//! Data-entry edits on the scene model

use phaseview_geom::Point2;
use tracing::debug;

use super::data::{Coords, DataEntry, DataSpec, EntryPayload, SegmentCollection};
use super::layer::{Layer, LayerKind};
use super::SceneModel;
use crate::error::{EntityKind, SceneError, SceneResult};
use crate::render::HandleId;
use crate::style::Style;
use crate::types::PositionCode;

/// Check that a payload may live in a layer of the given kind
fn check_kind(layer: &Layer, payload: &EntryPayload) -> SceneResult<()> {
    let expected = match (&layer.kind, payload) {
        (LayerKind::Text, EntryPayload::Text { .. }) => return Ok(()),
        (LayerKind::Patch, EntryPayload::Patch { .. }) => return Ok(()),
        (LayerKind::Text, _) => "text",
        (LayerKind::Patch, _) => "patch",
        (_, EntryPayload::Text { .. }) => "text",
        (_, EntryPayload::Patch { .. }) => "patch",
        _ => return Ok(()),
    };
    let actual = match (&layer.kind, payload) {
        (LayerKind::Text | LayerKind::Patch, p) => p.kind_name().to_string(),
        (kind, _) => kind.to_string(),
    };
    Err(SceneError::IncompatibleLayerKind {
        layer: layer.name.clone(),
        expected: expected.to_string(),
        actual,
    })
}

impl SceneModel {
    fn resolve_layer_name(&self, figure: &str, layer: Option<&str>) -> SceneResult<String> {
        match layer {
            Some(name) => Ok(name.to_string()),
            None => match &self.active_layer {
                Some((f, l)) if f == figure => Ok(l.clone()),
                _ => Err(SceneError::InvalidArgument(format!(
                    "no layer given and no active layer in figure '{}'",
                    figure
                ))),
            },
        }
    }

    /// Add a data entry to a layer (the active layer if `layer` is `None`)
    ///
    /// Returns the entry name, generated as `<figure>_<layer>_<n>` when the
    /// spec carries none. An existing entry of the same name is only
    /// replaced when `spec.force` is set; its render handles are retired so
    /// the next render draws the new data and style from scratch.
    pub fn add_data(&mut self, figure: Option<&str>, layer: Option<&str>, spec: DataSpec) -> SceneResult<String> {
        let fig_name = self.resolve_figure(figure)?;
        let layer_name = self.resolve_layer_name(&fig_name, layer)?;

        let Self {
            figures,
            names,
            retired_handles,
            ..
        } = self;
        let fig = figures
            .iter_mut()
            .find(|f| f.name == fig_name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, &fig_name))?;
        if let Some(position) = spec.subplot {
            if fig.subplot(position).is_none() {
                return Err(SceneError::unknown(EntityKind::Subplot, position.to_string()));
            }
        }
        let lay = fig
            .layer_mut(&layer_name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Layer, &layer_name))?;
        check_kind(lay, &spec.payload)?;

        let name = match spec.name {
            Some(name) => {
                if lay.entry(&name).is_some() && !spec.force {
                    return Err(SceneError::duplicate(EntityKind::Entry, name));
                }
                name
            }
            None => {
                let base = format!("{}_{}", fig_name, layer_name);
                names.next_free(&base, |n| lay.entry(n).is_some())
            }
        };

        let style = spec.style.unwrap_or_else(|| lay.style.clone());
        let mut entry = DataEntry::new(name.clone(), spec.payload, style);
        entry.display = spec.display;
        entry.subplot = spec.subplot;

        match lay.entries.iter().position(|e| e.name == name) {
            Some(index) => {
                lay.entries[index] = entry;
                if let Some(handles) = lay.handles.remove(&name) {
                    retired_handles.extend(handles);
                }
                debug!(figure = %fig_name, layer = %layer_name, entry = %name, "replaced data");
            }
            None => {
                lay.entries.push(entry);
                debug!(figure = %fig_name, layer = %layer_name, entry = %name, "added data");
            }
        }
        lay.refresh_curve(&name);
        Ok(name)
    }

    /// Append one planar point to an existing point entry
    pub fn append_data(&mut self, figure: Option<&str>, layer: &str, name: &str, point: Point2) -> SceneResult<()> {
        let lay = self.layer_mut(figure, layer)?;
        let entry = lay
            .entry_mut(name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Entry, name))?;
        match &mut entry.payload {
            EntryPayload::Points(coords) => coords.push(point)?,
            other => {
                return Err(SceneError::IncompatibleLayerKind {
                    layer: layer.to_string(),
                    expected: "points".to_string(),
                    actual: other.kind_name().to_string(),
                })
            }
        }
        entry.dirty = true;
        lay.refresh_curve(name);
        Ok(())
    }

    /// Replace the coordinates of a point entry
    pub fn set_data(&mut self, figure: Option<&str>, layer: &str, name: &str, coords: Coords) -> SceneResult<()> {
        let lay = self.layer_mut(figure, layer)?;
        let entry = lay
            .entry_mut(name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Entry, name))?;
        match &mut entry.payload {
            EntryPayload::Points(existing) => *existing = coords,
            EntryPayload::Patch { centers, .. } => *centers = coords,
            other => {
                return Err(SceneError::IncompatibleLayerKind {
                    layer: layer.to_string(),
                    expected: "points".to_string(),
                    actual: other.kind_name().to_string(),
                })
            }
        }
        entry.dirty = true;
        lay.refresh_curve(name);
        Ok(())
    }

    /// Move a point entry to a single new position
    pub fn set_point(&mut self, figure: Option<&str>, layer: &str, name: &str, point: Point2) -> SceneResult<()> {
        self.set_data(figure, layer, name, Coords::point(point))
    }

    /// Change the text, and optionally the position, of a text entry
    pub fn set_text(
        &mut self,
        figure: Option<&str>,
        layer: &str,
        name: &str,
        text: &str,
        position: Option<Point2>,
    ) -> SceneResult<()> {
        let lay = self.layer_mut(figure, layer)?;
        let entry = lay
            .entry_mut(name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Entry, name))?;
        match &mut entry.payload {
            EntryPayload::Text {
                position: pos,
                text: current,
                ..
            } => {
                *current = text.to_string();
                if let Some(p) = position {
                    *pos = p;
                }
            }
            other => {
                return Err(SceneError::IncompatibleLayerKind {
                    layer: layer.to_string(),
                    expected: "text".to_string(),
                    actual: other.kind_name().to_string(),
                })
            }
        }
        entry.dirty = true;
        Ok(())
    }

    /// Remove a data entry; its render handles are retired
    pub fn remove_data(&mut self, figure: Option<&str>, layer: &str, name: &str) -> SceneResult<DataEntry> {
        let lay = self.layer_mut(figure, layer)?;
        let index = lay
            .entries
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Entry, name))?;
        let entry = lay.entries.remove(index);
        let handles: Vec<HandleId> = lay.handles.remove(name).unwrap_or_default();
        lay.curves.remove(name);
        self.retired_handles.extend(handles);
        debug!(layer, entry = name, "removed data");
        Ok(entry)
    }

    // ===== Convenience constructors =====

    /// Add a single point
    pub fn add_point(
        &mut self,
        figure: Option<&str>,
        layer: Option<&str>,
        point: Point2,
        style: Option<Style>,
        name: Option<&str>,
    ) -> SceneResult<String> {
        let mut spec = DataSpec::points(Coords::point(point));
        spec.style = style;
        spec.name = name.map(str::to_string);
        self.add_data(figure, layer, spec)
    }

    /// Add a straight line through two points
    pub fn add_line_by_points(
        &mut self,
        figure: Option<&str>,
        layer: Option<&str>,
        points: (Point2, Point2),
        style: Option<Style>,
        name: Option<&str>,
    ) -> SceneResult<String> {
        let mut spec = DataSpec::points(Coords::segment(points.0, points.1));
        spec.style = style;
        spec.name = name.map(str::to_string);
        self.add_data(figure, layer, spec)
    }

    /// Add a vertical line at `x` spanning the layer's y-scale, or the
    /// figure's y-domain if the layer has none
    pub fn add_vline(
        &mut self,
        figure: Option<&str>,
        layer: &str,
        x: f64,
        style: Option<Style>,
        name: Option<&str>,
        subplot: Option<PositionCode>,
    ) -> SceneResult<String> {
        let fig = self.get_figure(figure)?;
        let lay = fig
            .layer(layer)
            .ok_or_else(|| SceneError::unknown(EntityKind::Layer, layer))?;
        let ydom = lay.scale.and_then(|s| s.y).unwrap_or(fig.domain.y);
        let mut spec = DataSpec::points(Coords::new(vec![x, x], ydom.to_vec())?)
            .name(name.unwrap_or("vline"))
            .force(true);
        spec.style = style;
        spec.subplot = subplot;
        let fig_name = fig.name.clone();
        self.add_data(Some(&fig_name), Some(layer), spec)
    }

    /// Add a horizontal line at `y` spanning the layer's x-scale, or the
    /// figure's x-domain if the layer has none
    pub fn add_hline(
        &mut self,
        figure: Option<&str>,
        layer: &str,
        y: f64,
        style: Option<Style>,
        name: Option<&str>,
    ) -> SceneResult<String> {
        let fig = self.get_figure(figure)?;
        let lay = fig
            .layer(layer)
            .ok_or_else(|| SceneError::unknown(EntityKind::Layer, layer))?;
        let xdom = lay.scale.and_then(|s| s.x).unwrap_or(fig.domain.x);
        let mut spec = DataSpec::points(Coords::new(xdom.to_vec(), vec![y, y])?)
            .name(name.unwrap_or("hline"))
            .force(true);
        spec.style = style;
        let fig_name = fig.name.clone();
        self.add_data(Some(&fig_name), Some(layer), spec)
    }

    /// Add a text label to a text layer
    pub fn add_text(
        &mut self,
        figure: Option<&str>,
        layer: Option<&str>,
        position: Point2,
        text: &str,
        axis_coords: bool,
    ) -> TextBuilder<'_> {
        TextBuilder {
            scene: self,
            figure: figure.map(str::to_string),
            layer: layer.map(str::to_string),
            spec: DataSpec::new(EntryPayload::Text {
                position,
                text: text.to_string(),
                axis_coords,
            }),
        }
    }

    /// Add one circle per point to a patch layer
    pub fn add_patch(
        &mut self,
        figure: Option<&str>,
        layer: Option<&str>,
        centers: Coords,
        radii: Vec<f64>,
        colors: Vec<String>,
        name: Option<&str>,
    ) -> SceneResult<String> {
        if centers.dims() != 2 {
            return Err(SceneError::shape("patch centers must be planar"));
        }
        if radii.len() != centers.len() {
            return Err(SceneError::shape(format!(
                "{} radii given for {} patches",
                radii.len(),
                centers.len()
            )));
        }
        if !colors.is_empty() && colors.len() != 1 && colors.len() != centers.len() {
            return Err(SceneError::shape(format!(
                "{} colors given for {} patches",
                colors.len(),
                centers.len()
            )));
        }
        let mut spec = DataSpec::new(EntryPayload::Patch {
            centers,
            radii,
            colors,
        })
        .force(true);
        spec.name = name.map(str::to_string);
        self.add_data(figure, layer, spec)
    }

    /// Add a pre-built segment collection
    pub fn add_collection(
        &mut self,
        figure: Option<&str>,
        layer: Option<&str>,
        collection: SegmentCollection,
        name: Option<&str>,
    ) -> SceneResult<String> {
        let mut spec = DataSpec::new(EntryPayload::Segments(collection)).force(true);
        spec.name = name.map(str::to_string);
        self.add_data(figure, layer, spec)
    }
}

/// Pending text entry; finish with [`TextBuilder::add`]
pub struct TextBuilder<'a> {
    scene: &'a mut SceneModel,
    figure: Option<String>,
    layer: Option<String>,
    spec: DataSpec,
}

impl TextBuilder<'_> {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.spec = self.spec.name(name);
        self
    }

    pub fn style(mut self, style: impl Into<Style>) -> Self {
        self.spec = self.spec.style(style);
        self
    }

    pub fn subplot(mut self, position: PositionCode) -> Self {
        self.spec = self.spec.subplot(position);
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.spec = self.spec.display(display);
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.spec = self.spec.force(force);
        self
    }

    pub fn add(self) -> SceneResult<String> {
        self.scene
            .add_data(self.figure.as_deref(), self.layer.as_deref(), self.spec)
    }
}

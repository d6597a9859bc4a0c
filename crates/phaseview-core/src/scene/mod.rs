//! Scene model: the figure → sub-plot → layer → data-entry registry
//!
//! All operations are pure registry edits. They fail fast with a
//! [`SceneError`] and know nothing about rendering; render handles recorded
//! on layers and sub-plots are back-references maintained by the render
//! synchronization layer.

mod curve;
mod data;
mod edit;
mod figure;
mod layer;

pub use curve::Curve;
pub use data::{Coords, DataEntry, DataSpec, EntryPayload, SegmentCollection};
pub(crate) use figure::first_listing;
pub use figure::{Figure, FigureSpec, FigureUpdate, LayerSelection, Subplot, SubplotSpec};
pub use layer::{Layer, LayerKind, LayerSpec, LayerUpdate};

use phaseview_geom::Domain;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PaletteConfig;
use crate::error::{EntityKind, SceneError, SceneResult};
use crate::naming::NameGenerator;
use crate::render::HandleId;
use crate::style::Style;
use crate::types::{GridShape, PositionCode};

/// What a display toggle applies to
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayTarget {
    /// The whole figure
    Figure,
    /// A whole layer
    Layer(String),
    /// Individual entries of one layer
    Entries { layer: String, names: Vec<String> },
}

impl DisplayTarget {
    pub fn layer(name: impl Into<String>) -> Self {
        DisplayTarget::Layer(name.into())
    }

    pub fn entries<S: Into<String>>(layer: impl Into<String>, names: impl IntoIterator<Item = S>) -> Self {
        DisplayTarget::Entries {
            layer: layer.into(),
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

/// One visible data layer as listed by [`SceneModel::legends`]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub subplot: PositionCode,
    pub layer: String,
    pub style: Style,
    pub axes_vars: Vec<String>,
    /// Visible entries with their styles
    pub entries: Vec<(String, Style)>,
}

/// Registry of figures, layers and data
#[derive(Debug, Default)]
pub struct SceneModel {
    figures: Vec<Figure>,
    current: Option<String>,
    active_layer: Option<(String, String)>,
    max_fignum: u32,
    names: NameGenerator,
    palette: PaletteConfig,
    /// Handles whose entries were replaced or removed, awaiting teardown
    pub(crate) retired_handles: Vec<HandleId>,
    /// Surfaces of removed figures, awaiting teardown
    pub(crate) retired_surfaces: Vec<u32>,
}

impl SceneModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene using a custom default-style palette
    pub fn with_palette(palette: PaletteConfig) -> Self {
        Self {
            palette,
            ..Self::default()
        }
    }

    // ===== Lookups =====

    /// Figures in creation order
    pub fn figures(&self) -> &[Figure] {
        &self.figures
    }

    pub fn figure(&self, name: &str) -> Option<&Figure> {
        self.figures.iter().find(|f| f.name == name)
    }

    pub(crate) fn figure_mut(&mut self, name: &str) -> Option<&mut Figure> {
        self.figures.iter_mut().find(|f| f.name == name)
    }

    /// Name of the current figure
    pub fn current_figure(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Active `(figure, layer)` pair used when no layer is named
    pub fn active_layer(&self) -> Option<(&str, &str)> {
        self.active_layer
            .as_ref()
            .map(|(f, l)| (f.as_str(), l.as_str()))
    }

    /// Resolve an optional figure reference to a registered figure name,
    /// falling back to the current figure
    pub fn resolve_figure(&self, figure: Option<&str>) -> SceneResult<String> {
        let name = match figure {
            Some(name) => name,
            None => self.current.as_deref().ok_or_else(|| {
                SceneError::InvalidArgument("no figure given and no current figure set".to_string())
            })?,
        };
        if self.figure(name).is_none() {
            return Err(SceneError::unknown(EntityKind::Figure, name));
        }
        Ok(name.to_string())
    }

    /// Figure by optional reference
    pub fn get_figure(&self, figure: Option<&str>) -> SceneResult<&Figure> {
        let name = self.resolve_figure(figure)?;
        self.figure(&name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, name))
    }

    pub(crate) fn get_figure_mut(&mut self, figure: Option<&str>) -> SceneResult<&mut Figure> {
        let name = self.resolve_figure(figure)?;
        self.figure_mut(&name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, name))
    }

    /// Layer by figure reference and name
    pub fn layer(&self, figure: Option<&str>, layer: &str) -> SceneResult<&Layer> {
        let fig = self.get_figure(figure)?;
        fig.layer(layer)
            .ok_or_else(|| SceneError::unknown(EntityKind::Layer, layer))
    }

    pub(crate) fn layer_mut(&mut self, figure: Option<&str>, layer: &str) -> SceneResult<&mut Layer> {
        let fig = self.get_figure_mut(figure)?;
        fig.layer_mut(layer)
            .ok_or_else(|| SceneError::unknown(EntityKind::Layer, layer))
    }

    /// Data entry by figure reference, layer and name
    pub fn entry(&self, figure: Option<&str>, layer: &str, name: &str) -> SceneResult<&DataEntry> {
        self.layer(figure, layer)?
            .entry(name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Entry, name))
    }

    // ===== Figures =====

    /// Register a new figure and make it current; returns its surface id
    pub fn add_figure(&mut self, spec: FigureSpec) -> SceneResult<u32> {
        let domain = spec.domain.ok_or_else(|| {
            SceneError::InvalidArgument(format!("figure '{}' needs a domain", spec.name))
        })?;
        if self.figure(&spec.name).is_some() {
            return Err(SceneError::duplicate(EntityKind::Figure, &spec.name));
        }
        self.max_fignum += 1;
        let fignum = self.max_fignum;
        let name = spec.name.clone();
        self.figures.push(Figure::from_spec(spec, domain, fignum));
        self.current = Some(name.clone());
        debug!(figure = %name, fignum, "added figure");
        Ok(fignum)
    }

    /// Duplicate a figure's properties and layer definitions (not data or
    /// arrangement) under a new name, and make it current
    pub fn copy_figure(&mut self, new: &str, old: &str) -> SceneResult<u32> {
        if self.figure(new).is_some() {
            return Err(SceneError::duplicate(EntityKind::Figure, new));
        }
        let source = self
            .figure(old)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, old))?;
        let spec = FigureSpec {
            name: new.to_string(),
            domain: Some(source.domain),
            title: source.title.clone(),
            xlabel: source.xlabel.clone(),
            ylabel: source.ylabel.clone(),
            tdom: source.tdom,
            display: source.display,
        };
        let layer_specs: Vec<LayerSpec> = source
            .layers
            .iter()
            .map(|l| LayerSpec {
                name: l.name.clone(),
                kind: l.kind.clone(),
                display: l.display,
                zindex: Some(l.zindex),
                style: Some(l.style.clone()),
                scale: l.scale,
                dynamic: l.dynamic,
                axes_vars: l.axes_vars.clone(),
                activate: false,
            })
            .collect();

        let fignum = self.add_figure(spec)?;
        for layer in layer_specs {
            self.add_layer(Some(new), layer)?;
        }
        debug!(figure = new, source = old, "copied figure");
        Ok(fignum)
    }

    /// Make a figure current
    pub fn set_current_figure(&mut self, name: &str) -> SceneResult<()> {
        if self.figure(name).is_none() {
            return Err(SceneError::unknown(EntityKind::Figure, name));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Set figure properties; the figure also becomes current
    pub fn update_figure(&mut self, figure: Option<&str>, update: FigureUpdate) -> SceneResult<()> {
        let name = self.resolve_figure(figure)?;
        let fig = self.get_figure_mut(Some(&name))?;
        update.apply(fig);
        self.current = Some(name);
        Ok(())
    }

    /// Empty every layer of a figure; unknown figures are ignored
    pub fn clear_figure_data(&mut self, name: &str) {
        let Some(fig) = self.figures.iter_mut().find(|f| f.name == name) else {
            return;
        };
        for layer in &mut fig.layers {
            self.retired_handles
                .extend(layer.handles.drain().flat_map(|(_, h)| h));
            layer.clear_data();
        }
        if self.active_layer.as_ref().map(|(f, _)| f.as_str()) == Some(name) {
            self.active_layer = None;
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        debug!(figure = name, "cleared figure data");
    }

    /// Remove a figure and everything in it
    pub fn remove_figure(&mut self, name: &str) -> SceneResult<Figure> {
        let index = self
            .figures
            .iter()
            .position(|f| f.name == name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, name))?;
        let figure = self.figures.remove(index);
        self.retired_surfaces.push(figure.fignum);
        if self.active_layer.as_ref().map(|(f, _)| f.as_str()) == Some(name) {
            self.active_layer = None;
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        debug!(figure = name, "removed figure");
        Ok(figure)
    }

    /// Discard every figure and reset name and surface counters
    pub fn clear(&mut self) {
        self.retired_surfaces
            .extend(self.figures.iter().map(|f| f.fignum));
        self.figures.clear();
        self.current = None;
        self.active_layer = None;
        self.max_fignum = 0;
        self.names.reset();
        debug!("cleared scene");
    }

    /// Replace a figure's sub-plot arrangement wholesale
    pub fn arrange_figure(
        &mut self,
        figure: Option<&str>,
        rows: u8,
        cols: u8,
        subplots: Vec<SubplotSpec>,
    ) -> SceneResult<()> {
        let shape = GridShape::new(rows, cols)?;
        let mut arrange: Vec<Subplot> = Vec::with_capacity(subplots.len());
        for spec in subplots {
            let subplot = spec.build(shape)?;
            if arrange.iter().any(|s| s.position == subplot.position) {
                return Err(SceneError::duplicate(
                    EntityKind::Subplot,
                    subplot.position.to_string(),
                ));
            }
            arrange.push(subplot);
        }

        let positions: Vec<PositionCode> = arrange.iter().map(|s| s.position).collect();
        let fig = self.get_figure_mut(figure)?;
        fig.shape = shape;
        fig.arrange = arrange;
        // existing axes no longer correspond to any sub-plot
        fig.needs_rebuild = true;
        for layer in &mut fig.layers {
            layer.handles.clear();
            for entry in &mut layer.entries {
                entry.subplot = entry.subplot.filter(|p| positions.contains(p));
            }
        }
        debug!(figure = %fig.name, rows, cols, subplots = fig.arrange.len(), "arranged figure");
        Ok(())
    }

    /// Toggle visibility of a figure, a layer, or entries of a layer
    pub fn toggle_display(&mut self, figure: Option<&str>, target: DisplayTarget) -> SceneResult<()> {
        let fig = self.get_figure_mut(figure)?;
        match target {
            DisplayTarget::Figure => fig.display = !fig.display,
            DisplayTarget::Layer(layer) => {
                let lay = fig
                    .layer_mut(&layer)
                    .ok_or_else(|| SceneError::unknown(EntityKind::Layer, &layer))?;
                lay.display = !lay.display;
            }
            DisplayTarget::Entries { layer, names } => {
                let lay = fig
                    .layer_mut(&layer)
                    .ok_or_else(|| SceneError::unknown(EntityKind::Layer, &layer))?;
                check_entries(lay, &names)?;
                for name in &names {
                    if let Some(entry) = lay.entry_mut(name) {
                        entry.display = !entry.display;
                    }
                }
            }
        }
        Ok(())
    }

    /// Set visibility of named entries in a layer
    pub fn set_display<S: AsRef<str>>(
        &mut self,
        figure: Option<&str>,
        layer: &str,
        names: &[S],
        display: bool,
    ) -> SceneResult<()> {
        let lay = self.layer_mut(figure, layer)?;
        let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
        check_entries(lay, &names)?;
        for name in &names {
            if let Some(entry) = lay.entry_mut(name) {
                entry.display = display;
            }
        }
        Ok(())
    }

    /// Set a figure's domain to the extent of all its planar point data,
    /// always including the origin
    pub fn auto_scale_domain(&mut self, figure: &str) -> SceneResult<Domain> {
        let fig = self
            .figure_mut(figure)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, figure))?;
        let mut domain = Domain::new([0.0, 0.0], [0.0, 0.0]);
        let extents = fig
            .layers
            .iter()
            .flat_map(|l| l.entries.iter())
            .filter_map(|e| e.payload.coords())
            .filter(|c| c.dims() == 2)
            .filter_map(|c| c.extent());
        for extent in extents {
            domain.expand_to_include(&phaseview_geom::Point2::new(extent.x[0], extent.y[0]));
            domain.expand_to_include(&phaseview_geom::Point2::new(extent.x[1], extent.y[1]));
        }
        fig.domain = domain;
        debug!(figure, x = ?domain.x, y = ?domain.y, "auto-scaled domain");
        Ok(domain)
    }

    /// Visible data layers and their visible entries, per sub-plot
    ///
    /// `subplot` filters by position code or sub-plot name.
    pub fn legends(&self, figure: Option<&str>, subplot: Option<&str>) -> SceneResult<Vec<LegendEntry>> {
        let fig = self.get_figure(figure)?;
        let mut out = Vec::new();
        for sp in &fig.arrange {
            if subplot.map_or(false, |key| !sp.matches(key)) {
                continue;
            }
            for layer_name in sp.layers.resolve(&fig.layers) {
                let Some(layer) = fig.layer(&layer_name) else {
                    continue;
                };
                if !layer.display || layer.kind != LayerKind::Data {
                    continue;
                }
                let entries: Vec<(String, Style)> = layer
                    .entries
                    .iter()
                    .filter(|e| e.display)
                    .map(|e| (e.name.clone(), e.style.clone()))
                    .collect();
                info!(
                    layer = %layer.name,
                    subplot = %sp.position,
                    style = %layer.style,
                    entries = entries.len(),
                    "legend"
                );
                out.push(LegendEntry {
                    subplot: sp.position,
                    layer: layer.name.clone(),
                    style: layer.style.clone(),
                    axes_vars: layer.axes_vars.clone(),
                    entries,
                });
            }
        }
        Ok(out)
    }

    // ===== Layers =====

    /// Add a layer; by default it becomes the active layer
    pub fn add_layer(&mut self, figure: Option<&str>, spec: LayerSpec) -> SceneResult<()> {
        let fig_name = self.resolve_figure(figure)?;
        let palette = &self.palette;
        let fig = self
            .figures
            .iter_mut()
            .find(|f| f.name == fig_name)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, &fig_name))?;
        if fig.has_layer(&spec.name) {
            return Err(SceneError::duplicate(EntityKind::Layer, &spec.name));
        }
        let count = fig.layers.len();
        let default_style = Style::from_palette(&palette.colors, &palette.line, count);
        let activate = spec.activate;
        let layer = Layer::from_spec(spec, count + 1, default_style);
        let layer_name = layer.name.clone();
        debug!(figure = %fig_name, layer = %layer_name, kind = %layer.kind, "added layer");
        fig.layers.push(layer);
        if activate {
            self.active_layer = Some((fig_name, layer_name));
        }
        Ok(())
    }

    /// Select the layer used when data is added without naming one
    pub fn set_active_layer(&mut self, figure: Option<&str>, layer: &str) -> SceneResult<()> {
        let fig_name = self.resolve_figure(figure)?;
        self.layer(Some(&fig_name), layer)?;
        self.active_layer = Some((fig_name, layer.to_string()));
        Ok(())
    }

    /// Set layer properties
    pub fn update_layer(&mut self, figure: Option<&str>, layer: &str, update: LayerUpdate) -> SceneResult<()> {
        let lay = self.layer_mut(figure, layer)?;
        update.apply(lay);
        Ok(())
    }

    /// Remove a layer and its data
    pub fn remove_layer(&mut self, figure: Option<&str>, layer: &str) -> SceneResult<Layer> {
        let fig_name = self.resolve_figure(figure)?;
        let fig = self.get_figure_mut(Some(&fig_name))?;
        let index = fig
            .layers
            .iter()
            .position(|l| l.name == layer)
            .ok_or_else(|| SceneError::unknown(EntityKind::Layer, layer))?;
        let mut removed = fig.layers.remove(index);
        self.retired_handles
            .extend(removed.handles.drain().flat_map(|(_, h)| h));
        if self.active_layer == Some((fig_name.clone(), layer.to_string())) {
            self.active_layer = None;
        }
        debug!(figure = %fig_name, layer, "removed layer");
        Ok(removed)
    }
}

fn check_entries(layer: &Layer, names: &[String]) -> SceneResult<()> {
    match names.iter().find(|n| layer.entry(n).is_none()) {
        Some(missing) => Err(SceneError::unknown(EntityKind::Entry, missing)),
        None => Ok(()),
    }
}

//! Reconciliation of the scene model with live render objects
//!
//! A pass walks a figure's sub-plots in grid order and, per layer and per
//! entry, either mutates an existing handle in place (cheap path) or draws
//! a fresh primitive. Rebuild passes tear the figure's axes down first.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::{AxesSpec, HandleId, Primitive, RenderBackend};
use crate::error::{EntityKind, RenderError, RenderResult, SceneError};
use crate::render::AxesId;
use crate::scene::{first_listing, DataEntry, EntryPayload, Layer, SceneModel, Subplot};
use crate::style::Style;
use crate::types::AxisScale;

/// Options of one synchronization pass
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SyncOptions {
    /// Tear down and re-create every axes and handle
    pub rebuild: bool,
    /// View limits overriding each layer's stored scale
    pub rescale: Option<AxisScale>,
}

impl SyncOptions {
    pub fn incremental() -> Self {
        Self::default()
    }

    pub fn rebuild() -> Self {
        Self {
            rebuild: true,
            rescale: None,
        }
    }
}

/// What a pass did
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub axes_created: usize,
    pub handles_created: usize,
    /// Handles whose geometry or text was pushed in place
    pub handles_updated: usize,
    /// Entries that could not be placed in any sub-plot
    pub skipped: usize,
}

/// Render synchronization state
///
/// Tracks which figures have a pass in progress, and which are running
/// dynamic-layer callbacks, so neither can be re-entered with a pass that
/// would tear down objects still in use.
#[derive(Debug, Default)]
pub struct RenderSync {
    in_pass: HashSet<String>,
    dispatching: HashSet<String>,
}

impl RenderSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pass or callback dispatch is running for the figure
    pub fn is_busy(&self, figure: &str) -> bool {
        self.in_pass.contains(figure) || self.dispatching.contains(figure)
    }

    /// Mark a figure as running dynamic-layer callbacks
    pub(crate) fn begin_dispatch(&mut self, figure: &str) -> RenderResult<()> {
        if self.in_pass.contains(figure) || !self.dispatching.insert(figure.to_string()) {
            return Err(RenderError::Reentrant {
                figure: figure.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn end_dispatch(&mut self, figure: &str) {
        self.dispatching.remove(figure);
    }

    /// Tear down handles and surfaces the scene has retired
    pub fn collect_retired<B: RenderBackend>(&mut self, scene: &mut SceneModel, backend: &mut B) -> RenderResult<()> {
        for handle in scene.retired_handles.drain(..) {
            backend.remove(handle)?;
        }
        for surface in scene.retired_surfaces.drain(..) {
            backend.close_surface(surface)?;
        }
        Ok(())
    }

    /// Reconcile one figure with the backend
    ///
    /// Fails with [`RenderError::Reentrant`] if a pass for the same figure is
    /// already running, or if a rebuild is requested while the figure's
    /// dynamic-layer callbacks are being dispatched.
    pub fn sync_figure<B: RenderBackend>(
        &mut self,
        scene: &mut SceneModel,
        backend: &mut B,
        figure: &str,
        options: SyncOptions,
    ) -> RenderResult<SyncReport> {
        let rebuild_while_dispatching = options.rebuild && self.dispatching.contains(figure);
        if rebuild_while_dispatching || !self.in_pass.insert(figure.to_string()) {
            return Err(RenderError::Reentrant {
                figure: figure.to_string(),
            });
        }
        let result = self.run_pass(scene, backend, figure, options);
        self.in_pass.remove(figure);
        result
    }

    fn run_pass<B: RenderBackend>(
        &mut self,
        scene: &mut SceneModel,
        backend: &mut B,
        figure: &str,
        options: SyncOptions,
    ) -> RenderResult<SyncReport> {
        self.collect_retired(scene, backend)?;
        let fig = scene
            .figure_mut(figure)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, figure))?;
        let rebuild = options.rebuild || fig.needs_rebuild;
        let fignum = fig.fignum;
        let mut report = SyncReport::default();

        backend.open_surface(fignum, &fig.title)?;
        if rebuild {
            backend.clear_axes(fignum)?;
            fig.forget_render_handles();
            fig.needs_rebuild = false;
            fig.generation += 1;
        }

        let shape = fig.shape;
        let mut order: Vec<usize> = (0..fig.arrange.len()).collect();
        order.sort_by_key(|&i| fig.arrange[i].position);

        for &i in &order {
            let subplot = &mut fig.arrange[i];
            let axes = match subplot.surface {
                Some(axes) => axes,
                None => {
                    let spec = AxesSpec {
                        shape,
                        position: subplot.position,
                        title: subplot.name.clone(),
                        labels: subplot.axes_vars.clone(),
                        projection: subplot.projection,
                    };
                    let axes = backend.add_axes(fignum, &spec)?;
                    subplot.surface = Some(axes);
                    report.axes_created += 1;
                    axes
                }
            };
            if let Some(scale) = subplot.scale {
                backend.set_limits(axes, &scale)?;
            }
        }

        if !fig.display {
            debug!(figure, "figure hidden; layers not drawn");
            backend.redraw(fignum)?;
            return Ok(report);
        }

        let arrange: &[Subplot] = &fig.arrange;
        let layers: &mut Vec<Layer> = &mut fig.layers;
        let mut done: HashSet<String> = HashSet::new();
        for &i in &order {
            let subplot = &arrange[i];
            let Some(axes) = subplot.surface else {
                continue;
            };
            for layer_name in subplot.layers.resolve(layers) {
                if !done.insert(layer_name.clone()) {
                    continue;
                }
                let Some(layer) = layers.iter_mut().find(|l| l.name == layer_name) else {
                    warn!(figure, subplot = %subplot.position, layer = %layer_name, "sub-plot lists an unknown layer");
                    continue;
                };
                build_layer(backend, figure, arrange, layer, axes, options.rescale, &mut report)?;
            }
        }
        for layer in layers.iter().filter(|l| !done.contains(&l.name) && !l.is_empty()) {
            warn!(figure, layer = %layer.name, "layer is not shown in any sub-plot");
            report.skipped += layer.len();
        }

        backend.redraw(fignum)?;
        debug!(
            figure,
            rebuild,
            axes = report.axes_created,
            created = report.handles_created,
            updated = report.handles_updated,
            "synchronized figure"
        );
        Ok(report)
    }

    /// Push an entry's current geometry or text into its live handle
    ///
    /// Returns `false` without touching the backend if the entry has not
    /// been drawn yet, or if its primitives cannot be updated in place (they
    /// are re-drawn on the next pass instead).
    pub fn push_entry<B: RenderBackend>(
        &mut self,
        scene: &mut SceneModel,
        backend: &mut B,
        figure: &str,
        layer: &str,
        entry: &str,
    ) -> RenderResult<bool> {
        let fig = scene
            .figure_mut(figure)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, figure))?;
        let lay = fig
            .layer_mut(layer)
            .ok_or_else(|| SceneError::unknown(EntityKind::Layer, layer))?;
        let Some(handles) = lay.handles.get(entry) else {
            return Ok(false);
        };
        let data = lay
            .entries
            .iter_mut()
            .find(|e| e.name == entry)
            .ok_or_else(|| SceneError::unknown(EntityKind::Entry, entry))?;
        if !updatable_in_place(&data.payload) {
            return Ok(false);
        }
        push_geometry(backend, handles, data)?;
        data.dirty = false;
        Ok(true)
    }
}

fn updatable_in_place(payload: &EntryPayload) -> bool {
    matches!(payload, EntryPayload::Points(_) | EntryPayload::Text { .. })
}

fn push_geometry<B: RenderBackend>(backend: &mut B, handles: &[HandleId], entry: &DataEntry) -> RenderResult<()> {
    let Some(&handle) = handles.first() else {
        return Ok(());
    };
    match &entry.payload {
        EntryPayload::Points(coords) => backend.set_data(handle, coords),
        EntryPayload::Text { position, text, .. } => backend.set_text(handle, text, Some(*position)),
        _ => Ok(()),
    }
}

fn draw_entry<B: RenderBackend>(
    backend: &mut B,
    axes: AxesId,
    entry: &DataEntry,
    style: &Style,
) -> RenderResult<Vec<HandleId>> {
    match &entry.payload {
        EntryPayload::Text {
            position,
            text,
            axis_coords,
        } => {
            let primitive = Primitive::Text {
                position: *position,
                text: text.clone(),
                axis_coords: *axis_coords,
            };
            Ok(vec![backend.draw(axes, &primitive, style)?])
        }
        EntryPayload::Patch {
            centers,
            radii,
            colors,
        } => {
            let mut handles = Vec::with_capacity(centers.len());
            for (i, (center, radius)) in centers.points().zip(radii).enumerate() {
                let color = match colors.len() {
                    0 => style.color(),
                    1 => colors.first().cloned(),
                    _ => colors.get(i).cloned(),
                };
                let primitive = Primitive::Circle {
                    center,
                    radius: *radius,
                    color,
                };
                handles.push(backend.draw(axes, &primitive, style)?);
            }
            Ok(handles)
        }
        EntryPayload::Segments(collection) => {
            let primitive = Primitive::Collection {
                segments: collection.segments.clone(),
                colors: collection.colors.clone(),
            };
            Ok(vec![backend.draw(axes, &primitive, style)?])
        }
        EntryPayload::Points(coords) => Ok(vec![backend.draw(axes, &Primitive::from_coords(coords), style)?]),
    }
}

fn build_layer<B: RenderBackend>(
    backend: &mut B,
    figure: &str,
    arrange: &[Subplot],
    layer: &mut Layer,
    current_axes: AxesId,
    rescale: Option<AxisScale>,
    report: &mut SyncReport,
) -> RenderResult<()> {
    if !layer.display {
        for handle in layer.handles.values().flatten() {
            backend.set_visible(*handle, false)?;
        }
        return Ok(());
    }

    let Layer {
        name,
        entries,
        handles,
        scale,
        ..
    } = layer;

    for entry in entries.iter_mut() {
        if let Some(existing) = handles.get(&entry.name) {
            for handle in existing {
                backend.set_visible(*handle, entry.display)?;
            }
            if !(entry.display && entry.dirty) {
                trace!(layer = %name, entry = %entry.name, "handle reused");
                continue;
            }
            if updatable_in_place(&entry.payload) {
                push_geometry(backend, existing, entry)?;
                entry.dirty = false;
                report.handles_updated += 1;
                trace!(layer = %name, entry = %entry.name, "geometry pushed in place");
                continue;
            }
            for handle in existing {
                backend.remove(*handle)?;
            }
            handles.remove(&entry.name);
        }
        if !entry.display {
            continue;
        }

        let Some(position) = entry.subplot.or_else(|| first_listing(arrange, name)) else {
            warn!(figure, layer = %name, entry = %entry.name, "no sub-plot lists this layer; entry skipped");
            report.skipped += 1;
            continue;
        };
        let axes = arrange
            .iter()
            .find(|s| s.position == position)
            .and_then(|s| s.surface)
            .ok_or_else(|| RenderError::NoSubplot {
                figure: figure.to_string(),
                position: position.to_string(),
            })?;

        let style = entry.style.effective();
        let drawn = draw_entry(backend, axes, entry, &style)?;
        trace!(layer = %name, entry = %entry.name, %axes, count = drawn.len(), "drew entry");
        report.handles_created += drawn.len();
        handles.insert(entry.name.clone(), drawn);
        entry.dirty = false;
    }

    if let Some(scale) = rescale.or(*scale) {
        backend.set_limits(current_axes, &scale)?;
    }
    Ok(())
}

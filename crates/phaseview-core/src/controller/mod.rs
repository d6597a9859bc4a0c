//! Interaction controller
//!
//! Receives key, pointer and widget events from the external dispatcher and
//! drives the mode state machine, time playback, dynamic-layer refresh and
//! the context registry. A failed gesture is logged and reported as an
//! [`Outcome`]; it never escapes [`Controller::handle_event`].

mod capture;
mod mode;

pub use capture::CapturedPoint;
pub use mode::{Mode, Trigger};

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use phaseview_geom::{nearest_within, NearestSample, Point2};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{InteractionConfig, ModeKeys, ViewerConfig};
use crate::context::{ContextObject, ContextRegistry, LineOfInterest, Selection};
use crate::error::{EntityKind, InteractionError, PhaseviewResult, RenderResult, SceneError};
use crate::input::{
    DragTracker, KeyEvent, Modifiers, PointerButton, PointerEvent, PointerPhase, UiEvent, WidgetEvent,
};
use crate::playback::TimePlayback;
use crate::plotter::Plotter;
use crate::provider::{DomainGrower, ProbeOutput, SampleProvider, SampleSet, UserFunction};
use crate::render::{AxesId, HandleId, Primitive, RenderBackend, SliderSpec, SyncOptions, WidgetId};
use crate::scene::{Figure, LayerKind, LayerUpdate, Subplot};
use crate::style::Style;
use crate::types::{PositionCode, Projection};

/// Per-time-step refresh of a dynamic layer: `(plotter, t, hard_reset)`
pub type DynamicCallback<B> = Box<dyn FnMut(&mut Plotter<B>, f64, bool) -> PhaseviewResult<()>>;

struct DynamicPlot<B> {
    figure: String,
    layer: String,
    callback: DynamicCallback<B>,
}

/// Sub-plot something was drawn in, as of one rebuild generation of its
/// figure
#[derive(Clone, Debug, PartialEq, Eq)]
struct Site {
    figure: String,
    position: PositionCode,
    generation: u64,
}

/// Primitive the controller drew itself (selection marker, domain boundary)
#[derive(Clone, Debug)]
struct Mark {
    site: Option<Site>,
    handle: HandleId,
}

/// Playback and GUI widgets created by [`Controller::build_gui`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GuiWidgets {
    pub time_bar: Option<WidgetId>,
    pub minus_dt: Option<WidgetId>,
    pub plus_dt: Option<WidgetId>,
    pub capture: Option<WidgetId>,
    pub refresh: Option<WidgetId>,
    pub back: Option<WidgetId>,
    pub save: Option<WidgetId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WidgetAction {
    TimeBar,
    MinusDt,
    PlusDt,
    Capture,
    Refresh,
    Back,
    Save,
}

impl GuiWidgets {
    fn action(&self, widget: WidgetId) -> Option<WidgetAction> {
        let table = [
            (self.time_bar, WidgetAction::TimeBar),
            (self.minus_dt, WidgetAction::MinusDt),
            (self.plus_dt, WidgetAction::PlusDt),
            (self.capture, WidgetAction::Capture),
            (self.refresh, WidgetAction::Refresh),
            (self.back, WidgetAction::Back),
            (self.save, WidgetAction::Save),
        ];
        table
            .into_iter()
            .find(|(id, _)| *id == Some(widget))
            .map(|(_, action)| action)
    }
}

/// Result of the last probe or snap
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum LastOutput {
    Probe { point: Point2, output: ProbeOutput },
    Snap(NearestSample),
}

/// What handling one event did
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ignored,
    Handled,
    ModeEntered(Mode),
    ModeRefused(InteractionError),
    ContextCreated(Uuid),
    Probed(ProbeOutput),
    Snapped(NearestSample),
    DomainGrown(Vec<Point2>),
    /// The gesture was abandoned and the controller is idle again
    Aborted(String),
    TimeChanged(f64),
    Clipboard(Point2),
    /// Number of figures captured
    Captured(usize),
    Saved(PathBuf),
    Failed(String),
}

/// Event-driven interaction controller over a plotter
pub struct Controller<B> {
    plotter: Plotter<B>,
    playback: TimePlayback,
    context: ContextRegistry,
    config: InteractionConfig,
    keys: ModeKeys,
    mode: Mode,
    modifiers: Modifiers,
    drag: DragTracker,

    line_anchor: Option<(AxesId, Point2)>,
    domain_seed: Option<(AxesId, Point2)>,
    selection_marker: Option<Mark>,
    domain_boundary: Option<Mark>,

    samples: Option<SampleSet>,
    user_func: Option<UserFunction>,
    domain_grower: Option<Box<dyn DomainGrower>>,
    dynamic: Vec<DynamicPlot<B>>,
    dynamic_axes: HashSet<AxesId>,
    /// `(figure, layer)` pairs shown in time-correlated sub-plots
    time_layers: Vec<(String, String)>,
    /// Master-figure generation the markers and dynamic axes belong to
    master_generation: Option<u64>,
    line_sites: HashMap<Uuid, Site>,

    widgets: GuiWidgets,
    clipboard: Option<Point2>,
    last_output: Option<LastOutput>,
    captured: BTreeMap<String, CapturedPoint>,
}

impl<B: RenderBackend> Controller<B> {
    pub fn new(plotter: Plotter<B>, config: &ViewerConfig) -> PhaseviewResult<Self> {
        let keys = config.interaction.mode_keys()?;
        Ok(Self {
            plotter,
            playback: TimePlayback::new(config.playback),
            context: ContextRegistry::new(),
            config: config.interaction.clone(),
            keys,
            mode: Mode::Idle,
            modifiers: Modifiers::new(),
            drag: DragTracker::new(),
            line_anchor: None,
            domain_seed: None,
            selection_marker: None,
            domain_boundary: None,
            samples: None,
            user_func: None,
            domain_grower: None,
            dynamic: Vec::new(),
            dynamic_axes: HashSet::new(),
            time_layers: Vec::new(),
            master_generation: None,
            line_sites: HashMap::new(),
            widgets: GuiWidgets::default(),
            clipboard: None,
            last_output: None,
            captured: BTreeMap::new(),
        })
    }

    // ===== Accessors =====

    pub fn plotter(&self) -> &Plotter<B> {
        &self.plotter
    }

    pub fn plotter_mut(&mut self) -> &mut Plotter<B> {
        &mut self.plotter
    }

    pub fn into_plotter(self) -> Plotter<B> {
        self.plotter
    }

    pub fn playback(&self) -> &TimePlayback {
        &self.playback
    }

    pub fn context(&self) -> &ContextRegistry {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ContextRegistry {
        &mut self.context
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn widgets(&self) -> &GuiWidgets {
        &self.widgets
    }

    /// Last point clicked in a dynamic plot
    pub fn clipboard(&self) -> Option<Point2> {
        self.clipboard
    }

    pub fn last_output(&self) -> Option<&LastOutput> {
        self.last_output.as_ref()
    }

    pub fn captured(&self) -> &BTreeMap<String, CapturedPoint> {
        &self.captured
    }

    pub fn samples(&self) -> Option<&SampleSet> {
        self.samples.as_ref()
    }

    // ===== Registration =====

    /// Store a trajectory: its `t` column drives playback, and its samples
    /// (or `points`, if given) are the targets of point snapping
    pub fn add_trajectory(&mut self, provider: &dyn SampleProvider, points: Option<SampleSet>) -> PhaseviewResult<()> {
        let sampled = provider.sample()?;
        let times = sampled.times().map(<[f64]>::to_vec).unwrap_or_default();
        if times.is_empty() {
            debug!("trajectory has no sample times; playback disabled");
        }
        self.playback.set_times(times);
        self.samples = Some(points.unwrap_or(sampled));
        Ok(())
    }

    pub fn assign_user_function(&mut self, func: impl FnMut(Point2) -> PhaseviewResult<ProbeOutput> + 'static) {
        self.user_func = Some(Box::new(func));
    }

    pub fn assign_domain_grower(&mut self, grower: impl DomainGrower + 'static) {
        self.domain_grower = Some(Box::new(grower));
    }

    /// Register the refresh callback of a dynamic layer, marking the layer
    /// dynamic; a previous callback for the same layer is replaced
    pub fn add_dynamic_plot(
        &mut self,
        figure: Option<&str>,
        layer: &str,
        callback: impl FnMut(&mut Plotter<B>, f64, bool) -> PhaseviewResult<()> + 'static,
    ) -> PhaseviewResult<()> {
        let figure = self.plotter.scene().resolve_figure(figure)?;
        self.plotter.scene_mut().update_layer(
            Some(&figure),
            layer,
            LayerUpdate {
                dynamic: Some(true),
                ..LayerUpdate::default()
            },
        )?;
        self.dynamic
            .retain(|d| !(d.figure == figure && d.layer == layer));
        self.dynamic.push(DynamicPlot {
            figure,
            layer: layer.to_string(),
            callback: Box::new(callback),
        });
        Ok(())
    }

    // ===== GUI =====

    /// Rebuild every figure and set up the master figure's playback widgets,
    /// time markers and dynamic plots
    pub fn build_gui(&mut self) -> PhaseviewResult<()> {
        let master = self.config.master_figure.clone();
        let fignum = self
            .plotter
            .scene()
            .figure(&master)
            .ok_or_else(|| SceneError::unknown(EntityKind::Figure, &master))?
            .fignum;

        self.playback.clear_markers();
        let names: Vec<String> = self
            .plotter
            .scene()
            .figures()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        for name in &names {
            self.plotter.render_figure(name, SyncOptions::rebuild())?;
        }

        if let Some((min, max)) = self.playback.range() {
            if self.playback.t().is_none() {
                self.playback
                    .set_time(self.plotter.backend_mut(), (min + max) / 2.0)?;
            }
            if self.widgets.time_bar.is_none() {
                let initial = self.playback.t().unwrap_or(min);
                let backend = self.plotter.backend_mut();
                let slider = backend.add_slider(
                    fignum,
                    &SliderSpec {
                        label: "Time".to_string(),
                        min,
                        max,
                        initial,
                    },
                )?;
                self.widgets.minus_dt = Some(backend.add_button(fignum, "-dt")?);
                self.widgets.plus_dt = Some(backend.add_button(fignum, "+dt")?);
                self.widgets.time_bar = Some(slider);
                self.playback.attach_slider(slider, initial);
            }
        }
        if self.widgets.capture.is_none() {
            let backend = self.plotter.backend_mut();
            self.widgets.capture = Some(backend.add_button(fignum, "Capture Point")?);
            self.widgets.refresh = Some(backend.add_button(fignum, "Refresh")?);
            self.widgets.back = Some(backend.add_button(fignum, "Back")?);
            self.widgets.save = Some(backend.add_button(fignum, "Save")?);
        }

        self.attach_master()?;
        self.reattach()?;
        let any_3d = self
            .plotter
            .scene()
            .figure(&master)
            .map(|f| f.subplots().iter().any(|s| s.projection == Projection::ThreeD))
            .unwrap_or(false);
        if any_3d {
            info!("3D axes can be rotated by clicking and dragging");
        }
        debug!(
            figure = %master,
            markers = self.playback.markers().len(),
            dynamic_axes = self.dynamic_axes.len(),
            "built playback GUI"
        );

        self.dispatch_dynamic(false)
    }

    /// Draw time markers on the master figure's time plots and record its
    /// dynamic axes and time-correlated layers, forgetting earlier ones
    fn attach_master(&mut self) -> PhaseviewResult<()> {
        let master = self.config.master_figure.clone();
        self.playback.clear_markers();
        self.dynamic_axes.clear();
        self.time_layers.clear();

        let Some(fig) = self.plotter.scene().figure(&master) else {
            self.master_generation = None;
            return Ok(());
        };
        let (fignum, generation) = (fig.fignum, fig.generation());
        let mut ordered: Vec<&Subplot> = fig.subplots().iter().collect();
        ordered.sort_by_key(|s| s.position);
        let subplots: Vec<(AxesId, bool, Vec<String>)> = ordered
            .into_iter()
            .filter_map(|s| {
                s.surface()
                    .map(|axes| (axes, s.is_time_plot(), s.layers.resolve(fig.layers())))
            })
            .collect();

        let marker_style = Style::from(self.config.time_marker_style.as_str());
        for (axes, time_plot, layers) in subplots {
            let dynamic = layers
                .iter()
                .any(|l| self.dynamic.iter().any(|d| d.figure == master && &d.layer == l));
            if dynamic {
                self.dynamic_axes.insert(axes);
            }
            if time_plot && self.playback.has_times() {
                self.playback
                    .add_marker(self.plotter.backend_mut(), axes, &marker_style)?;
                for layer in layers {
                    let pair = (master.clone(), layer);
                    if !self.time_layers.contains(&pair) {
                        self.time_layers.push(pair);
                    }
                }
            }
        }
        self.master_generation = Some(generation);
        self.plotter.backend_mut().redraw(fignum)?;
        Ok(())
    }

    /// Bring render state held here in line with figures rebuilt since it
    /// was drawn
    ///
    /// Markers and dynamic axes follow the master figure's new axes, lines
    /// of interest move to the new axes of their sub-plot, and marks on
    /// torn-down axes are forgotten.
    fn reattach(&mut self) -> PhaseviewResult<()> {
        let mut rebuilt = false;
        if let Some(seen) = self.master_generation {
            let current = self
                .plotter
                .scene()
                .figure(&self.config.master_figure)
                .map(Figure::generation);
            if current != Some(seen) {
                debug!(figure = %self.config.master_figure, "master figure rebuilt; re-attaching playback");
                self.attach_master()?;
                rebuilt = true;
            }
        }
        if self.selection_marker.as_ref().is_some_and(|m| self.is_stale(m)) {
            self.selection_marker = None;
            rebuilt = true;
        }
        if self.domain_boundary.as_ref().is_some_and(|m| self.is_stale(m)) {
            self.domain_boundary = None;
            rebuilt = true;
        }
        let stale: Vec<Uuid> = self
            .line_sites
            .iter()
            .filter(|(_, site)| !self.is_current(site))
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            self.rebind_line(id)?;
            rebuilt = true;
        }
        if rebuilt {
            self.reset_gesture();
        }
        Ok(())
    }

    fn rebind_line(&mut self, id: Uuid) -> RenderResult<()> {
        let Some(site) = self.line_sites.remove(&id) else {
            return Ok(());
        };
        let target = self.plotter.scene().figure(&site.figure).and_then(|f| {
            f.subplot(site.position)
                .and_then(Subplot::surface)
                .map(|axes| (axes, f.generation()))
        });
        let Some(line) = self.context.get_mut(id).and_then(ContextObject::as_line_mut) else {
            return Ok(());
        };
        let style = Style::from(self.config.line_style.as_str());
        let backend = self.plotter.backend_mut();
        match target {
            Some((axes, generation)) => {
                line.rebind(backend, Some(axes), &style)?;
                self.line_sites.insert(id, Site { generation, ..site });
            }
            None => {
                line.rebind(backend, None, &style)?;
                debug!(%id, figure = %site.figure, "sub-plot of line is gone; line detached");
            }
        }
        Ok(())
    }

    // ===== Playback =====

    /// Set the time without refreshing dynamic layers
    pub fn set_time(&mut self, t: f64) -> PhaseviewResult<bool> {
        self.reattach()?;
        Ok(self.playback.set_time(self.plotter.backend_mut(), t)?)
    }

    /// Set the time, then refresh every dynamic layer
    pub fn update_plots(&mut self, t: f64) -> PhaseviewResult<()> {
        self.reattach()?;
        self.playback.set_time(self.plotter.backend_mut(), t)?;
        self.dispatch_dynamic(false)
    }

    /// Refresh dynamic layers at the current time; `hard_reset` asks them to
    /// discard cached state
    pub fn refresh(&mut self, hard_reset: bool) -> PhaseviewResult<()> {
        self.reattach()?;
        self.dispatch_dynamic(hard_reset)
    }

    pub fn go_back(&mut self) -> PhaseviewResult<bool> {
        match self.playback.previous_time() {
            Some(t) => {
                self.update_plots(t)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn plus_dt(&mut self) -> PhaseviewResult<bool> {
        self.step(true)
    }

    pub fn minus_dt(&mut self) -> PhaseviewResult<bool> {
        self.step(false)
    }

    fn step(&mut self, forward: bool) -> PhaseviewResult<bool> {
        self.reattach()?;
        let changed = self
            .playback
            .step(self.plotter.backend_mut(), forward, self.modifiers)?;
        if changed {
            self.dispatch_dynamic(false)?;
        }
        Ok(changed)
    }

    fn dispatch_dynamic(&mut self, hard_reset: bool) -> PhaseviewResult<()> {
        let Some(t) = self.playback.t() else {
            return Ok(());
        };
        let mut figures: Vec<String> = Vec::new();
        for plot in &self.dynamic {
            if !figures.contains(&plot.figure) {
                figures.push(plot.figure.clone());
            }
        }
        for figure in figures {
            self.plotter.sync_mut().begin_dispatch(&figure)?;
            for plot in self.dynamic.iter_mut().filter(|d| d.figure == figure) {
                if let Err(e) = (plot.callback)(&mut self.plotter, t, hard_reset) {
                    warn!(figure = %plot.figure, layer = %plot.layer, error = %e, "dynamic layer refresh failed");
                }
            }
            self.plotter.sync_mut().end_dispatch(&figure);
            self.plotter
                .render_figure(&figure, SyncOptions::incremental())?;
        }
        // a pending re-arrangement turns the pass above into a rebuild
        self.reattach()
    }

    /// Snapshot the current time, index and time-series values of every
    /// figure
    pub fn capture_point(&mut self) -> &BTreeMap<String, CapturedPoint> {
        let (t, ix) = (self.playback.t(), self.playback.ix());
        let mut captured = BTreeMap::new();
        for fig in self.plotter.scene().figures() {
            let mut point = CapturedPoint::new(&fig.name, t, ix);
            if let Some(t) = t {
                for (_, layer_name) in self.time_layers.iter().filter(|(f, _)| f == &fig.name) {
                    let Some(layer) = fig.layer(layer_name) else {
                        continue;
                    };
                    if layer.kind != LayerKind::Data {
                        continue;
                    }
                    for entry in layer.entries() {
                        if let Some(value) = layer.curve(&entry.name).and_then(|c| c.eval(t)) {
                            point.values.insert(entry.name.clone(), value);
                        }
                    }
                }
            }
            info!(figure = %fig.name, t = ?t, ix = ?ix, values = point.values.len(), "captured point");
            captured.insert(fig.name.clone(), point);
        }
        self.captured = captured;
        &self.captured
    }

    // ===== Context objects =====

    /// Remove a context object's drawing, then unregister it
    ///
    /// If the drawing cannot be removed the object stays registered.
    pub fn remove_context(&mut self, id: Uuid) -> PhaseviewResult<ContextObject> {
        let unknown = || SceneError::unknown(EntityKind::ContextObject, id.to_string());
        self.reattach()?;
        let object = self.context.get_mut(id).ok_or_else(unknown)?;
        if let Some(line) = object.as_line_mut() {
            line.remove(self.plotter.backend_mut())?;
        }
        self.line_sites.remove(&id);
        Ok(self.context.remove(id).ok_or_else(unknown)?)
    }

    /// Show or hide a line of interest
    pub fn show_line(&mut self, id: Uuid, visible: bool) -> PhaseviewResult<()> {
        self.reattach()?;
        let line = self
            .context
            .get_mut(id)
            .and_then(ContextObject::as_line_mut)
            .ok_or_else(|| SceneError::unknown(EntityKind::ContextObject, id.to_string()))?;
        let backend = self.plotter.backend_mut();
        if visible {
            line.show(backend, &Style::from(self.config.line_style.as_str()))?;
        } else {
            line.unshow(backend)?;
        }
        Ok(())
    }

    // ===== Event handling =====

    /// Handle one dispatcher event
    pub fn handle_event(&mut self, event: impl Into<UiEvent>) -> Outcome {
        let result = self.dispatch_event(event.into());
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, mode = %self.mode, "interaction failed; returning to idle");
                self.reset_gesture();
                self.mode = Mode::Idle;
                Outcome::Failed(e.to_string())
            }
        }
    }

    fn dispatch_event(&mut self, event: UiEvent) -> PhaseviewResult<Outcome> {
        self.reattach()?;
        match event {
            UiEvent::Key(e) => self.on_key(e),
            UiEvent::Pointer(e) => self.on_pointer(e),
            UiEvent::Widget(e) => self.on_widget(e),
        }
    }

    fn on_key(&mut self, event: KeyEvent) -> PhaseviewResult<Outcome> {
        if event.key.is_modifier() {
            self.modifiers.apply(event.key, event.pressed);
            return Ok(Outcome::Handled);
        }
        if !event.pressed {
            return Ok(Outcome::Ignored);
        }
        let Some(trigger) = Trigger::from_key(event.key, &self.keys) else {
            return Ok(Outcome::Ignored);
        };
        if !self.mode.is_idle() {
            self.transition(Trigger::Cancel);
        }
        self.enter(trigger)
    }

    fn enter(&mut self, trigger: Trigger) -> PhaseviewResult<Outcome> {
        let Some(target) = self.mode.next(trigger) else {
            return Ok(Outcome::Ignored);
        };
        if target == Mode::DomainGrow && self.domain_grower.is_none() {
            let err = InteractionError::ModeRefused {
                mode: target.to_string(),
                reason: "Assign a domain criterion function first!".to_string(),
            };
            warn!(error = %err, "mode refused");
            return Ok(Outcome::ModeRefused(err));
        }
        if let Some(prompt) = target.prompt() {
            info!("{}", prompt);
        }
        self.mode = target;
        Ok(Outcome::ModeEntered(target))
    }

    /// Leave the current mode through the transition table, dropping any
    /// half-finished gesture
    fn transition(&mut self, trigger: Trigger) {
        if let Some(next) = self.mode.next(trigger) {
            debug!(from = %self.mode, to = %next, ?trigger, "mode change");
            self.reset_gesture();
            self.mode = next;
        }
    }

    fn reset_gesture(&mut self) {
        self.line_anchor = None;
        self.domain_seed = None;
    }

    fn abort(&mut self, reason: &str) -> Outcome {
        self.transition(Trigger::GestureDone);
        Outcome::Aborted(reason.to_string())
    }

    fn on_pointer(&mut self, event: PointerEvent) -> PhaseviewResult<Outcome> {
        match event.phase {
            PointerPhase::Press => {
                self.drag.press();
                if self.mode == Mode::LineSelect && event.button == PointerButton::Primary {
                    if let (Some(axes), Some(p)) = (event.axes, event.data) {
                        if self.is_callback_axes(axes) {
                            self.line_anchor = Some((axes, p));
                            return Ok(Outcome::Handled);
                        }
                    }
                }
                Ok(Outcome::Ignored)
            }
            PointerPhase::Move => {
                self.drag.moved();
                Ok(Outcome::Ignored)
            }
            PointerPhase::Release => {
                let click = self.drag.release();
                let (Some(axes), Some(p)) = (event.axes, event.data) else {
                    return Ok(Outcome::Ignored);
                };
                let outcome = match self.mode {
                    Mode::Idle => Outcome::Ignored,
                    Mode::LineSelect => self.complete_line(axes, p, event.button)?,
                    Mode::UserFuncWait => self.probe(axes, p)?,
                    Mode::SnapWait => self.snap(axes, p)?,
                    Mode::DomainGrow => self.grow_domain(axes, p)?,
                };
                if outcome != Outcome::Ignored || !click {
                    return Ok(outcome);
                }
                self.click(axes, p)
            }
        }
    }

    /// A true click not consumed by a mode
    fn click(&mut self, axes: AxesId, p: Point2) -> PhaseviewResult<Outcome> {
        if self.dynamic_axes.contains(&axes) {
            self.clipboard = Some(p);
            info!("Clipboard now contains: ({:.4}, {:.4})", p.x, p.y);
            return Ok(Outcome::Clipboard(p));
        }
        let time_plot = self
            .locate(axes)
            .map(|(_, s)| s.is_time_plot())
            .unwrap_or(false);
        if time_plot && self.playback.has_times() {
            self.update_plots(p.x)?;
            return Ok(Outcome::TimeChanged(self.playback.t().unwrap_or(p.x)));
        }
        Ok(Outcome::Ignored)
    }

    fn complete_line(&mut self, axes: AxesId, p: Point2, button: PointerButton) -> PhaseviewResult<Outcome> {
        let Some((anchor_axes, start)) = self.line_anchor else {
            return Ok(Outcome::Ignored);
        };
        if button != PointerButton::Primary || anchor_axes != axes {
            return Ok(Outcome::Ignored);
        }
        let mut line = LineOfInterest::new(start, p, Some(axes));
        line.show(
            self.plotter.backend_mut(),
            &Style::from(self.config.line_style.as_str()),
        )?;
        self.redraw_for(axes)?;
        let id = self.context.declare(ContextObject::Line(line));
        if let Some(site) = self.site_of(axes) {
            self.line_sites.insert(id, site);
        }
        info!("Created line as new selected object, now give it a name");
        self.transition(Trigger::GestureDone);
        Ok(Outcome::ContextCreated(id))
    }

    fn probe(&mut self, axes: AxesId, p: Point2) -> PhaseviewResult<Outcome> {
        if !self.is_callback_axes(axes) {
            info!("Must select axes for which callbacks have been defined.");
            return Ok(Outcome::Handled);
        }
        let Some(func) = self.user_func.as_mut() else {
            warn!("no user function assigned");
            return Ok(self.abort("no user function assigned"));
        };
        info!("({:.4}, {:.4})", p.x, p.y);
        match func(p) {
            Ok(output) => {
                info!(scalars = ?output.scalars, "user function output");
                self.mark_selection(axes, p)?;
                self.last_output = Some(LastOutput::Probe {
                    point: p,
                    output: output.clone(),
                });
                self.transition(Trigger::GestureDone);
                Ok(Outcome::Probed(output))
            }
            Err(e) => {
                warn!(error = %e, "user function failed");
                Ok(self.abort(&e.to_string()))
            }
        }
    }

    fn snap(&mut self, axes: AxesId, p: Point2) -> PhaseviewResult<Outcome> {
        let points = match &self.samples {
            Some(samples) => samples.points_xy(),
            None => {
                info!("No trajectory defined");
                return Ok(Outcome::Handled);
            }
        };
        info!("Click: ({:.4}, {:.4})", p.x, p.y);
        let Some(hit) = nearest_within(&points, p, self.config.snap_tolerance) else {
            info!("No nearby point found. Try again");
            return Ok(self.abort("no nearby point found"));
        };
        self.mark_selection(axes, hit.point)?;
        info!(
            "Last output = (index, distance, point) = ({}, {:.3}, ({:.3}, {:.3}))",
            hit.index, hit.distance, hit.point.x, hit.point.y
        );
        self.last_output = Some(LastOutput::Snap(hit));
        self.transition(Trigger::GestureDone);
        Ok(Outcome::Snapped(hit))
    }

    fn grow_domain(&mut self, axes: AxesId, p: Point2) -> PhaseviewResult<Outcome> {
        let Some((seed_axes, seed)) = self.domain_seed else {
            self.domain_seed = Some((axes, p));
            debug!(x = p.x, y = p.y, "domain seed point");
            return Ok(Outcome::Handled);
        };
        let radius = seed.distance(&p);
        let Some(grower) = self.domain_grower.as_mut() else {
            return Ok(self.abort("no domain criterion function"));
        };
        match grower.grow(seed, radius) {
            Ok(boundary) => {
                if let Some(old) = self.domain_boundary.take() {
                    self.plotter.backend_mut().remove(old.handle)?;
                }
                let primitive = Primitive::Line {
                    x: boundary.iter().map(|q| q.x).collect(),
                    y: boundary.iter().map(|q| q.y).collect(),
                };
                let style = Style::from(self.config.line_style.as_str());
                let handle = self.plotter.backend_mut().draw(seed_axes, &primitive, &style)?;
                self.domain_boundary = Some(Mark {
                    site: self.site_of(seed_axes),
                    handle,
                });
                self.redraw_for(seed_axes)?;
                self.transition(Trigger::GestureDone);
                Ok(Outcome::DomainGrown(boundary))
            }
            Err(e) => {
                warn!(error = %e, "domain growing failed");
                Ok(self.abort(&e.to_string()))
            }
        }
    }

    fn on_widget(&mut self, event: WidgetEvent) -> PhaseviewResult<Outcome> {
        let (widget, value) = match event {
            WidgetEvent::ValueChanged { widget, value } => (widget, Some(value)),
            WidgetEvent::Clicked { widget } => (widget, None),
        };
        let Some(action) = self.widgets.action(widget) else {
            return Ok(Outcome::Ignored);
        };
        let outcome = match action {
            WidgetAction::TimeBar => {
                let Some(value) = value else {
                    return Ok(Outcome::Ignored);
                };
                self.playback.slider_moved(value);
                self.update_plots(value)?;
                Outcome::TimeChanged(self.playback.t().unwrap_or(value))
            }
            WidgetAction::MinusDt | WidgetAction::PlusDt => {
                if self.step(action == WidgetAction::PlusDt)? {
                    Outcome::TimeChanged(self.playback.t().unwrap_or_default())
                } else {
                    Outcome::Handled
                }
            }
            WidgetAction::Capture => Outcome::Captured(self.capture_point().len()),
            WidgetAction::Refresh => {
                self.refresh(self.modifiers.shift)?;
                Outcome::Handled
            }
            WidgetAction::Back => {
                if self.go_back()? {
                    Outcome::TimeChanged(self.playback.t().unwrap_or_default())
                } else {
                    Outcome::Handled
                }
            }
            WidgetAction::Save => Outcome::Saved(self.plotter.save(None, None)?),
        };
        Ok(outcome)
    }

    // ===== Helpers =====

    fn locate(&self, axes: AxesId) -> Option<(&Figure, &Subplot)> {
        self.plotter
            .scene()
            .figures()
            .iter()
            .find_map(|f| f.subplot_for_axes(axes).map(|s| (f, s)))
    }

    fn site_of(&self, axes: AxesId) -> Option<Site> {
        self.locate(axes).map(|(f, s)| Site {
            figure: f.name.clone(),
            position: s.position,
            generation: f.generation(),
        })
    }

    /// The site's figure still exists and has not been rebuilt since
    fn is_current(&self, site: &Site) -> bool {
        self.plotter.scene().figure(&site.figure).map(Figure::generation) == Some(site.generation)
    }

    fn is_stale(&self, mark: &Mark) -> bool {
        mark.site.as_ref().is_some_and(|site| !self.is_current(site))
    }

    fn is_callback_axes(&self, axes: AxesId) -> bool {
        self.locate(axes).map(|(_, s)| s.callbacks).unwrap_or(false)
    }

    fn redraw_for(&mut self, axes: AxesId) -> RenderResult<()> {
        let fignum = self.locate(axes).map(|(f, _)| f.fignum);
        match fignum {
            Some(fignum) => self.plotter.backend_mut().redraw(fignum),
            None => Ok(()),
        }
    }

    /// Select a point and mark it, replacing the previous marker
    fn mark_selection(&mut self, axes: AxesId, p: Point2) -> RenderResult<()> {
        if let Some(old) = self.selection_marker.take() {
            self.plotter.backend_mut().remove(old.handle)?;
        }
        let marker = Primitive::Line {
            x: vec![p.x],
            y: vec![p.y],
        };
        let style = Style::from(self.config.marker_style.as_str());
        let handle = self.plotter.backend_mut().draw(axes, &marker, &style)?;
        self.selection_marker = Some(Mark {
            site: self.site_of(axes),
            handle,
        });
        self.context.select(Selection::Point(p));
        self.redraw_for(axes)
    }
}

#[cfg(test)]
mod tests {
    use phaseview_geom::Domain;

    use super::*;
    use crate::input::Key;
    use crate::render::RecordingBackend;
    use crate::scene::{Coords, DataSpec, FigureSpec, LayerSelection, LayerSpec, SubplotSpec};

    fn controller() -> Controller<RecordingBackend> {
        let config = ViewerConfig::default();
        let mut plotter = Plotter::new(RecordingBackend::new(), &config);
        let scene = plotter.scene_mut();
        scene
            .add_figure(FigureSpec::new("master").domain(Domain::new([0.0, 2.0], [0.0, 4.0])))
            .unwrap();
        scene.add_layer(None, LayerSpec::new("traj")).unwrap();
        scene
            .add_data(
                None,
                None,
                DataSpec::points(Coords::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]).unwrap()).name("xy"),
            )
            .unwrap();
        scene
            .arrange_figure(
                None,
                1,
                1,
                vec![SubplotSpec::new("11", ["x", "y"], LayerSelection::All).callbacks(true)],
            )
            .unwrap();
        plotter
            .render_figure("master", SyncOptions::incremental())
            .unwrap();
        let mut controller = Controller::new(plotter, &config).unwrap();
        let samples = SampleSet::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]).unwrap();
        controller.add_trajectory(&samples, None).unwrap();
        controller
    }

    fn axes(controller: &Controller<RecordingBackend>) -> AxesId {
        controller
            .plotter()
            .scene()
            .figure("master")
            .unwrap()
            .subplots()[0]
            .surface()
            .unwrap()
    }

    #[test]
    fn test_mode_keys_enter_modes() {
        let mut controller = controller();
        let outcome = controller.handle_event(KeyEvent::pressed(Key::Char('s')));
        assert_eq!(outcome, Outcome::ModeEntered(Mode::SnapWait));
        assert_eq!(controller.mode(), Mode::SnapWait);

        // another mode key cancels, then enters the new mode
        let outcome = controller.handle_event(KeyEvent::pressed(Key::Char('l')));
        assert_eq!(outcome, Outcome::ModeEntered(Mode::LineSelect));
        assert_eq!(controller.mode(), Mode::LineSelect);

        assert_eq!(
            controller.handle_event(KeyEvent::pressed(Key::Char('z'))),
            Outcome::Ignored
        );
    }

    #[test]
    fn test_domain_mode_refused_without_grower() {
        let mut controller = controller();
        let outcome = controller.handle_event(KeyEvent::pressed(Key::Char('.')));
        assert!(matches!(outcome, Outcome::ModeRefused(InteractionError::ModeRefused { .. })));
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn test_snap_hit_marks_and_selects() {
        let mut controller = controller();
        let axes = axes(&controller);
        controller.handle_event(KeyEvent::pressed(Key::Char('s')));
        controller.handle_event(PointerEvent::press(axes, 1.05, 0.98));
        let outcome = controller.handle_event(PointerEvent::release(axes, 1.05, 0.98));

        match outcome {
            Outcome::Snapped(hit) => {
                assert_eq!(hit.index, 1);
                assert_eq!(hit.point, Point2::new(1.0, 1.0));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(controller.mode(), Mode::Idle);
        assert_eq!(
            controller.context().selected(),
            Some(Selection::Point(Point2::new(1.0, 1.0)))
        );
        assert!(controller.context().is_empty());
    }

    #[test]
    fn test_snap_miss_aborts_to_idle() {
        let mut controller = controller();
        let axes = axes(&controller);
        controller.handle_event(KeyEvent::pressed(Key::Char('s')));
        let outcome = controller.handle_event(PointerEvent::release(axes, 1.5, 3.0));
        assert!(matches!(outcome, Outcome::Aborted(_)));
        assert_eq!(controller.mode(), Mode::Idle);
        assert!(controller.context().is_empty());
        assert!(controller.last_output().is_none());
    }

    #[test]
    fn test_line_selection_creates_context_object() {
        let mut controller = controller();
        let axes = axes(&controller);
        controller.handle_event(KeyEvent::pressed(Key::Char('l')));
        controller.handle_event(PointerEvent::press(axes, 2.0, 0.0));
        controller.handle_event(PointerEvent::moved(axes, 1.0, 0.0));
        let outcome = controller.handle_event(PointerEvent::release(axes, 0.0, 0.0));

        let Outcome::ContextCreated(id) = outcome else {
            panic!("unexpected outcome {:?}", outcome);
        };
        assert_eq!(controller.mode(), Mode::Idle);
        assert_eq!(controller.context().selected(), Some(Selection::Context(id)));
        let line = controller.context().get(id).unwrap().as_line().unwrap();
        assert_eq!(line.p1(), Point2::new(0.0, 0.0));
        assert_eq!(line.length(), 2.0);
        assert!(line.handle().is_some());

        controller.remove_context(id).unwrap();
        assert!(controller.context().is_empty());
    }

    #[test]
    fn test_user_function_outside_callback_axes_keeps_waiting() {
        let mut controller = controller();
        controller.assign_user_function(|p| {
            let mut output = ProbeOutput::default();
            output.scalars.insert("sum".to_string(), p.x + p.y);
            Ok(output)
        });
        controller.handle_event(KeyEvent::pressed(Key::Space));
        let outcome = controller.handle_event(PointerEvent::release(AxesId(999), 1.0, 1.0));
        assert_eq!(outcome, Outcome::Handled);
        assert_eq!(controller.mode(), Mode::UserFuncWait);

        let axes = axes(&controller);
        let outcome = controller.handle_event(PointerEvent::release(axes, 1.0, 2.0));
        match outcome {
            Outcome::Probed(output) => assert_eq!(output.scalars["sum"], 3.0),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn test_domain_grow_two_clicks() {
        struct Square;
        impl DomainGrower for Square {
            fn grow(&mut self, seed: Point2, radius: f64) -> PhaseviewResult<Vec<Point2>> {
                Ok(vec![
                    Point2::new(seed.x - radius, seed.y - radius),
                    Point2::new(seed.x + radius, seed.y - radius),
                    Point2::new(seed.x + radius, seed.y + radius),
                ])
            }
        }
        let mut controller = controller();
        controller.assign_domain_grower(Square);
        let axes = axes(&controller);

        assert_eq!(
            controller.handle_event(KeyEvent::pressed(Key::Char('.'))),
            Outcome::ModeEntered(Mode::DomainGrow)
        );
        assert_eq!(
            controller.handle_event(PointerEvent::release(axes, 1.0, 1.0)),
            Outcome::Handled
        );
        let outcome = controller.handle_event(PointerEvent::release(axes, 1.0, 1.5));
        match outcome {
            Outcome::DomainGrown(boundary) => assert_eq!(boundary[0], Point2::new(0.5, 0.5)),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(controller.mode(), Mode::Idle);
    }

    #[test]
    fn test_modifiers_tracked() {
        let mut controller = controller();
        controller.handle_event(KeyEvent::pressed(Key::Shift));
        assert!(controller.modifiers().shift);
        controller.handle_event(KeyEvent::released(Key::Shift));
        assert!(!controller.modifiers().shift);
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut controller = controller();
        let axes = axes(&controller);
        controller.handle_event(PointerEvent::press(axes, 0.0, 0.0));
        controller.handle_event(PointerEvent::moved(axes, 0.5, 0.5));
        let outcome = controller.handle_event(PointerEvent::release(axes, 1.0, 1.0));
        assert_eq!(outcome, Outcome::Ignored);
    }
}

//! Context objects created through interaction
//!
//! A line of interest is picked with two pointer positions; it can be drawn
//! on the axes it was picked in and can describe a zero-crossing event for
//! the external model builder.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use phaseview_geom::{LineSegment, Point2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{RenderError, RenderResult};
use crate::provider::{AuxFunction, ModelBuilder, ModelContribution};
use crate::render::{AxesId, HandleId, Primitive, RenderBackend};
use crate::style::Style;

/// Event detection tolerance
pub const EVENT_TOL: f64 = 1e-8;
/// Minimum separation between successive events
pub const EVENT_DELAY: f64 = 1e-3;

/// Default name of a freshly created line
pub const UNTITLED: &str = "<untitled>";

/// Sign change a zero-crossing event reacts to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossingDirection {
    /// Negative to positive
    Increasing,
    /// Positive to negative
    Decreasing,
    #[default]
    Either,
}

impl CrossingDirection {
    /// Solver direction code: 1, -1 or 0
    pub fn code(self) -> i8 {
        match self {
            CrossingDirection::Increasing => 1,
            CrossingDirection::Decreasing => -1,
            CrossingDirection::Either => 0,
        }
    }

    /// Whether the step from `prev` to `next` is a crossing in this direction
    pub fn detects(self, prev: f64, next: f64) -> bool {
        let up = prev < 0.0 && next >= 0.0;
        let down = prev > 0.0 && next <= 0.0;
        match self {
            CrossingDirection::Increasing => up,
            CrossingDirection::Decreasing => down,
            CrossingDirection::Either => up || down,
        }
    }
}

/// Zero-crossing event in the form the model builder consumes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub name: String,
    /// Expression whose zero crossing is detected
    pub expr: String,
    pub direction: CrossingDirection,
    pub varnames: Vec<String>,
    pub eventtol: f64,
    pub eventdelay: f64,
    pub starttime: f64,
    pub precise: bool,
    pub active: bool,
    /// Terminate integration on the event
    pub term: bool,
}

/// A user-picked line segment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LineOfInterest {
    id: Uuid,
    pub name: String,
    segment: LineSegment,
    /// Axes the line was picked in
    axes: Option<AxesId>,
    #[serde(skip)]
    handle: Option<HandleId>,
    #[serde(skip)]
    shown: bool,
    created: DateTime<Utc>,
    pars: BTreeMap<String, f64>,
    fnspecs: Vec<AuxFunction>,
    events: Vec<EventDescriptor>,
}

impl LineOfInterest {
    /// Line between two picked points; end points are reordered so that
    /// `x1 <= x2`
    pub fn new(p1: Point2, p2: Point2, axes: Option<AxesId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: UNTITLED.to_string(),
            segment: LineSegment::new(p1, p2).ordered_by_x(),
            axes,
            handle: None,
            shown: false,
            created: Utc::now(),
            pars: BTreeMap::new(),
            fnspecs: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    pub fn segment(&self) -> &LineSegment {
        &self.segment
    }

    pub fn p1(&self) -> Point2 {
        self.segment.p1
    }

    pub fn p2(&self) -> Point2 {
        self.segment.p2
    }

    pub fn dx(&self) -> f64 {
        self.segment.dx()
    }

    pub fn dy(&self) -> f64 {
        self.segment.dy()
    }

    pub fn length(&self) -> f64 {
        self.segment.length()
    }

    /// Radians from the horizontal
    pub fn angle(&self) -> f64 {
        self.segment.angle()
    }

    pub fn angle_deg(&self) -> f64 {
        self.angle().to_degrees()
    }

    pub fn axes(&self) -> Option<AxesId> {
        self.axes
    }

    pub fn handle(&self) -> Option<HandleId> {
        self.handle
    }

    /// Drawn and not hidden
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn events(&self) -> &[EventDescriptor] {
        &self.events
    }

    /// Absolute position at fractional distance (0-1) from the first end point
    pub fn fraction_to_pos(&self, fraction: f64) -> Point2 {
        self.segment.point_at_fraction(fraction)
    }

    /// Absolute position at distance `distance` from the first end point
    pub fn distance_to_pos(&self, distance: f64) -> Point2 {
        self.segment.point_at_distance(distance)
    }

    /// Value of this line's event function at `p`: signed distance to the
    /// line, positive on its left
    pub fn event_value(&self, p: Point2) -> f64 {
        self.segment.signed_distance(&p)
    }

    /// Draw the line, or make an existing drawing visible again
    pub fn show<B: RenderBackend>(&mut self, backend: &mut B, style: &Style) -> RenderResult<HandleId> {
        if let Some(handle) = self.handle {
            backend.set_visible(handle, true)?;
            self.shown = true;
            return Ok(handle);
        }
        let axes = self.axes.ok_or_else(|| RenderError::Backend {
            message: format!("line '{}' is not attached to any axes", self.name),
        })?;
        let primitive = Primitive::Line {
            x: vec![self.p1().x, self.p2().x],
            y: vec![self.p1().y, self.p2().y],
        };
        let handle = backend.draw(axes, &primitive, style)?;
        self.handle = Some(handle);
        self.shown = true;
        Ok(handle)
    }

    pub fn unshow<B: RenderBackend>(&mut self, backend: &mut B) -> RenderResult<()> {
        if let Some(handle) = self.handle {
            backend.set_visible(handle, false)?;
        }
        self.shown = false;
        Ok(())
    }

    /// Remove the drawing; the line itself is kept
    ///
    /// The handle is only forgotten once the backend has removed it.
    pub fn remove<B: RenderBackend>(&mut self, backend: &mut B) -> RenderResult<()> {
        if let Some(handle) = self.handle {
            backend.remove(handle)?;
            self.handle = None;
        }
        self.shown = false;
        Ok(())
    }

    /// Move the line onto `axes` after its previous axes were torn down
    /// together with its drawing; a line that was shown is drawn again
    pub fn rebind<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        axes: Option<AxesId>,
        style: &Style,
    ) -> RenderResult<()> {
        self.handle = None;
        self.axes = axes;
        if self.shown && axes.is_some() {
            self.show(backend, style)?;
        } else {
            self.shown = false;
        }
        Ok(())
    }

    /// Describe a crossing of this line as an event named after `name`
    ///
    /// Renames the line, and replaces any previously made event.
    pub fn make_event_def(&mut self, name: &str, direction: CrossingDirection) -> &EventDescriptor {
        self.name = name.to_string();
        let base = format!("exit_line_{}_", name);
        let (p_x, p_y, dp_x, dp_y) = (
            format!("{}p_x", base),
            format!("{}p_y", base),
            format!("{}dp_x", base),
            format!("{}dp_y", base),
        );
        let body = format!(
            "({dp_x}*(y-{p_y}) - {dp_y}*(x-{p_x}))/sqrt({dp_x}*{dp_x}+{dp_y}*{dp_y})",
            dp_x = dp_x,
            dp_y = dp_y,
            p_x = p_x,
            p_y = p_y,
        );
        let (start, dx, dy) = (self.p1(), self.dx(), self.dy());
        self.pars.insert(p_x, start.x);
        self.pars.insert(p_y, start.y);
        self.pars.insert(dp_x, dx);
        self.pars.insert(dp_y, dy);

        let fn_name = format!("exit_fn_{}", name);
        self.fnspecs.retain(|f| f.name != fn_name);
        self.fnspecs.push(AuxFunction {
            name: fn_name.clone(),
            args: vec!["x".to_string(), "y".to_string()],
            body,
        });
        self.events = vec![EventDescriptor {
            name: format!("exit_ev_{}", name),
            expr: format!("{}(x,y)", fn_name),
            direction,
            varnames: vec!["x".to_string(), "y".to_string()],
            eventtol: EVENT_TOL,
            eventdelay: EVENT_DELAY,
            starttime: 0.0,
            precise: true,
            active: true,
            term: false,
        }];
        debug!(line = %self.name, "made crossing event");
        &self.events[0]
    }

    /// Parameters, auxiliary functions and events for the model builder
    pub fn contribution(&self) -> ModelContribution {
        ModelContribution {
            pars: self.pars.clone(),
            fnspecs: self.fnspecs.clone(),
            events: self.events.clone(),
        }
    }
}

impl fmt::Display for LineOfInterest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let event = if self.events.is_empty() {
            "(no event)"
        } else {
            "(with event)"
        };
        write!(
            f,
            "line({:.3}, {:.3}, {:.3}, {:.3}) - '{}' {}",
            self.p1().x,
            self.p1().y,
            self.p2().x,
            self.p2().y,
            self.name,
            event
        )
    }
}

/// Object created through interaction
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContextObject {
    Line(LineOfInterest),
}

impl ContextObject {
    pub fn id(&self) -> Uuid {
        match self {
            ContextObject::Line(line) => line.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ContextObject::Line(line) => &line.name,
        }
    }

    pub fn as_line(&self) -> Option<&LineOfInterest> {
        match self {
            ContextObject::Line(line) => Some(line),
        }
    }

    pub fn as_line_mut(&mut self) -> Option<&mut LineOfInterest> {
        match self {
            ContextObject::Line(line) => Some(line),
        }
    }

    pub fn contribution(&self) -> ModelContribution {
        match self {
            ContextObject::Line(line) => line.contribution(),
        }
    }
}

impl fmt::Display for ContextObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextObject::Line(line) => fmt::Display::fmt(line, f),
        }
    }
}

/// What the controller currently has selected
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    Context(Uuid),
    /// A clicked or snapped point
    Point(Point2),
}

/// Context objects owned by the controller
#[derive(Debug, Default)]
pub struct ContextRegistry {
    objects: Vec<ContextObject>,
    selected: Option<Selection>,
    changed: bool,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object and make it the current selection
    pub fn declare(&mut self, object: ContextObject) -> Uuid {
        let id = object.id();
        info!(object = %object, "created context object as new selection");
        self.objects.push(object);
        self.selected = Some(Selection::Context(id));
        self.changed = true;
        id
    }

    pub fn objects(&self) -> &[ContextObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&ContextObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn get_mut(&mut self, id: Uuid) -> Option<&mut ContextObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// Unregister an object, deselecting it if selected
    pub fn remove(&mut self, id: Uuid) -> Option<ContextObject> {
        let index = self.objects.iter().position(|o| o.id() == id)?;
        if self.selected == Some(Selection::Context(id)) {
            self.selected = None;
        }
        self.changed = true;
        Some(self.objects.remove(index))
    }

    pub fn selected(&self) -> Option<Selection> {
        self.selected
    }

    /// The selected context object, if the selection is one
    pub fn selected_object(&self) -> Option<&ContextObject> {
        match self.selected {
            Some(Selection::Context(id)) => self.get(id),
            _ => None,
        }
    }

    pub fn select(&mut self, selection: Selection) {
        self.selected = Some(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Objects were created or removed since the last contribution
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Push every non-empty contribution into the builder; returns how many
    /// were pushed
    pub fn contribute(&mut self, builder: &mut dyn ModelBuilder) -> usize {
        let mut count = 0;
        for object in &self.objects {
            let contribution = object.contribution();
            if !contribution.is_empty() {
                builder.contribute(contribution);
                count += 1;
            }
        }
        self.changed = false;
        debug!(count, "contributed context to model builder");
        count
    }
}

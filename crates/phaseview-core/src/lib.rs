//! phaseview-core - Interactive exploration of dynamical-system trajectories
//!
//! This crate provides the model and controller behind a layered plotting
//! tool for phase-plane and time-series views:
//!
//! - **Scene**: Figure → sub-plot → layer → data-entry registry with visibility, styles and arrangement
//! - **Render**: Reconciliation of the scene with an external [`render::RenderBackend`], plus a recording backend
//! - **Plotter**: Scene, render sync and backend together, with show/pause and image export
//! - **Playback**: Shared current time snapped to sample times, time markers and slider
//! - **Context**: Lines of interest and the selection, contributing event definitions to a model builder
//! - **Controller**: Key/pointer/widget event handling with a single interaction-mode state machine
//! - **Provider**: Trajectory samples, user probe functions and domain growers supplied by the caller
//! - **Config**: Palette, playback steps, key bindings and output settings (TOML/JSON)
//!
//! # Architecture
//!
//! ```text
//! UiEvent → Controller → { TimePlayback, ContextRegistry, Plotter }
//!                                              │
//!                             SceneModel ── RenderSync ──→ RenderBackend
//! ```
//!
//! Scene edits never touch the backend. Live render objects are created and
//! updated only by a synchronization pass, which keeps handle back-references
//! on the scene.

pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod input;
pub mod naming;
pub mod playback;
pub mod plotter;
pub mod provider;
pub mod render;
pub mod scene;
pub mod style;
pub mod types;

pub use config::{InteractionConfig, ModeKeys, OutputConfig, PaletteConfig, PlaybackConfig, ViewerConfig};
pub use context::{ContextObject, ContextRegistry, CrossingDirection, EventDescriptor, LineOfInterest, Selection};
pub use controller::{CapturedPoint, Controller, DynamicCallback, GuiWidgets, LastOutput, Mode, Outcome, Trigger};
pub use error::{
    ConfigError, EntityKind, ExportError, InteractionError, PhaseviewError, PhaseviewResult, RenderError,
    SceneError, SceneResult,
};
pub use input::{Key, KeyEvent, Modifiers, PointerButton, PointerEvent, PointerPhase, UiEvent, WidgetEvent};
pub use playback::TimePlayback;
pub use plotter::{PauseCommand, PausePrompt, Plotter, ScriptedPrompt, ShowScope, StdinPrompt};
pub use provider::{
    AuxFunction, DomainGrower, ModelBuilder, ModelContribution, ProbeOutput, SampleProvider, SampleSet,
    UserFunction,
};
pub use render::{AxesId, HandleId, Primitive, RecordingBackend, RenderBackend, RenderSync, SyncOptions, SyncReport, WidgetId};
pub use scene::{
    Coords, DataEntry, DataSpec, DisplayTarget, EntryPayload, Figure, FigureSpec, FigureUpdate, Layer, LayerKind,
    LayerSelection, LayerSpec, LayerUpdate, SceneModel, Subplot, SubplotSpec,
};
pub use style::Style;
pub use types::{AxisScale, GridShape, PositionCode, Projection};

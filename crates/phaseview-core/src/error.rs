//! Error types for phaseview-core
//!
//! Provides error handling for:
//! - Scene registry edits (figures, layers, sub-plots, data entries)
//! - Render synchronization
//! - Interaction mode changes
//! - Image export and configuration loading

use std::fmt;
use std::path::PathBuf;

use phaseview_geom::GeomError;
use thiserror::Error;

/// Kind of registry entity named in an error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityKind {
    Figure,
    Layer,
    Subplot,
    Entry,
    ContextObject,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Figure => "figure",
            EntityKind::Layer => "layer",
            EntityKind::Subplot => "sub-plot",
            EntityKind::Entry => "data entry",
            EntityKind::ContextObject => "context object",
        };
        f.write_str(name)
    }
}

/// Main error type for phaseview operations
#[derive(Error, Debug)]
pub enum PhaseviewError {
    /// Scene registry errors
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Geometry errors (e.g. no boundary intersection)
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeomError),

    /// Render synchronization errors
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    /// Interaction controller errors
    #[error("Interaction error: {0}")]
    Interaction(#[from] InteractionError),

    /// Export errors
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by scene registry edits
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Name collision
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    /// Reference to something that is not registered
    #[error("Unknown {kind}: '{name}'")]
    UnknownEntity { kind: EntityKind, name: String },

    /// Data not castable to 2 or 3 parallel numeric sequences
    #[error("Invalid data shape: {message}")]
    InvalidShape { message: String },

    /// Operation applied to a layer of the wrong kind
    #[error("Incompatible layer kind for '{layer}': expected {expected}, found {actual}")]
    IncompatibleLayerKind {
        layer: String,
        expected: String,
        actual: String,
    },

    /// Missing or malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SceneError {
    pub(crate) fn duplicate(kind: EntityKind, name: impl Into<String>) -> Self {
        SceneError::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn unknown(kind: EntityKind, name: impl Into<String>) -> Self {
        SceneError::UnknownEntity {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        SceneError::InvalidShape {
            message: message.into(),
        }
    }
}

/// Errors raised while reconciling the scene with a render backend
#[derive(Error, Debug)]
pub enum RenderError {
    /// A synchronization pass for this figure is already running
    #[error("Render pass for figure '{figure}' is already in progress")]
    Reentrant { figure: String },

    /// Scene lookups failed during the pass
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The backend refused a request
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Referenced sub-plot has no live axes yet
    #[error("Sub-plot {position} of figure '{figure}' has not been rendered")]
    NoSubplot { figure: String, position: String },
}

/// Errors raised by the interaction controller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InteractionError {
    /// Mode entry refused because a prerequisite is missing
    #[error("Cannot enter {mode} mode: {reason}")]
    ModeRefused { mode: String, reason: String },

    /// A gesture could not be completed
    #[error("Gesture aborted: {0}")]
    Aborted(String),
}

/// Errors related to image export
#[derive(Error, Debug)]
pub enum ExportError {
    /// Output directory cannot be used
    #[error("Invalid output path: {path}")]
    InvalidPath { path: PathBuf },

    /// Backend failed to write the image
    #[error("Backend failed to write {path}: {message}")]
    Backend { path: PathBuf, message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Conflicting key bindings: {0}")]
    KeyConflict(String),
}

/// Result type alias for phaseview operations
pub type PhaseviewResult<T> = Result<T, PhaseviewError>;

/// Result type alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;

/// Result type alias for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Result type alias for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

//! Configuration for phaseview-core
//!
//! Centralized configuration for the default palette, playback step sizes,
//! interaction key bindings and image output.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::input::{Key, Modifiers};

/// Viewer-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Default layer styles
    pub palette: PaletteConfig,
    /// Time scrubbing settings
    pub playback: PlaybackConfig,
    /// Interaction keys and marker styles
    pub interaction: InteractionConfig,
    /// Image export settings
    pub output: OutputConfig,
}

/// Default layer style configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Color codes cycled through as layers are added
    pub colors: Vec<String>,
    /// Line code appended to the color
    pub line: String,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            colors: ["b", "g", "r", "c", "m", "k", "y"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            line: "-".to_string(),
        }
    }
}

/// Time scrubbing configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Index step for the -dt/+dt controls
    pub step: usize,
    /// Index step with shift held
    pub step_shift: usize,
    /// Index step with control held
    pub step_control: usize,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step: 5,
            step_shift: 10,
            step_control: 1,
        }
    }
}

impl PlaybackConfig {
    /// Step size for the given modifier state
    pub fn step_for(&self, modifiers: Modifiers) -> usize {
        if modifiers.shift {
            self.step_shift
        } else if modifiers.ctrl {
            self.step_control
        } else {
            self.step
        }
    }
}

/// Interaction configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Maximum distance for snapping to a trajectory sample
    pub snap_tolerance: f64,
    /// Key entering line-of-interest selection
    pub line_key: String,
    /// Key entering user-function probing
    pub user_func_key: String,
    /// Key entering point snapping
    pub snap_key: String,
    /// Key entering domain growing
    pub domain_key: String,
    /// Figure that carries the playback widgets
    pub master_figure: String,
    /// Style of the marker drawn at snapped or probed points
    pub marker_style: String,
    /// Style of line-of-interest primitives
    pub line_style: String,
    /// Style of vertical time markers
    pub time_marker_style: String,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            snap_tolerance: 0.1,
            line_key: "l".to_string(),
            user_func_key: "space".to_string(),
            snap_key: "s".to_string(),
            domain_key: ".".to_string(),
            master_figure: "master".to_string(),
            marker_style: "go".to_string(),
            line_style: "y-".to_string(),
            time_marker_style: "r--".to_string(),
        }
    }
}

/// Parsed mode-switch keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeKeys {
    pub line: Key,
    pub user_func: Key,
    pub snap: Key,
    pub domain: Key,
}

impl ModeKeys {
    pub fn contains(&self, key: Key) -> bool {
        [self.line, self.user_func, self.snap, self.domain].contains(&key)
    }
}

impl Default for ModeKeys {
    fn default() -> Self {
        Self {
            line: Key::Char('l'),
            user_func: Key::Space,
            snap: Key::Char('s'),
            domain: Key::Char('.'),
        }
    }
}

impl InteractionConfig {
    /// Parse the configured key names
    pub fn mode_keys(&self) -> ConfigResult<ModeKeys> {
        let parse = |s: &str| s.parse::<Key>().map_err(ConfigError::OutOfRange);
        Ok(ModeKeys {
            line: parse(&self.line_key)?,
            user_func: parse(&self.user_func_key)?,
            snap: parse(&self.snap_key)?,
            domain: parse(&self.domain_key)?,
        })
    }
}

/// Image export configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory images are written to (working directory if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// Image format extension
    pub format: String,
    /// Pause for a command after every `show`
    pub wait: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            format: "png".to_string(),
            wait: false,
        }
    }
}

impl ViewerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> ConfigResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Default location of the user configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("phaseview").join("config.toml"))
    }

    /// Load the user configuration, falling back to defaults if it is
    /// missing or invalid
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring configuration at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigResult<()> {
        if self.palette.colors.is_empty() {
            return Err(ConfigError::OutOfRange(
                "palette.colors must not be empty".to_string(),
            ));
        }

        if self.playback.step == 0 || self.playback.step_shift == 0 || self.playback.step_control == 0 {
            return Err(ConfigError::OutOfRange(
                "playback step sizes must be positive".to_string(),
            ));
        }

        let tol = self.interaction.snap_tolerance;
        if !tol.is_finite() || tol <= 0.0 {
            return Err(ConfigError::OutOfRange(
                "interaction.snap_tolerance must be positive and finite".to_string(),
            ));
        }

        let keys = self.interaction.mode_keys()?;
        let distinct: HashSet<Key> = [keys.line, keys.user_func, keys.snap, keys.domain]
            .into_iter()
            .collect();
        if distinct.len() != 4 {
            return Err(ConfigError::KeyConflict(
                "line, user function, snap and domain keys must differ".to_string(),
            ));
        }
        if distinct.iter().any(|k| k.is_modifier()) {
            return Err(ConfigError::KeyConflict(
                "modifier keys cannot switch interaction modes".to_string(),
            ));
        }

        if self.output.format.is_empty() {
            return Err(ConfigError::OutOfRange(
                "output.format must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.palette.colors.len(), 7);
        assert_eq!(config.playback.step, 5);
        assert_eq!(config.interaction.mode_keys().unwrap(), ModeKeys::default());
    }

    #[test]
    fn test_step_for_modifiers() {
        let playback = PlaybackConfig::default();
        assert_eq!(playback.step_for(Modifiers::new()), 5);
        assert_eq!(playback.step_for(Modifiers::new().with_shift()), 10);
        assert_eq!(playback.step_for(Modifiers::new().with_ctrl()), 1);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = ViewerConfig::default();
        config.interaction.snap_tolerance = 0.25;
        config.output.directory = Some(PathBuf::from("/tmp/frames"));
        let text = config.to_toml().unwrap();
        let parsed = ViewerConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ViewerConfig::from_toml("[playback]\nstep = 3\n").unwrap();
        assert_eq!(parsed.playback.step, 3);
        assert_eq!(parsed.playback.step_shift, 10);
        assert_eq!(parsed.interaction.master_figure, "master");
    }

    #[test]
    fn test_json_round_trip() {
        let config = ViewerConfig::default();
        let parsed = ViewerConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validate_rejects_duplicate_keys() {
        let mut config = ViewerConfig::default();
        config.interaction.snap_key = "l".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::KeyConflict(_))));
    }

    #[test]
    fn test_validate_rejects_bad_tolerance() {
        let mut config = ViewerConfig::default();
        config.interaction.snap_tolerance = 0.0;
        assert!(config.validate().is_err());
        config.interaction.snap_tolerance = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_palette() {
        let mut config = ViewerConfig::default();
        config.palette.colors.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[interaction]\nsnap_tolerance = 0.5\n").unwrap();
        let config = ViewerConfig::load(&path).unwrap();
        assert_eq!(config.interaction.snap_tolerance, 0.5);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = ViewerConfig::load(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

//! Drawing styles
//!
//! A style is either a compact shorthand string such as `"b-"` or `"go"`
//! (color letter followed by a line or marker code), or a structured record
//! of named drawing options.

use serde::{Deserialize, Serialize};

/// Style used when an entry's style is empty
pub const FALLBACK_STYLE: &str = "k-";

/// Drawing style of a layer or data entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Style {
    /// Positional shorthand, e.g. `"r--"`
    Shorthand(String),
    /// Field-by-field drawing options
    Record(StyleRecord),
}

/// Structured drawing options
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linestyle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linewidth: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markersize: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
}

impl Style {
    pub fn shorthand(s: impl Into<String>) -> Self {
        Style::Shorthand(s.into())
    }

    /// Default layer style from a palette, indexed by the current layer count
    pub fn from_palette(colors: &[String], line: &str, index: usize) -> Self {
        match colors.get(index % colors.len().max(1)) {
            Some(color) => Style::Shorthand(format!("{}{}", color, line)),
            None => Style::Shorthand(FALLBACK_STYLE.to_string()),
        }
    }

    /// The style to draw with, substituting black lines for an empty shorthand
    pub fn effective(&self) -> Style {
        match self {
            Style::Shorthand(s) if s.is_empty() => Style::Shorthand(FALLBACK_STYLE.to_string()),
            other => other.clone(),
        }
    }

    /// Color component, used for text primitives
    pub fn color(&self) -> Option<String> {
        match self {
            Style::Shorthand(s) => s.chars().next().map(|c| c.to_string()),
            Style::Record(r) => r.color.clone(),
        }
    }

    pub fn is_shorthand(&self) -> bool {
        matches!(self, Style::Shorthand(_))
    }
}

impl Default for Style {
    fn default() -> Self {
        Style::Shorthand(FALLBACK_STYLE.to_string())
    }
}

impl From<&str> for Style {
    fn from(s: &str) -> Self {
        Style::Shorthand(s.to_string())
    }
}

impl From<String> for Style {
    fn from(s: String) -> Self {
        Style::Shorthand(s)
    }
}

impl From<StyleRecord> for Style {
    fn from(r: StyleRecord) -> Self {
        Style::Record(r)
    }
}

impl std::fmt::Display for Style {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Style::Shorthand(s) => write!(f, "{}", s),
            Style::Record(r) => {
                let json = serde_json::to_string(r).map_err(|_| std::fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<String> {
        ["b", "g", "r", "c", "m", "k", "y"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_palette_wraps() {
        let colors = palette();
        assert_eq!(Style::from_palette(&colors, "-", 0), Style::shorthand("b-"));
        assert_eq!(Style::from_palette(&colors, "-", 2), Style::shorthand("r-"));
        assert_eq!(Style::from_palette(&colors, "-", 7), Style::shorthand("b-"));
    }

    #[test]
    fn test_empty_shorthand_falls_back() {
        assert_eq!(Style::shorthand("").effective(), Style::shorthand("k-"));
        assert_eq!(Style::shorthand("go").effective(), Style::shorthand("go"));
    }

    #[test]
    fn test_record_rejects_unknown_fields() {
        let ok: Result<Style, _> = serde_json::from_str(r#"{"color": "r", "linewidth": 2.0}"#);
        assert!(matches!(ok, Ok(Style::Record(_))));

        let bad: Result<StyleRecord, _> = serde_json::from_str(r#"{"colour": "r"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_color_component() {
        assert_eq!(Style::shorthand("r--").color().as_deref(), Some("r"));
        let record = StyleRecord {
            color: Some("magenta".to_string()),
            ..Default::default()
        };
        assert_eq!(Style::from(record).color().as_deref(), Some("magenta"));
    }
}

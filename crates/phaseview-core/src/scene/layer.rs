//! Layers: named, kind-tagged groups of data entries

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::curve::Curve;
use super::data::DataEntry;
use crate::render::HandleId;
use crate::style::Style;
use crate::types::AxisScale;

/// Kind tag of a layer
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    #[default]
    Data,
    Text,
    Patch,
    VLine,
    HLine,
    Epoch,
    /// User-defined kind, drawn like point data
    Other(String),
}

impl LayerKind {
    pub fn as_str(&self) -> &str {
        match self {
            LayerKind::Data => "data",
            LayerKind::Text => "text",
            LayerKind::Patch => "patch",
            LayerKind::VLine => "vline",
            LayerKind::HLine => "hline",
            LayerKind::Epoch => "epoch",
            LayerKind::Other(s) => s,
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for LayerKind {
    fn from(s: &str) -> Self {
        match s {
            "data" => LayerKind::Data,
            "text" => LayerKind::Text,
            "patch" => LayerKind::Patch,
            "vline" => LayerKind::VLine,
            "hline" => LayerKind::HLine,
            "epoch" => LayerKind::Epoch,
            other => LayerKind::Other(other.to_string()),
        }
    }
}

/// A named group of data entries within a figure
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub kind: LayerKind,
    pub display: bool,
    /// Declaration order; stored but not applied when drawing
    pub zindex: usize,
    /// Default style for entries added without one
    pub style: Style,
    pub scale: Option<AxisScale>,
    /// Refreshed by a registered callback on every time update
    pub dynamic: bool,
    pub axes_vars: Vec<String>,
    pub(crate) entries: Vec<DataEntry>,
    #[serde(skip)]
    pub(crate) handles: HashMap<String, Vec<HandleId>>,
    #[serde(skip)]
    pub(crate) curves: HashMap<String, Curve>,
}

impl Layer {
    pub(crate) fn from_spec(spec: LayerSpec, zindex: usize, default_style: Style) -> Self {
        Self {
            name: spec.name,
            kind: spec.kind,
            display: spec.display,
            zindex: spec.zindex.unwrap_or(zindex),
            style: spec.style.unwrap_or(default_style),
            scale: spec.scale,
            dynamic: spec.dynamic,
            axes_vars: spec.axes_vars,
            entries: Vec::new(),
            handles: HashMap::new(),
            curves: HashMap::new(),
        }
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[DataEntry] {
        &self.entries
    }

    pub fn entry(&self, name: &str) -> Option<&DataEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub(crate) fn entry_mut(&mut self, name: &str) -> Option<&mut DataEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live render handles of an entry, if it has been drawn
    pub fn handles(&self, entry: &str) -> Option<&[HandleId]> {
        self.handles.get(entry).map(|h| h.as_slice())
    }

    /// Interpolated curve of an entry, if one could be built
    pub fn curve(&self, entry: &str) -> Option<&Curve> {
        self.curves.get(entry)
    }

    /// Rebuild the interpolated curve for one entry
    ///
    /// Best effort: entries that cannot be interpolated (text, patches,
    /// segment collections, non-monotone or too-short data) lose any
    /// previous curve and no error is reported.
    pub fn refresh_curve(&mut self, entry: &str) {
        let curve = self.entry(entry).and_then(|e| Curve::from_payload(&e.payload));
        match curve {
            Some(curve) => {
                self.curves.insert(entry.to_string(), curve);
            }
            None => {
                tracing::trace!(layer = %self.name, entry, "no interpolated curve for entry");
                self.curves.remove(entry);
            }
        }
    }

    /// Rebuild curves for every entry
    pub fn refresh_curves(&mut self) {
        let names: Vec<String> = self.entries.iter().map(|e| e.name.clone()).collect();
        for name in names {
            self.refresh_curve(&name);
        }
    }

    pub(crate) fn clear_data(&mut self) {
        self.entries.clear();
        self.curves.clear();
    }
}

/// Options for creating a layer
#[derive(Clone, Debug)]
pub struct LayerSpec {
    pub name: String,
    pub kind: LayerKind,
    pub display: bool,
    pub zindex: Option<usize>,
    pub style: Option<Style>,
    pub scale: Option<AxisScale>,
    pub dynamic: bool,
    pub axes_vars: Vec<String>,
    /// Make this the active layer for subsequent data additions
    pub activate: bool,
}

impl LayerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LayerKind::Data,
            display: true,
            zindex: None,
            style: None,
            scale: None,
            dynamic: false,
            axes_vars: Vec::new(),
            activate: true,
        }
    }

    pub fn kind(mut self, kind: impl Into<LayerKind>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    pub fn zindex(mut self, zindex: usize) -> Self {
        self.zindex = Some(zindex);
        self
    }

    pub fn style(mut self, style: impl Into<Style>) -> Self {
        self.style = Some(style.into());
        self
    }

    pub fn scale(mut self, scale: AxisScale) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn dynamic(mut self, dynamic: bool) -> Self {
        self.dynamic = dynamic;
        self
    }

    pub fn axes_vars<S: Into<String>>(mut self, vars: impl IntoIterator<Item = S>) -> Self {
        self.axes_vars = vars.into_iter().map(Into::into).collect();
        self
    }

    pub fn activate(mut self, activate: bool) -> Self {
        self.activate = activate;
        self
    }
}

/// Partial update of layer properties
#[derive(Clone, Debug, Default)]
pub struct LayerUpdate {
    pub kind: Option<LayerKind>,
    pub display: Option<bool>,
    pub zindex: Option<usize>,
    pub style: Option<Style>,
    /// `Some(None)` clears the scale
    pub scale: Option<Option<AxisScale>>,
    pub dynamic: Option<bool>,
    pub axes_vars: Option<Vec<String>>,
}

impl LayerUpdate {
    pub(crate) fn apply(self, layer: &mut Layer) {
        if let Some(kind) = self.kind {
            layer.kind = kind;
        }
        if let Some(display) = self.display {
            layer.display = display;
        }
        if let Some(zindex) = self.zindex {
            layer.zindex = zindex;
        }
        if let Some(style) = self.style {
            layer.style = style;
        }
        if let Some(scale) = self.scale {
            layer.scale = scale;
        }
        if let Some(dynamic) = self.dynamic {
            layer.dynamic = dynamic;
        }
        if let Some(vars) = self.axes_vars {
            layer.axes_vars = vars;
        }
    }
}

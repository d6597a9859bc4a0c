//! Figures and their sub-plot arrangement

use phaseview_geom::Domain;
use serde::{Deserialize, Serialize};

use super::layer::Layer;
use crate::error::{SceneError, SceneResult};
use crate::render::AxesId;
use crate::types::{AxisScale, GridShape, PositionCode, Projection};

/// Which layers a sub-plot displays
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerSelection {
    /// Every layer of the figure, in declaration order
    All,
    Named(Vec<String>),
}

impl LayerSelection {
    pub fn named<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        LayerSelection::Named(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, layer: &str) -> bool {
        match self {
            LayerSelection::All => true,
            LayerSelection::Named(names) => names.iter().any(|n| n == layer),
        }
    }

    /// Concrete layer names against the figure's layers
    pub fn resolve(&self, layers: &[Layer]) -> Vec<String> {
        match self {
            LayerSelection::All => layers.iter().map(|l| l.name.clone()).collect(),
            LayerSelection::Named(names) => names.clone(),
        }
    }
}

/// One cell of a figure's grid
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subplot {
    pub position: PositionCode,
    pub name: String,
    /// 2 or 3 axis variable names
    pub axes_vars: Vec<String>,
    pub scale: Option<AxisScale>,
    pub layers: LayerSelection,
    pub projection: Projection,
    /// Pointer callbacks (line selection, user function) are bound here
    pub callbacks: bool,
    /// Live axes, once rendered
    #[serde(skip)]
    pub(crate) surface: Option<AxesId>,
}

impl Subplot {
    pub fn surface(&self) -> Option<AxesId> {
        self.surface
    }

    /// First axis variable is time (`t` or `time`, any case)
    pub fn is_time_plot(&self) -> bool {
        self.axes_vars
            .first()
            .map(|v| matches!(v.to_lowercase().as_str(), "t" | "time"))
            .unwrap_or(false)
    }

    /// Matches a position code or a sub-plot name
    pub fn matches(&self, key: &str) -> bool {
        self.position.to_string() == key || self.name == key
    }
}

/// Declaration of a sub-plot for `arrange_figure`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubplotSpec {
    pub position: String,
    #[serde(default)]
    pub name: String,
    pub axes_vars: Vec<String>,
    #[serde(default)]
    pub scale: Option<AxisScale>,
    pub layers: LayerSelection,
    #[serde(default)]
    pub projection: Projection,
    #[serde(default)]
    pub callbacks: bool,
}

impl SubplotSpec {
    pub fn new<S: Into<String>>(
        position: impl Into<String>,
        axes_vars: impl IntoIterator<Item = S>,
        layers: LayerSelection,
    ) -> Self {
        Self {
            position: position.into(),
            name: String::new(),
            axes_vars: axes_vars.into_iter().map(Into::into).collect(),
            scale: None,
            layers,
            projection: Projection::Planar,
            callbacks: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn scale(mut self, scale: AxisScale) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn callbacks(mut self, callbacks: bool) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Validate against a grid and build the sub-plot record
    pub(crate) fn build(self, shape: GridShape) -> SceneResult<Subplot> {
        let position: PositionCode = self.position.parse()?;
        if !shape.contains(position) {
            return Err(SceneError::InvalidArgument(format!(
                "position {} does not exist in a {}x{} arrangement",
                position, shape.rows, shape.cols
            )));
        }
        match self.axes_vars.len() {
            2 => {}
            3 if self.projection == Projection::ThreeD => {}
            3 => {
                return Err(SceneError::InvalidArgument(format!(
                    "sub-plot {} has 3 axis variables but no 3-D projection",
                    position
                )))
            }
            n => {
                return Err(SceneError::InvalidArgument(format!(
                    "sub-plot {} must have 2 or 3 axis variables, got {}",
                    position, n
                )))
            }
        }
        Ok(Subplot {
            position,
            name: self.name,
            axes_vars: self.axes_vars,
            scale: self.scale,
            layers: self.layers,
            projection: self.projection,
            callbacks: self.callbacks,
            surface: None,
        })
    }
}

/// Top-level canvas
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Figure {
    pub name: String,
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    /// Render-surface identifier
    pub fignum: u32,
    pub domain: Domain,
    pub tdom: Option<[f64; 2]>,
    pub display: bool,
    pub(crate) shape: GridShape,
    pub(crate) arrange: Vec<Subplot>,
    pub(crate) layers: Vec<Layer>,
    /// Arrangement changed since the last full rebuild
    #[serde(skip)]
    pub(crate) needs_rebuild: bool,
    /// Number of rebuild passes that tore this figure's axes down
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl Figure {
    pub(crate) fn from_spec(spec: FigureSpec, domain: Domain, fignum: u32) -> Self {
        let mut figure = Self {
            name: spec.name,
            title: spec.title,
            xlabel: spec.xlabel,
            ylabel: spec.ylabel,
            fignum,
            domain,
            tdom: spec.tdom,
            display: spec.display,
            shape: GridShape::default(),
            arrange: Vec::new(),
            layers: Vec::new(),
            needs_rebuild: false,
            generation: 0,
        };
        figure.arrange = vec![figure.default_subplot()];
        figure
    }

    /// Single full-size sub-plot showing every layer
    fn default_subplot(&self) -> Subplot {
        let label = |s: &str, fallback: &str| {
            if s.is_empty() {
                fallback.to_string()
            } else {
                s.to_string()
            }
        };
        Subplot {
            position: PositionCode { row: 1, col: 1 },
            name: self.title.clone(),
            axes_vars: vec![label(&self.xlabel, "x"), label(&self.ylabel, "y")],
            scale: None,
            layers: LayerSelection::All,
            projection: Projection::Planar,
            callbacks: false,
            surface: None,
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Sub-plots in declared arrangement order
    pub fn subplots(&self) -> &[Subplot] {
        &self.arrange
    }

    pub fn subplot(&self, position: PositionCode) -> Option<&Subplot> {
        self.arrange.iter().find(|s| s.position == position)
    }

    /// Sub-plot by position code or name
    pub fn find_subplot(&self, key: &str) -> Option<&Subplot> {
        self.arrange.iter().find(|s| s.matches(key))
    }

    /// Sub-plot owning a live axes object
    pub fn subplot_for_axes(&self, axes: AxesId) -> Option<&Subplot> {
        self.arrange.iter().find(|s| s.surface == Some(axes))
    }

    /// Layers in declaration order
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub(crate) fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    pub fn has_layer(&self, name: &str) -> bool {
        self.layer(name).is_some()
    }

    /// First sub-plot in arrangement order that lists the layer
    pub fn resolve_subplot(&self, layer: &str) -> Option<PositionCode> {
        first_listing(&self.arrange, layer)
    }

    /// Rendered axes of every sub-plot
    pub fn axes(&self) -> impl Iterator<Item = AxesId> + '_ {
        self.arrange.iter().filter_map(|s| s.surface)
    }

    /// Counts rebuild passes; axes and handles drawn before the last one
    /// are gone
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn forget_render_handles(&mut self) {
        for subplot in &mut self.arrange {
            subplot.surface = None;
        }
        for layer in &mut self.layers {
            layer.handles.clear();
        }
    }
}

pub(crate) fn first_listing(arrange: &[Subplot], layer: &str) -> Option<PositionCode> {
    arrange
        .iter()
        .find(|s| s.layers.contains(layer))
        .map(|s| s.position)
}

/// Options for creating a figure
#[derive(Clone, Debug, Default)]
pub struct FigureSpec {
    pub name: String,
    /// Required; creation fails without it
    pub domain: Option<Domain>,
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub tdom: Option<[f64; 2]>,
    pub display: bool,
}

impl FigureSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display: true,
            ..Default::default()
        }
    }

    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = Some(domain);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn labels(mut self, xlabel: impl Into<String>, ylabel: impl Into<String>) -> Self {
        self.xlabel = xlabel.into();
        self.ylabel = ylabel.into();
        self
    }

    pub fn tdom(mut self, tdom: [f64; 2]) -> Self {
        self.tdom = Some(tdom);
        self
    }

    pub fn display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }
}

/// Partial update of figure properties
#[derive(Clone, Debug, Default)]
pub struct FigureUpdate {
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub domain: Option<Domain>,
    /// `Some(None)` clears the time domain
    pub tdom: Option<Option<[f64; 2]>>,
    pub display: Option<bool>,
}

impl FigureUpdate {
    pub(crate) fn apply(self, figure: &mut Figure) {
        if let Some(title) = self.title {
            figure.title = title;
        }
        if let Some(xlabel) = self.xlabel {
            figure.xlabel = xlabel;
        }
        if let Some(ylabel) = self.ylabel {
            figure.ylabel = ylabel;
        }
        if let Some(domain) = self.domain {
            figure.domain = domain;
        }
        if let Some(tdom) = self.tdom {
            figure.tdom = tdom;
        }
        if let Some(display) = self.display {
            figure.display = display;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: u8, cols: u8) -> GridShape {
        GridShape::new(rows, cols).unwrap()
    }

    #[test]
    fn test_subplot_spec_validation() {
        let ok = SubplotSpec::new("21", ["t", "v"], LayerSelection::All).build(grid(2, 1));
        assert!(ok.is_ok());

        let outside = SubplotSpec::new("12", ["t", "v"], LayerSelection::All).build(grid(2, 1));
        assert!(matches!(outside, Err(SceneError::InvalidArgument(_))));

        let four = SubplotSpec::new("11", ["a", "b", "c", "d"], LayerSelection::All).build(grid(1, 1));
        assert!(four.is_err());

        let flat3 = SubplotSpec::new("11", ["x", "y", "z"], LayerSelection::All).build(grid(1, 1));
        assert!(flat3.is_err());

        let proj3 = SubplotSpec::new("11", ["x", "y", "z"], LayerSelection::All)
            .projection(Projection::ThreeD)
            .build(grid(1, 1));
        assert!(proj3.is_ok());
    }

    #[test]
    fn test_time_plot_detection() {
        let sp = SubplotSpec::new("11", ["Time", "v"], LayerSelection::All)
            .build(grid(1, 1))
            .unwrap();
        assert!(sp.is_time_plot());
        let sp = SubplotSpec::new("11", ["x", "t"], LayerSelection::All)
            .build(grid(1, 1))
            .unwrap();
        assert!(!sp.is_time_plot());
    }

    #[test]
    fn test_first_listing_uses_arrangement_order() {
        let arrange = vec![
            SubplotSpec::new("12", ["x", "y"], LayerSelection::named(["a", "b"]))
                .build(grid(1, 2))
                .unwrap(),
            SubplotSpec::new("11", ["x", "y"], LayerSelection::named(["b"]))
                .build(grid(1, 2))
                .unwrap(),
        ];
        assert_eq!(first_listing(&arrange, "b"), Some("12".parse().unwrap()));
        assert_eq!(first_listing(&arrange, "c"), None);
    }

    #[test]
    fn test_default_subplot_uses_labels() {
        let fig = Figure::from_spec(
            FigureSpec::new("F").labels("t", ""),
            Domain::new([0.0, 1.0], [0.0, 1.0]),
            1,
        );
        assert_eq!(fig.subplots().len(), 1);
        assert_eq!(fig.subplots()[0].axes_vars, vec!["t", "y"]);
        assert_eq!(fig.subplots()[0].layers, LayerSelection::All);
    }
}

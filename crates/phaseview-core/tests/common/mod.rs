//! Shared fixtures for phaseview-core integration tests

#![allow(dead_code)]

use std::path::Path;

use phaseview_core::error::RenderResult;
use phaseview_core::render::{AxesSpec, SliderSpec};
use phaseview_core::{
    AxesId, AxisScale, Controller, Coords, DataSpec, FigureSpec, HandleId, LayerSelection, LayerSpec, Plotter,
    PositionCode, Primitive, RecordingBackend, RenderBackend, RenderError, SampleSet, SceneModel, Style,
    SubplotSpec, ViewerConfig, WidgetId,
};
use phaseview_geom::{Domain, Point2};

/// Figure "F" on [-1,1]², layer "L" holding one entry `x=[0,1,2], y=[0,1,4]`
pub fn figure_f() -> SceneModel {
    let mut scene = SceneModel::new();
    scene
        .add_figure(FigureSpec::new("F").domain(Domain::new([-1.0, 1.0], [-1.0, 1.0])))
        .unwrap();
    scene.add_layer(None, LayerSpec::new("L").kind("data")).unwrap();
    scene
        .add_data(
            None,
            Some("L"),
            DataSpec::points(Coords::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 4.0]).unwrap()),
        )
        .unwrap();
    scene
}

/// Unit circle sampled at times 0, 0.1, ..., (n-1)/10
pub fn circle_samples(n: usize) -> SampleSet {
    let t: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
    let x = t.iter().map(|t| t.cos()).collect();
    let y = t.iter().map(|t| t.sin()).collect();
    SampleSet::new(x, y).unwrap().with_time(t).unwrap()
}

/// Master figure with a phase plot "11" (layers orbit and state) and a time
/// plot "12" (layer series), all with callbacks enabled
pub fn master_controller(samples: &SampleSet) -> Controller<RecordingBackend> {
    master_controller_with(RecordingBackend::new(), samples)
}

/// [`master_controller`] over any backend
pub fn master_controller_with<B: RenderBackend>(backend: B, samples: &SampleSet) -> Controller<B> {
    let config = ViewerConfig::default();
    let mut plotter = Plotter::new(backend, &config);
    let x = samples.column("x").unwrap().to_vec();
    let y = samples.column("y").unwrap().to_vec();
    let t = samples.times().unwrap().to_vec();

    let scene = plotter.scene_mut();
    scene
        .add_figure(FigureSpec::new("master").domain(Domain::new([-1.5, 1.5], [-1.5, 1.5])))
        .unwrap();
    scene.add_layer(None, LayerSpec::new("orbit")).unwrap();
    scene
        .add_data(None, None, DataSpec::points(Coords::new(x.clone(), y.clone()).unwrap()).name("orbit"))
        .unwrap();
    scene.add_layer(None, LayerSpec::new("state")).unwrap();
    scene
        .add_data(None, None, DataSpec::points(Coords::new(vec![x[0]], vec![y[0]]).unwrap()).name("state"))
        .unwrap();
    scene.add_layer(None, LayerSpec::new("series")).unwrap();
    scene
        .add_data(None, None, DataSpec::points(Coords::new(t, x).unwrap()).name("x"))
        .unwrap();
    scene
        .arrange_figure(
            None,
            1,
            2,
            vec![
                SubplotSpec::new("11", ["x", "y"], LayerSelection::named(["orbit", "state"])).callbacks(true),
                SubplotSpec::new("12", ["t", "x"], LayerSelection::named(["series"])).callbacks(true),
            ],
        )
        .unwrap();

    let mut controller = Controller::new(plotter, &config).unwrap();
    controller.add_trajectory(samples, None).unwrap();
    controller
}

pub fn axes_at<B: RenderBackend>(controller: &Controller<B>, figure: &str, position: &str) -> AxesId {
    let position: PositionCode = position.parse().unwrap();
    controller
        .plotter()
        .scene()
        .figure(figure)
        .unwrap()
        .subplot(position)
        .unwrap()
        .surface()
        .unwrap()
}

/// Recording backend that refuses selected requests on demand
#[derive(Debug, Default)]
pub struct FlakyBackend {
    pub inner: RecordingBackend,
    pub fail_set_data: bool,
    pub fail_remove: bool,
}

fn refused(what: &str) -> RenderError {
    RenderError::Backend {
        message: format!("{} refused", what),
    }
}

impl RenderBackend for FlakyBackend {
    fn open_surface(&mut self, surface: u32, title: &str) -> RenderResult<()> {
        self.inner.open_surface(surface, title)
    }

    fn close_surface(&mut self, surface: u32) -> RenderResult<()> {
        self.inner.close_surface(surface)
    }

    fn clear_axes(&mut self, surface: u32) -> RenderResult<()> {
        self.inner.clear_axes(surface)
    }

    fn add_axes(&mut self, surface: u32, spec: &AxesSpec) -> RenderResult<AxesId> {
        self.inner.add_axes(surface, spec)
    }

    fn draw(&mut self, axes: AxesId, primitive: &Primitive, style: &Style) -> RenderResult<HandleId> {
        self.inner.draw(axes, primitive, style)
    }

    fn set_visible(&mut self, handle: HandleId, visible: bool) -> RenderResult<()> {
        self.inner.set_visible(handle, visible)
    }

    fn set_data(&mut self, handle: HandleId, coords: &Coords) -> RenderResult<()> {
        if self.fail_set_data {
            return Err(refused("set_data"));
        }
        self.inner.set_data(handle, coords)
    }

    fn set_text(&mut self, handle: HandleId, text: &str, position: Option<Point2>) -> RenderResult<()> {
        self.inner.set_text(handle, text, position)
    }

    fn remove(&mut self, handle: HandleId) -> RenderResult<()> {
        if self.fail_remove {
            return Err(refused("remove"));
        }
        self.inner.remove(handle)
    }

    fn clear_lines(&mut self, axes: AxesId) -> RenderResult<()> {
        self.inner.clear_lines(axes)
    }

    fn set_limits(&mut self, axes: AxesId, scale: &AxisScale) -> RenderResult<()> {
        self.inner.set_limits(axes, scale)
    }

    fn add_slider(&mut self, surface: u32, spec: &SliderSpec) -> RenderResult<WidgetId> {
        self.inner.add_slider(surface, spec)
    }

    fn set_slider_value(&mut self, widget: WidgetId, value: f64) -> RenderResult<()> {
        self.inner.set_slider_value(widget, value)
    }

    fn add_button(&mut self, surface: u32, label: &str) -> RenderResult<WidgetId> {
        self.inner.add_button(surface, label)
    }

    fn redraw(&mut self, surface: u32) -> RenderResult<()> {
        self.inner.redraw(surface)
    }

    fn save_image(&mut self, surface: u32, path: &Path, format: &str) -> RenderResult<()> {
        self.inner.save_image(surface, path, format)
    }
}

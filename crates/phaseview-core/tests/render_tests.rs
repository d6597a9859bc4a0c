//! Render synchronization against the recording backend

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{axes_at, circle_samples, figure_f, master_controller};
use phaseview_core::{
    AxisScale, DisplayTarget, LayerSpec, Plotter, Primitive, RecordingBackend, RenderError, RenderSync, SyncOptions,
    SyncReport, ViewerConfig,
};
use phaseview_geom::Point2;

#[test]
fn test_second_pass_reuses_every_handle() {
    let mut scene = figure_f();
    let mut backend = RecordingBackend::new();
    let mut sync = RenderSync::new();

    let first = sync
        .sync_figure(&mut scene, &mut backend, "F", SyncOptions::incremental())
        .unwrap();
    assert_eq!(first.axes_created, 1);
    assert_eq!(first.handles_created, 1);
    let count = backend.primitive_count();

    let second = sync
        .sync_figure(&mut scene, &mut backend, "F", SyncOptions::incremental())
        .unwrap();
    assert_eq!(second, SyncReport::default());
    assert_eq!(backend.primitive_count(), count);
}

#[test]
fn test_hidden_layer_keeps_its_handle() {
    let mut scene = figure_f();
    let mut backend = RecordingBackend::new();
    let mut sync = RenderSync::new();
    sync.sync_figure(&mut scene, &mut backend, "F", SyncOptions::incremental())
        .unwrap();
    let name = scene.layer(None, "L").unwrap().entries()[0].name.clone();
    let handle = scene.layer(None, "L").unwrap().handles(&name).unwrap()[0];

    scene.toggle_display(None, DisplayTarget::layer("L")).unwrap();
    sync.sync_figure(&mut scene, &mut backend, "F", SyncOptions::incremental())
        .unwrap();
    assert!(!backend.primitive(handle).unwrap().visible);

    scene.toggle_display(None, DisplayTarget::layer("L")).unwrap();
    let report = sync
        .sync_figure(&mut scene, &mut backend, "F", SyncOptions::incremental())
        .unwrap();
    assert_eq!(report.handles_created, 0);
    assert!(backend.primitive(handle).unwrap().visible);
}

#[test]
fn test_rebuild_replaces_axes_and_handles() {
    let mut scene = figure_f();
    let mut backend = RecordingBackend::new();
    let mut sync = RenderSync::new();
    sync.sync_figure(&mut scene, &mut backend, "F", SyncOptions::incremental())
        .unwrap();
    let old_axes = scene.figure("F").unwrap().subplots()[0].surface().unwrap();

    let report = sync
        .sync_figure(&mut scene, &mut backend, "F", SyncOptions::rebuild())
        .unwrap();
    assert_eq!(report.axes_created, 1);
    assert_eq!(report.handles_created, 1);
    let new_axes = scene.figure("F").unwrap().subplots()[0].surface().unwrap();
    assert_ne!(old_axes, new_axes);
    assert!(backend.axes(old_axes).is_none());
}

#[test]
fn test_rescale_applies_limits() {
    let mut scene = figure_f();
    let mut backend = RecordingBackend::new();
    let mut sync = RenderSync::new();
    let scale = AxisScale::new([0.0, 3.0], [-2.0, 5.0]);
    sync.sync_figure(
        &mut scene,
        &mut backend,
        "F",
        SyncOptions {
            rebuild: false,
            rescale: Some(scale),
        },
    )
    .unwrap();
    let axes = scene.figure("F").unwrap().subplots()[0].surface().unwrap();
    assert_eq!(backend.axes(axes).unwrap().limits, scale);
}

#[test]
fn test_set_point_updates_live_handle() {
    let config = ViewerConfig::default();
    let mut plotter = Plotter::new(RecordingBackend::new(), &config);
    *plotter.scene_mut() = figure_f();
    plotter.render_figure("F", SyncOptions::incremental()).unwrap();
    let name = plotter.scene().layer(None, "L").unwrap().entries()[0].name.clone();
    let handle = plotter.scene().layer(None, "L").unwrap().handles(&name).unwrap()[0];

    plotter
        .set_point(Some("F"), "L", &name, Point2::new(0.25, -0.5))
        .unwrap();
    let recorded = plotter.backend().primitive(handle).unwrap();
    assert_eq!(
        recorded.primitive,
        Primitive::Line {
            x: vec![0.25],
            y: vec![-0.5]
        }
    );
    assert_eq!(recorded.updates, 1);
}

#[test]
fn test_rebuild_refused_during_dynamic_dispatch() {
    let samples = circle_samples(20);
    let mut controller = master_controller(&samples);
    let seen: Rc<RefCell<Vec<bool>>> = Rc::new(RefCell::new(Vec::new()));

    let log = Rc::clone(&seen);
    controller
        .add_dynamic_plot(Some("master"), "state", move |plotter, _t, _hard_reset| {
            let rebuild = plotter.render_figure("master", SyncOptions::rebuild());
            log.borrow_mut()
                .push(matches!(rebuild, Err(RenderError::Reentrant { .. })));
            let incremental = plotter.render_figure("master", SyncOptions::incremental());
            log.borrow_mut().push(incremental.is_ok());
            Ok(())
        })
        .unwrap();
    controller.build_gui().unwrap();

    assert_eq!(*seen.borrow(), vec![true, true]);
    // the figure is usable again once dispatch ends
    let axes = axes_at(&controller, "master", "11");
    assert!(controller.plotter().backend().axes(axes).is_some());
}

#[test]
fn test_line_kind_layers_are_drawn_as_lines() {
    let mut scene = figure_f();
    scene.add_layer(None, LayerSpec::new("V").kind("vline")).unwrap();
    scene.add_vline(None, "V", 0.5, None, Some("v"), None).unwrap();
    scene.add_layer(None, LayerSpec::new("E").kind("epoch")).unwrap();
    scene.add_hline(None, "E", 0.25, None, Some("h")).unwrap();
    let mut backend = RecordingBackend::new();
    let mut sync = RenderSync::new();

    let report = sync
        .sync_figure(&mut scene, &mut backend, "F", SyncOptions::incremental())
        .unwrap();
    assert_eq!(report.handles_created, 3);
    assert_eq!(report.skipped, 0);

    let vline = scene.layer(None, "V").unwrap().handles("v").unwrap()[0];
    assert_eq!(
        backend.primitive(vline).unwrap().primitive,
        Primitive::Line {
            x: vec![0.5, 0.5],
            y: vec![-1.0, 1.0]
        }
    );
    let hline = scene.layer(None, "E").unwrap().handles("h").unwrap()[0];
    assert_eq!(
        backend.primitive(hline).unwrap().primitive,
        Primitive::Line {
            x: vec![-1.0, 1.0],
            y: vec![0.25, 0.25]
        }
    );
}

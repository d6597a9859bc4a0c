//! phaseview demo - scripted exploration of a damped oscillator
//!
//! Builds a phase-plane and time-series figure, then replays the key,
//! pointer and widget events a user would produce against the recording
//! backend. Captured points and model contributions are printed as JSON.

use phaseview_core::{
    AxesId, ContextObject, Controller, CrossingDirection, DomainGrower, FigureSpec, Key, KeyEvent, LayerSelection,
    LayerSpec, ModelContribution, Outcome, PhaseviewResult, Plotter, PointerEvent, ProbeOutput, RecordingBackend,
    SampleSet, SubplotSpec, ViewerConfig, WidgetEvent,
};
use phaseview_core::{Coords, DataSpec, PositionCode};
use phaseview_geom::{Domain, Point2};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Samples of x'' + 0.2 x' + x = 0 from (1, 0)
fn damped_oscillator(steps: usize, dt: f64) -> Result<SampleSet, Box<dyn std::error::Error>> {
    let (zeta, omega) = (0.1_f64, (1.0_f64 - 0.01).sqrt());
    let mut t = Vec::with_capacity(steps);
    let mut x = Vec::with_capacity(steps);
    let mut y = Vec::with_capacity(steps);
    for i in 0..steps {
        let ti = i as f64 * dt;
        let decay = (-zeta * ti).exp();
        let (s, c) = (omega * ti).sin_cos();
        t.push(ti);
        x.push(decay * (c + zeta / omega * s));
        y.push(-decay * s / omega);
    }
    Ok(SampleSet::new(x, y)?.with_time(t)?)
}

/// Grows a circular region around the seed
struct CircleGrower {
    vertices: usize,
}

impl DomainGrower for CircleGrower {
    fn grow(&mut self, seed: Point2, radius: f64) -> PhaseviewResult<Vec<Point2>> {
        let n = self.vertices;
        Ok((0..=n)
            .map(|i| {
                let a = std::f64::consts::TAU * i as f64 / n as f64;
                Point2::new(seed.x + radius * a.cos(), seed.y + radius * a.sin())
            })
            .collect())
    }
}

fn axes_at(controller: &Controller<RecordingBackend>, figure: &str, position: &str) -> Option<AxesId> {
    let position: PositionCode = position.parse().ok()?;
    controller
        .plotter()
        .scene()
        .figure(figure)?
        .subplot(position)?
        .surface()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ViewerConfig::load_or_default();
    let master = config.interaction.master_figure.clone();
    let samples = damped_oscillator(400, 0.05)?;
    let (xs, ys, ts) = (
        samples.column("x").unwrap_or_default().to_vec(),
        samples.column("y").unwrap_or_default().to_vec(),
        samples.times().unwrap_or_default().to_vec(),
    );

    // Scene: phase plane on the left, x(t) on the right
    let mut plotter = Plotter::new(RecordingBackend::new(), &config);
    let scene = plotter.scene_mut();
    scene.add_figure(
        FigureSpec::new(&master)
            .domain(Domain::new([-1.2, 1.2], [-1.2, 1.2]))
            .title("Damped oscillator"),
    )?;
    scene.add_layer(None, LayerSpec::new("orbit").style("b-"))?;
    scene.add_data(None, None, DataSpec::points(Coords::new(xs.clone(), ys.clone())?).name("orbit"))?;
    scene.add_layer(None, LayerSpec::new("state").style("ko"))?;
    scene.add_point(None, None, Point2::new(xs[0], ys[0]), None, Some("state"))?;
    scene.add_layer(None, LayerSpec::new("series").style("g-"))?;
    scene.add_data(None, None, DataSpec::points(Coords::new(ts.clone(), xs.clone())?).name("x"))?;
    scene.arrange_figure(
        None,
        1,
        2,
        vec![
            SubplotSpec::new("11", ["x", "y"], LayerSelection::named(["orbit", "state"]))
                .name("phase")
                .callbacks(true),
            SubplotSpec::new("12", ["t", "x"], LayerSelection::named(["series"]))
                .name("time")
                .callbacks(true),
        ],
    )?;

    let mut controller = Controller::new(plotter, &config)?;
    controller.add_trajectory(&samples, None)?;
    controller.assign_user_function(|p| {
        let mut output = ProbeOutput::default();
        output.scalars.insert("energy".to_string(), 0.5 * (p.x * p.x + p.y * p.y));
        output.vectors.insert("field".to_string(), vec![p.y, -p.x - 0.2 * p.y]);
        Ok(output)
    });
    controller.assign_domain_grower(CircleGrower { vertices: 32 });
    {
        let figure = master.clone();
        let (xs, ys, ts) = (xs.clone(), ys.clone(), ts.clone());
        controller.add_dynamic_plot(Some(&master), "state", move |plotter, t, _hard_reset| {
            let i = ts.partition_point(|&s| s < t).min(ts.len() - 1);
            plotter.set_point(Some(&figure), "state", "state", Point2::new(xs[i], ys[i]))
        })?;
    }
    controller.build_gui()?;

    let phase = axes_at(&controller, &master, "11").ok_or("phase axes missing")?;
    let time = axes_at(&controller, &master, "12").ok_or("time axes missing")?;
    let widgets = *controller.widgets();
    let plus_dt = widgets.plus_dt.ok_or("no +dt button")?;
    let capture = widgets.capture.ok_or("no capture button")?;

    let script: Vec<phaseview_core::UiEvent> = vec![
        // snap to the trajectory near its start
        KeyEvent::pressed(Key::Char('s')).into(),
        PointerEvent::press(phase, 0.98, 0.02).into(),
        PointerEvent::release(phase, 0.98, 0.02).into(),
        // probe the user function
        KeyEvent::pressed(Key::Space).into(),
        PointerEvent::release(phase, 0.3, -0.4).into(),
        // draw a line of interest across the x axis
        KeyEvent::pressed(Key::Char('l')).into(),
        PointerEvent::press(phase, 0.5, -1.0).into(),
        PointerEvent::moved(phase, 0.5, 0.0).into(),
        PointerEvent::release(phase, 0.5, 1.0).into(),
        // scrub time
        PointerEvent::press(time, 3.0, 0.0).into(),
        PointerEvent::release(time, 3.0, 0.0).into(),
        KeyEvent::pressed(Key::Shift).into(),
        WidgetEvent::Clicked { widget: plus_dt }.into(),
        KeyEvent::released(Key::Shift).into(),
        WidgetEvent::Clicked { widget: capture }.into(),
        // grow a domain around the origin
        KeyEvent::pressed(Key::Char('.')).into(),
        PointerEvent::release(phase, 0.0, 0.0).into(),
        PointerEvent::release(phase, 0.25, 0.0).into(),
    ];

    let mut created = Vec::new();
    for event in script {
        let outcome = controller.handle_event(event);
        if let Outcome::ContextCreated(id) = outcome {
            created.push(id);
        }
        if !matches!(outcome, Outcome::Ignored | Outcome::Handled) {
            info!(?outcome, mode = %controller.mode(), "event handled");
        }
    }

    for id in created {
        if let Some(line) = controller.context_mut().get_mut(id).and_then(ContextObject::as_line_mut) {
            line.make_event_def("cross_half", CrossingDirection::Increasing);
            info!("{}", line);
        }
    }
    let mut model: Vec<ModelContribution> = Vec::new();
    let contributed = controller.context_mut().contribute(&mut model);
    info!(contributed, "model contributions collected");

    println!("{}", serde_json::to_string_pretty(controller.captured())?);
    println!("{}", serde_json::to_string_pretty(&model)?);

    let backend = controller.into_plotter().into_backend();
    info!(
        primitives = backend.primitive_count(),
        widgets = backend.widgets().count(),
        "session finished"
    );
    Ok(())
}

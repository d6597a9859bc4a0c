//! Time-indexed playback
//!
//! A shared current time snapped to the nearest sample, the vertical time
//! markers that show it, and the slider bound to it.

use tracing::{debug, warn};

use crate::config::PlaybackConfig;
use crate::error::RenderResult;
use crate::input::Modifiers;
use crate::render::{AxesId, HandleId, Primitive, RenderBackend, WidgetId};
use crate::scene::Coords;
use crate::style::Style;

/// Current time over an external array of sample times
#[derive(Debug, Default)]
pub struct TimePlayback {
    times: Vec<f64>,
    t: Option<f64>,
    ix: Option<usize>,
    last_ix: Option<usize>,
    markers: Vec<HandleId>,
    slider: Option<WidgetId>,
    slider_value: Option<f64>,
    config: PlaybackConfig,
}

impl TimePlayback {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Replace the sample times; the current time is reset
    pub fn set_times(&mut self, times: Vec<f64>) {
        self.times = times;
        self.t = None;
        self.ix = None;
        self.last_ix = None;
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn has_times(&self) -> bool {
        !self.times.is_empty()
    }

    pub fn t(&self) -> Option<f64> {
        self.t
    }

    pub fn ix(&self) -> Option<usize> {
        self.ix
    }

    pub fn last_ix(&self) -> Option<usize> {
        self.last_ix
    }

    /// `(min, max)` of the sample times
    pub fn range(&self) -> Option<(f64, f64)> {
        let min = self.times.iter().copied().reduce(f64::min)?;
        let max = self.times.iter().copied().reduce(f64::max)?;
        Some((min, max))
    }

    pub fn markers(&self) -> &[HandleId] {
        &self.markers
    }

    pub fn slider(&self) -> Option<WidgetId> {
        self.slider
    }

    /// Index of the sample time closest to `t`; ties go to the lower index
    ///
    /// NaN sample times are skipped; a non-finite `t` has no nearest sample.
    pub fn nearest_index(&self, t: f64) -> Option<usize> {
        if !t.is_finite() {
            return None;
        }
        let mut best: Option<(usize, f64)> = None;
        for (i, &sample) in self.times.iter().enumerate() {
            if sample.is_nan() {
                continue;
            }
            let d = (sample - t).abs();
            match best {
                Some((_, bd)) if d >= bd => {}
                _ => best = Some((i, d)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Move the current time to the sample nearest `t`
    ///
    /// Returns `false`, without touching markers or slider, if the nearest
    /// sample is already current. Markers and slider are moved before the
    /// current time changes; if the backend fails, the time stays put.
    pub fn set_time<B: RenderBackend>(&mut self, backend: &mut B, t: f64) -> RenderResult<bool> {
        let Some(ix) = self.nearest_index(t) else {
            warn!(t, "no usable sample time; time not set");
            return Ok(false);
        };
        if self.ix == Some(ix) {
            return Ok(false);
        }
        let snapped = self.times[ix];

        let span = Coords::new(vec![snapped, snapped], vec![0.0, 1.0])?;
        for &marker in &self.markers {
            backend.set_data(marker, &span)?;
        }
        if let Some(slider) = self.slider {
            if self.slider_value != Some(snapped) {
                backend.set_slider_value(slider, snapped)?;
                self.slider_value = Some(snapped);
            }
        }

        self.last_ix = self.ix;
        self.ix = Some(ix);
        self.t = Some(snapped);
        debug!(t = snapped, ix, "time set");
        Ok(true)
    }

    /// Step the index forward or back by the modifier-dependent delta,
    /// clamped to the valid range
    pub fn step<B: RenderBackend>(&mut self, backend: &mut B, forward: bool, modifiers: Modifiers) -> RenderResult<bool> {
        let (Some(ix), Some(last)) = (self.ix, self.times.len().checked_sub(1)) else {
            return Ok(false);
        };
        let delta = self.config.step_for(modifiers);
        let target = if forward {
            ix.saturating_add(delta).min(last)
        } else {
            ix.saturating_sub(delta)
        };
        if target == ix {
            return Ok(false);
        }
        let t = self.times[target];
        self.set_time(backend, t)
    }

    pub fn plus_dt<B: RenderBackend>(&mut self, backend: &mut B, modifiers: Modifiers) -> RenderResult<bool> {
        self.step(backend, true, modifiers)
    }

    pub fn minus_dt<B: RenderBackend>(&mut self, backend: &mut B, modifiers: Modifiers) -> RenderResult<bool> {
        self.step(backend, false, modifiers)
    }

    /// Time of the previously current index, if any
    pub fn previous_time(&self) -> Option<f64> {
        self.last_ix.map(|i| self.times[i])
    }

    pub fn go_back<B: RenderBackend>(&mut self, backend: &mut B) -> RenderResult<bool> {
        match self.previous_time() {
            Some(t) => self.set_time(backend, t),
            None => Ok(false),
        }
    }

    /// Draw a vertical time marker on `axes` at the current time
    pub fn add_marker<B: RenderBackend>(&mut self, backend: &mut B, axes: AxesId, style: &Style) -> RenderResult<HandleId> {
        let x = self.t.unwrap_or_default();
        let handle = backend.draw(axes, &Primitive::VerticalMarker { x }, style)?;
        self.markers.push(handle);
        Ok(handle)
    }

    /// Bind the time slider
    pub fn attach_slider(&mut self, slider: WidgetId, value: f64) {
        self.slider = Some(slider);
        self.slider_value = Some(value);
    }

    /// Record a value the user moved the slider to
    pub fn slider_moved(&mut self, value: f64) {
        self.slider_value = Some(value);
    }

    /// Forget markers whose axes were torn down
    pub fn clear_markers(&mut self) {
        self.markers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{AxesSpec, RecordingBackend, SliderSpec, WidgetKind};
    use crate::types::{GridShape, PositionCode, Projection};

    fn playback(times: &[f64]) -> TimePlayback {
        let mut playback = TimePlayback::new(PlaybackConfig::default());
        playback.set_times(times.to_vec());
        playback
    }

    fn backend_with_axes() -> (RecordingBackend, AxesId) {
        let mut backend = RecordingBackend::new();
        backend.open_surface(1, "master").unwrap();
        let axes = backend
            .add_axes(
                1,
                &AxesSpec {
                    shape: GridShape::default(),
                    position: PositionCode::new(1, 1).unwrap(),
                    title: String::new(),
                    labels: vec!["t".into(), "x".into()],
                    projection: Projection::Planar,
                },
            )
            .unwrap();
        (backend, axes)
    }

    #[test]
    fn test_nearest_index() {
        let playback = playback(&[0.0, 0.5, 1.0, 1.5]);
        assert_eq!(playback.nearest_index(0.9), Some(2));
        assert_eq!(playback.nearest_index(-3.0), Some(0));
        assert_eq!(playback.nearest_index(7.0), Some(3));
        // equidistant: first occurrence wins
        assert_eq!(playback.nearest_index(0.25), Some(0));
        assert_eq!(playback.nearest_index(0.75), Some(1));
        assert_eq!(TimePlayback::default().nearest_index(1.0), None);
    }

    #[test]
    fn test_nearest_index_ignores_nan() {
        assert_eq!(playback(&[f64::NAN]).nearest_index(0.0), None);
        let playback = playback(&[0.0, f64::NAN, 1.0, f64::NAN]);
        assert_eq!(playback.nearest_index(0.9), Some(2));
        assert_eq!(playback.nearest_index(0.1), Some(0));
        assert_eq!(playback.nearest_index(f64::NAN), None);
        assert_eq!(playback.nearest_index(f64::INFINITY), None);
    }

    #[test]
    fn test_set_time_non_finite_is_noop() {
        let mut backend = RecordingBackend::new();
        let mut playback = playback(&[0.0, 0.5]);
        playback.set_time(&mut backend, 0.5).unwrap();
        assert!(!playback.set_time(&mut backend, f64::NAN).unwrap());
        assert_eq!(playback.ix(), Some(1));
    }

    #[test]
    fn test_failed_marker_update_keeps_time() {
        let (mut backend, axes) = backend_with_axes();
        let mut playback = playback(&[0.0, 0.5, 1.0]);
        playback.set_time(&mut backend, 0.0).unwrap();
        playback.set_time(&mut backend, 0.5).unwrap();
        let marker = playback
            .add_marker(&mut backend, axes, &Style::from("r--"))
            .unwrap();
        // the marker's axes are torn down behind the playback's back
        backend.clear_axes(1).unwrap();
        assert!(backend.primitive(marker).is_none());

        assert!(playback.set_time(&mut backend, 1.0).is_err());
        assert_eq!(playback.ix(), Some(1));
        assert_eq!(playback.t(), Some(0.5));
        assert_eq!(playback.last_ix(), Some(0));
        assert_eq!(playback.previous_time(), Some(0.0));

        // once the stale marker is forgotten, time moves again
        playback.clear_markers();
        assert!(playback.set_time(&mut backend, 1.0).unwrap());
        assert_eq!(playback.ix(), Some(2));
    }

    #[test]
    fn test_set_time_snaps_and_remembers_previous() {
        let mut backend = RecordingBackend::new();
        let mut playback = playback(&[0.0, 0.5, 1.0, 1.5]);

        assert!(playback.set_time(&mut backend, 0.9).unwrap());
        assert_eq!(playback.ix(), Some(2));
        assert_eq!(playback.t(), Some(1.0));
        assert_eq!(playback.last_ix(), None);

        assert!(playback.set_time(&mut backend, 0.1).unwrap());
        assert_eq!(playback.last_ix(), Some(2));
        // same index again is a no-op
        assert!(!playback.set_time(&mut backend, 0.05).unwrap());
        assert_eq!(playback.last_ix(), Some(2));
    }

    #[test]
    fn test_set_time_moves_markers_and_slider() {
        let (mut backend, axes) = backend_with_axes();
        let mut playback = playback(&[0.0, 0.5, 1.0]);
        let marker = playback
            .add_marker(&mut backend, axes, &Style::from("r--"))
            .unwrap();
        let slider = backend
            .add_slider(
                1,
                &SliderSpec {
                    label: "Time".into(),
                    min: 0.0,
                    max: 1.0,
                    initial: 0.0,
                },
            )
            .unwrap();
        playback.attach_slider(slider, 0.0);

        playback.set_time(&mut backend, 0.6).unwrap();
        assert_eq!(
            backend.primitive(marker).unwrap().primitive,
            Primitive::VerticalMarker { x: 0.5 }
        );
        assert!(matches!(
            backend.widget(slider).unwrap().kind,
            WidgetKind::Slider { value, .. } if value == 0.5
        ));
    }

    #[test]
    fn test_step_clamps_with_modifiers() {
        let mut backend = RecordingBackend::new();
        let times: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let mut playback = playback(&times);
        playback.set_time(&mut backend, 2.0).unwrap();

        playback.plus_dt(&mut backend, Modifiers::new()).unwrap();
        assert_eq!(playback.ix(), Some(7));
        playback.plus_dt(&mut backend, Modifiers::new().with_shift()).unwrap();
        assert_eq!(playback.ix(), Some(17));
        playback.plus_dt(&mut backend, Modifiers::new()).unwrap();
        assert_eq!(playback.ix(), Some(19));
        assert!(!playback.plus_dt(&mut backend, Modifiers::new()).unwrap());

        playback.minus_dt(&mut backend, Modifiers::new().with_ctrl()).unwrap();
        assert_eq!(playback.ix(), Some(18));
        playback.minus_dt(&mut backend, Modifiers::new().with_shift()).unwrap();
        playback.minus_dt(&mut backend, Modifiers::new().with_shift()).unwrap();
        assert_eq!(playback.ix(), Some(0));
    }

    #[test]
    fn test_step_without_current_time_is_noop() {
        let mut backend = RecordingBackend::new();
        let mut playback = playback(&[0.0, 1.0]);
        assert!(!playback.plus_dt(&mut backend, Modifiers::new()).unwrap());
        assert_eq!(playback.ix(), None);
    }

    #[test]
    fn test_go_back() {
        let mut backend = RecordingBackend::new();
        let mut playback = playback(&[0.0, 0.5, 1.0]);
        assert!(!playback.go_back(&mut backend).unwrap());

        playback.set_time(&mut backend, 0.0).unwrap();
        playback.set_time(&mut backend, 1.0).unwrap();
        assert!(playback.go_back(&mut backend).unwrap());
        assert_eq!(playback.t(), Some(0.0));
        assert_eq!(playback.last_ix(), Some(2));
    }

    #[test]
    fn test_range() {
        assert_eq!(playback(&[0.5, 1.0, 3.0]).range(), Some((0.5, 3.0)));
        assert_eq!(TimePlayback::default().range(), None);
    }
}

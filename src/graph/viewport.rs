use crate::graph::{Extent, GraphConfig};

/// Width of the visible time window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeWindow {
    /// Everything recorded so far; pan is ignored.
    Full,
    Seconds(f64),
}
/// Zoom and pan state of the live graph.
///
/// Zooming in from `Full` starts from the configured default window rather
/// than from half of the recorded span, and zooming out collapses back to
/// `Full` once the doubled window reaches the span. The two commands are
/// therefore not inverses around the full view.
#[derive(Clone, Debug)]
pub struct ViewportController {
    window: TimeWindow,
    pan_percent: f64,
    default_window_secs: f64,
    min_window_secs: f64,
}
impl ViewportController {
    pub fn new(default_window_secs: f64, min_window_secs: f64) -> Self {
        Self {
            window: TimeWindow::Seconds(default_window_secs),
            pan_percent: 0.0,
            default_window_secs,
            min_window_secs,
        }
    }
    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.default_window_secs, config.min_window_secs)
    }
    #[cfg(test)]
    pub fn window(&self) -> TimeWindow {
        self.window
    }
    pub fn pan_percent(&self) -> f64 {
        self.pan_percent
    }
    pub fn reset(&mut self) {
        self.window = TimeWindow::Seconds(self.default_window_secs);
        self.pan_percent = 0.0;
    }
    /// Halves the window, never going below the minimum.
    pub fn zoom_in(&mut self) {
        let current = match self.window {
            TimeWindow::Full => self.default_window_secs,
            TimeWindow::Seconds(secs) => secs,
        };
        self.window = TimeWindow::Seconds((current / 2.0).max(self.min_window_secs));
    }
    /// Doubles the window, switching to the full view once it covers the
    /// recorded span. No-op without data or with a zero-length span.
    pub fn zoom_out(&mut self, extent: Option<Extent>) {
        let Some(extent) = extent else {
            return;
        };
        let span = extent.span();
        let TimeWindow::Seconds(secs) = self.window else {
            return;
        };
        if span <= 0.0 {
            return;
        }
        let doubled = secs * 2.0;
        self.window = if doubled >= span {
            TimeWindow::Full
        } else {
            TimeWindow::Seconds(doubled)
        };
    }
    /// Clamped into `0..=100`; NaN is ignored.
    pub fn set_pan_percent(&mut self, percent: f64) {
        if percent.is_nan() {
            return;
        }
        self.pan_percent = percent.clamp(0.0, 100.0);
    }
    /// Concrete `(tmin, tmax)` for the current window. Always `tmin < tmax`.
    pub fn visible_range(&self, extent: &Extent) -> (f64, f64) {
        let (tmin, mut tmax) = match self.window {
            TimeWindow::Full => (extent.min_t, extent.max_t),
            TimeWindow::Seconds(secs) => {
                let window = secs.min(extent.span());
                let start_max = extent.max_t - window;
                let tmin = if start_max <= extent.min_t {
                    extent.min_t
                } else {
                    extent.min_t + self.pan_percent / 100.0 * (start_max - extent.min_t)
                };
                (tmin, tmin + window)
            }
        };
        if tmax <= tmin {
            tmax = tmin + 1.0;
        }
        (tmin, tmax)
    }
    pub fn window_label(&self) -> String {
        match self.window {
            TimeWindow::Full => "Window: full".to_owned(),
            TimeWindow::Seconds(secs) => format!("Window: {:.2} min", secs / 60.0),
        }
    }
}
impl Default for ViewportController {
    fn default() -> Self {
        Self::from_config(&GraphConfig::default())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    fn extent(min_t: f64, max_t: f64) -> Extent {
        Extent {
            min_t,
            max_t,
            min_v: 0.0,
            max_v: 1.0,
        }
    }
    #[test]
    fn zoom_in_halves_down_to_floor() {
        let mut vp = ViewportController::default();
        vp.zoom_in();
        assert_eq!(vp.window(), TimeWindow::Seconds(150.0));
        for _ in 0..20 {
            vp.zoom_in();
        }
        assert_eq!(vp.window(), TimeWindow::Seconds(5.0));
    }
    #[test]
    fn zoom_in_from_full_restarts_at_default() {
        let mut vp = ViewportController::default();
        vp.zoom_out(Some(extent(0.0, 400.0)));
        assert_eq!(vp.window(), TimeWindow::Full);
        vp.zoom_in();
        assert_eq!(vp.window(), TimeWindow::Seconds(150.0));
    }
    #[test]
    fn zoom_out_doubles_then_collapses_to_full() {
        let mut vp = ViewportController::new(10.0, 5.0);
        let data = extent(0.0, 100.0);
        vp.zoom_out(Some(data));
        assert_eq!(vp.window(), TimeWindow::Seconds(20.0));
        vp.zoom_out(Some(data));
        vp.zoom_out(Some(data));
        assert_eq!(vp.window(), TimeWindow::Seconds(80.0));
        vp.zoom_out(Some(data));
        assert_eq!(vp.window(), TimeWindow::Full);
        vp.zoom_out(Some(data));
        assert_eq!(vp.window(), TimeWindow::Full);
    }
    #[test]
    fn zoom_out_without_span_is_noop() {
        let mut vp = ViewportController::default();
        vp.zoom_out(None);
        vp.zoom_out(Some(extent(4.0, 4.0)));
        assert_eq!(vp.window(), TimeWindow::Seconds(300.0));
    }
    #[test]
    fn zoom_sequences_stay_within_bounds() {
        let data = extent(0.0, 1000.0);
        let mut vp = ViewportController::default();
        for round in 0..30 {
            if round % 3 == 0 {
                vp.zoom_out(Some(data));
            } else {
                vp.zoom_in();
            }
            if let TimeWindow::Seconds(secs) = vp.window() {
                assert!(secs >= 5.0);
                assert!(secs < data.span());
            }
        }
        for _ in 0..20 {
            vp.zoom_out(Some(data));
        }
        assert_eq!(vp.window(), TimeWindow::Full);
    }
    #[test]
    fn full_window_shows_everything() {
        let mut vp = ViewportController::default();
        vp.zoom_out(Some(extent(0.0, 10.0)));
        vp.set_pan_percent(80.0);
        assert_eq!(vp.visible_range(&extent(2.0, 10.0)), (2.0, 10.0));
    }
    #[test]
    fn pan_moves_window_between_earliest_and_latest() {
        let mut vp = ViewportController::new(40.0, 5.0);
        let data = extent(0.0, 100.0);
        assert_eq!(vp.visible_range(&data), (0.0, 40.0));
        vp.set_pan_percent(50.0);
        assert_eq!(vp.visible_range(&data), (30.0, 70.0));
        vp.set_pan_percent(250.0);
        assert_eq!(vp.pan_percent(), 100.0);
        assert_eq!(vp.visible_range(&data), (60.0, 100.0));
        vp.set_pan_percent(f64::NAN);
        assert_eq!(vp.pan_percent(), 100.0);
    }
    #[test]
    fn window_wider_than_span_pins_to_start() {
        let mut vp = ViewportController::default();
        vp.set_pan_percent(100.0);
        assert_eq!(vp.visible_range(&extent(10.0, 70.0)), (10.0, 70.0));
    }
    #[test]
    fn visible_range_is_never_empty() {
        let vp = ViewportController::default();
        let (tmin, tmax) = vp.visible_range(&extent(42.0, 42.0));
        assert_eq!((tmin, tmax), (42.0, 43.0));
        let mut full = ViewportController::default();
        full.zoom_out(Some(extent(0.0, 1.0)));
        let (tmin, tmax) = full.visible_range(&extent(7.0, 7.0));
        assert!(tmin < tmax);
    }
    #[test]
    fn window_label_in_minutes() {
        let mut vp = ViewportController::default();
        assert_eq!(vp.window_label(), "Window: 5.00 min");
        vp.zoom_in();
        assert_eq!(vp.window_label(), "Window: 2.50 min");
        vp.zoom_out(Some(extent(0.0, 100.0)));
        assert_eq!(vp.window_label(), "Window: full");
    }
}

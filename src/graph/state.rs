use std::collections::BTreeMap;

use crate::graph::hover::{self, HoverEntry};
use crate::graph::{
    ChannelId, ChannelRegistry, CoordinateMapper, Extent, GraphConfig, PixelRect, PlotGeometry,
    Readings, TimeSeriesStore, TrendClassifier, TrendSummary, ViewportController,
};

/// Operator commands applied to the graph state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ViewCommand {
    ZoomIn,
    ZoomOut,
    SetPan(f64),
    SetVisible { channel: ChannelId, visible: bool },
}
/// Everything the live graph knows: channels, history, trends and view.
pub struct GraphState {
    config: GraphConfig,
    registry: ChannelRegistry,
    store: TimeSeriesStore,
    trends: TrendClassifier,
    viewport: ViewportController,
    mapper: CoordinateMapper,
    last_geometry: Option<PlotGeometry>,
    last_elapsed: Option<f64>,
}
impl GraphState {
    pub fn new(config: GraphConfig) -> Self {
        Self {
            registry: ChannelRegistry::default(),
            store: TimeSeriesStore::new(config.max_points),
            trends: TrendClassifier::new(config.trend_window, config.trend_threshold),
            viewport: ViewportController::from_config(&config),
            mapper: CoordinateMapper::new(config.min_plot_size),
            last_geometry: None,
            last_elapsed: None,
            config,
        }
    }
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }
    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }
    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }
    pub fn last_elapsed(&self) -> Option<f64> {
        self.last_elapsed
    }
    /// Starts a new run with the given channels; all history is discarded.
    pub fn set_channels(&mut self, channels: impl IntoIterator<Item = (ChannelId, String)>) {
        self.registry.reset(channels);
        self.store.clear();
        self.trends.reset(self.registry.iter().map(|e| e.id));
        self.viewport.reset();
        self.last_geometry = None;
        self.last_elapsed = None;
        log::info!("graph reset for {} channel(s)", self.registry.len());
    }
    /// One ingestion tick. Readings for unknown channels are ignored.
    pub fn add_sample(&mut self, elapsed_secs: f64, readings: &Readings) {
        if !elapsed_secs.is_finite() || elapsed_secs < 0.0 {
            log::warn!("dropping tick with invalid elapsed time {elapsed_secs}");
            return;
        }
        for id in readings.keys().filter(|id| !self.registry.contains(**id)) {
            log::trace!("ignoring reading for unregistered channel {id}");
        }
        for entry in self.registry.iter() {
            let value = readings.get(&entry.id).copied().flatten();
            self.store.append(entry.id, elapsed_secs, value);
            self.trends.update(entry.id, value);
        }
        self.last_elapsed = Some(elapsed_secs);
    }
    /// Pulls one tick from `source` and ingests it.
    #[cfg(test)]
    pub fn pump_once<S: crate::graph::ReadingSource>(
        &mut self,
        source: &mut S,
        elapsed_secs: f64,
    ) -> Result<(), crate::graph::GraphError> {
        let readings = source.read()?;
        self.add_sample(elapsed_secs, &readings);
        Ok(())
    }
    pub fn set_visible(&mut self, channel: ChannelId, visible: bool) {
        if !self.registry.set_visible(channel, visible) {
            log::debug!("visibility change for unknown channel {channel}");
        }
    }
    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }
    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out(self.store.global_extent());
    }
    pub fn set_pan_fraction(&mut self, percent: f64) {
        self.viewport.set_pan_percent(percent);
    }
    pub fn apply(&mut self, command: ViewCommand) {
        log::debug!("view command {command:?}");
        match command {
            ViewCommand::ZoomIn => self.zoom_in(),
            ViewCommand::ZoomOut => self.zoom_out(),
            ViewCommand::SetPan(percent) => self.set_pan_fraction(percent),
            ViewCommand::SetVisible { channel, visible } => self.set_visible(channel, visible),
        }
    }
    pub fn global_extent(&self) -> Option<Extent> {
        self.store.global_extent()
    }
    /// Visible time range for the current viewport, `None` without data.
    pub fn visible_range(&self) -> Option<(f64, f64)> {
        self.global_extent()
            .map(|extent| self.viewport.visible_range(&extent))
    }
    /// Pure geometry for a canvas; `None` without data or when the canvas is
    /// too small.
    pub fn compute_geometry(&self, canvas: PixelRect) -> Option<PlotGeometry> {
        let range = self.visible_range()?;
        let visible = self
            .registry
            .visible()
            .filter_map(|entry| self.store.series(entry.id));
        self.mapper.geometry(canvas, range, visible)
    }
    /// Computes the frame geometry and keeps it for hover queries.
    pub fn render(&mut self, canvas: PixelRect) -> Option<PlotGeometry> {
        self.last_geometry = self.compute_geometry(canvas);
        self.last_geometry
    }
    #[cfg(test)]
    pub fn last_geometry(&self) -> Option<&PlotGeometry> {
        self.last_geometry.as_ref()
    }
    /// Nearest sample per visible channel under the pointer, against the last
    /// rendered frame.
    pub fn hover_query(&self, x: f64, y: f64) -> Vec<HoverEntry> {
        match &self.last_geometry {
            Some(geometry) if !self.store.is_empty() => {
                hover::resolve(geometry, &self.registry, &self.store, x, y)
            }
            _ => Vec::new(),
        }
    }
    pub fn hover_readout(&self, x: f64, y: f64) -> String {
        hover::format_readout(&self.hover_query(x, y), &self.config.value_unit)
    }
    pub fn trend_report(&self) -> BTreeMap<ChannelId, TrendSummary> {
        self.trends.report()
    }
}
impl Default for GraphState {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}

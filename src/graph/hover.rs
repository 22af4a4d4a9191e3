use crate::graph::{ChannelId, ChannelRegistry, PlotGeometry, Sample, TimeSeriesStore};

#[derive(Clone, Debug, PartialEq)]
pub struct HoverEntry {
    pub channel: ChannelId,
    pub name: String,
    pub time: f64,
    pub value: f64,
}
/// Nearest-in-time sample per visible channel under the pointer.
///
/// Only samples inside the geometry's time range take part, and the first
/// sample wins on equal distance. Channels are reported in registry order.
pub fn resolve(
    geometry: &PlotGeometry,
    registry: &ChannelRegistry,
    store: &TimeSeriesStore,
    x: f64,
    y: f64,
) -> Vec<HoverEntry> {
    let Some(target) = geometry.time_at(x, y) else {
        return Vec::new();
    };
    registry
        .visible()
        .filter_map(|entry| {
            let series = store.series(entry.id)?;
            let nearest = nearest_sample(series.in_range(geometry.tmin, geometry.tmax), target)?;
            Some(HoverEntry {
                channel: entry.id,
                name: entry.name.clone(),
                time: nearest.time,
                value: nearest.value,
            })
        })
        .collect()
}
fn nearest_sample<'a>(samples: impl Iterator<Item = &'a Sample>, target: f64) -> Option<&'a Sample> {
    let mut best: Option<(&Sample, f64)> = None;
    for sample in samples {
        let dt = (sample.time - target).abs();
        match best {
            Some((_, best_dt)) if dt >= best_dt => {}
            _ => best = Some((sample, dt)),
        }
    }
    best.map(|(sample, _)| sample)
}
/// One-line readout, e.g. `t=1.50 min | CH1=20.25°C`. The time shown is the
/// first channel's sample time.
pub fn format_readout(entries: &[HoverEntry], unit: &str) -> String {
    let Some(first) = entries.first() else {
        return String::new();
    };
    let mut parts = vec![format!("t={:.2} min", first.time / 60.0)];
    parts.extend(
        entries
            .iter()
            .map(|e| format!("{}={:.2}{unit}", e.name, e.value)),
    );
    parts.join(" | ")
}

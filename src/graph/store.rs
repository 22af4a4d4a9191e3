use std::collections::{BTreeMap, VecDeque};

use crate::graph::ChannelId;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Seconds since the run started.
    pub time: f64,
    pub value: f64,
}
/// Bounding box of everything currently stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub min_t: f64,
    pub max_t: f64,
    pub min_v: f64,
    pub max_v: f64,
}
impl Extent {
    pub fn span(&self) -> f64 {
        self.max_t - self.min_t
    }
    fn include(&mut self, sample: &Sample) {
        self.min_t = self.min_t.min(sample.time);
        self.max_t = self.max_t.max(sample.time);
        self.min_v = self.min_v.min(sample.value);
        self.max_v = self.max_v.max(sample.value);
    }
}
/// History of one channel, capped at `max_points`.
#[derive(Clone, Debug, Default)]
pub struct ChannelSeries {
    samples: VecDeque<Sample>,
}
impl ChannelSeries {
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
    /// Samples with `tmin <= time <= tmax`, oldest first.
    pub fn in_range(&self, tmin: f64, tmax: f64) -> impl Iterator<Item = &Sample> {
        self.samples
            .iter()
            .filter(move |s| s.time >= tmin && s.time <= tmax)
    }
    #[cfg(test)]
    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
/// Rolling per-channel store for the live graph.
#[derive(Clone, Debug)]
pub struct TimeSeriesStore {
    per_channel: BTreeMap<ChannelId, ChannelSeries>,
    max_points: usize,
}
impl TimeSeriesStore {
    pub fn new(max_points: usize) -> Self {
        Self {
            per_channel: BTreeMap::new(),
            max_points: max_points.max(1),
        }
    }
    /// Appends one reading. Missing and non-finite values are dropped; returns
    /// whether the sample was stored.
    pub fn append(&mut self, channel: ChannelId, elapsed_secs: f64, value: Option<f64>) -> bool {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return false;
        };
        let series = self.per_channel.entry(channel).or_default();
        if series.samples.len() == self.max_points {
            series.samples.pop_front();
        }
        series.samples.push_back(Sample {
            time: elapsed_secs,
            value,
        });
        true
    }
    pub fn clear(&mut self) {
        self.per_channel.clear();
    }
    pub fn series(&self, channel: ChannelId) -> Option<&ChannelSeries> {
        self.per_channel.get(&channel)
    }
    #[cfg(test)]
    pub fn len(&self, channel: ChannelId) -> usize {
        self.series(channel).map(ChannelSeries::len).unwrap_or(0)
    }
    pub fn is_empty(&self) -> bool {
        self.per_channel.values().all(ChannelSeries::is_empty)
    }
    /// Extent across every channel with data, `None` when nothing is stored.
    pub fn global_extent(&self) -> Option<Extent> {
        let mut samples = self.per_channel.values().flat_map(ChannelSeries::iter);
        let first = samples.next()?;
        let mut extent = Extent {
            min_t: first.time,
            max_t: first.time,
            min_v: first.value,
            max_v: first.value,
        };
        for sample in samples {
            extent.include(sample);
        }
        Some(extent)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    const CH: ChannelId = ChannelId(1);
    #[test]
    fn keeps_most_recent_samples_in_order() {
        let mut store = TimeSeriesStore::new(5);
        for i in 0..12 {
            store.append(CH, i as f64, Some(i as f64 * 10.0));
            assert!(store.len(CH) <= 5);
        }
        let times: Vec<f64> = store.series(CH).unwrap().iter().map(|s| s.time).collect();
        assert_eq!(times, [7.0, 8.0, 9.0, 10.0, 11.0]);
    }
    #[test]
    fn drops_missing_and_nan_values() {
        let mut store = TimeSeriesStore::new(10);
        assert!(store.append(CH, 0.0, Some(20.0)));
        assert!(!store.append(CH, 1.0, None));
        assert!(!store.append(CH, 2.0, Some(f64::NAN)));
        assert!(!store.append(CH, 3.0, Some(f64::INFINITY)));
        assert_eq!(store.len(CH), 1);
        assert_eq!(store.series(CH).unwrap().last().unwrap().value, 20.0);
    }
    #[test]
    fn global_extent_spans_all_channels() {
        let mut store = TimeSeriesStore::new(10);
        assert!(store.global_extent().is_none());
        store.append(ChannelId(1), 2.0, Some(21.0));
        store.append(ChannelId(2), 10.0, Some(-4.0));
        store.append(ChannelId(2), 12.0, Some(30.5));
        let extent = store.global_extent().unwrap();
        assert_eq!(
            extent,
            Extent {
                min_t: 2.0,
                max_t: 12.0,
                min_v: -4.0,
                max_v: 30.5
            }
        );
        assert_eq!(extent.span(), 10.0);
        store.clear();
        assert!(store.is_empty());
        assert!(store.global_extent().is_none());
    }
    #[test]
    fn in_range_is_inclusive() {
        let mut store = TimeSeriesStore::new(10);
        for t in [0.0, 5.0, 10.0, 15.0] {
            store.append(CH, t, Some(t));
        }
        let picked: Vec<f64> = store
            .series(CH)
            .unwrap()
            .in_range(5.0, 10.0)
            .map(|s| s.time)
            .collect();
        assert_eq!(picked, [5.0, 10.0]);
    }
}

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use crate::graph::ChannelId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    NoData,
    Stable,
    Increasing,
    Decreasing,
}
impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Verdict::NoData => "no data",
            Verdict::Stable => "stable",
            Verdict::Increasing => "increasing",
            Verdict::Decreasing => "decreasing",
        };
        f.write_str(text)
    }
}
/// Per-channel trend line for display. Numbers are rounded to one decimal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrendSummary {
    pub verdict: Verdict,
    /// Mean of the window; absent when the window is empty.
    pub avg: Option<f64>,
    /// `last - first`; absent with fewer than two readings.
    pub delta: Option<f64>,
    pub samples: usize,
}
impl TrendSummary {
    fn no_data(avg: Option<f64>, samples: usize) -> Self {
        Self {
            verdict: Verdict::NoData,
            avg,
            delta: None,
            samples,
        }
    }
}
/// Fixed-size sliding window of the most recent valid readings.
#[derive(Clone, Debug)]
pub struct TrendWindow {
    buffer: VecDeque<f64>,
    capacity: usize,
}
impl TrendWindow {
    pub fn new(size: usize) -> Self {
        let capacity = size.max(2);
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    pub fn push(&mut self, val: f64) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(val);
    }
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }
    #[cfg(test)]
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.buffer.iter().copied()
    }
    /// Classifies the window contents. Pure: the same contents always give
    /// the same summary.
    pub fn summarize(&self, threshold: f64) -> TrendSummary {
        let samples = self.buffer.len();
        let avg = (samples > 0).then(|| round1(self.buffer.iter().sum::<f64>() / samples as f64));
        let (Some(&first), Some(&last)) = (self.buffer.front(), self.buffer.back()) else {
            return TrendSummary::no_data(avg, samples);
        };
        if samples < 2 {
            return TrendSummary::no_data(avg, samples);
        }
        let lo = self.buffer.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = self.buffer.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let delta = last - first;
        let verdict = if hi - lo <= threshold {
            Verdict::Stable
        } else if delta > 0.0 {
            Verdict::Increasing
        } else if delta < 0.0 {
            Verdict::Decreasing
        } else {
            // Range exceeded the band but the endpoints match.
            Verdict::Stable
        };
        TrendSummary {
            verdict,
            avg,
            delta: Some(round1(delta)),
            samples,
        }
    }
}
/// Sliding-window stability check for every channel of the run.
#[derive(Clone, Debug)]
pub struct TrendClassifier {
    windows: BTreeMap<ChannelId, TrendWindow>,
    window_size: usize,
    threshold: f64,
}
impl TrendClassifier {
    pub fn new(window_size: usize, threshold: f64) -> Self {
        Self {
            windows: BTreeMap::new(),
            window_size: window_size.max(2),
            threshold,
        }
    }
    /// Registers the channels of a new run with empty windows.
    pub fn reset(&mut self, channels: impl IntoIterator<Item = ChannelId>) {
        self.windows = channels
            .into_iter()
            .map(|id| (id, TrendWindow::new(self.window_size)))
            .collect();
    }
    /// Feeds one tick for a channel. Missing or non-finite readings leave the
    /// window untouched.
    pub fn update(&mut self, channel: ChannelId, value: Option<f64>) {
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        self.windows
            .entry(channel)
            .or_insert_with(|| TrendWindow::new(self.window_size))
            .push(value);
    }
    #[cfg(test)]
    pub fn window(&self, channel: ChannelId) -> Option<&TrendWindow> {
        self.windows.get(&channel)
    }
    #[cfg(test)]
    pub fn summary(&self, channel: ChannelId) -> TrendSummary {
        match self.windows.get(&channel) {
            Some(window) => window.summarize(self.threshold),
            None => TrendWindow::new(self.window_size).summarize(self.threshold),
        }
    }
    pub fn report(&self) -> BTreeMap<ChannelId, TrendSummary> {
        self.windows
            .iter()
            .map(|(id, window)| (*id, window.summarize(self.threshold)))
            .collect()
    }
}
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
#[cfg(test)]
mod tests {
    use super::*;
    fn window_of(values: &[f64], size: usize) -> TrendWindow {
        let mut window = TrendWindow::new(size);
        for &v in values {
            window.push(v);
        }
        window
    }
    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }
    #[test]
    fn small_spread_is_stable() {
        let summary = window_of(&[20.0, 20.5, 20.3], 10).summarize(3.0);
        assert_eq!(summary.verdict, Verdict::Stable);
        assert!(close(summary.avg.unwrap(), 20.3));
        assert!(close(summary.delta.unwrap(), 0.3));
    }
    #[test]
    fn rising_beyond_threshold_is_increasing() {
        let summary = window_of(&[20.0, 21.0, 24.0], 10).summarize(3.0);
        assert_eq!(summary.verdict, Verdict::Increasing);
        assert!(close(summary.delta.unwrap(), 4.0));
    }
    #[test]
    fn falling_beyond_threshold_is_decreasing() {
        let summary = window_of(&[30.0, 25.0, 22.0], 10).summarize(3.0);
        assert_eq!(summary.verdict, Verdict::Decreasing);
        assert!(close(summary.delta.unwrap(), -8.0));
    }
    #[test]
    fn equal_endpoints_with_wide_range_is_stable() {
        let summary = window_of(&[20.0, 30.0, 20.0], 10).summarize(3.0);
        assert_eq!(summary.verdict, Verdict::Stable);
        assert_eq!(summary.delta, Some(0.0));
    }
    #[test]
    fn fewer_than_two_values_is_no_data() {
        assert_eq!(TrendWindow::new(10).summarize(3.0).verdict, Verdict::NoData);
        let one = window_of(&[50.0], 10).summarize(0.0);
        assert_eq!(one.verdict, Verdict::NoData);
        assert_eq!(one.avg, Some(50.0));
        assert_eq!(one.delta, None);
    }
    #[test]
    fn window_evicts_oldest() {
        let window = window_of(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        assert_eq!(window.len(), 3);
        assert_eq!(window.values().collect::<Vec<_>>(), [3.0, 4.0, 5.0]);
        assert_eq!(TrendWindow::new(0).capacity, 2);
    }
    #[test]
    fn invalid_reading_does_not_change_verdict() {
        let ch = ChannelId(3);
        let mut classifier = TrendClassifier::new(10, 3.0);
        classifier.reset([ch]);
        for v in [20.0, 21.0, 24.0] {
            classifier.update(ch, Some(v));
        }
        let before = classifier.summary(ch);
        classifier.update(ch, Some(f64::NAN));
        classifier.update(ch, None);
        assert_eq!(classifier.window(ch).unwrap().len(), 3);
        assert_eq!(classifier.summary(ch), before);
    }
    #[test]
    fn summary_is_idempotent() {
        let ch = ChannelId(1);
        let mut classifier = TrendClassifier::new(4, 1.0);
        classifier.reset([ch, ChannelId(2)]);
        for v in [10.0, 10.4, 13.0, 9.0, 15.0] {
            classifier.update(ch, Some(v));
        }
        assert_eq!(classifier.summary(ch), classifier.summary(ch));
        let report = classifier.report();
        assert_eq!(report.len(), 2);
        assert_eq!(report[&ChannelId(2)].verdict, Verdict::NoData);
        assert_eq!(report[&ch].verdict, Verdict::Increasing);
    }
}

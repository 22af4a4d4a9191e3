use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::{ChannelId, GraphError};

/// One poll of the logger: a reading per channel, `None` when the input had
/// no value (open thermocouple, overrange).
pub type Readings = BTreeMap<ChannelId, Option<f64>>;

/// Something that yields one set of readings per sampling interval.
pub trait ReadingSource {
    fn read(&mut self) -> Result<Readings, GraphError>;
}
/// In-memory source for deterministic playback.
#[cfg(test)]
pub struct ManualSource {
    queue: std::collections::VecDeque<Readings>,
}
#[cfg(test)]
impl ManualSource {
    pub fn new(ticks: impl IntoIterator<Item = Readings>) -> Self {
        Self {
            queue: ticks.into_iter().collect(),
        }
    }
}
#[cfg(test)]
impl ReadingSource for ManualSource {
    fn read(&mut self) -> Result<Readings, GraphError> {
        self.queue.pop_front().ok_or(GraphError::SourceExhausted)
    }
}
struct Sensor {
    temperature: f64,
    target: f64,
}
/// Bank of simulated thermocouples drifting towards per-channel targets.
pub struct SimulatedSensors {
    sensors: BTreeMap<ChannelId, Sensor>,
    rng: StdRng,
    /// Chance per reading that a sensor reports nothing.
    dropout: f64,
}
impl SimulatedSensors {
    pub fn new(channels: impl IntoIterator<Item = ChannelId>, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let sensors = channels
            .into_iter()
            .map(|id| {
                let temperature = 22.0 + rng.gen_range(-1.0..1.0);
                let target = if id.0 == 0 {
                    // Cold junction stays near room temperature.
                    temperature
                } else {
                    rng.gen_range(30.0..90.0)
                };
                (
                    id,
                    Sensor {
                        temperature,
                        target,
                    },
                )
            })
            .collect();
        Self {
            sensors,
            rng,
            dropout: 0.01,
        }
    }
    #[cfg(test)]
    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout.clamp(0.0, 1.0);
        self
    }
    #[cfg(test)]
    pub fn set_target(&mut self, channel: ChannelId, target: f64) {
        if let Some(sensor) = self.sensors.get_mut(&channel) {
            sensor.target = target;
        }
    }
}
impl ReadingSource for SimulatedSensors {
    fn read(&mut self) -> Result<Readings, GraphError> {
        let mut readings = Readings::new();
        for (id, sensor) in &mut self.sensors {
            sensor.temperature += (sensor.target - sensor.temperature) * 0.02;
            sensor.temperature += self.rng.gen_range(-0.15..0.15);
            let value = if self.rng.gen_bool(self.dropout) {
                None
            } else {
                Some(sensor.temperature)
            };
            readings.insert(*id, value);
        }
        Ok(readings)
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn manual_source_drains_in_order() {
        let tick = |v: f64| Readings::from([(ChannelId(1), Some(v))]);
        let mut source = ManualSource::new(vec![tick(1.0), tick(2.0)]);
        assert_eq!(source.read().unwrap()[&ChannelId(1)], Some(1.0));
        assert_eq!(source.read().unwrap()[&ChannelId(1)], Some(2.0));
        assert!(matches!(source.read(), Err(GraphError::SourceExhausted)));
    }
    #[test]
    fn simulated_sensors_approach_target() {
        let ch = ChannelId(2);
        let mut sensors = SimulatedSensors::new([ch], 7).with_dropout(0.0);
        sensors.set_target(ch, 80.0);
        let mut last = None;
        for _ in 0..400 {
            last = sensors.read().unwrap()[&ch];
        }
        let last = last.unwrap();
        assert!((last - 80.0).abs() < 5.0, "ended at {last}");
    }
    #[test]
    fn seeded_sensors_are_reproducible() {
        let channels = [ChannelId(0), ChannelId(1), ChannelId(2)];
        let mut a = SimulatedSensors::new(channels, 42);
        let mut b = SimulatedSensors::new(channels, 42);
        for _ in 0..10 {
            assert_eq!(a.read().unwrap(), b.read().unwrap());
        }
    }
}

// src/types.rs
use std::path::PathBuf;

use crate::ambient::AmbientReading;
use crate::graph::{ChannelId, Readings};

/// Free-text header written at the top of each log file.
#[derive(Clone, Debug, Default)]
pub struct RunMetadata {
    pub test_name: String,
    pub tester: String,
    pub fixture: String,
    pub notes: String,
}
#[derive(Clone, Debug)]
pub struct AmbientSetup {
    pub port: String,
    pub setpoint: f64,
}
/// Everything the engine needs to start logging.
#[derive(Clone, Debug)]
pub struct RunSetup {
    pub metadata: RunMetadata,
    pub channels: Vec<(ChannelId, String)>,
    pub base_name: String,
    pub output_dir: PathBuf,
    pub sample_interval_secs: f64,
    /// `None` runs until stopped.
    pub duration_secs: Option<f64>,
    pub ambient: Option<AmbientSetup>,
    pub seed: u64,
}
// GUI -> engine
#[derive(Clone, Debug)]
pub enum EngineCommand {
    Start(RunSetup),
    Stop,
    SetAmbientHold(f64),
}
// engine -> GUI
#[derive(Clone, Debug)]
pub enum EngineMessage {
    Log(String),
    Running(bool),
    Tick {
        /// Local wall-clock time, as written to the log.
        timestamp: String,
        elapsed_secs: f64,
        readings: Readings,
        ambient: Option<AmbientReading>,
    },
    Finished {
        path: Option<PathBuf>,
        error: bool,
    },
}

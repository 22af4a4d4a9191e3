// src/engine.rs
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::ambient::AmbientController;
use crate::excel;
use crate::graph::{ChannelId, ReadingSource, SimulatedSensors};
use crate::recorder::{local_timestamp, unique_csv_path, DataRecorder};
use crate::types::*;

const IDLE_SLEEP: Duration = Duration::from_millis(50);
const BUSY_SLEEP: Duration = Duration::from_millis(10);
const DEFAULT_BASE_NAME: &str = "TC_Log";
const FALLBACK_DIR: &str = "logs";

/// Next poll is one interval after the previous poll started; polls missed
/// during a stall are not made up.
struct Pacer {
    interval: Duration,
    next_due: Instant,
}
impl Pacer {
    fn new(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            next_due: start,
        }
    }
    fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }
    fn polled_at(&mut self, started: Instant) {
        self.next_due = started + self.interval;
    }
}
/// One logging session: source, CSV file and optional ambient controller.
struct Run {
    source: Box<dyn ReadingSource>,
    recorder: DataRecorder,
    ambient: Option<AmbientController>,
    channels: Vec<ChannelId>,
    started: Instant,
    pacer: Pacer,
    duration: Option<Duration>,
}
impl Run {
    fn start(setup: RunSetup, tx: &Sender<EngineMessage>) -> Result<Self> {
        let dir = match fs::create_dir_all(&setup.output_dir) {
            Ok(()) => setup.output_dir.clone(),
            Err(err) => {
                log::warn!(
                    "cannot use output folder {}: {err}",
                    setup.output_dir.display()
                );
                let fallback = PathBuf::from(FALLBACK_DIR);
                fs::create_dir_all(&fallback).with_context(|| {
                    format!("could not create fallback folder {}", fallback.display())
                })?;
                fallback
            }
        };
        let path = unique_csv_path(&dir, &base_name(&setup.base_name));
        let channels: Vec<ChannelId> = setup.channels.iter().map(|(id, _)| *id).collect();
        let names: Vec<String> = setup.channels.iter().map(|(_, name)| name.clone()).collect();

        let mut recorder = DataRecorder::new();
        recorder.start(
            &path,
            &setup.metadata,
            setup.ambient.as_ref().map(|a| a.setpoint),
            &names,
        )?;

        let ambient = setup.ambient.as_ref().and_then(|a| {
            let opened = AmbientController::open(&a.port).and_then(|mut ctrl| {
                ctrl.set_hold(a.setpoint)?;
                Ok(ctrl)
            });
            match opened {
                Ok(ctrl) => {
                    tx.send(EngineMessage::Log(format!(
                        "Ambient hold set to {:.2} °C",
                        a.setpoint
                    )))
                    .ok();
                    Some(ctrl)
                }
                Err(err) => {
                    log::warn!("ambient controller unavailable: {err:#}");
                    tx.send(EngineMessage::Log(format!(
                        "Ambient controller unavailable: {err:#}"
                    )))
                    .ok();
                    None
                }
            }
        });

        let interval = Duration::try_from_secs_f64(setup.sample_interval_secs)
            .ok()
            .filter(|d| !d.is_zero())
            .unwrap_or(Duration::from_secs(1));
        let duration = setup
            .duration_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

        tx.send(EngineMessage::Log(format!("Logging to {}", path.display())))
            .ok();
        let started = Instant::now();
        Ok(Self {
            source: Box::new(SimulatedSensors::new(channels.iter().copied(), setup.seed)),
            recorder,
            ambient,
            channels,
            started,
            pacer: Pacer::new(interval, started),
            duration,
        })
    }
    fn tick(&mut self, tx: &Sender<EngineMessage>) -> Result<()> {
        let polled = Instant::now();
        let elapsed_secs = polled.duration_since(self.started).as_secs_f64();
        let timestamp = local_timestamp();
        let readings = self.source.read().context("reading source failed")?;
        let ambient = self.ambient.as_mut().map(AmbientController::poll);
        let values: Vec<Option<f64>> = self
            .channels
            .iter()
            .map(|id| readings.get(id).copied().flatten())
            .collect();
        // Runs with a setpoint always carry the ambient column.
        let ambient_column = self
            .recorder
            .has_ambient_column()
            .then(|| ambient.and_then(|a| a.temp));
        self.recorder
            .write_record(&timestamp, ambient_column, &values)?;
        tx.send(EngineMessage::Tick {
            timestamp,
            elapsed_secs,
            readings,
            ambient,
        })
        .ok();
        self.pacer.polled_at(polled);
        Ok(())
    }
}
fn base_name(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        DEFAULT_BASE_NAME.to_owned()
    } else {
        cleaned
    }
}
fn finish(mut run: Run, error: bool, reason: &str, tx: &Sender<EngineMessage>) {
    let path = run.recorder.stop();
    log::info!("{reason}");
    tx.send(EngineMessage::Log(reason.to_owned())).ok();
    if let Some(p) = &path {
        tx.send(EngineMessage::Log(format!("Saved {}", p.display())))
            .ok();
        if !error {
            match excel::export_colored_xlsx(p) {
                Ok(xlsx) => {
                    tx.send(EngineMessage::Log(format!("Saved {}", xlsx.display())))
                        .ok();
                }
                Err(err) => {
                    log::warn!("Excel export failed: {err:#}");
                    tx.send(EngineMessage::Log(format!("Excel export failed: {err:#}")))
                        .ok();
                }
            }
        }
    }
    tx.send(EngineMessage::Running(false)).ok();
    tx.send(EngineMessage::Finished { path, error }).ok();
}
fn handle_command(cmd: EngineCommand, run: &mut Option<Run>, tx: &Sender<EngineMessage>) {
    match cmd {
        EngineCommand::Start(setup) => {
            if run.is_some() {
                tx.send(EngineMessage::Log("A run is already in progress.".to_owned()))
                    .ok();
                return;
            }
            match Run::start(setup, tx) {
                Ok(started) => {
                    *run = Some(started);
                    tx.send(EngineMessage::Running(true)).ok();
                }
                Err(err) => {
                    log::error!("run failed to start: {err:#}");
                    tx.send(EngineMessage::Log(format!("Start failed: {err:#}")))
                        .ok();
                    tx.send(EngineMessage::Finished {
                        path: None,
                        error: true,
                    })
                    .ok();
                }
            }
        }
        EngineCommand::Stop => {
            if let Some(active) = run.take() {
                finish(active, false, "Logging stopped.", tx);
            }
        }
        EngineCommand::SetAmbientHold(temp_c) => {
            match run.as_mut().and_then(|r| r.ambient.as_mut()) {
                Some(ctrl) => match ctrl.set_hold(temp_c) {
                    Ok(()) => {
                        tx.send(EngineMessage::Log(format!(
                            "Ambient hold set to {temp_c:.2} °C"
                        )))
                        .ok();
                    }
                    Err(err) => {
                        log::warn!("{err:#}");
                        tx.send(EngineMessage::Log(format!("{err:#}"))).ok();
                    }
                },
                None => {
                    tx.send(EngineMessage::Log(
                        "No ambient controller connected.".to_owned(),
                    ))
                    .ok();
                }
            }
        }
    }
}
pub fn spawn_thread(tx: Sender<EngineMessage>, rx_cmd: Receiver<EngineCommand>) {
    thread::spawn(move || {
        tx.send(EngineMessage::Log("Acquisition engine ready.".to_owned()))
            .ok();
        let mut run: Option<Run> = None;
        loop {
            loop {
                match rx_cmd.try_recv() {
                    Ok(cmd) => handle_command(cmd, &mut run, &tx),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if let Some(active) = run.take() {
                            finish(active, false, "Window closed, logging stopped.", &tx);
                        }
                        log::debug!("engine thread exiting");
                        return;
                    }
                }
            }

            let Some(active) = run.as_mut() else {
                thread::sleep(IDLE_SLEEP);
                continue;
            };
            let elapsed = active.started.elapsed();
            if active.duration.is_some_and(|limit| elapsed >= limit) {
                if let Some(done) = run.take() {
                    finish(done, false, "Run duration reached.", &tx);
                }
                continue;
            }
            if active.pacer.is_due(Instant::now()) {
                if let Err(err) = active.tick(&tx) {
                    log::error!("{err:#}");
                    if let Some(failed) = run.take() {
                        finish(failed, true, &format!("Logging aborted: {err:#}"), &tx);
                    }
                    continue;
                }
            }
            thread::sleep(BUSY_SLEEP);
        }
    });
}

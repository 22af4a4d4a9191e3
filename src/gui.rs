// src/gui.rs
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use eframe::egui;
use egui::{Color32, RichText};

use crate::ambient::AmbientReading;
use crate::engine;
use crate::graph::{
    render_snapshot_png, ChannelId, GraphConfig, GraphState, PlotStyle, ViewCommand,
};
use crate::types::*;
use crate::visualizer;

const MAX_INPUTS: usize = 8;
const MAX_LOG_LINES: usize = 12;
const GRAPH_HEIGHT: f32 = 450.0;

pub struct ThermoViewApp {
    graph: GraphState,

    // Run setup
    metadata: RunMetadata,
    base_name: String,
    include_cj: bool,
    num_inputs: usize,
    channel_names: Vec<String>,
    duration_minutes: String,
    use_ambient: bool,
    ambient_port: String,
    ambient_setpoint: String,

    // Live status
    is_running: bool,
    ambient: Option<AmbientReading>,
    hover_text: String,
    last_line: String,
    // Applied to the graph once the engine confirms the run started.
    pending_channels: Option<Vec<(ChannelId, String)>>,
    log_messages: Vec<String>,

    rx: Receiver<EngineMessage>,
    tx_cmd: Sender<EngineCommand>,
}
impl ThermoViewApp {
    pub fn new(config: GraphConfig) -> Self {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        engine::spawn_thread(tx, rx_cmd);
        Self::with_engine(config, rx, tx_cmd)
    }
    fn with_engine(
        config: GraphConfig,
        rx: Receiver<EngineMessage>,
        tx_cmd: Sender<EngineCommand>,
    ) -> Self {
        Self {
            graph: GraphState::new(config),
            metadata: RunMetadata::default(),
            base_name: "TC_Log".to_owned(),
            include_cj: true,
            num_inputs: 4,
            channel_names: (1..=MAX_INPUTS).map(|i| format!("CH{i}")).collect(),
            duration_minutes: String::new(),
            use_ambient: false,
            ambient_port: "COM5".to_owned(),
            ambient_setpoint: "25".to_owned(),
            is_running: false,
            ambient: None,
            hover_text: String::new(),
            last_line: String::new(),
            pending_channels: None,
            log_messages: vec!["ThermoView ready.".to_owned()],
            rx,
            tx_cmd,
        }
    }
    fn log(&mut self, msg: &str) {
        self.log_messages.push(format!("> {msg}"));
        if self.log_messages.len() > MAX_LOG_LINES {
            self.log_messages.remove(0);
        }
    }
    fn send(&mut self, cmd: EngineCommand) {
        if self.tx_cmd.send(cmd).is_err() {
            log::error!("engine thread is gone");
            self.log("Acquisition engine stopped unexpectedly.");
        }
    }
    fn drain_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                EngineMessage::Log(s) => self.log(&s),
                EngineMessage::Running(b) => {
                    self.is_running = b;
                    if b {
                        if let Some(channels) = self.pending_channels.take() {
                            self.graph.set_channels(channels);
                            self.ambient = None;
                            self.hover_text.clear();
                            self.last_line.clear();
                        }
                    }
                }
                EngineMessage::Tick {
                    timestamp,
                    elapsed_secs,
                    readings,
                    ambient,
                } => {
                    self.graph.add_sample(elapsed_secs, &readings);
                    self.ambient = ambient;
                    let channels = self
                        .graph
                        .registry()
                        .iter()
                        .map(|e| (e.name.as_str(), readings.get(&e.id).copied().flatten()));
                    self.last_line = format_last_line(
                        &timestamp,
                        ambient,
                        channels,
                        &self.graph.config().value_unit,
                    );
                }
                EngineMessage::Finished { path, error } => {
                    self.is_running = false;
                    if error && path.is_none() {
                        self.pending_channels = None;
                        self.log("Run ended without a log file.");
                    }
                }
            }
        }
    }
    fn start_run(&mut self) {
        let duration_secs = match parse_duration_minutes(&self.duration_minutes) {
            Ok(d) => d,
            Err(msg) => {
                self.log(&msg);
                return;
            }
        };
        let ambient = if self.use_ambient {
            match self.ambient_setpoint.trim().parse::<f64>() {
                Ok(setpoint) => Some(AmbientSetup {
                    port: self.ambient_port.clone(),
                    setpoint,
                }),
                Err(_) => {
                    self.log("Ambient setpoint must be a number.");
                    return;
                }
            }
        } else {
            None
        };
        let channels = build_channels(self.include_cj, self.num_inputs, &self.channel_names);
        if channels.is_empty() {
            self.log("Select at least one channel.");
            return;
        }
        self.pending_channels = Some(channels.clone());
        let config = self.graph.config();
        let setup = RunSetup {
            metadata: self.metadata.clone(),
            channels,
            base_name: self.base_name.clone(),
            output_dir: config.output_dir.clone(),
            sample_interval_secs: config.sample_interval_secs,
            duration_secs,
            ambient,
            seed: unix_secs(),
        };
        self.send(EngineCommand::Start(setup));
    }
    fn export_snapshot(&self) -> Result<PathBuf> {
        let png = render_snapshot_png(&self.graph, PlotStyle::default())
            .context("could not render graph")?;
        let dir = &self.graph.config().output_dir;
        fs::create_dir_all(dir)
            .with_context(|| format!("could not create {}", dir.display()))?;
        let path = dir.join(format!("graph_{}.png", unix_secs()));
        fs::write(&path, png).with_context(|| format!("could not write {}", path.display()))?;
        Ok(path)
    }
    fn setup_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("ThermoView");
        ui.label("Thermocouple logger");
        ui.separator();

        let editable = !self.is_running;
        ui.add_enabled_ui(editable, |ui| {
            egui::Grid::new("metadata").num_columns(2).show(ui, |ui| {
                ui.label("Test");
                ui.text_edit_singleline(&mut self.metadata.test_name);
                ui.end_row();
                ui.label("Tester");
                ui.text_edit_singleline(&mut self.metadata.tester);
                ui.end_row();
                ui.label("Fixture");
                ui.text_edit_singleline(&mut self.metadata.fixture);
                ui.end_row();
                ui.label("Notes");
                ui.text_edit_singleline(&mut self.metadata.notes);
                ui.end_row();
                ui.label("File name");
                ui.text_edit_singleline(&mut self.base_name);
                ui.end_row();
                ui.label("Duration (min)");
                ui.add(
                    egui::TextEdit::singleline(&mut self.duration_minutes)
                        .hint_text("until stopped"),
                );
                ui.end_row();
            });
            ui.add_space(6.0);
            ui.checkbox(&mut self.include_cj, "Log cold junction (CJ)");
            ui.add(egui::Slider::new(&mut self.num_inputs, 1..=MAX_INPUTS).text("Inputs"));
            for name in self.channel_names.iter_mut().take(self.num_inputs) {
                ui.text_edit_singleline(name);
            }
            ui.add_space(6.0);
            ui.checkbox(&mut self.use_ambient, "Ambient controller");
        });
        if self.use_ambient {
            ui.horizontal(|ui| {
                ui.label("Port");
                ui.add_enabled(
                    editable,
                    egui::TextEdit::singleline(&mut self.ambient_port).desired_width(70.0),
                );
                ui.label("Hold °C");
                ui.add(egui::TextEdit::singleline(&mut self.ambient_setpoint).desired_width(50.0));
            });
            if self.is_running && ui.button("Update hold").clicked() {
                match self.ambient_setpoint.trim().parse::<f64>() {
                    Ok(t) => self.send(EngineCommand::SetAmbientHold(t)),
                    Err(_) => self.log("Ambient setpoint must be a number."),
                }
            }
            if let Some(a) = self.ambient {
                ui.label(format!(
                    "Ambient {} | hold {} | PWM {}",
                    fmt_opt(a.temp, 2),
                    fmt_opt(a.hold, 2),
                    fmt_opt(a.pwm, 0)
                ));
            }
        }

        ui.add_space(10.0);
        let (text, color) = if self.is_running {
            ("⏹ STOP", Color32::from_rgb(180, 40, 40))
        } else {
            ("▶ START", Color32::from_rgb(40, 120, 40))
        };
        if ui
            .add(egui::Button::new(RichText::new(text).color(Color32::WHITE)).fill(color))
            .clicked()
        {
            if self.is_running {
                self.send(EngineCommand::Stop);
            } else {
                self.start_run();
            }
        }
        if self.is_running {
            let elapsed = self.graph.last_elapsed().unwrap_or_default();
            ui.label(
                RichText::new(format!("Logging... {}", format_elapsed(elapsed)))
                    .color(Color32::RED)
                    .small(),
            );
        }

        ui.add_space(10.0);
        ui.separator();
        egui::ScrollArea::vertical().max_height(180.0).show(ui, |ui| {
            for m in &self.log_messages {
                ui.monospace(m);
            }
        });
    }
    fn view_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                self.graph.apply(ViewCommand::ZoomIn);
            }
            if ui.button("Zoom out").clicked() {
                self.graph.apply(ViewCommand::ZoomOut);
            }
            ui.label(self.graph.viewport().window_label());
            ui.separator();
            ui.label("Earlier");
            let mut pan = self.graph.viewport().pan_percent();
            if ui
                .add(egui::Slider::new(&mut pan, 0.0..=100.0).show_value(false))
                .changed()
            {
                self.graph.apply(ViewCommand::SetPan(pan));
            }
            ui.label("Later");
            ui.separator();
            if ui.button("Export PNG").clicked() {
                match self.export_snapshot() {
                    Ok(path) => self.log(&format!("Graph saved to {}", path.display())),
                    Err(err) => {
                        log::warn!("snapshot export failed: {err:#}");
                        self.log(&format!("Export failed: {err:#}"));
                    }
                }
            }
        });
    }
    fn channel_toggles(&mut self, ui: &mut egui::Ui) {
        if self.graph.registry().is_empty() {
            return;
        }
        let entries: Vec<(ChannelId, String, bool)> = self
            .graph
            .registry()
            .iter()
            .map(|e| (e.id, e.name.clone(), e.visible))
            .collect();
        ui.horizontal_wrapped(|ui| {
            ui.label("Show:");
            for (slot, (channel, name, mut visible)) in entries.into_iter().enumerate() {
                let label = RichText::new(name).color(visualizer::series_color(slot));
                if ui.checkbox(&mut visible, label).changed() {
                    self.graph.apply(ViewCommand::SetVisible { channel, visible });
                }
            }
        });
    }
    fn trend_table(&self, ui: &mut egui::Ui) {
        let report = self.graph.trend_report();
        if report.is_empty() {
            return;
        }
        let unit = &self.graph.config().value_unit;
        egui::Grid::new("trends")
            .striped(true)
            .num_columns(5)
            .show(ui, |ui| {
                ui.strong("Channel");
                ui.strong("Trend");
                ui.strong("Avg");
                ui.strong("Δ");
                ui.strong("N");
                ui.end_row();
                for (id, summary) in &report {
                    let name = self
                        .graph
                        .registry()
                        .get(*id)
                        .map_or_else(|| id.to_string(), |e| e.name.clone());
                    ui.label(name);
                    ui.label(summary.verdict.to_string());
                    ui.label(
                        summary
                            .avg
                            .map_or_else(|| "-".to_owned(), |v| format!("{v:.1}{unit}")),
                    );
                    ui.label(
                        summary
                            .delta
                            .map_or_else(|| "-".to_owned(), |v| format!("{v:+.1}{unit}")),
                    );
                    ui.label(summary.samples.to_string());
                    ui.end_row();
                }
            });
    }
}
impl eframe::App for ThermoViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();

        egui::SidePanel::left("setup").min_width(260.0).show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| self.setup_panel(ui));
        });
        egui::CentralPanel::default().show(ctx, |ui| {
            self.view_controls(ui);
            self.hover_text = visualizer::draw_graph(ui, &mut self.graph, GRAPH_HEIGHT);
            ui.label(RichText::new(&self.hover_text).monospace());
            if !self.last_line.is_empty() {
                ui.label(RichText::new(&self.last_line).monospace().small());
            }
            self.channel_toggles(ui);
            ui.separator();
            self.trend_table(ui);
        });

        ctx.request_repaint_after(Duration::from_millis(200));
    }
}
/// CJ first as channel 0, then inputs 1..=n. Blank names fall back to `CHn`.
pub fn build_channels(
    include_cj: bool,
    num_inputs: usize,
    names: &[String],
) -> Vec<(ChannelId, String)> {
    let mut channels = Vec::with_capacity(num_inputs + 1);
    if include_cj {
        channels.push((ChannelId(0), "CJ".to_owned()));
    }
    for i in 1..=num_inputs.min(MAX_INPUTS) {
        let name = names
            .get(i - 1)
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map_or_else(|| format!("CH{i}"), str::to_owned);
        channels.push((ChannelId(i as u32), name));
    }
    channels
}
/// Empty input means "run until stopped".
pub fn parse_duration_minutes(text: &str) -> Result<Option<f64>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(min) if min.is_finite() && min > 0.0 => Ok(Some(min * 60.0)),
        _ => Err(format!("Invalid duration '{text}' (minutes > 0 expected).")),
    }
}
/// `2024-05-01 09:30:00 | Arduino=24.90°C (hold=25.00°C, PWM=128)  CH1=21.50°C  CH2=NaN`
pub fn format_last_line<'a>(
    timestamp: &str,
    ambient: Option<AmbientReading>,
    channels: impl IntoIterator<Item = (&'a str, Option<f64>)>,
    unit: &str,
) -> String {
    let mut parts = Vec::new();
    if let Some(a) = ambient {
        parts.push(match a.temp {
            Some(t) => format!(
                "Arduino={t:.2}{unit} (hold={}{unit}, PWM={})",
                nan_or(a.hold, 2),
                nan_or(a.pwm, 0)
            ),
            None => "Arduino=NaN".to_owned(),
        });
    }
    for (name, value) in channels {
        match value {
            Some(v) => parts.push(format!("{name}={v:.2}{unit}")),
            None => parts.push(format!("{name}=NaN")),
        }
    }
    format!("{timestamp} | {}", parts.join("  "))
}
fn nan_or(val: Option<f64>, decimals: usize) -> String {
    val.map_or_else(|| "NaN".to_owned(), |v| format!("{v:.decimals$}"))
}
fn format_elapsed(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, total / 60 % 60, total % 60)
}
fn fmt_opt(val: Option<f64>, decimals: usize) -> String {
    val.map_or_else(|| "-".to_owned(), |v| format!("{v:.decimals$}"))
}
fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn channels_put_cold_junction_first() {
        let names = vec!["Oven".to_owned(), " ".to_owned()];
        let channels = build_channels(true, 3, &names);
        assert_eq!(
            channels,
            vec![
                (ChannelId(0), "CJ".to_owned()),
                (ChannelId(1), "Oven".to_owned()),
                (ChannelId(2), "CH2".to_owned()),
                (ChannelId(3), "CH3".to_owned()),
            ]
        );
        assert_eq!(build_channels(false, 1, &names).len(), 1);
    }
    #[test]
    fn duration_is_optional_minutes() {
        assert_eq!(parse_duration_minutes(""), Ok(None));
        assert_eq!(parse_duration_minutes("1.5"), Ok(Some(90.0)));
        assert!(parse_duration_minutes("0").is_err());
        assert!(parse_duration_minutes("abc").is_err());
    }
    fn test_app() -> (ThermoViewApp, Sender<EngineMessage>, Receiver<EngineCommand>) {
        let (tx, rx) = channel();
        let (tx_cmd, rx_cmd) = channel();
        (ThermoViewApp::with_engine(GraphConfig::default(), rx, tx_cmd), tx, rx_cmd)
    }
    fn tick(elapsed_secs: f64, readings: &[(u32, Option<f64>)]) -> EngineMessage {
        EngineMessage::Tick {
            timestamp: "2024-05-01 09:30:00".to_owned(),
            elapsed_secs,
            readings: readings.iter().map(|&(id, v)| (ChannelId(id), v)).collect(),
            ambient: None,
        }
    }
    #[test]
    fn history_is_kept_until_the_engine_confirms_a_new_run() {
        let (mut app, tx, rx_cmd) = test_app();
        app.num_inputs = 2;
        app.start_run();
        assert!(matches!(rx_cmd.try_recv(), Ok(EngineCommand::Start(_))));
        tx.send(EngineMessage::Running(true)).unwrap();
        tx.send(tick(0.0, &[(0, Some(22.0)), (1, Some(30.0)), (2, Some(31.0))]))
            .unwrap();
        app.drain_messages();
        assert_eq!(app.graph.registry().len(), 3);
        assert!(app.graph.global_extent().is_some());

        app.is_running = false;
        app.num_inputs = 4;
        app.start_run();
        // A rejected start must not wipe the previous run.
        assert_eq!(app.graph.registry().len(), 3);
        assert!(app.graph.global_extent().is_some());

        tx.send(EngineMessage::Running(true)).unwrap();
        app.drain_messages();
        assert_eq!(app.graph.registry().len(), 5);
        assert!(app.graph.global_extent().is_none());
        assert!(app.last_line.is_empty());
    }
    #[test]
    fn failed_start_drops_pending_channels() {
        let (mut app, tx, _rx_cmd) = test_app();
        app.start_run();
        tx.send(EngineMessage::Finished {
            path: None,
            error: true,
        })
        .unwrap();
        app.drain_messages();
        assert!(app.pending_channels.is_none());
        assert!(app.graph.registry().is_empty());
    }
    #[test]
    fn tick_updates_last_line_readout() {
        let (mut app, tx, _rx_cmd) = test_app();
        app.num_inputs = 2;
        app.start_run();
        tx.send(EngineMessage::Running(true)).unwrap();
        tx.send(tick(1.0, &[(0, Some(22.0)), (1, Some(21.456))]))
            .unwrap();
        app.drain_messages();
        assert_eq!(
            app.last_line,
            "2024-05-01 09:30:00 | CJ=22.00°C  CH1=21.46°C  CH2=NaN"
        );
    }
    #[test]
    fn last_line_includes_ambient_controller() {
        let ambient = AmbientReading {
            temp: Some(24.9),
            hold: Some(25.0),
            pwm: Some(127.6),
        };
        let line = format_last_line(
            "2024-05-01 09:30:00",
            Some(ambient),
            [("Oven", Some(80.0)), ("Door", None)],
            "°C",
        );
        assert_eq!(
            line,
            "2024-05-01 09:30:00 | Arduino=24.90°C (hold=25.00°C, PWM=128)  Oven=80.00°C  Door=NaN"
        );
        let cold = format_last_line(
            "t",
            Some(AmbientReading::default()),
            std::iter::empty(),
            "°C",
        );
        assert_eq!(cold, "t | Arduino=NaN");
    }
    #[test]
    fn elapsed_is_clock_formatted() {
        assert_eq!(format_elapsed(3725.9), "01:02:05");
        assert_eq!(format_elapsed(-1.0), "00:00:00");
    }
    #[test]
    fn optional_values_format() {
        assert_eq!(fmt_opt(Some(25.256), 2), "25.26");
        assert_eq!(fmt_opt(None, 2), "-");
    }
}

// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod ambient;
mod engine;
mod excel;
mod graph;
mod gui;
mod recorder;
mod types;
mod visualizer;
use eframe::egui;

use graph::GraphConfig;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let config = GraphConfig::load().unwrap_or_else(|err| {
        log::error!("config rejected, using defaults: {err}");
        GraphConfig::default()
    });
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1280.0, 800.0])
        .with_min_inner_size([950.0, 600.0])
        .with_title("ThermoView - Live Temperature Graph");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "ThermoView",
        options,
        Box::new(|_cc| Box::new(gui::ThermoViewApp::new(config))),
    )
}

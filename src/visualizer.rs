// src/visualizer.rs
use eframe::egui;
use egui::{Align2, Color32, FontId, Pos2, Rounding, Sense, Shape, Stroke, Vec2};

use crate::graph::{GraphState, PixelRect, PlotGeometry};

/// Series colours by registry slot; same order as the PNG export.
pub const SERIES_COLORS: [Color32; 8] = [
    Color32::from_rgb(0, 0, 255),
    Color32::from_rgb(255, 0, 0),
    Color32::from_rgb(0, 128, 0),
    Color32::from_rgb(128, 0, 128),
    Color32::from_rgb(255, 165, 0),
    Color32::from_rgb(165, 42, 42),
    Color32::from_rgb(255, 0, 255),
    Color32::from_rgb(0, 255, 255),
];
pub fn series_color(slot: usize) -> Color32 {
    SERIES_COLORS[slot % SERIES_COLORS.len()]
}
fn to_pos((x, y): (f64, f64)) -> Pos2 {
    Pos2::new(x as f32, y as f32)
}
/// Paints the live graph and returns the hover readout for this frame.
pub fn draw_graph(ui: &mut egui::Ui, state: &mut GraphState, height: f32) -> String {
    let size = Vec2::new(ui.available_width(), height);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let rect = response.rect;
    painter.rect_filled(rect, Rounding::same(2.0), Color32::WHITE);

    let canvas = PixelRect {
        left: f64::from(rect.left()),
        top: f64::from(rect.top()),
        right: f64::from(rect.right()),
        bottom: f64::from(rect.bottom()),
    };
    let Some(geometry) = state.render(canvas) else {
        painter.text(
            rect.center(),
            Align2::CENTER_CENTER,
            "Waiting for data",
            FontId::proportional(14.0),
            Color32::GRAY,
        );
        return String::new();
    };

    draw_grid(&painter, &geometry);

    let plot = geometry.rect;
    let axis = Stroke::new(2.0, Color32::BLACK);
    let origin = to_pos((plot.left, plot.bottom));
    painter.line_segment([to_pos((plot.left, plot.top)), origin], axis);
    painter.line_segment([origin, to_pos((plot.right, plot.bottom))], axis);

    let mut legend_y = rect.top() + 25.0;
    for entry in state.registry().visible() {
        let color = series_color(state.registry().slot(entry.id).unwrap_or(0));
        if let Some(series) = state.store().series(entry.id) {
            let points: Vec<Pos2> = geometry.polyline(series).into_iter().map(to_pos).collect();
            if points.len() >= 2 {
                painter.add(Shape::line(points, Stroke::new(1.5, color)));
            }
        }
        let x = rect.left() + 10.0;
        painter.line_segment(
            [Pos2::new(x, legend_y), Pos2::new(x + 18.0, legend_y)],
            Stroke::new(3.0, color),
        );
        painter.text(
            Pos2::new(x + 24.0, legend_y),
            Align2::LEFT_CENTER,
            &entry.name,
            FontId::proportional(12.0),
            Color32::BLACK,
        );
        legend_y += 18.0;
    }

    painter.text(
        Pos2::new(
            ((plot.left + plot.right) / 2.0) as f32,
            rect.bottom() - 2.0,
        ),
        Align2::CENTER_BOTTOM,
        format!(
            "Time (min) – window ≈ {:.2} min",
            (geometry.tmax - geometry.tmin) / 60.0
        ),
        FontId::proportional(11.0),
        Color32::DARK_GRAY,
    );

    response
        .hover_pos()
        .map(|pos| state.hover_readout(f64::from(pos.x), f64::from(pos.y)))
        .unwrap_or_default()
}
fn draw_grid(painter: &egui::Painter, geometry: &PlotGeometry) {
    let plot = geometry.rect;
    let grid = Stroke::new(1.0, Color32::from_gray(220));
    let font = FontId::proportional(10.0);
    for line in geometry.time_grid() {
        painter.line_segment(
            [to_pos((line.pixel, plot.top)), to_pos((line.pixel, plot.bottom))],
            grid,
        );
        painter.text(
            to_pos((line.pixel, plot.bottom + 2.0)),
            Align2::CENTER_TOP,
            &line.label,
            font.clone(),
            Color32::BLACK,
        );
    }
    for line in geometry.value_grid() {
        painter.line_segment(
            [to_pos((plot.left, line.pixel)), to_pos((plot.right, line.pixel))],
            grid,
        );
        painter.text(
            to_pos((plot.left - 5.0, line.pixel)),
            Align2::RIGHT_CENTER,
            &line.label,
            font.clone(),
            Color32::BLACK,
        );
    }
}

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::LineSeries;
use plotters::prelude::*;

use crate::graph::error::GraphError;
use crate::graph::{GraphState, PixelRect};

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
    pub palette: Vec<RGBColor>,
    /// Caption, axis labels and legend. Needs a system font.
    pub show_labels: bool,
}
impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 950,
            height: 500,
            background: WHITE,
            palette: PALETTE.to_vec(),
            show_labels: true,
        }
    }
}
/// Same order as the live view's channel colours.
pub const PALETTE: [RGBColor; 8] = [
    RGBColor(0, 0, 255),
    RGBColor(255, 0, 0),
    RGBColor(0, 128, 0),
    RGBColor(128, 0, 128),
    RGBColor(255, 165, 0),
    RGBColor(165, 42, 42),
    RGBColor(255, 0, 255),
    RGBColor(0, 255, 255),
];
/// Renders what the live graph currently shows (visible range, visible
/// channels, auto-scaled value axis) to PNG bytes. Time is drawn in minutes.
pub fn render_snapshot_png(state: &GraphState, style: PlotStyle) -> Result<Vec<u8>, GraphError> {
    let canvas = PixelRect::from_size(f64::from(style.width), f64::from(style.height));
    let geometry = state
        .compute_geometry(canvas)
        .ok_or(GraphError::NothingToExport)?;
    let has_visible_data = state.registry().visible().any(|entry| {
        state
            .store()
            .series(entry.id)
            .is_some_and(|s| s.in_range(geometry.tmin, geometry.tmax).next().is_some())
    });
    if !has_visible_data {
        return Err(GraphError::NothingToExport);
    }
    let unit = state.config().value_unit.clone();
    let palette: &[RGBColor] = if style.palette.is_empty() {
        &PALETTE
    } else {
        &style.palette
    };
    let mut buffer = vec![0u8; (style.width * style.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&style.background)?;
        let label_area = if style.show_labels { 45 } else { 0 };
        let mut builder = ChartBuilder::on(&root);
        builder
            .margin(10)
            .set_label_area_size(LabelAreaPosition::Left, label_area)
            .set_label_area_size(LabelAreaPosition::Bottom, label_area);
        if style.show_labels {
            builder.caption("Live Temperature Graph", ("sans-serif", 20).into_font());
        }
        let mut chart = builder.build_cartesian_2d(
            geometry.tmin / 60.0..geometry.tmax / 60.0,
            geometry.vmin..geometry.vmax,
        )?;
        {
            let mut mesh = chart.configure_mesh();
            mesh.light_line_style(BLACK.mix(0.1));
            if style.show_labels {
                mesh.x_desc("Time (min)").y_desc(unit.as_str());
            } else {
                mesh.x_labels(0).y_labels(0);
            }
            mesh.draw()?;
        }
        for entry in state.registry().visible() {
            let Some(series) = state.store().series(entry.id) else {
                continue;
            };
            let points: Vec<(f64, f64)> = series
                .in_range(geometry.tmin, geometry.tmax)
                .map(|s| (s.time / 60.0, s.value))
                .collect();
            if points.len() < 2 {
                continue;
            }
            let slot = state.registry().slot(entry.id).unwrap_or(0);
            let color = palette[slot % palette.len()];
            let drawn = chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?;
            if style.show_labels {
                drawn
                    .label(entry.name.clone())
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            }
        }
        if style.show_labels {
            chart
                .configure_series_labels()
                .border_style(BLACK.mix(0.2))
                .background_style(style.background)
                .draw()?;
        }
        root.present()?;
    }
    encode_png(&buffer, style.width, style.height)
}
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>, GraphError> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| GraphError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    let dynamic = DynamicImage::ImageRgb8(image);
    dynamic.write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::source::Readings;
    use crate::graph::ChannelId;
    fn unlabelled() -> PlotStyle {
        PlotStyle {
            width: 400,
            height: 240,
            show_labels: false,
            ..PlotStyle::default()
        }
    }
    #[test]
    fn snapshot_is_png() {
        let mut state = GraphState::default();
        state.set_channels(vec![(ChannelId(1), "CH1".to_owned())]);
        for t in 0..20 {
            state.add_sample(t as f64, &Readings::from([(ChannelId(1), Some(20.0 + t as f64))]));
        }
        let png = render_snapshot_png(&state, unlabelled()).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
    #[test]
    fn empty_palette_uses_default_colours() {
        let mut state = GraphState::default();
        state.set_channels(vec![
            (ChannelId(1), "CH1".to_owned()),
            (ChannelId(2), "CH2".to_owned()),
        ]);
        for t in 0..10 {
            state.add_sample(
                t as f64,
                &Readings::from([(ChannelId(1), Some(20.0)), (ChannelId(2), Some(30.0 + t as f64))]),
            );
        }
        let style = PlotStyle {
            palette: Vec::new(),
            ..unlabelled()
        };
        let png = render_snapshot_png(&state, style).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
    #[test]
    fn empty_or_hidden_state_has_nothing_to_export() {
        let mut state = GraphState::default();
        state.set_channels(vec![(ChannelId(1), "CH1".to_owned())]);
        assert!(matches!(
            render_snapshot_png(&state, unlabelled()),
            Err(GraphError::NothingToExport)
        ));
        state.add_sample(0.0, &Readings::from([(ChannelId(1), Some(20.0))]));
        state.set_visible(ChannelId(1), false);
        assert!(matches!(
            render_snapshot_png(&state, unlabelled()),
            Err(GraphError::NothingToExport)
        ));
    }
}

use crate::graph::{ChannelSeries, Sample};

/// Number of equal divisions on each axis.
pub const GRID_DIVISIONS: usize = 5;

/// Axis-aligned pixel rectangle, y growing downwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}
impl PixelRect {
    pub fn from_size(width: f64, height: f64) -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            right: width,
            bottom: height,
        }
    }
    pub fn width(&self) -> f64 {
        self.right - self.left
    }
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.top && y <= self.bottom
    }
}
/// Space reserved around the plot area inside the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotMargins {
    /// Legend column plus y-axis labels.
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}
impl Default for PlotMargins {
    fn default() -> Self {
        Self {
            left: 130.0 + 30.0,
            right: 40.0,
            top: 20.0,
            bottom: 30.0,
        }
    }
}
#[derive(Clone, Debug, PartialEq)]
pub struct GridLine {
    /// Pixel x for time lines, pixel y for value lines.
    pub pixel: f64,
    pub value: f64,
    pub label: String,
}
/// Geometry of one redraw: where the visible data rectangle lands on screen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlotGeometry {
    pub rect: PixelRect,
    pub tmin: f64,
    pub tmax: f64,
    pub vmin: f64,
    pub vmax: f64,
}
impl PlotGeometry {
    pub fn pixel_x(&self, t: f64) -> f64 {
        self.rect.left + (t - self.tmin) / (self.tmax - self.tmin) * self.rect.width()
    }
    pub fn pixel_y(&self, v: f64) -> f64 {
        self.rect.bottom - (v - self.vmin) / (self.vmax - self.vmin) * self.rect.height()
    }
    /// Time under a pointer, `None` outside the plot rectangle.
    pub fn time_at(&self, x: f64, y: f64) -> Option<f64> {
        if !self.rect.contains(x, y) {
            return None;
        }
        Some(self.tmin + (x - self.rect.left) / self.rect.width() * (self.tmax - self.tmin))
    }
    /// Value under a pointer, `None` outside the plot rectangle.
    #[cfg(test)]
    pub fn value_at(&self, x: f64, y: f64) -> Option<f64> {
        if !self.rect.contains(x, y) {
            return None;
        }
        Some(self.vmin + (self.rect.bottom - y) / self.rect.height() * (self.vmax - self.vmin))
    }
    /// Vertical grid lines, labelled in minutes.
    pub fn time_grid(&self) -> Vec<GridLine> {
        (0..=GRID_DIVISIONS)
            .map(|i| {
                let frac = i as f64 / GRID_DIVISIONS as f64;
                let t = self.tmin + (self.tmax - self.tmin) * frac;
                GridLine {
                    pixel: self.rect.left + self.rect.width() * frac,
                    value: t,
                    label: format!("{:.1}", t / 60.0),
                }
            })
            .collect()
    }
    /// Horizontal grid lines from the top (vmax) down to the bottom (vmin).
    pub fn value_grid(&self) -> Vec<GridLine> {
        (0..=GRID_DIVISIONS)
            .map(|j| {
                let frac = j as f64 / GRID_DIVISIONS as f64;
                let v = self.vmax - (self.vmax - self.vmin) * frac;
                GridLine {
                    pixel: self.rect.top + self.rect.height() * frac,
                    value: v,
                    label: format!("{v:.1}"),
                }
            })
            .collect()
    }
    /// Screen points of the in-range samples of a series. Fewer than two
    /// points means there is no line to draw.
    pub fn polyline(&self, series: &ChannelSeries) -> Vec<(f64, f64)> {
        series
            .in_range(self.tmin, self.tmax)
            .map(|s| (self.pixel_x(s.time), self.pixel_y(s.value)))
            .collect()
    }
}
/// Turns a visible time range and the visible series into pixel geometry.
#[derive(Clone, Debug)]
pub struct CoordinateMapper {
    pub margins: PlotMargins,
    pub min_plot_size: f64,
}
impl CoordinateMapper {
    pub fn new(min_plot_size: f64) -> Self {
        Self {
            margins: PlotMargins::default(),
            min_plot_size,
        }
    }
    /// Plot rectangle inside `canvas`, or `None` when it is too small to draw.
    pub fn plot_rect(&self, canvas: PixelRect) -> Option<PixelRect> {
        let rect = PixelRect {
            left: canvas.left + self.margins.left,
            top: canvas.top + self.margins.top,
            right: canvas.right - self.margins.right,
            bottom: canvas.bottom - self.margins.bottom,
        };
        if rect.width() <= self.min_plot_size || rect.height() <= self.min_plot_size {
            return None;
        }
        Some(rect)
    }
    /// Builds the geometry for `(tmin, tmax)`. The value axis is scaled to
    /// the in-range samples of `visible` only.
    pub fn geometry<'a>(
        &self,
        canvas: PixelRect,
        (tmin, tmax): (f64, f64),
        visible: impl IntoIterator<Item = &'a ChannelSeries>,
    ) -> Option<PlotGeometry> {
        let rect = self.plot_rect(canvas)?;
        let (vmin, vmax) = value_range(tmin, tmax, visible).unwrap_or((0.0, 1.0));
        let tmax = if tmax <= tmin { tmin + 1.0 } else { tmax };
        let vmax = if vmax <= vmin { vmin + 1.0 } else { vmax };
        Some(PlotGeometry {
            rect,
            tmin,
            tmax,
            vmin,
            vmax,
        })
    }
}
impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(10.0)
    }
}
fn value_range<'a>(
    tmin: f64,
    tmax: f64,
    series: impl IntoIterator<Item = &'a ChannelSeries>,
) -> Option<(f64, f64)> {
    series
        .into_iter()
        .flat_map(|s| s.in_range(tmin, tmax))
        .map(|s: &Sample| s.value)
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

// Live multi-channel graph: history, trends, zoom/pan and pixel mapping.
pub mod config;
pub mod error;
pub mod hover;
pub mod mapper;
pub mod plot;
pub mod registry;
pub mod source;
pub mod state;
pub mod store;
pub mod trend;
pub mod viewport;
pub use config::GraphConfig;
pub use error::GraphError;
pub use mapper::{CoordinateMapper, PixelRect, PlotGeometry};
pub use plot::{render_snapshot_png, PlotStyle};
pub use registry::{ChannelId, ChannelRegistry};
pub use source::{ReadingSource, Readings, SimulatedSensors};
pub use state::{GraphState, ViewCommand};
pub use store::{ChannelSeries, Extent, Sample, TimeSeriesStore};
pub use trend::{TrendClassifier, TrendSummary};
pub use viewport::ViewportController;

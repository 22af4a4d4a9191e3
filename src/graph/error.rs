use thiserror::Error;
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("invalid config value for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("no visible samples to export")]
    NothingToExport,
    #[cfg(test)]
    #[error("reading source exhausted")]
    SourceExhausted,
    #[error("failed to render snapshot: {0}")]
    Plot(String),
}
impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for GraphError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        GraphError::Plot(format!("{value:?}"))
    }
}
impl From<image::ImageError> for GraphError {
    fn from(value: image::ImageError) -> Self {
        GraphError::Plot(value.to_string())
    }
}

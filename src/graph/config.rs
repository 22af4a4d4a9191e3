use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::graph::GraphError;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV_VAR: &str = "THERMOVIEW_CONFIG";
/// Config file looked up in the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "thermoview.json";

/// Tunables for history, trend detection and the viewport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Samples kept per channel for the live graph.
    pub max_points: usize,
    /// Number of recent readings used for trend classification.
    pub trend_window: usize,
    /// Band (in value units) inside which a channel counts as stable.
    pub trend_threshold: f64,
    pub sample_interval_secs: f64,
    /// Window width used when zooming in from the full view.
    pub default_window_secs: f64,
    pub min_window_secs: f64,
    /// Smallest plot rectangle (pixels, both axes) worth drawing.
    pub min_plot_size: f64,
    pub value_unit: String,
    /// Folder for CSV logs and PNG snapshots.
    pub output_dir: PathBuf,
}
impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_points: 2000,
            trend_window: 10,
            trend_threshold: 3.0,
            sample_interval_secs: 1.0,
            default_window_secs: 300.0,
            min_window_secs: 5.0,
            min_plot_size: 10.0,
            value_unit: "°C".to_owned(),
            output_dir: PathBuf::from("logs"),
        }
    }
}
impl GraphConfig {
    pub fn from_json_str(text: &str) -> Result<Self, GraphError> {
        let config: GraphConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }
    pub fn from_path(path: &Path) -> Result<Self, GraphError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
    /// Loads the config from `THERMOVIEW_CONFIG`, then `thermoview.json`,
    /// falling back to defaults when neither file exists.
    pub fn load() -> Result<Self, GraphError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if path.exists() {
            log::info!("loading config from {}", path.display());
            Self::from_path(&path)
        } else {
            log::debug!("no config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.max_points == 0 {
            return Err(invalid("max_points", "must be at least 1"));
        }
        if self.trend_window < 2 {
            return Err(invalid("trend_window", "must be at least 2"));
        }
        if !self.trend_threshold.is_finite() || self.trend_threshold < 0.0 {
            return Err(invalid("trend_threshold", "must be a finite value >= 0"));
        }
        for (field, value) in [
            ("sample_interval_secs", self.sample_interval_secs),
            ("default_window_secs", self.default_window_secs),
            ("min_window_secs", self.min_window_secs),
            ("min_plot_size", self.min_plot_size),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, "must be a finite value > 0"));
            }
        }
        if self.min_window_secs > self.default_window_secs {
            return Err(invalid(
                "min_window_secs",
                format!(
                    "{} exceeds default_window_secs {}",
                    self.min_window_secs, self.default_window_secs
                ),
            ));
        }
        Ok(())
    }
}
fn invalid(field: &'static str, reason: impl Into<String>) -> GraphError {
    GraphError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn defaults_are_valid() {
        let config = GraphConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_points, 2000);
        assert_eq!(config.trend_window, 10);
    }
    #[test]
    fn partial_json_keeps_defaults() {
        let config = GraphConfig::from_json_str(r#"{ "trend_window": 4 }"#).unwrap();
        assert_eq!(config.trend_window, 4);
        assert_eq!(config.max_points, 2000);
        assert_eq!(config.trend_threshold, 3.0);
    }
    #[test]
    fn rejects_short_trend_window() {
        let err = GraphConfig::from_json_str(r#"{ "trend_window": 1 }"#).unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidConfig {
                field: "trend_window",
                ..
            }
        ));
    }
    #[test]
    fn rejects_min_window_above_default() {
        let config = GraphConfig {
            min_window_secs: 600.0,
            ..GraphConfig::default()
        };
        assert!(config.validate().is_err());
    }
    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GraphConfig::from_json_str("{ max_points: ").unwrap_err();
        assert!(matches!(err, GraphError::ConfigParse(_)));
    }
}

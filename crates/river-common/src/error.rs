//! Error types for the river heatmap engine.

use thiserror::Error;

/// Result type alias using HeatmapError.
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Primary error type for heatmap operations.
#[derive(Debug, Error)]
pub enum HeatmapError {
    // === Configuration Errors ===
    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Invalid parameter layer '{key}': {message}")]
    InvalidLayer { key: String, message: String },

    #[error("Invalid sensor '{id}': {message}")]
    InvalidSensor { id: String, message: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // === Data Errors ===
    #[error("Invalid sample grid: {0}")]
    InvalidGrid(String),

    // === Output Errors ===
    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl HeatmapError {
    /// True for errors caused by the host's configuration rather than by
    /// rendering or output.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            HeatmapError::UnknownParameter(_)
                | HeatmapError::InvalidLayer { .. }
                | HeatmapError::InvalidSensor { .. }
                | HeatmapError::InvalidColor(_)
                | HeatmapError::Config(_)
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::Config(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for HeatmapError {
    fn from(err: serde_yaml::Error) -> Self {
        HeatmapError::Config(format!("YAML error: {}", err))
    }
}

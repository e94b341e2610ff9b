//! Error types for the elevation band runner.

use elevband_dem::DemError;
use elevband_scene::SceneError;
use thiserror::Error;

/// Errors that end an elevation band run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Elevation generation failed.
    #[error(transparent)]
    Dem(#[from] DemError),

    /// Scene metadata could not be read or updated.
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML configuration could not be parsed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration is incomplete or inconsistent.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Command-line arguments are inconsistent.
    #[error("{0}")]
    InvalidArguments(String),
}

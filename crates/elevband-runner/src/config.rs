//! Run configuration.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration as long as `ESPA_ELEVATION_DIR` names the reference
//! data.

use crate::{Result, RunError};
use elevband_dem::{GeneratorSettings, ReferenceData, DEFAULT_MAXBOX_PADDING};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the reference data root.
pub const ELEVATION_DIR_ENV: &str = "ESPA_ELEVATION_DIR";

/// Default warp cache size in megabytes.
pub const DEFAULT_WARP_MEMORY_MB: u32 = 2048;

/// Degrees of extra padding used when indexing GTOPO30 tiles.
const DEFAULT_GTOPO30_PADDING: f64 = 1.0;

/// Configuration for building an elevation band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Reference data root. Falls back to `ESPA_ELEVATION_DIR`.
    pub elevation_dir: Option<PathBuf>,
    /// Directory the output and intermediate files are written to.
    pub work_dir: PathBuf,
    /// Degrees added to every side of the scene box.
    pub maxbox_padding: f64,
    /// Degrees added when indexing GTOPO30 tiles.
    pub gtopo30_padding: f64,
    /// Warp cache size (`-wm`).
    pub warp_memory_mb: u32,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            elevation_dir: None,
            work_dir: PathBuf::from("."),
            maxbox_padding: DEFAULT_MAXBOX_PADDING,
            gtopo30_padding: DEFAULT_GTOPO30_PADDING,
            warp_memory_mb: DEFAULT_WARP_MEMORY_MB,
        }
    }
}

impl ElevationConfig {
    /// Load from a YAML file, or JSON when the extension is `.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Self = if is_json {
            serde_json::from_str(&text)?
        } else {
            serde_yaml::from_str(&text)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could use.
    pub fn validate(&self) -> Result<()> {
        if self.maxbox_padding < 0.0 || self.gtopo30_padding < 0.0 {
            return Err(RunError::Config(
                "padding values must be non-negative".to_string(),
            ));
        }
        if self.warp_memory_mb == 0 {
            return Err(RunError::Config(
                "warp_memory_mb must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Reference data root: the configured directory, else the environment.
    pub fn elevation_root(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.elevation_dir {
            return Ok(dir.clone());
        }
        match std::env::var_os(ELEVATION_DIR_ENV) {
            Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
            _ => Err(RunError::Config(format!(
                "{ELEVATION_DIR_ENV} environment variable not defined"
            ))),
        }
    }

    /// The reference data layout under [`Self::elevation_root`].
    pub fn reference_data(&self) -> Result<ReferenceData> {
        Ok(ReferenceData::from_root(self.elevation_root()?))
    }

    /// Generator margins.
    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            maxbox_padding: self.maxbox_padding,
            gtopo30_padding: self.gtopo30_padding,
        }
    }
}

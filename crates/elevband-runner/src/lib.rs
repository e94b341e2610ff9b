//! # elevband-runner
//!
//! Builds the elevation band for a Landsat scene from the command line.
//!
//! The run reads the scene metadata, asks GDAL for the reference band's
//! projection, and hands the scene box and output grid to
//! [`elevband_dem::ElevationGenerator`], backed by:
//!
//! - [`GdalRasters`]: warping, georeferencing, pixel access and coordinate
//!   projection through the GDAL library.
//! - [`FsTileRepository`]: GLS tiles and GTOPO30 archives staged from the
//!   reference data directory (`ESPA_ELEVATION_DIR`).
//!
//! Afterwards the ENVI header is finalized and, for XML metadata, the band is
//! recorded in the metadata document.

mod cli;
mod config;
mod error;
mod logging;
mod raster;
mod repository;
mod run;

pub use cli::Args;
pub use config::{ElevationConfig, DEFAULT_WARP_MEMORY_MB, ELEVATION_DIR_ENV};
pub use error::RunError;
pub use logging::{default_directive, init_logging};
pub use raster::{corner_transform, warp_options, GdalRasters, GEOGRAPHIC_EPSG, SHIFTED_TILE_DRIVER};
pub use repository::FsTileRepository;
pub use run::{app_version, build_elevation_band, remove_gdal_aux_files, run, RunOptions, RunSummary};

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunError>;

//! Error types for the DEM crate.

use thiserror::Error;

/// Errors that can occur while selecting, assembling, or correcting DEM data.
#[derive(Debug, Error)]
pub enum DemError {
    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Polygon vertex list cannot be used for a containment test.
    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    /// The candidate DEM footprint does not cover enough of the scene.
    ///
    /// Recoverable: the caller falls back to GTOPO30.
    #[error("Insufficient overlap: only found {found} points within data when at least {required} are required")]
    InsufficientCoverage {
        /// Number of scene sample points inside the DEM footprint.
        found: usize,
        /// Minimum number of points that must be inside.
        required: usize,
    },

    /// No candidate tiles could be derived from the bounding box.
    #[error("Unable to determine tiles while retrieving the required {dem} tile list")]
    NoTiles {
        /// Name of the DEM whose tile list was empty.
        dem: &'static str,
    },

    /// None of the candidate GLS tiles exist.
    ///
    /// Recoverable: GLS has no tiles over open ocean, so the caller falls back to GTOPO30.
    #[error("GLS DEM is over water: none of the {expected} candidate tiles are available")]
    OverWater {
        /// Number of candidate tiles that were looked up.
        expected: usize,
    },

    /// A tile that must exist is missing from the tile repository.
    #[error("Tile {0} is not available in the tile repository")]
    TileUnavailable(String),

    /// Tile identifier does not follow the hemisphere/degree naming convention.
    #[error("Invalid tile identifier: {0}")]
    InvalidTileName(String),

    /// Elevation and geoid rasters differ in size.
    #[error("The size of the geoid ({geoid_rows}x{geoid_cols}) and elevation ({elevation_rows}x{elevation_cols}) do not match")]
    DimensionMismatch {
        /// Elevation raster rows.
        elevation_rows: usize,
        /// Elevation raster columns.
        elevation_cols: usize,
        /// Geoid raster rows.
        geoid_rows: usize,
        /// Geoid raster columns.
        geoid_cols: usize,
    },

    /// Raster buffer length does not agree with its declared dimensions.
    #[error("Raster buffer holds {len} values but {rows}x{cols} were declared")]
    BufferSize {
        /// Declared rows.
        rows: usize,
        /// Declared columns.
        cols: usize,
        /// Actual number of values.
        len: usize,
    },

    /// ENVI header is missing a field or has an unparsable one.
    #[error("Invalid raster header {path}: {reason}")]
    InvalidHeader {
        /// Header file path.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Warp parameters are inconsistent.
    #[error("Invalid warp request: {0}")]
    InvalidWarpRequest(String),

    /// A raster operation in the backing library failed.
    #[error("{operation} failed: {message}")]
    RasterOperation {
        /// Operation and the file it ran on.
        operation: String,
        /// Diagnostic from the library.
        message: String,
    },

    /// A raster service produced output that could not be interpreted.
    #[error("Unexpected output from {tool}: {reason}")]
    UnexpectedOutput {
        /// Service or operation name.
        tool: String,
        /// Why the output was rejected.
        reason: String,
    },
}

impl DemError {
    /// Whether this error is one of the designed fallback signals.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            DemError::InsufficientCoverage { .. } | DemError::OverWater { .. }
        )
    }
}

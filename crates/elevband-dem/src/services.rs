//! Interfaces to the raster tooling and tile store the generator drives.
//!
//! The generator only decides *what* to warp, shift, and stage. The
//! implementations behind these traits do the raster work; the runner crate
//! backs them with the GDAL library and the reference-data directory.

use crate::antimeridian::CornerBounds;
use crate::bounds::MapExtents;
use crate::datum::Int16Raster;
use crate::geometry::GeoTransform;
use crate::scratch::ScratchFiles;
use crate::select::DemSource;
use crate::{DemError, Result};
use std::path::{Path, PathBuf};

// ============================================================================
// Warp requests
// ============================================================================

/// Parameters for one warp or mosaic operation.
#[derive(Debug, Clone, PartialEq)]
pub struct WarpRequest {
    /// Resampling method, e.g. `bilinear`.
    pub resampling: Option<String>,
    /// Target pixel width.
    pub resolution_x: Option<f64>,
    /// Target pixel height.
    pub resolution_y: Option<f64>,
    /// Target spatial reference.
    pub target_srs: Option<String>,
    /// Output extents in target coordinates.
    pub extents: Option<MapExtents>,
    /// No-data value written for uncovered pixels.
    pub no_data: Option<f64>,
    /// Output pixel type.
    pub output_type: String,
    /// Output raster format.
    pub output_format: String,
    /// One source, or several to mosaic in order.
    pub sources: Vec<PathBuf>,
    /// Output raster path.
    pub output: PathBuf,
}

impl WarpRequest {
    /// An `Int16` ENVI warp of `sources` into `output` with nothing else set.
    pub fn new(sources: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            resampling: None,
            resolution_x: None,
            resolution_y: None,
            target_srs: None,
            extents: None,
            no_data: None,
            output_type: "Int16".to_string(),
            output_format: "ENVI".to_string(),
            sources,
            output: output.into(),
        }
    }

    /// Set the resampling method.
    pub fn resampling(mut self, method: impl Into<String>) -> Self {
        self.resampling = Some(method.into());
        self
    }

    /// Set both target resolutions.
    pub fn resolution(mut self, x: f64, y: f64) -> Self {
        self.resolution_x = Some(x);
        self.resolution_y = Some(y);
        self
    }

    /// Set the target spatial reference.
    pub fn target_srs(mut self, srs: impl Into<String>) -> Self {
        self.target_srs = Some(srs.into());
        self
    }

    /// Set the output extents.
    pub fn extents(mut self, extents: MapExtents) -> Self {
        self.extents = Some(extents);
        self
    }

    /// Set the no-data value.
    pub fn no_data(mut self, value: f64) -> Self {
        self.no_data = Some(value);
        self
    }

    /// Check the request is complete and consistent.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(DemError::InvalidWarpRequest(
                "at least one source raster is required".to_string(),
            ));
        }

        match (self.resolution_x, self.resolution_y) {
            (Some(_), None) | (None, Some(_)) => Err(DemError::InvalidWarpRequest(
                "both resolution_x and resolution_y must be specified".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

// ============================================================================
// Service traits
// ============================================================================

/// Resamples, reprojects, and mosaics rasters.
pub trait RasterWarpService {
    /// Perform a warp. Implementations should call [`WarpRequest::validate`].
    fn warp(&self, request: &WarpRequest) -> Result<()>;

    /// Copy `source` to `output` with its georeferenced corners replaced.
    /// Pixel data is not altered.
    fn assign_bounds(&self, source: &Path, bounds: &CornerBounds, output: &Path) -> Result<()>;
}

/// Reads georeferencing from raster files.
pub trait RasterIntrospection {
    /// Spatial reference of the raster as a projection string.
    fn projection_string(&self, path: &Path) -> Result<String>;

    /// Affine transform of the raster.
    fn transform(&self, path: &Path) -> Result<GeoTransform>;

    /// Raster size as `(rows, cols)`.
    fn raster_size(&self, path: &Path) -> Result<(usize, usize)>;
}

/// Reads and rewrites pixel values of single-band rasters.
pub trait RasterBandStore {
    /// Band 1 of `path` as signed 16-bit values.
    fn read_int16(&self, path: &Path) -> Result<Int16Raster>;

    /// Overwrite band 1 of the existing raster `path`. The raster keeps its
    /// georeferencing and must already have the dimensions of `raster`.
    fn write_int16(&self, path: &Path, raster: &Int16Raster) -> Result<()>;
}

/// Projects geographic WGS84 coordinates into another spatial reference.
pub trait MapProjector {
    /// Project `(longitude, latitude)` points into `target_srs`.
    fn project(&self, target_srs: &str, points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>>;
}

/// Local files backing one resolved tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFiles {
    /// Raster data file.
    pub data_path: PathBuf,
    /// Header describing the data file.
    pub header_path: PathBuf,
}

/// Supplies DEM tiles.
pub trait TileRepository {
    /// Stage the files for `identifier` of `source` into the scratch work
    /// directory, registering everything staged with `scratch`.
    ///
    /// Returns `Ok(None)` when the repository has no such tile.
    fn resolve(
        &self,
        source: DemSource,
        identifier: &str,
        scratch: &mut ScratchFiles,
    ) -> Result<Option<TileFiles>>;
}

/// The services one generation run uses.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    /// Warp and bounds assignment.
    pub warp: &'a dyn RasterWarpService,
    /// Raster georeferencing queries.
    pub introspection: &'a dyn RasterIntrospection,
    /// Pixel reads and writes.
    pub bands: &'a dyn RasterBandStore,
    /// Geographic to map projection.
    pub projector: &'a dyn MapProjector,
    /// Tile lookup and staging.
    pub tiles: &'a dyn TileRepository,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warp_request_builder() {
        let request = WarpRequest::new(vec![PathBuf::from("a.bil")], "out.img")
            .resampling("bilinear")
            .resolution(30.0, 30.0)
            .no_data(0.0);

        assert_eq!(request.resampling.as_deref(), Some("bilinear"));
        assert_eq!(request.output_type, "Int16");
        assert_eq!(request.output_format, "ENVI");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_warp_request_requires_sources() {
        let request = WarpRequest::new(Vec::new(), "out.img");
        assert!(matches!(
            request.validate(),
            Err(DemError::InvalidWarpRequest(_))
        ));
    }

    #[test]
    fn test_warp_request_requires_both_resolutions() {
        let mut request = WarpRequest::new(vec![PathBuf::from("a.bil")], "out.img");
        request.resolution_x = Some(30.0);
        assert!(matches!(
            request.validate(),
            Err(DemError::InvalidWarpRequest(_))
        ));
    }
}

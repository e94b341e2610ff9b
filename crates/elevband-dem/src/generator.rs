//! Elevation band generation: source selection, tile assembly, warping to the
//! scene grid, and geoid correction.

use crate::antimeridian::shift_western_tiles;
use crate::bounds::{GeoBoundingBox, MapExtents};
use crate::coverage::verify_coverage;
use crate::envi::header_path_for;
use crate::gls::{gls_candidate_tiles, resolve_gls_tiles};
use crate::gtopo30::{gtopo30_tiles, DEFAULT_PADDING};
use crate::reference::ReferenceData;
use crate::scratch::ScratchFiles;
use crate::select::{plan_source, DemSource};
use crate::services::{Services, WarpRequest};
use crate::{DemError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Padding, in degrees, applied to the scene bounding box before selection.
pub const DEFAULT_MAXBOX_PADDING: f64 = 0.2;

/// Resampling used when warping onto the scene grid.
pub const RESAMPLING_METHOD: &str = "bilinear";

/// Mosaic no-data value. Missing GLS tiles are ocean, so sea level.
pub const MOSAIC_NO_DATA: f64 = 0.0;

/// Intermediate mosaic file name.
pub const MOSAIC_IMAGE_NAME: &str = "espa-mosaic-elevation.img";

/// Geoid heights warped to the scene grid.
pub const WARPED_GEOID_IMAGE_NAME: &str = "espa-geoid.img";

/// The scene grid the elevation band is produced on.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// Target spatial reference (projection string of the scene).
    pub target_srs: String,
    /// Pixel width in target units.
    pub pixel_size_x: f64,
    /// Pixel height in target units.
    pub pixel_size_y: f64,
    /// Output extents in target coordinates.
    pub extents: MapExtents,
}

impl GridSpec {
    /// Warp of `source` onto this grid.
    fn warp_request(&self, source: &Path, output: &Path) -> WarpRequest {
        WarpRequest::new(vec![source.to_path_buf()], output)
            .resampling(RESAMPLING_METHOD)
            .resolution(self.pixel_size_x, self.pixel_size_y)
            .target_srs(self.target_srs.clone())
            .extents(self.extents)
    }
}

/// Tunable margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorSettings {
    /// Padding applied to the scene box before anything else.
    pub maxbox_padding: f64,
    /// Extra padding applied when indexing GTOPO30 tiles.
    pub gtopo30_padding: f64,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            maxbox_padding: DEFAULT_MAXBOX_PADDING,
            gtopo30_padding: DEFAULT_PADDING,
        }
    }
}

/// What a successful generation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationOutcome {
    /// Source the elevation values came from.
    pub source: DemSource,
    /// Whether geoid heights were added.
    pub datum_adjusted: bool,
    /// Whether the planned source failed over to its fallback.
    pub fallback_used: bool,
    /// The elevation raster written.
    pub output: PathBuf,
}

/// Builds an elevation raster for one scene.
pub struct ElevationGenerator<'a> {
    services: Services<'a>,
    reference: &'a ReferenceData,
    work_dir: PathBuf,
    settings: GeneratorSettings,
}

impl<'a> ElevationGenerator<'a> {
    /// Create a generator that stages intermediate files in `work_dir`.
    pub fn new(services: Services<'a>, reference: &'a ReferenceData, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            services,
            reference,
            work_dir: work_dir.into(),
            settings: GeneratorSettings::default(),
        }
    }

    /// Override the default margins.
    pub fn with_settings(mut self, settings: GeneratorSettings) -> Self {
        self.settings = settings;
        self
    }

    fn scratch(&self) -> ScratchFiles {
        ScratchFiles::new(&self.work_dir)
    }

    /// Produce the elevation raster `output` (ENVI, `Int16`) for a scene.
    ///
    /// On failure the output and every intermediate file are removed.
    pub fn generate(
        &self,
        scene_bbox: &GeoBoundingBox,
        grid: &GridSpec,
        output: &Path,
    ) -> Result<GenerationOutcome> {
        let bbox = scene_bbox.padded(self.settings.maxbox_padding);
        info!(
            "Padded bounding box: north {} south {} east {} west {}",
            bbox.north, bbox.south, bbox.east, bbox.west
        );

        let mut product = self.scratch();
        product.track(output);
        product.track(header_path_for(output));

        let outcome = self.generate_inner(&bbox, grid, output)?;

        product.keep(output);
        product.keep(&header_path_for(output));
        Ok(outcome)
    }

    fn generate_inner(&self, bbox: &GeoBoundingBox, grid: &GridSpec, output: &Path) -> Result<GenerationOutcome> {
        let plan = plan_source(bbox);
        info!("Selected {} elevation source", plan.primary);

        let (source, fallback_used) = match self.build(plan.primary, bbox, grid, output) {
            Ok(()) => (plan.primary, false),
            Err(e) if e.triggers_fallback() => match plan.fallback {
                Some(fallback) => {
                    warn!("{e}; defaulting to {fallback}");
                    self.build(fallback, bbox, grid, output)?;
                    (fallback, true)
                }
                None => return Err(e),
            },
            Err(e) => return Err(e),
        };

        let datum_adjusted = source.needs_geoid_correction();
        if datum_adjusted {
            self.adjust_to_geoid(grid, output)?;
        }

        Ok(GenerationOutcome {
            source,
            datum_adjusted,
            fallback_used,
            output: output.to_path_buf(),
        })
    }

    fn build(&self, source: DemSource, bbox: &GeoBoundingBox, grid: &GridSpec, output: &Path) -> Result<()> {
        match source {
            DemSource::Ramp => self.build_from_ramp(bbox, grid, output),
            DemSource::Gtopo30 => self.build_from_gtopo30(bbox, grid, output),
            DemSource::Gls => self.build_from_gls(bbox, grid, output),
        }
    }

    fn warp_to_grid(&self, source: &Path, grid: &GridSpec, output: &Path) -> Result<()> {
        self.services.warp.warp(&grid.warp_request(source, output))
    }

    fn build_from_ramp(&self, bbox: &GeoBoundingBox, grid: &GridSpec, output: &Path) -> Result<()> {
        let mut scratch = self.scratch();
        let image = link_reference(&mut scratch, &self.reference.ramp_image)?;
        link_reference(&mut scratch, &self.reference.ramp_header)?;

        let ramp_srs = self.services.introspection.projection_string(&image)?;
        debug!("RAMP projection: {ramp_srs}");

        let [ul, ur, lr, ll] = bbox.corners();
        let projected = self
            .services
            .projector
            .project(&ramp_srs, &[ul, ur, lr, ll, bbox.center()])?;
        let points: [(f64, f64); 5] =
            projected
                .try_into()
                .map_err(|points: Vec<(f64, f64)>| DemError::UnexpectedOutput {
                    tool: "projector".to_string(),
                    reason: format!("expected 5 projected points, got {}", points.len()),
                })?;
        debug!("Scene points in RAMP coordinates: {points:?}");

        let transform = self.services.introspection.transform(&image)?;
        let (rows, cols) = self.services.introspection.raster_size(&image)?;
        debug!("RAMP lines, samples: {rows}, {cols}");

        verify_coverage(rows, cols, &transform, &points)?;

        self.warp_to_grid(&image, grid, output)
    }

    fn build_from_gls(&self, bbox: &GeoBoundingBox, grid: &GridSpec, output: &Path) -> Result<()> {
        let mut scratch = self.scratch();

        let mut candidates = gls_candidate_tiles(bbox)?;
        debug!(
            "GLS candidate tiles: {}",
            candidates.iter().map(|t| t.identifier.as_str()).collect::<Vec<_>>().join(", ")
        );

        let files = resolve_gls_tiles(&mut candidates, self.services.tiles, &mut scratch)?;
        let data_paths: Vec<PathBuf> = files.into_iter().map(|f| f.data_path).collect();
        info!("GLS DEM files: {}", display_list(&data_paths));

        self.mosaic_and_warp(data_paths, bbox, grid, output, &mut scratch)
    }

    fn build_from_gtopo30(&self, bbox: &GeoBoundingBox, grid: &GridSpec, output: &Path) -> Result<()> {
        let mut scratch = self.scratch();

        let tiles = gtopo30_tiles(bbox, self.settings.gtopo30_padding);
        if tiles.is_empty() {
            return Err(DemError::NoTiles { dem: "GTOPO30" });
        }
        info!("GTOPO30 tile names: {}", tiles.join(", "));

        let mut data_paths = Vec::with_capacity(tiles.len());
        for tile in &tiles {
            let files = self
                .services
                .tiles
                .resolve(DemSource::Gtopo30, tile, &mut scratch)?
                .ok_or_else(|| DemError::TileUnavailable(tile.clone()))?;
            data_paths.push(files.data_path);
        }
        info!("GTOPO30 DEM files: {}", display_list(&data_paths));

        self.mosaic_and_warp(data_paths, bbox, grid, output, &mut scratch)
    }

    fn mosaic_and_warp(
        &self,
        mut data_paths: Vec<PathBuf>,
        bbox: &GeoBoundingBox,
        grid: &GridSpec,
        output: &Path,
        scratch: &mut ScratchFiles,
    ) -> Result<()> {
        if bbox.crosses_antimeridian() {
            let shifted = shift_western_tiles(
                &mut data_paths,
                self.services.warp,
                self.services.introspection,
                scratch,
            )?;
            info!("Scene crosses the antimeridian; shifted {shifted} western tiles");
        }

        let mosaic = scratch.track_name(MOSAIC_IMAGE_NAME);
        scratch.track(header_path_for(&mosaic));

        let request = WarpRequest::new(data_paths, &mosaic).no_data(MOSAIC_NO_DATA);
        self.services.warp.warp(&request)?;

        self.warp_to_grid(&mosaic, grid, output)
    }

    /// Warp the geoid onto the scene grid and add it to the elevations.
    fn adjust_to_geoid(&self, grid: &GridSpec, output: &Path) -> Result<()> {
        let mut scratch = self.scratch();
        let geoid = link_reference(&mut scratch, &self.reference.geoid_image)?;
        link_reference(&mut scratch, &self.reference.geoid_header)?;

        let warped = scratch.track_name(WARPED_GEOID_IMAGE_NAME);
        scratch.track(header_path_for(&warped));
        self.warp_to_grid(&geoid, grid, &warped)?;

        let bands = self.services.bands;
        let mut elevation = bands.read_int16(output)?;
        let geoid_heights = bands.read_int16(&warped)?;
        elevation.add_geoid(&geoid_heights)?;
        bands.write_int16(output, &elevation)?;

        info!("Adjusted elevation to the WGS84 geoid");
        Ok(())
    }
}

fn link_reference(scratch: &mut ScratchFiles, source: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DemError::TileUnavailable(source.display().to_string()))?;
    scratch.link(source, name)
}

fn display_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_warp_request() {
        let grid = GridSpec {
            target_srs: "+proj=utm +zone=11 +datum=WGS84 +units=m +no_defs".to_string(),
            pixel_size_x: 30.0,
            pixel_size_y: 30.0,
            extents: MapExtents::new(300.0, 4_000_000.0, 6_300.0, 4_006_000.0),
        };

        let request = grid.warp_request(Path::new("mosaic.img"), Path::new("out.img"));

        assert_eq!(request.resampling.as_deref(), Some(RESAMPLING_METHOD));
        assert_eq!(request.resolution_x, Some(30.0));
        assert_eq!(request.resolution_y, Some(30.0));
        assert_eq!(request.extents, Some(grid.extents));
        assert_eq!(request.no_data, None);
        assert_eq!(request.sources, vec![PathBuf::from("mosaic.img")]);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_default_settings() {
        let settings = GeneratorSettings::default();
        assert_eq!(settings.maxbox_padding, 0.2);
        assert_eq!(settings.gtopo30_padding, 1.0);
    }
}

//! The elevation band run: metadata in, finished band out.

use crate::cli::Args;
use crate::config::ElevationConfig;
use crate::raster::GdalRasters;
use crate::repository::FsTileRepository;
use crate::Result;
use chrono::Utc;
use elevband_dem::{
    finalize_elevation_header, header_path_for, DemSource, ElevationGenerator, GridSpec,
    ReferenceData, ScratchFiles, Services,
};
use elevband_scene::{open_scene, ElevationBand, MetadataSource, UserExtents};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix of GDAL auxiliary files removed after the build.
const GDAL_AUX_SUFFIX: &str = ".img.aux.xml";

/// Version recorded in the metadata of every band produced.
pub fn app_version() -> String {
    format!("ELEVATION_{}", env!("CARGO_PKG_VERSION"))
}

/// What to build.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Scene metadata.
    pub metadata: MetadataSource,
    /// Replacement extents and bounds.
    pub user_extents: Option<UserExtents>,
    /// Output image name; defaults to `<product_id>_elevation.img`.
    pub elevation: Option<PathBuf>,
}

impl RunOptions {
    /// Options from parsed command-line arguments.
    pub fn from_args(args: &Args) -> Result<Self> {
        Ok(Self {
            metadata: args.metadata_source()?,
            user_extents: args.user_extents()?,
            elevation: args.elevation.clone(),
        })
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// DEM the band was built from.
    pub source: DemSource,
    /// Elevation image.
    pub image: PathBuf,
    /// ENVI header of the image.
    pub header: PathBuf,
    /// Whether the band was recorded in the metadata document.
    pub band_recorded: bool,
}

/// Remove GDAL `*.img.aux.xml` files from `dir`. Returns how many were removed.
pub fn remove_gdal_aux_files(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_aux = path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(GDAL_AUX_SUFFIX));
        if is_aux && path.is_file() {
            fs::remove_file(&path)?;
            debug!("Removed {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

/// Build the elevation band for one scene with the given services.
///
/// Nothing is left in the work directory unless the band is finished and
/// recorded.
pub fn build_elevation_band(
    options: &RunOptions,
    config: &ElevationConfig,
    reference: &ReferenceData,
    services: Services<'_>,
) -> Result<RunSummary> {
    let scene = open_scene(&options.metadata, options.user_extents.as_ref())?;
    let info = scene.scene();
    debug!("Bounding box: {:?}", info.bounding_box);
    debug!("Extents: {:?}", info.extents);
    debug!("Pixel size: {:?}", info.pixel_size);
    debug!("Elevation data: {}", reference.root.display());

    let target_srs = services
        .introspection
        .projection_string(scene.reference_band_path())?;
    debug!("Target SRS: {target_srs}");

    let grid = GridSpec {
        target_srs,
        pixel_size_x: info.pixel_size.x,
        pixel_size_y: info.pixel_size.y,
        extents: info.extents,
    };

    let image_name = options
        .elevation
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{}_elevation.img", info.product_id)));
    let image = config.work_dir.join(&image_name);
    let header = header_path_for(&image);

    let mut product = ScratchFiles::new(&config.work_dir);
    product.track(&image);
    product.track(&header);

    let generator = ElevationGenerator::new(services, reference, &config.work_dir)
        .with_settings(config.generator_settings());
    let outcome = generator.generate(&info.bounding_box, &grid, &image)?;
    if outcome.fallback_used {
        warn!("Elevation built from fallback source {}", outcome.source);
    }

    remove_gdal_aux_files(&config.work_dir)?;
    finalize_elevation_header(&header)?;

    let file_name = image_name
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let band = ElevationBand::new(
        outcome.source,
        file_name,
        info.lines(),
        info.samples(),
        info.pixel_size.clone(),
        app_version(),
    );
    let band_recorded = scene.append_band(&band)?;

    product.keep(&image);
    product.keep(&header);
    Ok(RunSummary {
        source: outcome.source,
        image,
        header,
        band_recorded,
    })
}

/// Run with configuration and GDAL services resolved from the arguments.
pub fn run(args: &Args) -> Result<RunSummary> {
    let started = Utc::now();

    let mut config = match &args.config {
        Some(path) => ElevationConfig::load(path)?,
        None => ElevationConfig::default(),
    };
    if let Some(work_dir) = &args.work_dir {
        config.work_dir = work_dir.clone();
    }

    let options = RunOptions::from_args(args)?;
    let reference = config.reference_data()?;

    let rasters = GdalRasters::new(config.warp_memory_mb);
    let tiles = FsTileRepository::new(reference.clone());
    let services = Services {
        warp: &rasters,
        introspection: &rasters,
        bands: &rasters,
        projector: &rasters,
        tiles: &tiles,
    };

    let summary = build_elevation_band(&options, &config, &reference, services)?;

    let elapsed = Utc::now() - started;
    info!(
        "Elevation band {} built from {} in {}s",
        summary.image.display(),
        summary.source,
        elapsed.num_seconds()
    );
    Ok(summary)
}

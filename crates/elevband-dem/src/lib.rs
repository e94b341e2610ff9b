//! # elevband-dem
//!
//! DEM source selection, tile indexing, and geoid correction for building a
//! scene-aligned elevation band.
//!
//! ## Overview
//!
//! Three elevation sources are supported, each valid over part of the globe:
//!
//! - **RAMP**: a single 200 m Antarctic DEM, already referenced to WGS84.
//!   Used for scenes entirely south of 60°S after checking that its
//!   footprint covers the scene.
//! - **GLS**: 1°×1° tiles named by their lower-left corner (`n47w118`),
//!   between 53°S and 83°N. There are no tiles over open ocean.
//! - **GTOPO30**: 33 coarse global tiles named by their upper-left corner
//!   (`w140n40`). Used in the coverage gaps and as the fallback for the
//!   other two.
//!
//! GLS and GTOPO30 heights are relative to mean sea level, so the geoid
//! height is added after warping to reference them to the WGS84 ellipsoid.
//!
//! The raster work itself (warping, georeferencing queries, pixel access and
//! tile staging) goes through the traits in [`Services`], so the decision
//! logic can run against any backend.
//!
//! ## Example
//!
//! ```no_run
//! use elevband_dem::{
//!     ElevationGenerator, GeoBoundingBox, GridSpec, MapExtents, ReferenceData, Services,
//! };
//! # use elevband_dem::{
//! #     MapProjector, RasterBandStore, RasterIntrospection, RasterWarpService, TileRepository,
//! # };
//! # fn backends() -> (
//! #     Box<dyn RasterWarpService>,
//! #     Box<dyn RasterIntrospection>,
//! #     Box<dyn RasterBandStore>,
//! #     Box<dyn MapProjector>,
//! #     Box<dyn TileRepository>,
//! # ) { unimplemented!() }
//! # let (warp, introspection, bands, projector, tiles) = backends();
//!
//! let services = Services {
//!     warp: warp.as_ref(),
//!     introspection: introspection.as_ref(),
//!     bands: bands.as_ref(),
//!     projector: projector.as_ref(),
//!     tiles: tiles.as_ref(),
//! };
//! let reference = ReferenceData::from_root("/data/elevation");
//! let generator = ElevationGenerator::new(services, &reference, ".");
//!
//! let grid = GridSpec {
//!     target_srs: "+proj=utm +zone=11 +datum=WGS84 +units=m +no_defs".to_string(),
//!     pixel_size_x: 30.0,
//!     pixel_size_y: 30.0,
//!     extents: MapExtents::new(300.0, 4_000_000.0, 6_300.0, 4_006_000.0),
//! };
//! let bbox = GeoBoundingBox::new(36.2, 36.1, -117.1, -117.2);
//!
//! let outcome = generator.generate(&bbox, &grid, std::path::Path::new("scene_elevation.img"))?;
//! println!("Built from {}", outcome.source);
//! # Ok::<(), elevband_dem::DemError>(())
//! ```

mod antimeridian;
mod bounds;
mod coverage;
mod datum;
mod envi;
mod error;
mod generator;
mod geometry;
mod gls;
mod gtopo30;
mod reference;
mod scratch;
mod select;
mod services;
mod tile;

pub use antimeridian::{shift_western_tiles, shifted_bounds, CornerBounds, ANTIMERIDIAN_SHIFT};
pub use bounds::{GeoBoundingBox, MapExtents};
pub use coverage::{verify_coverage, MIN_POINTS_INSIDE};
pub use datum::Int16Raster;
pub use envi::{finalize_elevation_header, header_path_for, EnviHeader, ELEVATION_FILL_VALUE};
pub use error::DemError;
pub use generator::{
    ElevationGenerator, GenerationOutcome, GeneratorSettings, GridSpec, DEFAULT_MAXBOX_PADDING,
    MOSAIC_IMAGE_NAME, RESAMPLING_METHOD, WARPED_GEOID_IMAGE_NAME,
};
pub use geometry::{normalize_longitude, point_in_polygon, GeoTransform, Polygon};
pub use gls::{gls_candidate_tiles, longitude_cells, resolve_gls_tiles};
pub use gtopo30::gtopo30_tiles;
pub use reference::ReferenceData;
pub use scratch::ScratchFiles;
pub use select::{plan_source, DemSource, SourcePlan, GLS_NORTH_LIMIT, GLS_SOUTH_LIMIT, RAMP_SOUTH_LIMIT};
pub use services::{
    MapProjector, RasterBandStore, RasterIntrospection, RasterWarpService, Services, TileFiles,
    TileRepository, WarpRequest,
};
pub use tile::{gls_tile_name, gtopo30_tile_name, parse_origin, Tile, TileOrigin};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;

//! Antimeridian correction for tile mosaics.
//!
//! A scene crossing ±180° needs tiles from both ends of the longitude range.
//! Western tiles are re-expressed in a continuous 0°..360° frame by moving
//! their origin east by 360°, so the mosaic does not span the whole globe.

use crate::geometry::GeoTransform;
use crate::scratch::ScratchFiles;
use crate::services::{RasterIntrospection, RasterWarpService};
use crate::tile::is_western_name;
use crate::Result;
use std::path::PathBuf;
use tracing::{debug, info};

/// Origin offset applied to western tiles, in degrees.
pub const ANTIMERIDIAN_SHIFT: f64 = 360.0;

/// Suffix appended to the data file name of a shifted tile.
pub const SHIFTED_SUFFIX: &str = "_shifted";

/// Upper-left and lower-right corners of a raster in map coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerBounds {
    /// Upper-left X.
    pub ul_x: f64,
    /// Upper-left Y.
    pub ul_y: f64,
    /// Lower-right X.
    pub lr_x: f64,
    /// Lower-right Y.
    pub lr_y: f64,
}

/// Corners of a `rows` x `cols` raster after moving its origin `offset`
/// units along X. Y is unchanged.
pub fn shifted_bounds(transform: &GeoTransform, rows: usize, cols: usize, offset: f64) -> CornerBounds {
    let t = &transform.0;
    let lr_x = t[0] + cols as f64 * t[1];
    let lr_y = t[3] + rows as f64 * t[5];

    CornerBounds {
        ul_x: t[0] + offset,
        ul_y: t[3],
        lr_x: lr_x + offset,
        lr_y,
    }
}

/// Shift every western tile in `data_paths` by [`ANTIMERIDIAN_SHIFT`].
///
/// Each western tile is copied to `<name>_shifted` with new bounds, and the
/// copy replaces the original in the list. Returns the number shifted.
pub fn shift_western_tiles(
    data_paths: &mut [PathBuf],
    warp: &dyn RasterWarpService,
    introspection: &dyn RasterIntrospection,
    scratch: &mut ScratchFiles,
) -> Result<usize> {
    let mut shifted = 0;

    for path in data_paths.iter_mut() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !is_western_name(&name)? {
            continue;
        }

        let source = path.as_path();
        let transform = introspection.transform(source)?;
        let (rows, cols) = introspection.raster_size(source)?;
        let bounds = shifted_bounds(&transform, rows, cols, ANTIMERIDIAN_SHIFT);

        let output = scratch.track(source.with_file_name(format!("{name}{SHIFTED_SUFFIX}")));
        info!("Shifting {} to {}", source.display(), output.display());
        debug!("Shifted bounds: {bounds:?}");
        warp.assign_bounds(source, &bounds, &output)?;

        *path = output;
        shifted += 1;
    }

    Ok(shifted)
}

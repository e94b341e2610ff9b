//! Footprint check for the polar DEM.

use crate::geometry::GeoTransform;
use crate::{DemError, Result};
use tracing::debug;

/// Number of scene sample points that must fall inside the DEM footprint.
pub const MIN_POINTS_INSIDE: usize = 3;

/// Verify that a DEM raster covers the scene.
///
/// `scene_points` are the scene's four bounding-box corners and its center,
/// already projected into the DEM's map coordinates. The DEM footprint is
/// built from the raster's corner pixels. Returns the number of points found
/// inside, or [`DemError::InsufficientCoverage`] when fewer than
/// [`MIN_POINTS_INSIDE`] are.
pub fn verify_coverage(
    rows: usize,
    cols: usize,
    transform: &GeoTransform,
    scene_points: &[(f64, f64); 5],
) -> Result<usize> {
    let footprint = transform.footprint(rows, cols)?;
    debug!("DEM footprint: {:?}", footprint.vertices());

    let found = scene_points
        .iter()
        .filter(|(x, y)| {
            let inside = footprint.contains(*x, *y);
            debug!("Scene point ({x}, {y}) inside DEM: {inside}");
            inside
        })
        .count();

    if found < MIN_POINTS_INSIDE {
        return Err(DemError::InsufficientCoverage {
            found,
            required: MIN_POINTS_INSIDE,
        });
    }

    Ok(found)
}

//! GLS tile indexing.
//!
//! GLS tiles cover 1°×1° cells and are named by their lower-left corner,
//! e.g. `n47w118` covers 47°N..48°N, 118°W..117°W. There are no tiles over
//! open ocean.

use crate::bounds::GeoBoundingBox;
use crate::scratch::ScratchFiles;
use crate::select::DemSource;
use crate::services::{TileFiles, TileRepository};
use crate::tile::{gls_tile_name, Tile};
use crate::{DemError, Result};
use std::ops::RangeInclusive;
use tracing::debug;

/// Easternmost GLS tile column. There is no e180 tile, only w180.
pub const LAST_EASTERN_COLUMN: i32 = 179;

/// Longitude cell ranges between two floored longitudes.
///
/// When the west cell is east of the prime meridian and the east cell west
/// of it, the box crosses the antimeridian and the range is split at ±180°.
pub fn longitude_cells(west_floor: i32, east_floor: i32) -> Vec<RangeInclusive<i32>> {
    if west_floor > 0 && east_floor < 0 {
        vec![west_floor..=LAST_EASTERN_COLUMN, -180..=east_floor]
    } else {
        vec![west_floor..=east_floor]
    }
}

/// Every GLS tile cell touching `bbox`, south to north and west to east.
pub fn gls_candidate_tiles(bbox: &GeoBoundingBox) -> Result<Vec<Tile>> {
    let north = bbox.north.floor() as i32;
    let south = bbox.south.floor() as i32;
    let west = bbox.west.floor() as i32;
    let east = bbox.east.floor() as i32;
    debug!("GLS cells: latitude {south}..={north}, longitude {west}..={east}");

    let columns = longitude_cells(west, east);

    let tiles: Vec<Tile> = (south..=north)
        .flat_map(|lat| {
            columns
                .iter()
                .flat_map(move |range| range.clone().map(move |lon| (lat, lon)))
        })
        .map(|(lat, lon)| Tile::candidate(gls_tile_name(lat, lon)))
        .collect();

    if tiles.is_empty() {
        return Err(DemError::NoTiles { dem: "GLS" });
    }

    Ok(tiles)
}

/// Resolve GLS candidates against the repository.
///
/// Marks each candidate's `present` flag and returns the files of the
/// present ones. Missing tiles are tolerated unless every tile is missing,
/// which means the scene is over water.
pub fn resolve_gls_tiles(
    candidates: &mut [Tile],
    repository: &dyn TileRepository,
    scratch: &mut ScratchFiles,
) -> Result<Vec<TileFiles>> {
    let mut files = Vec::with_capacity(candidates.len());

    for tile in candidates.iter_mut() {
        match repository.resolve(DemSource::Gls, &tile.identifier, scratch)? {
            Some(resolved) => {
                tile.present = true;
                files.push(resolved);
            }
            None => debug!("Missing GLS tile: {}", tile.identifier),
        }
    }

    let expected = candidates.len();
    debug!("Expected GLS tile count: {expected}");
    debug!("Missing GLS tile count: {}", expected - files.len());

    if files.is_empty() {
        return Err(DemError::OverWater { expected });
    }

    Ok(files)
}

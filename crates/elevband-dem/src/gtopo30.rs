//! GTOPO30 tile indexing.
//!
//! GTOPO30 is distributed as 33 tiles on a fixed global grid. Tiles north of
//! 60°S span 50° of latitude by 40° of longitude; the Antarctic row spans 30°
//! of latitude by 60° of longitude. Tiles are named by their upper-left corner.

use crate::bounds::GeoBoundingBox;
use crate::geometry::normalize_longitude;
use crate::tile::gtopo30_tile_name;
use tracing::debug;

/// Default padding, in degrees, applied before indexing.
pub const DEFAULT_PADDING: f64 = 1.0;

/// Upper edges of the tile rows, north to south.
pub const LATITUDE_BREAKS: [i32; 4] = [90, 40, -10, -60];

/// Rows whose upper edge is above this latitude use the 40° longitude grid.
pub const TILE_SET_CUTOFF_LATITUDE: i32 = -60;

/// Western edges of the tile columns north of the cutoff.
pub const NORTH_LONGITUDE_BREAKS: [i32; 9] = [-180, -140, -100, -60, -20, 20, 60, 100, 140];

/// Western edges of the tile columns in the Antarctic row.
pub const SOUTH_LONGITUDE_BREAKS: [i32; 6] = [-180, -120, -60, 0, 60, 120];

/// Row (upper-edge latitude) containing `latitude`: the smallest break
/// strictly greater than it. The north pole itself belongs to the top row.
fn row_for(latitude: f64) -> i32 {
    LATITUDE_BREAKS
        .iter()
        .copied()
        .filter(|&brk| f64::from(brk) > latitude)
        .min()
        .unwrap_or(LATITUDE_BREAKS[0])
}

/// Column (western-edge longitude) containing `longitude`: the largest break
/// strictly less than it. -180° itself belongs to the first column.
fn column_for(breaks: &[i32], longitude: f64) -> i32 {
    breaks
        .iter()
        .copied()
        .filter(|&brk| f64::from(brk) < longitude)
        .max()
        .unwrap_or(breaks[0])
}

fn push_unique(values: &mut Vec<i32>, value: i32) {
    if !values.contains(&value) {
        values.push(value);
    }
}

/// Identifiers of the GTOPO30 tiles overlapping `bbox` grown by `padding`.
///
/// Tiles are listed row by row, north to south, and west to east within a
/// row.
pub fn gtopo30_tiles(bbox: &GeoBoundingBox, padding: f64) -> Vec<String> {
    let ul_lat = (bbox.north + padding).min(90.0);
    let lr_lat = (bbox.south - padding).max(-90.0);
    let ul_lon = normalize_longitude(bbox.west - padding);
    let lr_lon = normalize_longitude(bbox.east + padding);
    debug!("GTOPO30 padded box: UL ({ul_lon}, {ul_lat}) LR ({lr_lon}, {lr_lat})");

    let mut rows = Vec::with_capacity(2);
    push_unique(&mut rows, row_for(ul_lat));
    push_unique(&mut rows, row_for(lr_lat));
    debug!("GTOPO30 rows: {rows:?}");

    let mut tiles = Vec::new();
    for row in rows {
        let breaks: &[i32] = if row > TILE_SET_CUTOFF_LATITUDE {
            &NORTH_LONGITUDE_BREAKS
        } else {
            &SOUTH_LONGITUDE_BREAKS
        };

        let mut columns = Vec::with_capacity(2);
        push_unique(&mut columns, column_for(breaks, ul_lon));
        push_unique(&mut columns, column_for(breaks, lr_lon));
        columns.sort_unstable();
        debug!("GTOPO30 columns for row {row}: {columns:?}");

        tiles.extend(columns.into_iter().map(|column| gtopo30_tile_name(row, column)));
    }

    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_inside_single_tile() {
        // w100n40 spans 100W..60W, 10S..40N
        let bbox = GeoBoundingBox::new(35.0, 30.0, -80.0, -85.0);
        assert_eq!(gtopo30_tiles(&bbox, DEFAULT_PADDING), vec!["w100n40"]);
    }

    #[test]
    fn test_box_straddling_prime_meridian() {
        let bbox = GeoBoundingBox::new(0.5, -0.5, 0.5, -0.5);
        assert_eq!(gtopo30_tiles(&bbox, DEFAULT_PADDING), vec!["w020n40"]);

        // Columns break at 20 degrees, not at 0
        let bbox = GeoBoundingBox::new(0.5, -0.5, 20.5, 19.5);
        assert_eq!(
            gtopo30_tiles(&bbox, DEFAULT_PADDING),
            vec!["w020n40", "e020n40"]
        );
    }

    #[test]
    fn test_padding_crosses_row_break() {
        let bbox = GeoBoundingBox::new(39.5, 38.0, -120.0, -121.0);
        assert_eq!(
            gtopo30_tiles(&bbox, DEFAULT_PADDING),
            vec!["w140n90", "w140n40"]
        );
        assert_eq!(gtopo30_tiles(&bbox, 0.0), vec!["w140n40"]);
    }

    #[test]
    fn test_antarctic_row_uses_wide_columns() {
        let bbox = GeoBoundingBox::new(-75.0, -77.0, 5.0, 2.0);
        assert_eq!(gtopo30_tiles(&bbox, DEFAULT_PADDING), vec!["w000s60"]);

        let bbox = GeoBoundingBox::new(-75.0, -77.0, -0.5, -1.5);
        assert_eq!(
            gtopo30_tiles(&bbox, DEFAULT_PADDING),
            vec!["w060s60", "w000s60"]
        );
    }

    #[test]
    fn test_rows_spanning_tile_set_cutoff() {
        let bbox = GeoBoundingBox::new(-55.0, -65.0, -65.0, -70.0);
        assert_eq!(
            gtopo30_tiles(&bbox, DEFAULT_PADDING),
            vec!["w100s10", "w120s60"]
        );
    }

    #[test]
    fn test_antimeridian_box() {
        let bbox = GeoBoundingBox::new(-16.0, -18.0, -179.2, 178.5);
        let tiles = gtopo30_tiles(&bbox, DEFAULT_PADDING);
        assert_eq!(tiles, vec!["w180s10", "e140s10"]);
    }

    #[test]
    fn test_poles_clamp() {
        let bbox = GeoBoundingBox::new(89.8, 89.0, 10.0, 5.0);
        assert_eq!(gtopo30_tiles(&bbox, DEFAULT_PADDING), vec!["w020n90"]);

        let bbox = GeoBoundingBox::new(-89.0, -89.8, 10.0, 5.0);
        assert_eq!(gtopo30_tiles(&bbox, DEFAULT_PADDING), vec!["w000s60"]);
    }
}

//! Tile identifiers for the gridded DEM sources.
//!
//! Both tiled sources name a cell by one of its corners using hemisphere
//! letters and zero-padded whole degrees. GLS leads with latitude
//! (`n48w123`), GTOPO30 leads with longitude (`w140n40`).

use crate::{DemError, Result};
use std::fmt;

/// A candidate tile and whether the tile repository could supply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Tile identifier, e.g. `n48w123` or `w140n40`.
    pub identifier: String,
    /// Whether the repository resolved the tile's files.
    pub present: bool,
}

impl Tile {
    /// A tile that has not yet been resolved.
    pub fn candidate(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            present: false,
        }
    }

    /// Whether the tile is named in the western hemisphere.
    ///
    /// Judged by the longitude hemisphere letter, so GTOPO30's `w000`
    /// column counts as western.
    pub fn is_western(&self) -> Result<bool> {
        is_western_name(&self.identifier)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier)
    }
}

/// Name of the GLS tile whose lower-left corner is at the given whole degrees.
pub fn gls_tile_name(latitude: i32, longitude: i32) -> String {
    let ns = if latitude < 0 { 's' } else { 'n' };
    let ew = if longitude < 0 { 'w' } else { 'e' };
    format!(
        "{ns}{:02}{ew}{:03}",
        latitude.unsigned_abs(),
        longitude.unsigned_abs()
    )
}

/// Name of the GTOPO30 tile whose upper-left corner is at the given break.
///
/// Longitude zero belongs to the western name (`w000`).
pub fn gtopo30_tile_name(latitude: i32, longitude: i32) -> String {
    let ns = if latitude < 0 { 's' } else { 'n' };
    let ew = if longitude <= 0 { 'w' } else { 'e' };
    format!(
        "{ew}{:03}{ns}{:02}",
        longitude.unsigned_abs(),
        latitude.unsigned_abs()
    )
}

/// Whether a tile identifier (or a file named after one) carries the `w`
/// longitude letter.
pub fn is_western_name(identifier: &str) -> Result<bool> {
    identifier
        .chars()
        .map(|c| c.to_ascii_lowercase())
        .find(|c| *c == 'e' || *c == 'w')
        .map(|c| c == 'w')
        .ok_or_else(|| DemError::InvalidTileName(identifier.to_string()))
}

/// Signed whole-degree corner encoded in a tile identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileOrigin {
    /// Signed latitude in degrees.
    pub latitude: i32,
    /// Signed longitude in degrees.
    pub longitude: i32,
}

/// Parse the corner from either naming order.
///
/// Identifiers are matched case-insensitively so unpacked archive names
/// (`W140N40.DEM`) parse too; anything after the second number is ignored.
pub fn parse_origin(identifier: &str) -> Result<TileOrigin> {
    let invalid = || DemError::InvalidTileName(identifier.to_string());
    let lower = identifier.to_ascii_lowercase();
    let mut chars = lower.chars().peekable();

    let mut latitude = None;
    let mut longitude = None;

    while latitude.is_none() || longitude.is_none() {
        let hemisphere = chars.next().ok_or_else(invalid)?;

        let mut digits = String::new();
        while let Some(&d) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }
        let magnitude: i32 = digits.parse().map_err(|_| invalid())?;

        match hemisphere {
            'n' if latitude.is_none() => latitude = Some(magnitude),
            's' if latitude.is_none() => latitude = Some(-magnitude),
            'e' if longitude.is_none() => longitude = Some(magnitude),
            'w' if longitude.is_none() => longitude = Some(-magnitude),
            _ => return Err(invalid()),
        }
    }

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok(TileOrigin {
            latitude,
            longitude,
        }),
        _ => Err(invalid()),
    }
}

//! DEM source selection by scene latitude.

use crate::bounds::GeoBoundingBox;
use std::fmt;

/// Northern edge at or below which only RAMP is considered.
pub const RAMP_SOUTH_LIMIT: f64 = -60.0;

/// Southern limit of GLS coverage.
pub const GLS_SOUTH_LIMIT: f64 = -53.0;

/// Northern limit of GLS coverage.
pub const GLS_NORTH_LIMIT: f64 = 83.0;

/// The elevation sources an elevation band can be built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DemSource {
    /// Radarsat Antarctic Mapping Project 200 m DEM.
    Ramp,
    /// Global 30 arc-second DEM, the universal fallback.
    Gtopo30,
    /// Global Land Survey 1° tiles.
    Gls,
}

impl DemSource {
    /// Lower-case name recorded as the band's `source` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            DemSource::Ramp => "ramp",
            DemSource::Gtopo30 => "gtopo30",
            DemSource::Gls => "gls",
        }
    }

    /// Whether the source's heights must be shifted onto the WGS84 geoid.
    /// RAMP is already WGS84-referenced.
    pub fn needs_geoid_correction(&self) -> bool {
        !matches!(self, DemSource::Ramp)
    }
}

impl fmt::Display for DemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The source to attempt and the one it falls back to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePlan {
    /// First source attempted.
    pub primary: DemSource,
    /// Source used when the primary reports a recoverable coverage failure.
    pub fallback: Option<DemSource>,
}

/// Choose the DEM source for a (padded) scene bounding box.
pub fn plan_source(bbox: &GeoBoundingBox) -> SourcePlan {
    let between_ramp_and_gls =
        |lat: f64| lat > RAMP_SOUTH_LIMIT && lat <= GLS_SOUTH_LIMIT;

    if bbox.north <= RAMP_SOUTH_LIMIT {
        SourcePlan {
            primary: DemSource::Ramp,
            fallback: Some(DemSource::Gtopo30),
        }
    } else if (between_ramp_and_gls(bbox.north) && between_ramp_and_gls(bbox.south))
        || (bbox.north >= GLS_NORTH_LIMIT && bbox.south >= GLS_NORTH_LIMIT)
    {
        SourcePlan {
            primary: DemSource::Gtopo30,
            fallback: None,
        }
    } else {
        SourcePlan {
            primary: DemSource::Gls,
            fallback: Some(DemSource::Gtopo30),
        }
    }
}

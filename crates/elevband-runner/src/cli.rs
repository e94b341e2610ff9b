//! Command-line arguments.

use crate::{Result, RunError};
use clap::{ArgGroup, Parser};
use elevband_dem::{GeoBoundingBox, MapExtents};
use elevband_scene::{MetadataSource, UserExtents};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Accepted latitude bounds, in degrees.
const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;

/// Accepted longitude bounds, in degrees. Values are normalized later.
const LONGITUDE_RANGE: RangeInclusive<f64> = -360.0..=360.0;

fn check_range(flag: &str, value: f64, range: &RangeInclusive<f64>) -> Result<()> {
    if range.contains(&value) {
        return Ok(());
    }
    Err(RunError::InvalidArguments(format!(
        "{flag} must be between {} and {}, got {value}",
        range.start(),
        range.end()
    )))
}

/// Create an elevation band using either the MTL or XML metadata as the
/// information source. Optionally the scene extents can be overridden with
/// user-specified extents.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "build-elevation-band", version)]
#[command(group(ArgGroup::new("metadata").required(true).args(["mtl", "xml"])))]
pub struct Args {
    /// Name of Landsat MTL file
    #[arg(long, alias = "mtl_filename", value_name = "FILE")]
    pub mtl: Option<PathBuf>,

    /// Name of XML metadata file
    #[arg(long, alias = "xml_filename", value_name = "FILE")]
    pub xml: Option<PathBuf>,

    /// Name of the output elevation file (.img); default is {product_id}_elevation.img
    #[arg(long, value_name = "FILE")]
    pub elevation: Option<PathBuf>,

    /// Turn debug logging on
    #[arg(long)]
    pub debug: bool,

    /// YAML (or .json) configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for output and intermediate files, overriding the configuration
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Minimum X direction extent value
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub extent_minx: Option<f64>,

    /// Maximum X direction extent value
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub extent_maxx: Option<f64>,

    /// Minimum Y direction extent value
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub extent_miny: Option<f64>,

    /// Maximum Y direction extent value
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub extent_maxy: Option<f64>,

    /// North-bounding latitude associated with extent-maxy
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub nbound_lat: Option<f64>,

    /// South-bounding latitude associated with extent-miny
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub sbound_lat: Option<f64>,

    /// West-bounding longitude associated with extent-minx
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub wbound_lon: Option<f64>,

    /// East-bounding longitude associated with extent-maxx
    #[arg(long, value_name = "FLOAT", allow_hyphen_values = true, help_heading = "Custom extents")]
    pub ebound_lon: Option<f64>,
}

impl Args {
    /// The metadata file to read.
    pub fn metadata_source(&self) -> Result<MetadataSource> {
        match (&self.mtl, &self.xml) {
            (Some(mtl), None) => Ok(MetadataSource::Mtl(mtl.clone())),
            (None, Some(xml)) => Ok(MetadataSource::Xml(xml.clone())),
            _ => Err(RunError::InvalidArguments(
                "Exactly one of --mtl or --xml must be specified".to_string(),
            )),
        }
    }

    /// User-specified extents. Supplying any of the eight values requires
    /// all of them.
    pub fn user_extents(&self) -> Result<Option<UserExtents>> {
        let values = [
            ("--extent-minx", self.extent_minx),
            ("--extent-maxx", self.extent_maxx),
            ("--extent-miny", self.extent_miny),
            ("--extent-maxy", self.extent_maxy),
            ("--nbound-lat", self.nbound_lat),
            ("--sbound-lat", self.sbound_lat),
            ("--wbound-lon", self.wbound_lon),
            ("--ebound-lon", self.ebound_lon),
        ];

        if values.iter().all(|(_, value)| value.is_none()) {
            return Ok(None);
        }

        let mut resolved = [0.0; 8];
        for (slot, (flag, value)) in resolved.iter_mut().zip(values) {
            *slot = value.ok_or_else(|| {
                RunError::InvalidArguments(format!(
                    "Must specify {flag} when specifying custom extents"
                ))
            })?;
        }
        let [min_x, max_x, min_y, max_y, north, south, west, east] = resolved;

        for (flag, value) in &values[..4] {
            if !value.is_some_and(f64::is_finite) {
                return Err(RunError::InvalidArguments(format!(
                    "{flag} must be a finite number"
                )));
            }
        }
        check_range("--nbound-lat", north, &LATITUDE_RANGE)?;
        check_range("--sbound-lat", south, &LATITUDE_RANGE)?;
        check_range("--wbound-lon", west, &LONGITUDE_RANGE)?;
        check_range("--ebound-lon", east, &LONGITUDE_RANGE)?;

        Ok(Some(UserExtents {
            extents: MapExtents::new(min_x, min_y, max_x, max_y),
            bounds: GeoBoundingBox::new(north, south, east, west),
        }))
    }
}

//! The scene description shared by every metadata format.

use crate::band::ElevationBand;
use crate::mtl::MtlScene;
use crate::xml::XmlScene;
use crate::{Result, SceneError};
use elevband_dem::{GeoBoundingBox, MapExtents};
use std::path::{Path, PathBuf};

/// Pixel dimensions of the scene grid.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSize {
    /// Pixel width.
    pub x: f64,
    /// Pixel height.
    pub y: f64,
    /// Units of `x` and `y`, e.g. `meters`.
    pub units: String,
}

/// Extents and bounds supplied on the command line in place of the scene's.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserExtents {
    /// Map extents of the output grid.
    pub extents: MapExtents,
    /// Geographic bounds matching `extents`.
    pub bounds: GeoBoundingBox,
}

/// Everything the elevation build needs to know about a scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneInfo {
    /// Geographic bounding box.
    pub bounding_box: GeoBoundingBox,
    /// Map extents of the output grid, pixel edges.
    pub extents: MapExtents,
    /// Pixel size of the reference band.
    pub pixel_size: PixelSize,
    /// Product or scene identifier used to name the output.
    pub product_id: String,
    /// A band file whose projection defines the output grid.
    pub reference_band: PathBuf,
}

impl SceneInfo {
    /// Number of output lines.
    pub fn lines(&self) -> usize {
        self.extents.lines(self.pixel_size.y)
    }

    /// Number of output samples.
    pub fn samples(&self) -> usize {
        self.extents.samples(self.pixel_size.x)
    }
}

/// A parsed scene metadata document.
///
/// MTL and the two XML layouts all describe the same scene facts; they
/// differ in where those facts live and whether a band can be added back.
pub trait SceneMetadataProvider {
    /// The parsed scene.
    fn scene(&self) -> &SceneInfo;

    /// Add the elevation band to the metadata document.
    ///
    /// Returns `false` when the format has no band list to extend.
    fn append_band(&self, band: &ElevationBand) -> Result<bool>;

    /// Geographic bounding box.
    fn bounding_box(&self) -> GeoBoundingBox {
        self.scene().bounding_box
    }

    /// Map extents of the output grid.
    fn corner_extents(&self) -> MapExtents {
        self.scene().extents
    }

    /// Pixel size of the reference band.
    fn pixel_size(&self) -> &PixelSize {
        &self.scene().pixel_size
    }

    /// Product identifier.
    fn product_id(&self) -> &str {
        &self.scene().product_id
    }

    /// Reference band file.
    fn reference_band_path(&self) -> &Path {
        &self.scene().reference_band
    }
}

/// A metadata file and its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// Landsat MTL text file.
    Mtl(PathBuf),
    /// ESPA or ARD metadata XML.
    Xml(PathBuf),
}

impl MetadataSource {
    /// Path to the metadata file.
    pub fn path(&self) -> &Path {
        match self {
            MetadataSource::Mtl(path) | MetadataSource::Xml(path) => path,
        }
    }
}

/// Open the scene described by `source`.
pub fn open_scene(
    source: &MetadataSource,
    user: Option<&UserExtents>,
) -> Result<Box<dyn SceneMetadataProvider>> {
    Ok(match source {
        MetadataSource::Mtl(path) => Box::new(MtlScene::open(path, user)?),
        MetadataSource::Xml(path) => Box::new(XmlScene::open(path, user)?),
    })
}

/// Parse a floating-point metadata value, naming the field on failure.
pub(crate) fn parse_float(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .trim_matches('"')
        .parse()
        .map_err(|_| SceneError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        })
}

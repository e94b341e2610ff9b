//! Landsat MTL (`KEY = value`) metadata.

use crate::band::ElevationBand;
use crate::scene::{parse_float, PixelSize, SceneInfo, SceneMetadataProvider, UserExtents};
use crate::{Result, SceneError};
use elevband_dem::{GeoBoundingBox, MapExtents};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Pixel units of MTL grid cell sizes.
const MTL_PIXEL_UNITS: &str = "meters";

/// A scene described by an MTL file.
#[derive(Debug, Clone)]
pub struct MtlScene {
    scene: SceneInfo,
}

/// Fields collected while scanning the file.
#[derive(Debug, Default)]
struct MtlFields {
    north: Option<f64>,
    south: Option<f64>,
    east: Option<f64>,
    west: Option<f64>,
    ul_x: Option<f64>,
    ul_y: Option<f64>,
    lr_x: Option<f64>,
    lr_y: Option<f64>,
    grid_cell_size: Option<f64>,
    scene_id: Option<String>,
    band_1: Option<String>,
}

fn keep_max(slot: &mut Option<f64>, value: f64) {
    *slot = Some(slot.map_or(value, |current| current.max(value)));
}

fn keep_min(slot: &mut Option<f64>, value: f64) {
    *slot = Some(slot.map_or(value, |current| current.min(value)));
}

impl MtlFields {
    fn parse(text: &str) -> Result<Self> {
        let mut fields = Self::default();

        for line in text.lines() {
            let line = line.trim();
            if line == "END" {
                break;
            }
            if line.is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| SceneError::MalformedLine(line.to_string()))?;
            let key = key.trim();
            let value = value.trim();

            match key {
                "CORNER_UL_LAT_PRODUCT" | "CORNER_UR_LAT_PRODUCT" => {
                    keep_max(&mut fields.north, parse_float(key, value)?)
                }
                "CORNER_LL_LAT_PRODUCT" | "CORNER_LR_LAT_PRODUCT" => {
                    keep_min(&mut fields.south, parse_float(key, value)?)
                }
                "CORNER_UL_LON_PRODUCT" | "CORNER_LL_LON_PRODUCT" => {
                    keep_min(&mut fields.west, parse_float(key, value)?)
                }
                "CORNER_UR_LON_PRODUCT" | "CORNER_LR_LON_PRODUCT" => {
                    keep_max(&mut fields.east, parse_float(key, value)?)
                }
                "CORNER_UL_PROJECTION_X_PRODUCT" => fields.ul_x = Some(parse_float(key, value)?),
                "CORNER_UL_PROJECTION_Y_PRODUCT" => fields.ul_y = Some(parse_float(key, value)?),
                "CORNER_LR_PROJECTION_X_PRODUCT" => fields.lr_x = Some(parse_float(key, value)?),
                "CORNER_LR_PROJECTION_Y_PRODUCT" => fields.lr_y = Some(parse_float(key, value)?),
                "GRID_CELL_SIZE_REFLECTIVE" => {
                    fields.grid_cell_size = Some(parse_float(key, value)?)
                }
                "LANDSAT_SCENE_ID" => fields.scene_id = Some(value.trim_matches('"').to_string()),
                "FILE_NAME_BAND_1" => fields.band_1 = Some(value.trim_matches('"').to_string()),
                _ => {}
            }
        }

        Ok(fields)
    }
}

impl MtlScene {
    /// Parse an MTL file.
    ///
    /// Corner coordinates in an MTL are pixel centers, so the map extents
    /// are widened by half a pixel unless `user` replaces them.
    pub fn open(path: &Path, user: Option<&UserExtents>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path, user)
    }

    fn parse(text: &str, path: &Path, user: Option<&UserExtents>) -> Result<Self> {
        let fields = MtlFields::parse(text)?;
        let missing = |field: &str| SceneError::MissingField {
            field: field.to_string(),
            path: path.display().to_string(),
        };

        let pixel = fields
            .grid_cell_size
            .ok_or_else(|| missing("reflective grid cell size"))?;
        let band_1 = fields.band_1.ok_or_else(|| missing("FILE_NAME_BAND_1"))?;
        let product_id = fields.scene_id.ok_or_else(|| missing("LANDSAT_SCENE_ID"))?;

        let pixel_size = PixelSize {
            x: pixel,
            y: pixel,
            units: MTL_PIXEL_UNITS.to_string(),
        };

        let (bounding_box, extents) = match user {
            Some(user) => (user.bounds, user.extents),
            None => {
                let bounding_box = GeoBoundingBox::new(
                    fields.north.ok_or_else(|| missing("north bounding metadata"))?,
                    fields.south.ok_or_else(|| missing("south bounding metadata"))?,
                    fields.east.ok_or_else(|| missing("east bounding metadata"))?,
                    fields.west.ok_or_else(|| missing("west bounding metadata"))?,
                );
                let extents = MapExtents::new(
                    fields.ul_x.ok_or_else(|| missing("UL Map X"))?,
                    fields.lr_y.ok_or_else(|| missing("LR Map Y"))?,
                    fields.lr_x.ok_or_else(|| missing("LR Map X"))?,
                    fields.ul_y.ok_or_else(|| missing("UL Map Y"))?,
                )
                .widened_by_half_pixel(pixel_size.x, pixel_size.y);
                (bounding_box, extents)
            }
        };

        let scene = SceneInfo {
            bounding_box,
            extents,
            pixel_size,
            product_id,
            reference_band: PathBuf::from(band_1),
        };
        debug!("MTL scene: {scene:?}");

        Ok(Self { scene })
    }
}

impl SceneMetadataProvider for MtlScene {
    fn scene(&self) -> &SceneInfo {
        &self.scene
    }

    fn append_band(&self, _band: &ElevationBand) -> Result<bool> {
        Ok(false)
    }
}

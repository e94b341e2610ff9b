//! ESPA and ARD metadata XML.

use crate::band::{append_band_xml, ElevationBand};
use crate::scene::{parse_float, PixelSize, SceneInfo, SceneMetadataProvider, UserExtents};
use crate::{Result, SceneError};
use elevband_dem::{GeoBoundingBox, MapExtents};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

// ============================================================================
// Document tree
// ============================================================================

/// A parsed XML element. Namespace prefixes are dropped from names.
#[derive(Debug, Clone, Default, PartialEq)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            attributes.push((key, attr.unescape_value()?.into_owned()));
        }
        Ok(Self {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            attributes,
            ..Self::default()
        })
    }

    fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root = None;

        let mut close = |element: Element, stack: &mut Vec<Element>| match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => root = Some(element),
        };

        loop {
            match reader.read_event()? {
                Event::Start(e) => stack.push(Self::from_start(&e)?),
                Event::Empty(e) => close(Self::from_start(&e)?, &mut stack),
                Event::End(_) => {
                    if let Some(element) = stack.pop() {
                        close(element, &mut stack);
                    }
                }
                Event::Text(t) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&t.unescape()?);
                    }
                }
                Event::CData(t) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&t));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        root.ok_or_else(|| SceneError::MissingElement("root".to_string()))
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Descend through `path`, one child name per step.
    fn descend(&self, path: &[&str]) -> Option<&Element> {
        path.iter().try_fold(self, |element, name| element.child(name))
    }
}

// ============================================================================
// Band validation
// ============================================================================

/// Attributes every `band` entry must carry.
const REQUIRED_BAND_ATTRIBUTES: [&str; 7] =
    ["product", "name", "category", "data_type", "nlines", "nsamps", "fill_value"];

/// Child elements every `band` entry must carry, in schema order.
const REQUIRED_BAND_ELEMENTS: [&str; 8] = [
    "short_name",
    "long_name",
    "file_name",
    "pixel_size",
    "resample_method",
    "data_units",
    "app_version",
    "production_date",
];

/// Check an updated document before it replaces the original: same root,
/// and a last band under the layout's band list that is `band`'s entry in
/// full.
fn validate_appended_band(xml: &str, layout: &dyn XmlLayout, band: &ElevationBand) -> Result<()> {
    let invalid = SceneError::InvalidBand;

    let root = Element::parse(xml)?;
    if root.name != layout.root_tag() {
        return Err(invalid(format!(
            "root element {} where {} was expected",
            root.name,
            layout.root_tag()
        )));
    }

    let bands = root
        .descend(layout.bands_path())
        .ok_or_else(|| SceneError::MissingElement(layout.bands_path().join("/")))?;
    let entry = bands
        .children_named("band")
        .last()
        .ok_or_else(|| invalid("no band entries".to_string()))?;

    for name in REQUIRED_BAND_ATTRIBUTES {
        if entry.attribute(name).map_or(true, str::is_empty) {
            return Err(invalid(format!("band is missing attribute {name}")));
        }
    }
    for (name, expected) in [("nlines", band.lines), ("nsamps", band.samples)] {
        let value = entry.attribute(name).unwrap_or_default();
        if value.parse::<usize>().ok() != Some(expected) {
            return Err(invalid(format!("band {name} is {value}, expected {expected}")));
        }
    }

    let elements: Vec<&str> = entry.children.iter().map(|c| c.name.as_str()).collect();
    if elements != REQUIRED_BAND_ELEMENTS {
        return Err(invalid(format!(
            "band elements [{}] do not match [{}]",
            elements.join(", "),
            REQUIRED_BAND_ELEMENTS.join(", ")
        )));
    }

    let file_name = entry.child("file_name").map(|e| e.text.as_str());
    if file_name != Some(band.file_name.as_str()) {
        return Err(invalid(format!(
            "band file_name is {file_name:?}, expected {}",
            band.file_name
        )));
    }

    let pixel_size = entry.child("pixel_size");
    for name in ["x", "y", "units"] {
        if pixel_size.and_then(|p| p.attribute(name)).is_none() {
            return Err(invalid(format!("band pixel_size is missing attribute {name}")));
        }
    }
    Ok(())
}

// ============================================================================
// Layouts
// ============================================================================

/// Where an XML metadata layout keeps the facts the elevation build needs.
///
/// Paths are child names below the root element.
pub trait XmlLayout: Debug + Sync {
    /// Local name of the root element.
    fn root_tag(&self) -> &'static str;

    /// Path to `global_metadata`.
    fn global_metadata_path(&self) -> &'static [&'static str];

    /// Path to the `bands` list.
    fn bands_path(&self) -> &'static [&'static str];

    /// Band names eligible as the reference band.
    fn reference_band_names(&self) -> &'static [&'static str];

    /// Band products eligible as the reference band.
    fn reference_products(&self) -> &'static [&'static str];

    /// Whether `band` may serve as the reference band.
    fn is_reference_candidate(&self, name: &str, product: &str) -> bool {
        self.reference_band_names().contains(&name) && self.reference_products().contains(&product)
    }
}

/// Scene-based ESPA metadata (`espa_metadata`).
#[derive(Debug, Clone, Copy)]
pub struct EspaLayout;

impl XmlLayout for EspaLayout {
    fn root_tag(&self) -> &'static str {
        "espa_metadata"
    }

    fn global_metadata_path(&self) -> &'static [&'static str] {
        &["global_metadata"]
    }

    fn bands_path(&self) -> &'static [&'static str] {
        &["bands"]
    }

    fn reference_band_names(&self) -> &'static [&'static str] {
        &["b1", "sr_band1"]
    }

    fn reference_products(&self) -> &'static [&'static str] {
        &["L1T", "L1G", "L1TP", "L1GT", "L1GS", "sr_refl"]
    }
}

/// Analysis Ready Data tile metadata (`ard_metadata`).
#[derive(Debug, Clone, Copy)]
pub struct ArdLayout;

impl XmlLayout for ArdLayout {
    fn root_tag(&self) -> &'static str {
        "ard_metadata"
    }

    fn global_metadata_path(&self) -> &'static [&'static str] {
        &["tile_metadata", "global_metadata"]
    }

    fn bands_path(&self) -> &'static [&'static str] {
        &["tile_metadata", "bands"]
    }

    // PIXELQA is present in every ARD tile product
    fn reference_band_names(&self) -> &'static [&'static str] {
        &["PIXELQA"]
    }

    fn reference_products(&self) -> &'static [&'static str] {
        &["level2_qa"]
    }
}

static LAYOUTS: [&dyn XmlLayout; 2] = [&EspaLayout, &ArdLayout];

/// The layout whose root element is `root_tag`.
pub fn layout_for_root(root_tag: &str) -> Option<&'static dyn XmlLayout> {
    LAYOUTS.iter().copied().find(|l| l.root_tag() == root_tag)
}

// ============================================================================
// Scene
// ============================================================================

/// A scene described by ESPA or ARD metadata XML.
#[derive(Debug, Clone)]
pub struct XmlScene {
    path: PathBuf,
    layout: &'static dyn XmlLayout,
    scene: SceneInfo,
}

impl XmlScene {
    /// Parse a metadata XML file.
    ///
    /// Band file names are resolved against the XML file's directory.
    pub fn open(path: &Path, user: Option<&UserExtents>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, path, base, user)
    }

    fn parse(text: &str, path: &Path, base: &Path, user: Option<&UserExtents>) -> Result<Self> {
        let root = Element::parse(text)?;
        let layout =
            layout_for_root(&root.name).ok_or_else(|| SceneError::UnsupportedXml(root.name.clone()))?;
        debug!("Metadata layout: {}", layout.root_tag());

        let missing = |field: &str| SceneError::MissingField {
            field: field.to_string(),
            path: path.display().to_string(),
        };

        let global = root
            .descend(layout.global_metadata_path())
            .ok_or_else(|| missing("global_metadata"))?;

        let mut product_id = None;
        for element in &global.children {
            if element.name.contains("product_id") || element.name.contains("scene_id") {
                product_id = Some(element.text.trim().to_string());
            }
        }
        let product_id = product_id
            .ok_or_else(|| SceneError::UnsupportedXml(format!("no product id in {}", path.display())))?;

        let (reference_band, pixel_size) = Self::reference_band(&root, layout, base)?;

        let (bounding_box, extents) = match user {
            Some(user) => (user.bounds, user.extents),
            None => (
                Self::bounding_box(global, &missing)?,
                Self::extents(global, &pixel_size, &missing)?,
            ),
        };

        let scene = SceneInfo {
            bounding_box,
            extents,
            pixel_size,
            product_id,
            reference_band,
        };
        debug!("XML scene: {scene:?}");

        Ok(Self {
            path: path.to_path_buf(),
            layout,
            scene,
        })
    }

    fn bounding_box(
        global: &Element,
        missing: &dyn Fn(&str) -> SceneError,
    ) -> Result<GeoBoundingBox> {
        let coordinates = global
            .child("bounding_coordinates")
            .ok_or_else(|| missing("bounding_coordinates"))?;
        let value = |name: &str| -> Result<f64> {
            let element = coordinates.child(name).ok_or_else(|| missing(name))?;
            parse_float(name, &element.text)
        };
        Ok(GeoBoundingBox::new(
            value("north")?,
            value("south")?,
            value("east")?,
            value("west")?,
        ))
    }

    fn extents(
        global: &Element,
        pixel_size: &PixelSize,
        missing: &dyn Fn(&str) -> SceneError,
    ) -> Result<MapExtents> {
        let projection = global
            .child("projection_information")
            .ok_or_else(|| missing("projection_information"))?;

        let corner = |location: &str| -> Result<(f64, f64)> {
            let point = projection
                .children_named("corner_point")
                .find(|c| c.attribute("location") == Some(location))
                .ok_or_else(|| missing(&format!("{location} corner_point")))?;
            let x = point.attribute("x").ok_or_else(|| missing("corner_point x"))?;
            let y = point.attribute("y").ok_or_else(|| missing("corner_point y"))?;
            Ok((parse_float("corner_point x", x)?, parse_float("corner_point y", y)?))
        };

        let (ul_x, ul_y) = corner("UL")?;
        let (lr_x, lr_y) = corner("LR")?;
        let extents = MapExtents::new(ul_x, lr_y, lr_x, ul_y);

        let grid_origin = projection.child("grid_origin").map(|e| e.text.trim());
        if grid_origin == Some("CENTER") {
            Ok(extents.widened_by_half_pixel(pixel_size.x, pixel_size.y))
        } else {
            Ok(extents)
        }
    }

    /// First eligible band whose file exists, with its pixel size.
    fn reference_band(
        root: &Element,
        layout: &dyn XmlLayout,
        base: &Path,
    ) -> Result<(PathBuf, PixelSize)> {
        let bands = root
            .descend(layout.bands_path())
            .ok_or_else(|| SceneError::MissingElement(layout.bands_path().join("/")))?;

        for band in bands.children_named("band") {
            let (Some(name), Some(product)) = (band.attribute("name"), band.attribute("product"))
            else {
                continue;
            };
            if !layout.is_reference_candidate(name, product) {
                continue;
            }
            let Some(file_name) = band.child("file_name") else {
                continue;
            };
            let file = base.join(file_name.text.trim());
            if !file.is_file() {
                debug!("Skipping band {name}: {} not found", file.display());
                continue;
            }

            let pixel = band
                .child("pixel_size")
                .ok_or_else(|| SceneError::MissingElement(format!("{name}/pixel_size")))?;
            let attribute = |key: &str| {
                pixel
                    .attribute(key)
                    .ok_or_else(|| SceneError::MissingElement(format!("{name}/pixel_size@{key}")))
            };
            let pixel_size = PixelSize {
                x: parse_float("pixel_size x", attribute("x")?)?,
                y: parse_float("pixel_size y", attribute("y")?)?,
                units: attribute("units")?.to_string(),
            };
            return Ok((file, pixel_size));
        }

        Err(SceneError::NoReferenceBand)
    }

    /// The metadata layout of this file.
    pub fn layout(&self) -> &'static dyn XmlLayout {
        self.layout
    }
}

impl SceneMetadataProvider for XmlScene {
    fn scene(&self) -> &SceneInfo {
        &self.scene
    }

    fn append_band(&self, band: &ElevationBand) -> Result<bool> {
        let text = fs::read_to_string(&self.path)?;

        let mut path = vec![self.layout.root_tag()];
        path.extend_from_slice(self.layout.bands_path());
        let updated = append_band_xml(&text, &path, band)?;
        validate_appended_band(&updated, self.layout, band)?;

        fs::write(&self.path, updated)?;
        info!("Added elevation band to {}", self.path.display());
        Ok(true)
    }
}

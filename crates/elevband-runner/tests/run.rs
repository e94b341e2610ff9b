//! Full runs from metadata to finished band, with raster services faked.

use elevband_dem::{
    header_path_for, CornerBounds, DemError, DemSource, EnviHeader, GeoTransform, Int16Raster,
    MapProjector, RasterBandStore, RasterIntrospection, RasterWarpService, ReferenceData,
    Result as DemResult, ScratchFiles, Services, TileFiles, TileRepository, WarpRequest,
};
use elevband_runner::{build_elevation_band, ElevationConfig, RunError, RunOptions};
use elevband_scene::{MetadataSource, SceneError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ELEVATION: i16 = 1200;
const GEOID: i16 = -30;

// ============================================================================
// Fakes
// ============================================================================

/// Writes the files GDAL would leave for each warp (raster, ENVI header and
/// aux file) and keeps the pixel values in memory.
#[derive(Default)]
struct FakeRasters {
    outputs: RefCell<Vec<PathBuf>>,
    rasters: RefCell<HashMap<PathBuf, Int16Raster>>,
    /// Drop the header of the finished product right after it is warped.
    lose_product_header: bool,
}

impl RasterWarpService for FakeRasters {
    fn warp(&self, request: &WarpRequest) -> DemResult<()> {
        request.validate()?;
        self.outputs.borrow_mut().push(request.output.clone());

        let is_geoid = request
            .sources
            .iter()
            .any(|s| s.file_name().is_some_and(|n| n == "geoid.img"));
        let (rows, cols) = match (request.extents, request.resolution_x, request.resolution_y) {
            (Some(extents), Some(x), Some(y)) => (extents.lines(y), extents.samples(x)),
            _ => (1, 1),
        };
        let value = if is_geoid { GEOID } else { ELEVATION };

        fs::write(&request.output, b"pixels")?;
        fs::write(
            header_path_for(&request.output),
            format!("ENVI\nsamples = {cols}\nlines = {rows}\nbands = 1\ndata type = 2\n"),
        )?;
        let mut aux = request.output.clone().into_os_string();
        aux.push(".aux.xml");
        fs::write(aux, b"<PAMDataset/>")?;

        self.rasters
            .borrow_mut()
            .insert(request.output.clone(), Int16Raster::filled(rows, cols, value));

        let is_product = request
            .output
            .to_string_lossy()
            .ends_with("_elevation.img");
        if self.lose_product_header && is_product {
            fs::remove_file(header_path_for(&request.output))?;
        }
        Ok(())
    }

    fn assign_bounds(&self, _source: &Path, _bounds: &CornerBounds, output: &Path) -> DemResult<()> {
        fs::write(output, b"shifted")?;
        Ok(())
    }
}

impl RasterBandStore for FakeRasters {
    fn read_int16(&self, path: &Path) -> DemResult<Int16Raster> {
        self.rasters
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| DemError::RasterOperation {
                operation: format!("open {}", path.display()),
                message: "no such raster".to_string(),
            })
    }

    fn write_int16(&self, path: &Path, raster: &Int16Raster) -> DemResult<()> {
        self.rasters
            .borrow_mut()
            .insert(path.to_path_buf(), raster.clone());
        Ok(())
    }
}

/// Reports a UTM projection. When `rename_bands_in` is set, it also renames
/// the `bands` element of that metadata file, which happens after the scene
/// has been read and before the band is recorded.
#[derive(Default)]
struct FakeIntrospection {
    rename_bands_in: Option<PathBuf>,
}

impl RasterIntrospection for FakeIntrospection {
    fn projection_string(&self, _path: &Path) -> DemResult<String> {
        if let Some(xml) = &self.rename_bands_in {
            let text = fs::read_to_string(xml)?;
            fs::write(
                xml,
                text.replace("<bands>", "<band_list>")
                    .replace("</bands>", "</band_list>"),
            )?;
        }
        Ok("+proj=utm +zone=11 +datum=WGS84 +units=m +no_defs".to_string())
    }

    fn transform(&self, _path: &Path) -> DemResult<GeoTransform> {
        Ok(GeoTransform([0.0, 1.0, 0.0, 0.0, 0.0, -1.0]))
    }

    fn raster_size(&self, _path: &Path) -> DemResult<(usize, usize)> {
        Ok((1, 1))
    }
}

struct IdentityProjector;

impl MapProjector for IdentityProjector {
    fn project(&self, _target_srs: &str, points: &[(f64, f64)]) -> DemResult<Vec<(f64, f64)>> {
        Ok(points.to_vec())
    }
}

/// Serves a single GLS tile.
struct OneGlsTile(&'static str);

impl TileRepository for OneGlsTile {
    fn resolve(
        &self,
        source: DemSource,
        identifier: &str,
        scratch: &mut ScratchFiles,
    ) -> DemResult<Option<TileFiles>> {
        if source != DemSource::Gls || identifier != self.0 {
            return Ok(None);
        }
        let data_path = scratch.track_name(&format!("{identifier}.bil"));
        let header_path = scratch.track_name(&format!("{identifier}.hdr"));
        fs::write(&data_path, b"tile")?;
        fs::write(&header_path, b"header")?;
        Ok(Some(TileFiles {
            data_path,
            header_path,
        }))
    }
}

// ============================================================================
// Harness
// ============================================================================

const ESPA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<espa_metadata version="2.0" xmlns="http://espa.cr.usgs.gov/v2">
    <global_metadata>
        <product_id>LC08_L1TP_040035_20170704_20170716_01_T1</product_id>
        <bounding_coordinates>
            <west>-117.2</west>
            <east>-117.1</east>
            <north>36.2</north>
            <south>36.1</south>
        </bounding_coordinates>
        <projection_information projection="UTM" datum="WGS84" units="meters">
            <corner_point location="UL" x="0.0" y="210.0"/>
            <corner_point location="LR" x="300.0" y="0.0"/>
            <grid_origin>UL</grid_origin>
        </projection_information>
    </global_metadata>
    <bands>
        <band product="L1TP" name="b1" category="image" nlines="7" nsamps="10">
            <file_name>LC08_b1.img</file_name>
            <pixel_size x="30" y="30" units="meters"/>
        </band>
    </bands>
</espa_metadata>
"#;

const PRODUCT_IMAGE: &str = "LC08_L1TP_040035_20170704_20170716_01_T1_elevation.img";
const PRODUCT_HEADER: &str = "LC08_L1TP_040035_20170704_20170716_01_T1_elevation.hdr";

struct Harness {
    scene_dir: TempDir,
    reference_dir: TempDir,
    work_dir: TempDir,
    rasters: FakeRasters,
    introspection: FakeIntrospection,
}

impl Harness {
    fn new() -> Self {
        let scene_dir = TempDir::new().unwrap();
        fs::write(scene_dir.path().join("LC08_b1.img"), b"").unwrap();
        fs::write(scene_dir.path().join("LC08.xml"), ESPA).unwrap();

        let reference_dir = TempDir::new().unwrap();
        let reference = ReferenceData::from_root(reference_dir.path());
        fs::create_dir_all(reference.geoid_image.parent().unwrap()).unwrap();
        fs::write(&reference.geoid_image, b"geoid").unwrap();
        fs::write(&reference.geoid_header, b"geoid").unwrap();

        Self {
            scene_dir,
            reference_dir,
            work_dir: TempDir::new().unwrap(),
            rasters: FakeRasters::default(),
            introspection: FakeIntrospection::default(),
        }
    }

    fn xml_path(&self) -> PathBuf {
        self.scene_dir.path().join("LC08.xml")
    }

    fn build(&self, elevation: Option<PathBuf>) -> elevband_runner::Result<elevband_runner::RunSummary> {
        let reference = ReferenceData::from_root(self.reference_dir.path());
        let config = ElevationConfig {
            work_dir: self.work_dir.path().to_path_buf(),
            ..ElevationConfig::default()
        };
        let tiles = OneGlsTile("n36w118");
        let services = Services {
            warp: &self.rasters,
            introspection: &self.introspection,
            bands: &self.rasters,
            projector: &IdentityProjector,
            tiles: &tiles,
        };
        let options = RunOptions {
            metadata: MetadataSource::Xml(self.xml_path()),
            user_extents: None,
            elevation,
        };
        build_elevation_band(&options, &config, &reference, services)
    }

    fn work_dir_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.work_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_xml_scene_end_to_end() {
    let harness = Harness::new();

    let summary = harness.build(None).unwrap();

    assert_eq!(summary.source, DemSource::Gls);
    assert!(summary.band_recorded);
    assert_eq!(summary.image, harness.work_dir.path().join(PRODUCT_IMAGE));

    let raster = harness.rasters.read_int16(&summary.image).unwrap();
    assert_eq!((raster.rows(), raster.cols()), (7, 10));
    assert!(raster.data().iter().all(|&v| v == ELEVATION + GEOID));

    let header = EnviHeader::read(&summary.header).unwrap();
    assert_eq!(header.get("band names"), Some("{band 1 - elevation}"));
    assert_eq!(header.get("data ignore value"), Some("-9999"));
    assert_eq!(header.get("lines"), Some("7"));

    // Only the finished product is left behind
    assert_eq!(harness.work_dir_entries(), vec![PRODUCT_HEADER, PRODUCT_IMAGE]);

    let xml = fs::read_to_string(harness.xml_path()).unwrap();
    assert!(xml.contains("<band product=\"elevation\" source=\"gls\" name=\"elevation\""));
    assert!(xml.contains("nlines=\"7\" nsamps=\"10\""));
    assert!(xml.contains(&format!("<file_name>{PRODUCT_IMAGE}</file_name>")));
}

#[test]
fn test_missing_reference_band_fails_before_generation() {
    let harness = Harness::new();
    fs::remove_file(harness.scene_dir.path().join("LC08_b1.img")).unwrap();

    let err = harness.build(Some(PathBuf::from("custom.img"))).unwrap_err();

    assert_eq!(err.to_string(), "Supported bands not found in XML file");
    assert!(harness.rasters.outputs.borrow().is_empty());
}

#[test]
fn test_failed_band_record_removes_product() {
    let mut harness = Harness::new();
    harness.introspection.rename_bands_in = Some(harness.xml_path());

    let err = harness.build(None).unwrap_err();

    assert!(matches!(
        err,
        RunError::Scene(SceneError::MissingElement(ref path)) if path == "espa_metadata/bands"
    ));
    assert!(harness.work_dir_entries().is_empty());
    // The metadata document is not rewritten
    let xml = fs::read_to_string(harness.xml_path()).unwrap();
    assert!(!xml.contains("product=\"elevation\""));
}

#[test]
fn test_failed_header_finalize_removes_product() {
    let mut harness = Harness::new();
    harness.rasters.lose_product_header = true;

    let err = harness.build(None).unwrap_err();

    assert!(matches!(err, RunError::Dem(DemError::Io(_))));
    assert!(harness.work_dir_entries().is_empty());
    let xml = fs::read_to_string(harness.xml_path()).unwrap();
    assert!(!xml.contains("product=\"elevation\""));
}

//! End-to-end tests over metadata files on disk.

use approx::assert_relative_eq;
use elevband_dem::{DemSource, GeoBoundingBox, MapExtents};
use elevband_scene::{
    open_scene, ElevationBand, MetadataSource, SceneError, UserExtents,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ARD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ard_metadata version="1.0" xmlns="http://ard.cr.usgs.gov/v1">
  <tile_metadata>
    <global_metadata>
      <data_provider>USGS/EROS</data_provider>
      <product_id>LC08_CU_003009_20130613_20181116_C01_V01</product_id>
      <bounding_coordinates>
        <west>-120.386</west>
        <east>-118.259</east>
        <north>36.911</north>
        <south>35.261</south>
      </bounding_coordinates>
      <projection_information projection="AEA" datum="WGS84" units="meters">
        <corner_point location="UL" x="-2115585.0" y="1964805.0"/>
        <corner_point location="LR" x="-1965585.0" y="1814805.0"/>
        <grid_origin>UL</grid_origin>
      </projection_information>
    </global_metadata>
    <bands>
      <band product="level2_qa" name="PIXELQA" category="qa" nlines="5000" nsamps="5000">
        <file_name>LC08_PIXELQA.tif</file_name>
        <pixel_size x="30" y="30" units="meters"/>
      </band>
    </bands>
  </tile_metadata>
</ard_metadata>
"#;

const MTL: &str = r#"GROUP = L1_METADATA_FILE
    LANDSAT_SCENE_ID = "LE70420342002164EDC00"
    CORNER_UL_LAT_PRODUCT = 37.7
    CORNER_UR_LAT_PRODUCT = 37.8
    CORNER_LL_LAT_PRODUCT = 35.5
    CORNER_LR_LAT_PRODUCT = 35.6
    CORNER_UL_LON_PRODUCT = -121.0
    CORNER_UR_LON_PRODUCT = -118.3
    CORNER_LL_LON_PRODUCT = -121.1
    CORNER_LR_LON_PRODUCT = -118.4
    CORNER_UL_PROJECTION_X_PRODUCT = 600015.0
    CORNER_UL_PROJECTION_Y_PRODUCT = 4000005.0
    CORNER_LR_PROJECTION_X_PRODUCT = 602985.0
    CORNER_LR_PROJECTION_Y_PRODUCT = 3997035.0
    FILE_NAME_BAND_1 = "LE70420342002164EDC00_B1.TIF"
    GRID_CELL_SIZE_REFLECTIVE = 30.0
END_GROUP = L1_METADATA_FILE
END
"#;

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_ard_scene_and_band_append() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "LC08_PIXELQA.tif", "");
    let xml_path = write(dir.path(), "LC08_CU.xml", ARD);

    let source = MetadataSource::Xml(xml_path.clone());
    let scene = open_scene(&source, None).unwrap();

    assert_eq!(scene.product_id(), "LC08_CU_003009_20130613_20181116_C01_V01");
    assert_eq!(scene.reference_band_path(), dir.path().join("LC08_PIXELQA.tif"));
    assert_eq!(scene.scene().lines(), 5000);
    assert_eq!(scene.scene().samples(), 5000);

    let band = ElevationBand::new(
        DemSource::Gtopo30,
        "LC08_CU_003009_20130613_20181116_C01_V01_elevation.img",
        scene.scene().lines(),
        scene.scene().samples(),
        scene.pixel_size().clone(),
        "ELEVATION_0.1.0",
    );
    assert!(scene.append_band(&band).unwrap());

    let updated = fs::read_to_string(&xml_path).unwrap();
    assert!(updated.contains("<band product=\"elevation\" source=\"gtopo30\""));
    assert!(updated.contains("nlines=\"5000\" nsamps=\"5000\""));
    assert!(updated.contains("<pixel_size x=\"30.0\" y=\"30.0\" units=\"meters\"/>"));

    // The rewritten document still parses with the same reference band
    let reopened = open_scene(&source, None).unwrap();
    assert_eq!(reopened.scene(), scene.scene());
}

#[test]
fn test_mtl_scene_with_user_extents() {
    let dir = TempDir::new().unwrap();
    let mtl_path = write(dir.path(), "LE07_MTL.txt", MTL);

    let scene = open_scene(&MetadataSource::Mtl(mtl_path.clone()), None).unwrap();
    assert_relative_eq!(scene.bounding_box().north, 37.8);
    assert_relative_eq!(scene.bounding_box().west, -121.1);
    assert_eq!(scene.scene().samples(), 100);
    assert_eq!(scene.scene().lines(), 100);

    let user = UserExtents {
        extents: MapExtents::new(600_000.0, 3_997_000.0, 601_500.0, 3_997_600.0),
        bounds: GeoBoundingBox::new(36.12, 36.11, -118.88, -118.9),
    };
    let scene = open_scene(&MetadataSource::Mtl(mtl_path), Some(&user)).unwrap();
    assert_eq!(scene.corner_extents(), user.extents);
    assert_eq!(scene.scene().samples(), 50);
    assert_eq!(scene.scene().lines(), 20);
}

#[test]
fn test_missing_metadata_file() {
    let dir = TempDir::new().unwrap();
    let source = MetadataSource::Xml(dir.path().join("absent.xml"));
    assert!(matches!(open_scene(&source, None), Err(SceneError::Io(_))));
}

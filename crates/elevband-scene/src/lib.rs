//! # elevband-scene
//!
//! Scene metadata for the elevation band build.
//!
//! A scene is read from one of three documents:
//!
//! - **MTL**: Landsat `KEY = value` metadata.
//! - **ESPA XML**: `espa_metadata` with global metadata and bands at the root.
//! - **ARD XML**: `ard_metadata` with both under `tile_metadata`.
//!
//! Each yields a [`SceneInfo`]: the geographic bounding box, the map extents
//! of the output grid (pixel edges), the pixel size, the product identifier,
//! and a reference band whose projection the elevation band adopts. For XML
//! input the finished band is recorded back into the document with
//! [`SceneMetadataProvider::append_band`].
//!
//! ```no_run
//! use elevband_scene::{open_scene, MetadataSource};
//!
//! let source = MetadataSource::Xml("LC08_L1TP_042034_20130613_20170504_01_T1.xml".into());
//! let scene = open_scene(&source, None)?;
//! println!("{} lines", scene.scene().lines());
//! # Ok::<(), elevband_scene::SceneError>(())
//! ```

mod band;
mod error;
mod mtl;
mod scene;
mod xml;

pub use band::{append_band_xml, ElevationBand, PRODUCTION_DATE_FORMAT};
pub use error::SceneError;
pub use mtl::MtlScene;
pub use scene::{open_scene, MetadataSource, PixelSize, SceneInfo, SceneMetadataProvider, UserExtents};
pub use xml::{layout_for_root, ArdLayout, EspaLayout, XmlLayout, XmlScene};

/// Result type for scene metadata operations.
pub type Result<T> = std::result::Result<T, SceneError>;

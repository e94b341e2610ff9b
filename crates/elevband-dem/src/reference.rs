//! Layout of the reference elevation data directory.

use std::path::{Path, PathBuf};

/// Locations of the DEM sources and geoid under the reference data root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceData {
    /// Root directory.
    pub root: PathBuf,
    /// Directory of GLS `*.bil`/`*.hdr` tiles.
    pub gls_dir: PathBuf,
    /// Projection file shared by every GLS tile.
    pub gls_projection: PathBuf,
    /// Directory of GTOPO30 `<tile>.tar.gz` archives.
    pub gtopo30_dir: PathBuf,
    /// RAMP header.
    pub ramp_header: PathBuf,
    /// RAMP image.
    pub ramp_image: PathBuf,
    /// WGS84 geoid height header.
    pub geoid_header: PathBuf,
    /// WGS84 geoid height image.
    pub geoid_image: PathBuf,
}

impl ReferenceData {
    /// The standard layout under `root`.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let gls_dir = root.join("gls");

        Self {
            gls_projection: gls_dir.join("gls_projection.prj"),
            gls_dir,
            gtopo30_dir: root.join("gtopo30"),
            ramp_header: root.join("ramp").join("ramp200dem_wgs_v2.hdr"),
            ramp_image: root.join("ramp").join("ramp200dem_wgs_v2.img"),
            geoid_header: root.join("geoid").join("geoid.hdr"),
            geoid_image: root.join("geoid").join("geoid.img"),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_layout() {
        let data = ReferenceData::from_root("/data/elevation");
        assert_eq!(data.gls_dir, Path::new("/data/elevation/gls"));
        assert_eq!(
            data.gls_projection,
            Path::new("/data/elevation/gls/gls_projection.prj")
        );
        assert_eq!(
            data.ramp_image,
            Path::new("/data/elevation/ramp/ramp200dem_wgs_v2.img")
        );
        assert_eq!(data.geoid_header, Path::new("/data/elevation/geoid/geoid.hdr"));
        assert_eq!(data.gtopo30_dir, Path::new("/data/elevation/gtopo30"));
    }
}

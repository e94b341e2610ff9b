//! Tile repository over the reference data directory.

use elevband_dem::{
    parse_origin, DemError, DemSource, ReferenceData, ScratchFiles, TileFiles, TileRepository,
};
use flate2::read::GzDecoder;
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use tar::Archive;
use tracing::{debug, warn};

type Result<T> = elevband_dem::Result<T>;

/// Stages GLS and GTOPO30 tiles from a [`ReferenceData`] layout.
///
/// GLS tiles are linked into the work directory together with the shared
/// projection file, renamed `<tile>.prj`. GTOPO30 archives are unpacked into
/// the work directory. RAMP is a single dataset, not a tile set, so it is
/// never resolved here.
#[derive(Debug, Clone)]
pub struct FsTileRepository {
    reference: ReferenceData,
}

impl FsTileRepository {
    pub fn new(reference: ReferenceData) -> Self {
        Self { reference }
    }

    fn resolve_gls(&self, identifier: &str, scratch: &mut ScratchFiles) -> Result<Option<TileFiles>> {
        let bil_name = format!("{identifier}.bil");
        let hdr_name = format!("{identifier}.hdr");
        let bil = self.reference.gls_dir.join(&bil_name);
        let hdr = self.reference.gls_dir.join(&hdr_name);

        if !bil.is_file() || !hdr.is_file() {
            debug!("Missing Tile: {}", bil.display());
            return Ok(None);
        }

        let data_path = scratch.link(&bil, &bil_name)?;
        let header_path = scratch.link(&hdr, &hdr_name)?;
        if self.reference.gls_projection.is_file() {
            scratch.link(&self.reference.gls_projection, &format!("{identifier}.prj"))?;
        } else {
            warn!(
                "GLS projection file {} not found",
                self.reference.gls_projection.display()
            );
        }

        Ok(Some(TileFiles {
            data_path,
            header_path,
        }))
    }

    fn resolve_gtopo30(
        &self,
        identifier: &str,
        scratch: &mut ScratchFiles,
    ) -> Result<Option<TileFiles>> {
        let archive = self.reference.gtopo30_dir.join(format!("{identifier}.tar.gz"));
        if !archive.is_file() {
            debug!("Missing Tile: {}", archive.display());
            return Ok(None);
        }

        let extracted = unpack_flat(&archive, scratch)?;
        debug!("Unpacked {} files from {}", extracted.len(), archive.display());

        let find = |extension: &str| {
            extracted
                .iter()
                .find(|path| {
                    path.file_stem()
                        .and_then(OsStr::to_str)
                        .is_some_and(|stem| stem.eq_ignore_ascii_case(identifier))
                        && path
                            .extension()
                            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
                })
                .cloned()
                .ok_or_else(|| DemError::UnexpectedOutput {
                    tool: archive.display().to_string(),
                    reason: format!("no {extension} file for tile {identifier}"),
                })
        };

        Ok(Some(TileFiles {
            data_path: find("DEM")?,
            header_path: find("HDR")?,
        }))
    }
}

/// Unpack every regular file in a `.tar.gz` into the scratch work directory,
/// dropping any directory structure, and track what was written.
fn unpack_flat(archive: &Path, scratch: &mut ScratchFiles) -> Result<Vec<PathBuf>> {
    let mut tar = Archive::new(GzDecoder::new(File::open(archive)?));
    let mut extracted = Vec::new();

    for entry in tar.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let Some(name) = entry.path()?.file_name().map(OsStr::to_os_string) else {
            continue;
        };

        let destination = scratch.path(&name.to_string_lossy());
        scratch.track(destination.clone());
        entry.unpack(&destination)?;
        extracted.push(destination);
    }

    Ok(extracted)
}

impl TileRepository for FsTileRepository {
    fn resolve(
        &self,
        source: DemSource,
        identifier: &str,
        scratch: &mut ScratchFiles,
    ) -> Result<Option<TileFiles>> {
        parse_origin(identifier)?;

        match source {
            DemSource::Gls => self.resolve_gls(identifier, scratch),
            DemSource::Gtopo30 => self.resolve_gtopo30(identifier, scratch),
            DemSource::Ramp => Ok(None),
        }
    }
}

//! ENVI header editing.
//!
//! ENVI rasters are a flat binary file plus a text header of `key = value`
//! lines. Values wrapped in braces may span several lines. Pixel data goes
//! through [`crate::RasterBandStore`]; only the header text is handled here.

use crate::{DemError, Result};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// ENVI code for signed 16-bit integers.
pub const DATA_TYPE_INT16: i32 = 2;

/// Fill value declared for elevation products.
pub const ELEVATION_FILL_VALUE: i16 = -9999;

/// Band name written into elevation headers.
pub const ELEVATION_BAND_NAME: &str = "band 1 - elevation";

/// Header path for an ENVI data file: the extension is replaced with `.hdr`.
pub fn header_path_for(data_path: &Path) -> PathBuf {
    data_path.with_extension("hdr")
}

/// A parsed ENVI header, preserving field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnviHeader {
    fields: Vec<(String, String)>,
}

impl EnviHeader {
    /// Parse header text.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let mut lines = text.lines();

        match lines.next().map(str::trim) {
            Some("ENVI") => {}
            _ => return Err("missing ENVI signature".to_string()),
        }

        let mut fields = Vec::new();
        while let Some(line) = lines.next() {
            if line.trim().is_empty() {
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| format!("malformed line: {line}"))?;
            let mut value = value.trim().to_string();

            if value.starts_with('{') {
                while !value.ends_with('}') {
                    let next = lines
                        .next()
                        .ok_or_else(|| format!("unterminated value for {}", key.trim()))?;
                    value.push('\n');
                    value.push_str(next.trim_end());
                }
            }

            fields.push((key.trim().to_string(), value));
        }

        Ok(Self { fields })
    }

    /// Read and parse a header file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text).map_err(|reason| DemError::InvalidHeader {
            path: path.display().to_string(),
            reason,
        })
    }

    /// Write the header to a file.
    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    /// Render the header text.
    pub fn to_text(&self) -> String {
        let mut text = String::from("ENVI\n");
        for (key, value) in &self.fields {
            let _ = writeln!(text, "{key} = {value}");
        }
        text
    }

    /// Raw value of a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Replace a field's value, appending the field if absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some((_, v)) => *v = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    /// Update the fields that describe a finished elevation band.
    pub fn mark_as_elevation(&mut self) {
        self.set("band names", format!("{{{ELEVATION_BAND_NAME}}}"));
        self.set("data type", DATA_TYPE_INT16.to_string());
        self.set("data ignore value", ELEVATION_FILL_VALUE.to_string());
    }
}

/// Rewrite the header of a finished elevation raster.
pub fn finalize_elevation_header(header_path: &Path) -> Result<()> {
    let mut header = EnviHeader::read(header_path)?;
    header.mark_as_elevation();
    header.write(header_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GDAL_HEADER: &str = "ENVI
description = {
espa-mosaic-elevation.img}
samples = 3
lines = 2
bands = 1
header offset = 0
file type = ENVI Standard
data type = 2
interleave = bsq
byte order = 1
map info = {UTM, 1, 1, 300000, 4000000, 30, 30, 12, North,WGS-84}
band names = {
Band 1}
";

    #[test]
    fn test_parse_multiline_values() {
        let header = EnviHeader::parse(GDAL_HEADER).unwrap();
        assert_eq!(header.get("samples"), Some("3"));
        assert_eq!(header.get("description"), Some("{\nespa-mosaic-elevation.img}"));
        assert_eq!(header.get("band names"), Some("{\nBand 1}"));
        assert_eq!(header.get("lines"), Some("2"));
        assert_eq!(header.get("missing"), None);
    }

    #[test]
    fn test_parse_rejects_non_envi() {
        assert!(EnviHeader::parse("BANDS: 1\n").is_err());
        assert!(EnviHeader::parse("ENVI\nband names = {\nBand 1\n").is_err());
    }

    #[test]
    fn test_mark_as_elevation() {
        let mut header = EnviHeader::parse(GDAL_HEADER).unwrap();
        header.set("data type", "4");
        header.mark_as_elevation();

        let text = header.to_text();
        assert!(text.contains("band names = {band 1 - elevation}\n"));
        assert!(text.contains("data type = 2\n"));
        assert!(text.contains("data ignore value = -9999\n"));
        // Existing fields keep their position
        assert!(text.starts_with("ENVI\ndescription = {\nespa-mosaic-elevation.img}\nsamples = 3\n"));
    }

    #[test]
    fn test_finalize_rewrites_header_in_place() {
        let dir = TempDir::new().unwrap();
        let data_path = dir.path().join("LC08_elevation.img");
        let header_path = header_path_for(&data_path);
        fs::write(&header_path, GDAL_HEADER).unwrap();

        finalize_elevation_header(&header_path).unwrap();

        let header = EnviHeader::read(&header_path).unwrap();
        assert_eq!(header.get("band names"), Some("{band 1 - elevation}"));
        assert_eq!(header.get("data ignore value"), Some("-9999"));
        assert_eq!(header.get("byte order"), Some("1"));
        assert_eq!(header.get("lines"), Some("2"));
    }

    #[test]
    fn test_finalize_missing_header() {
        let dir = TempDir::new().unwrap();
        let err = finalize_elevation_header(&dir.path().join("absent.hdr")).unwrap_err();
        assert!(matches!(err, DemError::Io(_)));
    }

    #[test]
    fn test_header_path_for() {
        assert_eq!(
            header_path_for(Path::new("/work/LC08_elevation.img")),
            PathBuf::from("/work/LC08_elevation.hdr")
        );
    }
}

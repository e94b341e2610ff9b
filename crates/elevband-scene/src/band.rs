//! The elevation band element added to XML metadata.

use crate::scene::PixelSize;
use crate::{Result, SceneError};
use chrono::{DateTime, Utc};
use elevband_dem::{DemSource, ELEVATION_FILL_VALUE};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

/// Format of `production_date`.
pub const PRODUCTION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Metadata describing a generated elevation band.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationBand {
    /// DEM the band was built from.
    pub source: DemSource,
    /// Elevation image file name.
    pub file_name: String,
    /// Output lines.
    pub lines: usize,
    /// Output samples.
    pub samples: usize,
    /// Output pixel size.
    pub pixel_size: PixelSize,
    /// Producing software and version.
    pub app_version: String,
    /// When the band was produced.
    pub production_date: DateTime<Utc>,
}

/// Render a float the way the metadata carries it, keeping `.0` on whole
/// numbers.
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

impl ElevationBand {
    /// Describe a band produced now.
    pub fn new(
        source: DemSource,
        file_name: impl Into<String>,
        lines: usize,
        samples: usize,
        pixel_size: PixelSize,
        app_version: impl Into<String>,
    ) -> Self {
        Self {
            source,
            file_name: file_name.into(),
            lines,
            samples,
            pixel_size,
            app_version: app_version.into(),
            production_date: Utc::now(),
        }
    }

    /// Write the `<band>` element.
    pub fn write<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let lines = self.lines.to_string();
        let samples = self.samples.to_string();
        let fill = ELEVATION_FILL_VALUE.to_string();

        let mut band = BytesStart::new("band");
        band.push_attribute(("product", "elevation"));
        band.push_attribute(("source", self.source.as_str()));
        band.push_attribute(("name", "elevation"));
        band.push_attribute(("category", "image"));
        band.push_attribute(("data_type", "INT16"));
        band.push_attribute(("nlines", lines.as_str()));
        band.push_attribute(("nsamps", samples.as_str()));
        band.push_attribute(("fill_value", fill.as_str()));
        writer.write_event(Event::Start(band))?;

        write_text_element(writer, "short_name", "ELEVATION")?;
        write_text_element(writer, "long_name", "elevation")?;
        write_text_element(writer, "file_name", &self.file_name)?;

        let x = format_float(self.pixel_size.x);
        let y = format_float(self.pixel_size.y);
        let mut pixel_size = BytesStart::new("pixel_size");
        pixel_size.push_attribute(("x", x.as_str()));
        pixel_size.push_attribute(("y", y.as_str()));
        pixel_size.push_attribute(("units", self.pixel_size.units.as_str()));
        writer.write_event(Event::Empty(pixel_size))?;

        write_text_element(writer, "resample_method", "bilinear")?;
        write_text_element(writer, "data_units", "meters")?;
        write_text_element(writer, "app_version", &self.app_version)?;
        let date = self.production_date.format(PRODUCTION_DATE_FORMAT).to_string();
        write_text_element(writer, "production_date", &date)?;

        writer.write_event(Event::End(BytesEnd::new("band")))?;
        Ok(())
    }
}

/// Insert `band` as the last child of the element at `bands_path`.
///
/// `bands_path` lists local element names from the root down, e.g.
/// `["espa_metadata", "bands"]`. Everything else in the document is passed
/// through unchanged.
pub fn append_band_xml(xml: &str, bands_path: &[&str], band: &ElevationBand) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut stack: Vec<String> = Vec::new();
    let mut inserted = false;

    let at_bands = |stack: &[String]| {
        stack.len() == bands_path.len() && stack.iter().zip(bands_path).all(|(a, b)| a == b)
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                writer.write_event(Event::Start(e))?;
            }
            Event::End(e) => {
                if !inserted && at_bands(&stack) {
                    band.write(&mut writer)?;
                    inserted = true;
                }
                stack.pop();
                writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                if !inserted && at_bands(&stack) {
                    // <bands/> becomes <bands><band .../></bands>
                    let end = BytesEnd::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
                    writer.write_event(Event::Start(e))?;
                    band.write(&mut writer)?;
                    writer.write_event(Event::End(end))?;
                    inserted = true;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
                stack.pop();
            }
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    if !inserted {
        return Err(SceneError::MissingElement(bands_path.join("/")));
    }

    Ok(String::from_utf8(writer.into_inner())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn band() -> ElevationBand {
        let mut band = ElevationBand::new(
            DemSource::Gls,
            "LC08_elevation.img",
            7001,
            7121,
            PixelSize {
                x: 30.0,
                y: 30.0,
                units: "meters".to_string(),
            },
            "ELEVATION_0.1.0",
        );
        band.production_date = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        band
    }

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(30.0), "30.0");
        assert_eq!(format_float(-0.5), "-0.5");
        assert_eq!(format_float(12.25), "12.25");
    }

    #[test]
    fn test_band_element() {
        let mut writer = Writer::new(Vec::new());
        band().write(&mut writer).unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();

        assert!(xml.starts_with(
            "<band product=\"elevation\" source=\"gls\" name=\"elevation\" category=\"image\" \
             data_type=\"INT16\" nlines=\"7001\" nsamps=\"7121\" fill_value=\"-9999\">"
        ));
        assert!(xml.contains("<short_name>ELEVATION</short_name>"));
        assert!(xml.contains("<file_name>LC08_elevation.img</file_name>"));
        assert!(xml.contains("<pixel_size x=\"30.0\" y=\"30.0\" units=\"meters\"/>"));
        assert!(xml.contains("<resample_method>bilinear</resample_method>"));
        assert!(xml.contains("<app_version>ELEVATION_0.1.0</app_version>"));
        assert!(xml.contains("<production_date>2024-03-05T14:07:09Z</production_date>"));
        assert!(xml.ends_with("</band>"));
    }

    #[test]
    fn test_append_after_existing_bands() {
        let xml = "<?xml version=\"1.0\"?>\n<espa_metadata version=\"2.0\">\
                   <global_metadata><bands>ignored</bands></global_metadata>\
                   <bands><band name=\"b1\"/></bands></espa_metadata>";
        let out = append_band_xml(xml, &["espa_metadata", "bands"], &band()).unwrap();

        assert!(out.starts_with("<?xml version=\"1.0\"?>\n<espa_metadata version=\"2.0\">"));
        assert!(out.contains("<global_metadata><bands>ignored</bands></global_metadata>"));
        let b1 = out.find("<band name=\"b1\"/>").unwrap();
        let elevation = out.find("<band product=\"elevation\"").unwrap();
        assert!(b1 < elevation);
        assert!(out.ends_with("</band></bands></espa_metadata>"));
    }

    #[test]
    fn test_append_into_empty_bands() {
        let xml = "<ard_metadata><tile_metadata><bands/></tile_metadata></ard_metadata>";
        let out =
            append_band_xml(xml, &["ard_metadata", "tile_metadata", "bands"], &band()).unwrap();
        assert!(out.contains("<tile_metadata><bands><band product=\"elevation\""));
        assert!(out.ends_with("</band></bands></tile_metadata></ard_metadata>"));
    }

    #[test]
    fn test_missing_bands_element() {
        let xml = "<espa_metadata><global_metadata/></espa_metadata>";
        let err = append_band_xml(xml, &["espa_metadata", "bands"], &band()).unwrap_err();
        assert!(matches!(err, SceneError::MissingElement(path) if path == "espa_metadata/bands"));
    }
}

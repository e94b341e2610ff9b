//! Error types for scene metadata handling.

use thiserror::Error;

/// Errors that can occur while reading scene metadata or writing the
/// elevation band into it.
#[derive(Debug, Error)]
pub enum SceneError {
    /// I/O error reading or writing a metadata file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML could not be read or written.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// An XML attribute could not be parsed.
    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    /// A required metadata field is absent.
    #[error("Obtaining {field} field from: [{path}]")]
    MissingField {
        /// Field name.
        field: String,
        /// Metadata file.
        path: String,
    },

    /// A metadata field holds a value that cannot be used.
    #[error("Invalid value for {field}: {value}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// The offending value.
        value: String,
    },

    /// Rewritten XML is not valid UTF-8.
    #[error("XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// An MTL line is not a `key = value` pair.
    #[error("Malformed MTL line: {0}")]
    MalformedLine(String),

    /// The XML is not a supported metadata layout.
    #[error("Un-Supported Metadata XML: {0}")]
    UnsupportedXml(String),

    /// No band in the XML qualifies as the reference band.
    #[error("Supported bands not found in XML file")]
    NoReferenceBand,

    /// The rewritten document does not carry a complete band entry.
    #[error("Updated metadata failed validation: {0}")]
    InvalidBand(String),

    /// The element a new band is appended to is missing.
    #[error("Element {0} not found in metadata XML")]
    MissingElement(String),
}

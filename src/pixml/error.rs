/// Errors that can occur while reading or writing PI-XML
#[derive(Debug, thiserror::Error)]
pub enum PiXmlError {
    /// Error parsing XML
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    /// I/O error during file operations
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// UTF-8 encoding error in a name, attribute or text node
    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),

    /// Invalid character or entity reference
    #[error("XML escape error: {0}")]
    EscapeError(#[from] quick_xml::escape::EscapeError),

    /// Two series share the same identity and location
    #[error(
        "PI-XML import failed because of duplicate time series for timeseries_code \"{code}\", \
         location_code \"{location_code}\" and source \"{origin}\""
    )]
    DuplicateSeries {
        /// Series code of the duplicated identity
        code: String,
        /// Location code of the duplicated series
        location_code: String,
        /// Description of the source document
        origin: String,
    },

    /// A mandatory header field is missing or invalid
    #[error("Malformed header in series {series}: {reason}")]
    MalformedHeader {
        /// Position (1-based) or key of the offending series
        series: String,
        /// What is wrong with the header
        reason: String,
    },

    /// An event's date or time cannot be parsed
    #[error("Invalid event timestamp '{date}T{time}' in series {series}")]
    InvalidTimestamp {
        /// Key of the series the event belongs to
        series: String,
        /// Raw `date` attribute
        date: String,
        /// Raw `time` attribute
        time: String,
    },

    /// The `timeZone` element does not hold a number
    #[error("Invalid timeZone value: '{0}'")]
    InvalidTimezone(String),

    /// Invalid document structure
    #[error("Invalid PI-XML structure: {0}")]
    InvalidStructure(String),

    /// Chunk size of zero requested
    #[error("Chunk size must be at least 1")]
    InvalidChunkSize,

    /// Error from the Arrow library while building record batches
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),
}

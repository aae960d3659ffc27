/// pixml batch format version - follows semantic versioning
pub const PIXML_FORMAT_VERSION: &str = "1.0.0";

/// File extension for Parquet files written from PI-XML
pub const PIXML_PARQUET_EXTENSION: &str = ".pixml.parquet";

/// Field metadata key naming the PI-XML element or attribute a column comes from
pub const KEY_PI_SOURCE: &str = "pixml:source";

/// Metadata key for format version in schemas and Parquet footers
pub const KEY_FORMAT_VERSION: &str = "pixml:format_version";

/// Metadata key for the document timezone in Parquet footers
pub const KEY_TIMEZONE: &str = "pixml:timezone";

/// Metadata key for the JSON list of series headers in Parquet footers
pub const KEY_SERIES: &str = "pixml:series";

/// Metadata key for the source document in Parquet footers
pub const KEY_SOURCE_FILE: &str = "pixml:source_file";

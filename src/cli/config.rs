//! TOML configuration file support.
//!
//! Settings that would otherwise be passed as flags can live in a config file:
//!
//! ```toml
//! # pixml.toml
//! [conversion]
//! chunk_size = 100000
//! compression_level = 9
//! row_group_size = 100000
//!
//! [export]
//! pretty = false
//! version = "1.2"
//! ```
//!
//! Flags given on the command line win over values from the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure for pixml.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Settings of the convert command.
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Settings of PI-XML output.
    #[serde(default)]
    pub export: ExportConfig,
}

/// Configuration for the convert command.
#[derive(Debug, Default, Deserialize)]
pub struct ConversionConfig {
    /// Rows per extracted batch.
    pub chunk_size: Option<usize>,

    /// ZSTD compression level (1-22).
    pub compression_level: Option<i32>,

    /// Rows per Parquet row group.
    pub row_group_size: Option<usize>,
}

/// Configuration for written PI-XML.
#[derive(Debug, Default, Deserialize)]
pub struct ExportConfig {
    /// Indent nested elements.
    pub pretty: Option<bool>,

    /// `version` attribute of the root element.
    pub version: Option<String>,
}

impl Config {
    /// Load configuration from an optional TOML file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [conversion]
            chunk_size = 50000
            compression_level = 15
            row_group_size = 200000

            [export]
            pretty = false
            version = "1.10"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.chunk_size, Some(50_000));
        assert_eq!(config.conversion.compression_level, Some(15));
        assert_eq!(config.conversion.row_group_size, Some(200_000));
        assert_eq!(config.export.pretty, Some(false));
        assert_eq!(config.export.version.as_deref(), Some("1.10"));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [conversion]
            chunk_size = 10
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.conversion.chunk_size, Some(10));
        assert_eq!(config.conversion.row_group_size, None);
        assert_eq!(config.export.pretty, None);
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.conversion.chunk_size, None);
        assert!(Config::load(None).unwrap().export.version.is_none());
    }

    #[test]
    fn test_invalid_config() {
        assert!(Config::from_str("[conversion]\nchunk_size = \"many\"").is_err());
    }
}

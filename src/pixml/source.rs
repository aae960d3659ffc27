//! Re-openable PI-XML sources.
//!
//! Reading a document takes two independent passes (duplicate validation,
//! then extraction), so a source must be able to hand out a fresh reader
//! positioned at the start of the document each time it is opened.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use super::PiXmlError;

/// Buffer size used for file sources
pub const DEFAULT_INPUT_BUFFER_SIZE: usize = 256 * 1024;

/// A PI-XML document that can be read from the start any number of times
pub trait XmlSource {
    /// Reader type produced by [`XmlSource::open`]
    type Reader: BufRead;

    /// Open a new forward-only reader at the start of the document
    fn open(&self) -> Result<Self::Reader, PiXmlError>;

    /// Human-readable description used in error messages
    fn describe(&self) -> String;
}

impl XmlSource for Path {
    type Reader = BufReader<File>;

    fn open(&self) -> Result<Self::Reader, PiXmlError> {
        let file = File::open(self)?;
        Ok(BufReader::with_capacity(DEFAULT_INPUT_BUFFER_SIZE, file))
    }

    fn describe(&self) -> String {
        self.display().to_string()
    }
}

impl XmlSource for PathBuf {
    type Reader = BufReader<File>;

    fn open(&self) -> Result<Self::Reader, PiXmlError> {
        self.as_path().open()
    }

    fn describe(&self) -> String {
        self.as_path().describe()
    }
}

/// An in-memory PI-XML document.
///
/// Cloning is cheap; every [`open`](XmlSource::open) shares the same bytes.
#[derive(Debug, Clone)]
pub struct MemorySource {
    label: String,
    data: Bytes,
}

impl MemorySource {
    /// Wrap document bytes under a descriptive label
    pub fn new(label: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            label: label.into(),
            data: data.into(),
        }
    }

    /// Size of the document in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True for an empty document
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<String> for MemorySource {
    fn from(xml: String) -> Self {
        Self::new("<memory>", xml)
    }
}

impl From<&'static str> for MemorySource {
    fn from(xml: &'static str) -> Self {
        Self::new("<memory>", xml)
    }
}

impl From<Vec<u8>> for MemorySource {
    fn from(xml: Vec<u8>) -> Self {
        Self::new("<memory>", xml)
    }
}

impl XmlSource for MemorySource {
    type Reader = Cursor<Bytes>;

    fn open(&self) -> Result<Self::Reader, PiXmlError> {
        Ok(Cursor::new(self.data.clone()))
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

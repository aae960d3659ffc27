//! # pixml - Streaming PI-XML Time Series
//!
//! `pixml` reads and writes hydrological and meteorological time series in the
//! Delft-FEWS Published Interface (PI-XML) format, converting between the XML
//! wire format and columnar Arrow record batches.
//!
//! ## Key Features
//!
//! - **Bounded Memory**: Documents are streamed through a pruning reader; only
//!   one chunk of rows plus the series currently in flight is ever held.
//!
//! - **Fail-fast Validation**: A cheap first pass rejects documents that repeat
//!   a series identity before any data is produced.
//!
//! - **Chunked Batches**: Events are delivered in fixed-size
//!   [`Batch`](model::Batch)es carrying the headers of every series they touch.
//!
//! - **Timezone Aware**: The document-level `timeZone` is resolved up front and
//!   stamped on every batch; documents without one stay naive.
//!
//! - **Round Trip**: Batches and series serialize back to schema-conformant
//!   PI-XML.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use pixml::pixml::{BulkReader, PiXmlWriter, PiXmlWriterConfig};
//!
//! let reader = BulkReader::new(PathBuf::from("export.xml")).with_chunk_size(100_000);
//! let batches = reader.batches()?;
//!
//! let config = PiXmlWriterConfig::default().with_timezone(batches.timezone());
//! let mut writer = PiXmlWriter::new(std::io::stdout(), &config)?;
//! writer.write_batches(batches)?;
//! let (_, stats) = writer.finish()?;
//! eprintln!("{}", stats);
//! # Ok::<(), pixml::pixml::PiXmlError>(())
//! ```
//!
//! ## Writing Parquet
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//!
//! use pixml::pixml::BulkReader;
//! use pixml::writer::{BatchWriter, WriterConfig};
//!
//! let batches = BulkReader::new(PathBuf::from("export.xml")).batches()?;
//! let mut writer = BatchWriter::new_file(
//!     "export.pixml.parquet",
//!     batches.timezone(),
//!     WriterConfig::default(),
//! )?;
//! writer.write_all(batches)?;
//! let stats = writer.finish()?;
//! println!("{}", stats);
//! # Ok::<(), pixml::writer::WriterError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`model`]: Series identity, headers, events, batches and fixed offsets
//! - [`pixml`]: Streaming reader, duplicate validator, extractor and serializer
//! - [`schema`]: Arrow schema of event and series batches
//! - [`writer`]: Parquet sink for extracted batches
//! - [`adapters`]: Key-value store and list-of-events adapters
//!
//! ### Event Schema
//!
//! | Column | Type | Nullable | Source |
//! |--------|------|----------|--------|
//! | code | Utf8 | No | `parameterId` + `timeStep` |
//! | location_code | Utf8 | No | `locationId` |
//! | timestamp | Timestamp(ms, offset?) | No | `event@date` + `event@time` |
//! | value | Float64 | No | `event@value` (NaN when missing) |
//! | flag | Int32 | Yes | `event@flag` |
//! | flag_source | Utf8 | Yes | `event@flagSource` |
//! | comment | Utf8 | Yes | `event@comment` |
//! | user | Utf8 | Yes | `event@user` |

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod adapters;
pub mod model;
pub mod pixml;
pub mod schema;
pub mod writer;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::adapters::{
        flatten, BucketSize, EventList, KeyValueStore, KvReader, KvWriter, ListFrame, MemoryStore,
    };
    pub use crate::model::{
        Batch, EventColumns, EventRow, SeriesHeader, SeriesIdentity, SeriesKey, TimezoneOffset,
    };
    pub use crate::pixml::{
        extract, resolve_timezone, validate, BatchIterator, BulkReader, ExtractConfig,
        MemorySource, PiXmlError, PiXmlWriter, PiXmlWriterConfig, Series, SeriesReader,
        XmlSource,
    };
    pub use crate::schema::{columns, create_event_schema, PIXML_FORMAT_VERSION};
    pub use crate::writer::{BatchWriter, CompressionType, WriterConfig, WriterError, WriterStats};
}

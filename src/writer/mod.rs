//! # Parquet Batch Sink
//!
//! Writes extracted [`Batch`](crate::model::Batch)es to a single Parquet file.
//!
//! ## Design Principles
//!
//! 1. **Streaming**: each batch is written as it arrives; only the series
//!    headers are kept until the end.
//!
//! 2. **Row groups per chunk**: with `row_group_size` equal to the extraction
//!    chunk size every batch lands in its own row group.
//!
//! 3. **Self-contained files**: the format version, the document offset and
//!    the JSON list of series headers are stored in the Parquet footer's
//!    key-value metadata.
//!
//! 4. **Configurable compression**: ZSTD (default), Snappy or uncompressed.

mod batch_writer;
mod config;
mod error;
mod stats;


pub use batch_writer::BatchWriter;
pub use config::{CompressionType, WriterConfig};
pub use error::WriterError;
pub use stats::WriterStats;

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::datatypes::Schema;
use log::debug;
use parquet::arrow::ArrowWriter;
use parquet::format::KeyValue;

use crate::model::{Batch, SeriesHeader, SeriesKey, TimezoneOffset};
use crate::schema::{
    create_event_schema, KEY_FORMAT_VERSION, KEY_SERIES, KEY_SOURCE_FILE, KEY_TIMEZONE,
    PIXML_FORMAT_VERSION,
};

use super::config::WriterConfig;
use super::error::WriterError;
use super::stats::WriterStats;

/// Streaming writer of extracted batches to a Parquet file.
///
/// Event rows go to the row groups; the series headers seen across all
/// batches are collected and stored as JSON in the footer on
/// [`finish`](BatchWriter::finish).
pub struct BatchWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    schema: Arc<Schema>,
    timezone: TimezoneOffset,
    series: Vec<Arc<SeriesHeader>>,
    seen: HashSet<SeriesKey>,
    source_file: Option<String>,
    batches_written: usize,
    rows_written: usize,
}

impl BatchWriter<File> {
    /// Create a writer to a file path
    pub fn new_file<P: AsRef<Path>>(
        path: P,
        timezone: TimezoneOffset,
        config: WriterConfig,
    ) -> Result<Self, WriterError> {
        let file = File::create(path)?;
        Self::new(file, timezone, config)
    }
}

impl<W: Write + Send> BatchWriter<W> {
    /// Create a writer for batches of a document with the given offset
    pub fn new(
        writer: W,
        timezone: TimezoneOffset,
        config: WriterConfig,
    ) -> Result<Self, WriterError> {
        let schema = Arc::new(create_event_schema(timezone));

        let mut metadata = HashMap::new();
        metadata.insert(KEY_FORMAT_VERSION.to_string(), PIXML_FORMAT_VERSION.to_string());
        if let Some(tz) = timezone.to_arrow_timezone() {
            metadata.insert(KEY_TIMEZONE.to_string(), tz);
        }
        let props = config.to_writer_properties(&metadata);

        let arrow_writer = ArrowWriter::try_new(writer, schema.clone(), Some(props))?;

        Ok(Self {
            writer: arrow_writer,
            schema,
            timezone,
            series: Vec::new(),
            seen: HashSet::new(),
            source_file: None,
            batches_written: 0,
            rows_written: 0,
        })
    }

    /// Record the document the batches come from in the footer
    pub fn with_source_file(mut self, source: impl Into<String>) -> Self {
        self.source_file = Some(source.into());
        self
    }

    /// Arrow schema of the event rows
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Write one batch.
    ///
    /// Metadata-only batches contribute their headers but no rows.
    pub fn write_batch(&mut self, batch: &Batch) -> Result<(), WriterError> {
        if batch.timezone != self.timezone {
            return Err(WriterError::InvalidData(format!(
                "batch {} has timezone {} but the file was created for {}",
                batch.index, batch.timezone, self.timezone
            )));
        }

        for header in &batch.metadata {
            if self.seen.insert(header.key()) {
                self.series.push(Arc::clone(header));
            }
        }

        if !batch.is_empty() {
            let record_batch = batch.to_record_batch()?;
            self.writer.write(&record_batch)?;
        }

        self.batches_written += 1;
        self.rows_written += batch.len();
        debug!("batch {}: {} rows written", batch.index, batch.len());
        Ok(())
    }

    /// Write every batch of an extraction, stopping at the first error
    pub fn write_all<I>(&mut self, batches: I) -> Result<(), WriterError>
    where
        I: IntoIterator<Item = Result<Batch, crate::pixml::PiXmlError>>,
    {
        for batch in batches {
            self.write_batch(&batch?)?;
        }
        Ok(())
    }

    /// Get current statistics
    pub fn stats(&self) -> WriterStats {
        WriterStats {
            batches_written: self.batches_written,
            series_written: self.series.len(),
            rows_written: self.rows_written,
            row_groups_written: 0, // Unknown until finish
            file_size_bytes: 0,    // Unknown until finish
        }
    }

    fn append_footer(&mut self) -> Result<(), WriterError> {
        let headers: Vec<&SeriesHeader> = self.series.iter().map(Arc::as_ref).collect();
        self.writer.append_key_value_metadata(KeyValue::new(
            KEY_SERIES.to_string(),
            serde_json::to_string(&headers)?,
        ));
        if let Some(source) = &self.source_file {
            self.writer
                .append_key_value_metadata(KeyValue::new(KEY_SOURCE_FILE.to_string(), source.clone()));
        }
        Ok(())
    }

    /// Flush buffered rows, write the footer and finalize the file
    pub fn finish(mut self) -> Result<WriterStats, WriterError> {
        self.append_footer()?;
        let stats = self.stats();
        let file_metadata = self.writer.close()?;

        Ok(WriterStats {
            row_groups_written: file_metadata.row_groups.len(),
            file_size_bytes: file_metadata
                .row_groups
                .iter()
                .map(|rg| rg.total_byte_size as u64)
                .sum(),
            ..stats
        })
    }

    /// Finalize the file and return the underlying writer.
    ///
    /// Useful when the writer is backed by an in-memory buffer.
    pub fn finish_into_inner(mut self) -> Result<W, WriterError> {
        self.append_footer()?;
        let inner = self.writer.into_inner()?;
        Ok(inner)
    }
}

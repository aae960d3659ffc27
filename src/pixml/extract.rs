//! Chunked bulk extraction of PI-XML events.
//!
//! The extractor pulls `timeZone` and `series` elements out of the pruner,
//! one complete series at a time, and walks that series' events lazily into a
//! columnar buffer. A batch is cut when the buffer holds `chunk_size` rows
//! and another row arrives, or when the document ends, so no batch is ever
//! empty unless the document has series headers but no events at all.
//!
//! ## Carry-over metadata
//!
//! A series whose events straddle a batch boundary is reported in the
//! metadata of every batch it contributes rows to. A series without events
//! is reported once, in the next batch emitted after it was read.

use std::io::BufRead;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::parse::{parse_event, parse_series_header, parse_timezone};
use super::pruner::{Element, Pruner};
use super::source::XmlSource;
use super::timezone::resolve_timezone;
use super::validate::validate;
use super::{tags, PiXmlError};
use crate::model::{Batch, EventColumns, EventRow, SeriesHeader, SeriesKey, TimezoneOffset};

/// Rows per batch when nothing else is configured
pub const DEFAULT_CHUNK_SIZE: usize = 250_000;

/// Configuration of the bulk extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Number of event rows per emitted batch (the last batch may be shorter)
    pub chunk_size: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ExtractConfig {
    /// Configuration with a specific chunk size
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self { chunk_size }
    }

    /// Small batches for interactive use and low-memory hosts
    pub fn small() -> Self {
        Self { chunk_size: 10_000 }
    }

    /// Large batches for bulk loads into columnar stores
    pub fn bulk() -> Self {
        Self {
            chunk_size: 1_000_000,
        }
    }

    /// Reject configurations the extractor cannot run with
    pub fn check(&self) -> Result<(), PiXmlError> {
        if self.chunk_size == 0 {
            return Err(PiXmlError::InvalidChunkSize);
        }
        Ok(())
    }
}

/// Entry point for chunked extraction from a re-openable source.
///
/// # Example
///
/// ```rust,no_run
/// use pixml::pixml::BulkReader;
/// use std::path::PathBuf;
///
/// let reader = BulkReader::new(PathBuf::from("export.xml")).with_chunk_size(50_000);
/// for batch in reader.batches()? {
///     let batch = batch?;
///     println!("batch {}: {} rows, {} series", batch.index, batch.len(), batch.metadata.len());
/// }
/// # Ok::<(), pixml::pixml::PiXmlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BulkReader<S> {
    source: S,
    config: ExtractConfig,
}

impl<S: XmlSource> BulkReader<S> {
    /// Reader with the default configuration
    pub fn new(source: S) -> Self {
        Self::with_config(source, ExtractConfig::default())
    }

    /// Reader with an explicit configuration
    pub fn with_config(source: S, config: ExtractConfig) -> Self {
        Self { source, config }
    }

    /// Override the chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.chunk_size = chunk_size;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Validate the source, then start streaming batches.
    ///
    /// Fails before producing anything when the chunk size is zero or the
    /// document holds duplicate series.
    pub fn batches(&self) -> Result<BatchIterator<S::Reader>, PiXmlError> {
        extract(&self.source, self.config.chunk_size)
    }
}

/// Validate `source` and return a lazy iterator over its batches.
///
/// The document offset is resolved before returning, so
/// [`BatchIterator::timezone`] is final before the first batch is pulled.
pub fn extract<S: XmlSource + ?Sized>(
    source: &S,
    chunk_size: usize,
) -> Result<BatchIterator<S::Reader>, PiXmlError> {
    ExtractConfig::with_chunk_size(chunk_size).check()?;
    validate(source)?;
    let timezone = resolve_timezone(source)?;
    let mut batches = BatchIterator::new(source.open()?, chunk_size, source.describe());
    batches.timezone = timezone;
    Ok(batches)
}

/// A series in the live carry-over set
#[derive(Debug)]
struct LiveSeries {
    header: Arc<SeriesHeader>,
    /// Rows of this series currently in the buffer
    buffered: usize,
    /// More events of this series may still arrive
    open: bool,
}

/// The series whose events are being walked
#[derive(Debug)]
struct SeriesCursor {
    header: Arc<SeriesHeader>,
    key: Arc<SeriesKey>,
    events: std::vec::IntoIter<Element>,
}

/// Lazy, finite iterator over the batches of one document.
///
/// Created by [`BulkReader::batches`] or [`extract`]. Not restartable; after
/// an error it yields nothing more.
pub struct BatchIterator<R: BufRead> {
    pruner: Pruner<R>,
    origin: String,
    chunk_size: usize,
    timezone: TimezoneOffset,
    live: Vec<LiveSeries>,
    buffer: EventColumns,
    current: Option<SeriesCursor>,
    series_count: usize,
    rows_emitted: usize,
    next_index: usize,
    input_done: bool,
    done: bool,
}

impl<R: BufRead> BatchIterator<R> {
    /// Extract from an already opened reader without the duplicate check.
    ///
    /// `chunk_size` must be at least 1; use [`extract`] for a checked start.
    pub fn new(reader: R, chunk_size: usize, origin: impl Into<String>) -> Self {
        Self {
            pruner: Pruner::new(reader, &[tags::TIME_ZONE, tags::SERIES]),
            origin: origin.into(),
            chunk_size: chunk_size.max(1),
            timezone: TimezoneOffset::NAIVE,
            live: Vec::new(),
            buffer: EventColumns::new(),
            current: None,
            series_count: 0,
            rows_emitted: 0,
            next_index: 0,
            input_done: false,
            done: false,
        }
    }

    /// Document offset.
    ///
    /// Final from the start when created by [`extract`]; an iterator built
    /// with [`BatchIterator::new`] learns it when the `timeZone` element is read.
    pub fn timezone(&self) -> TimezoneOffset {
        self.timezone
    }

    /// Series read so far
    pub fn series_count(&self) -> usize {
        self.series_count
    }

    /// Event rows handed out so far
    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    fn next_batch(&mut self) -> Result<Option<Batch>, PiXmlError> {
        loop {
            if let Some(cursor) = self.current.as_mut() {
                match cursor.events.next() {
                    Some(event) => {
                        let row = parse_event(&event, &cursor.header)?;
                        let key = Arc::clone(&cursor.key);
                        if self.buffer.len() >= self.chunk_size {
                            let batch = self.flush();
                            self.push_row(key, row);
                            return Ok(Some(batch));
                        }
                        self.push_row(key, row);
                    }
                    None => self.close_current(),
                }
                continue;
            }

            if self.input_done {
                return Ok(None);
            }

            match self.pruner.next_node()? {
                Some(node) => match node.element.name.as_str() {
                    tags::TIME_ZONE => self.on_timezone(&node.element, node.depth)?,
                    tags::SERIES => self.on_series(node.element)?,
                    _ => {}
                },
                None => {
                    self.input_done = true;
                    let last = if self.buffer.is_empty() && self.live.is_empty() {
                        None
                    } else {
                        Some(self.flush())
                    };
                    info!(
                        "{}: {} series, {} events in {} batches",
                        self.origin, self.series_count, self.rows_emitted, self.next_index
                    );
                    return Ok(last);
                }
            }
        }
    }

    fn on_timezone(&mut self, element: &Element, depth: usize) -> Result<(), PiXmlError> {
        if depth != 1 || self.series_count > 0 {
            warn!(
                "{}: ignoring timeZone element that is not the first child of the root",
                self.origin
            );
            return Ok(());
        }
        self.timezone = parse_timezone(&element.text)?;
        debug!("{}: document timezone {}", self.origin, self.timezone);
        Ok(())
    }

    fn on_series(&mut self, element: Element) -> Result<(), PiXmlError> {
        self.series_count += 1;
        let position = format!("#{}", self.series_count);
        let header = Arc::new(parse_series_header(&element, &position)?);
        let key = Arc::new(header.key());

        let events: Vec<Element> = element
            .children
            .into_iter()
            .filter(|c| c.name == tags::EVENT)
            .collect();
        debug!("series {} ({}): {} events", position, key, events.len());

        self.live.push(LiveSeries {
            header: Arc::clone(&header),
            buffered: 0,
            open: true,
        });
        self.current = Some(SeriesCursor {
            header,
            key,
            events: events.into_iter(),
        });
        Ok(())
    }

    fn push_row(&mut self, key: Arc<SeriesKey>, row: EventRow) {
        self.buffer.push(key, row);
        if let Some(live) = self.live.last_mut() {
            live.buffered += 1;
        }
    }

    fn close_current(&mut self) {
        self.current = None;
        if let Some(live) = self.live.last_mut() {
            live.open = false;
        }
    }

    /// Cut the buffered rows into a batch and update the carry-over set
    fn flush(&mut self) -> Batch {
        let data = self.buffer.split_front(self.chunk_size);

        // An open series without buffered rows has nothing in this batch yet.
        let metadata: Vec<Arc<SeriesHeader>> = self
            .live
            .iter()
            .filter(|s| s.buffered > 0 || !s.open)
            .map(|s| Arc::clone(&s.header))
            .collect();

        self.live.retain(|s| s.open);
        for series in &mut self.live {
            series.buffered = 0;
        }

        let batch = Batch {
            index: self.next_index,
            metadata,
            data,
            timezone: self.timezone,
        };
        self.next_index += 1;
        self.rows_emitted += batch.len();
        debug!(
            "batch {}: {} rows, {} series",
            batch.index,
            batch.len(),
            batch.metadata.len()
        );
        batch
    }
}

impl<R: BufRead> Iterator for BatchIterator<R> {
    type Item = Result<Batch, PiXmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_batch() {
            Ok(Some(batch)) => Some(Ok(batch)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                self.current = None;
                self.live.clear();
                self.buffer = EventColumns::new();
                Some(Err(e))
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for BatchIterator<R> {}

use std::io::BufRead;

use log::warn;

use super::parse::{parse_event, parse_series_header, parse_timezone};
use super::pruner::Pruner;
use super::source::XmlSource;
use super::validate::validate;
use super::{tags, PiXmlError};
use crate::model::{EventRow, SeriesHeader, TimezoneOffset};

/// One complete series: its header and every event, in document order
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Series metadata
    pub header: SeriesHeader,
    /// Events; empty for a series without observations
    pub events: Vec<EventRow>,
    /// Document offset of the event timestamps
    pub timezone: TimezoneOffset,
}

impl Series {
    /// Number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True for a series without events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Reads a document one whole series at a time.
///
/// Suited to documents with many small series; a single huge series is
/// better served by [`BulkReader`](super::BulkReader), which never holds
/// more than one chunk of parsed rows.
#[derive(Debug, Clone)]
pub struct SeriesReader<S> {
    source: S,
}

impl<S: XmlSource> SeriesReader<S> {
    /// Reader over `source`
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Validate the source, then iterate over its series
    pub fn series(&self) -> Result<SeriesIterator<S::Reader>, PiXmlError> {
        validate(&self.source)?;
        Ok(SeriesIterator::new(self.source.open()?))
    }
}

/// Iterator returned by [`SeriesReader::series`]
pub struct SeriesIterator<R: BufRead> {
    pruner: Pruner<R>,
    timezone: TimezoneOffset,
    position: usize,
    done: bool,
}

impl<R: BufRead> SeriesIterator<R> {
    /// Iterate over the series of an opened reader without the duplicate check
    pub fn new(reader: R) -> Self {
        Self {
            pruner: Pruner::new(reader, &[tags::TIME_ZONE, tags::SERIES]),
            timezone: TimezoneOffset::NAIVE,
            position: 0,
            done: false,
        }
    }

    fn next_series(&mut self) -> Result<Option<Series>, PiXmlError> {
        while let Some(node) = self.pruner.next_node()? {
            let element = node.element;
            if element.name == tags::TIME_ZONE {
                if node.depth == 1 && self.position == 0 {
                    self.timezone = parse_timezone(&element.text)?;
                } else {
                    warn!("ignoring misplaced timeZone element");
                }
                continue;
            }

            self.position += 1;
            let header = parse_series_header(&element, &format!("#{}", self.position))?;
            let events = element
                .children_named(tags::EVENT)
                .map(|event| parse_event(event, &header))
                .collect::<Result<Vec<_>, _>>()?;

            return Ok(Some(Series {
                header,
                events,
                timezone: self.timezone,
            }));
        }
        Ok(None)
    }
}

impl<R: BufRead> Iterator for SeriesIterator<R> {
    type Item = Result<Series, PiXmlError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_series() {
            Ok(Some(series)) => Some(Ok(series)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

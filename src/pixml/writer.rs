//! Streaming PI-XML serializer.
//!
//! The document prolog (declaration, root element and the optional
//! `timeZone`) is written when the writer is created, each series as soon as
//! it is handed over, and the root is closed by [`PiXmlWriter::finish`].
//! Only the series currently being written is held in memory.

use std::io::Write;
use std::sync::Arc;

use chrono::NaiveDateTime;
use log::debug;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};

use super::series::Series;
use super::{tags, PiXmlError, PI_NAMESPACE, PI_SCHEMA_LOCATION, PI_VERSION, XSI_NAMESPACE};
use crate::model::{Batch, EventRow, SeriesHeader, TimezoneOffset};

/// Series type written when the header does not carry one
const DEFAULT_SERIES_TYPE: &str = "instantaneous";

/// Configuration for [`PiXmlWriter`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PiXmlWriterConfig {
    /// Indent nested elements by two spaces
    pub pretty: bool,
    /// `version` attribute of the root element
    pub version: String,
    /// Offset written as `timeZone`; event times are converted into it
    #[serde(skip)]
    pub timezone: TimezoneOffset,
}

impl Default for PiXmlWriterConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            version: PI_VERSION.to_string(),
            timezone: TimezoneOffset::NAIVE,
        }
    }
}

impl PiXmlWriterConfig {
    /// Unindented output
    pub fn compact() -> Self {
        Self {
            pretty: false,
            ..Default::default()
        }
    }

    /// Set the document offset
    pub fn with_timezone(mut self, timezone: TimezoneOffset) -> Self {
        self.timezone = timezone;
        self
    }
}

/// Statistics returned by [`PiXmlWriter::finish`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PiXmlWriterStats {
    /// Number of `series` elements written
    pub series_written: usize,
    /// Number of `event` elements written
    pub events_written: usize,
    /// Events written with the missing value literal
    pub missing_values: usize,
}

impl std::fmt::Display for PiXmlWriterStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} series, {} events ({} missing)",
            self.series_written, self.events_written, self.missing_values
        )
    }
}

/// Writes PI-XML time series documents
pub struct PiXmlWriter<W: Write> {
    writer: Writer<W>,
    timezone: TimezoneOffset,
    stats: PiXmlWriterStats,
}

impl<W: Write> PiXmlWriter<W> {
    /// Start a document: writes the prolog and the `timeZone` element
    pub fn new(inner: W, config: &PiXmlWriterConfig) -> Result<Self, PiXmlError> {
        let writer = if config.pretty {
            Writer::new_with_indent(inner, b' ', 2)
        } else {
            Writer::new(inner)
        };

        let mut pi = Self {
            writer,
            timezone: config.timezone,
            stats: PiXmlWriterStats::default(),
        };

        pi.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let schema_location = format!("{} {}", PI_NAMESPACE, PI_SCHEMA_LOCATION);
        let mut root = BytesStart::new(tags::TIME_SERIES);
        root.push_attribute(("xmlns", PI_NAMESPACE));
        root.push_attribute(("xmlns:xsi", XSI_NAMESPACE));
        root.push_attribute(("xsi:schemaLocation", schema_location.as_str()));
        root.push_attribute(("version", config.version.as_str()));
        pi.writer.write_event(Event::Start(root))?;

        if let Some(hours) = config.timezone.to_pi_hours() {
            pi.text_element(tags::TIME_ZONE, &hours)?;
        }

        Ok(pi)
    }

    /// Offset the document declares
    pub fn timezone(&self) -> TimezoneOffset {
        self.timezone
    }

    /// Statistics so far
    pub fn stats(&self) -> &PiXmlWriterStats {
        &self.stats
    }

    /// Write one series.
    ///
    /// `rows_timezone` is the offset of the row timestamps; they are moved
    /// into the document offset when both are known and written unchanged
    /// otherwise. The header is checked before anything is written.
    pub fn write_series(
        &mut self,
        header: &SeriesHeader,
        rows: &[EventRow],
        rows_timezone: TimezoneOffset,
    ) -> Result<(), PiXmlError> {
        header
            .validate()
            .map_err(|reason| PiXmlError::MalformedHeader {
                series: header.key().to_string(),
                reason,
            })?;

        let target = self.timezone;
        let local = |ts: NaiveDateTime| rows_timezone.convert(ts, target);
        let span = rows
            .first()
            .zip(rows.last())
            .map(|(first, last)| (local(first.timestamp), local(last.timestamp)));

        self.writer
            .write_event(Event::Start(BytesStart::new(tags::SERIES)))?;
        self.write_header(header, span)?;

        for row in rows {
            self.event_element(header, row, local(row.timestamp))?;
        }

        if let Some(comment) = &header.comment {
            self.text_element(tags::COMMENT, comment)?;
        }
        self.writer
            .write_event(Event::End(BytesEnd::new(tags::SERIES)))?;

        self.stats.series_written += 1;
        debug!("wrote series {} with {} events", header.key(), rows.len());
        Ok(())
    }

    /// Write a complete [`Series`]
    pub fn write(&mut self, series: &Series) -> Result<(), PiXmlError> {
        self.write_series(&series.header, &series.events, series.timezone)
    }

    /// Write the series carried by a sequence of batches.
    ///
    /// Rows of a series that straddles batch boundaries are joined again,
    /// and series without events are written from their metadata entry.
    /// Accepts a [`BatchIterator`](super::BatchIterator) directly; the first
    /// error it yields stops the write.
    pub fn write_batches<I>(&mut self, batches: I) -> Result<(), PiXmlError>
    where
        I: IntoIterator<Item = Result<Batch, PiXmlError>>,
    {
        let mut pending: Option<(Arc<SeriesHeader>, Vec<EventRow>, TimezoneOffset)> = None;

        for batch in batches {
            let batch = batch?;
            let mut cursor = 0;
            for header in &batch.metadata {
                let continues = pending
                    .as_ref()
                    .map_or(false, |(h, _, _)| h.key() == header.key());
                if !continues {
                    if let Some((h, rows, tz)) = pending.take() {
                        self.write_series(&h, &rows, tz)?;
                    }
                    pending = Some((Arc::clone(header), Vec::new(), batch.timezone));
                }

                let key = header.key();
                if let Some((_, rows, _)) = pending.as_mut() {
                    while cursor < batch.len() && *batch.data.key[cursor] == key {
                        if let Some(row) = batch.data.row(cursor) {
                            rows.push(row);
                        }
                        cursor += 1;
                    }
                }
            }

            if cursor != batch.len() {
                return Err(PiXmlError::InvalidStructure(format!(
                    "batch {} has {} rows without a matching metadata entry",
                    batch.index,
                    batch.len() - cursor
                )));
            }
        }

        if let Some((h, rows, tz)) = pending.take() {
            self.write_series(&h, &rows, tz)?;
        }
        Ok(())
    }

    /// Close the document and return the inner writer
    pub fn finish(mut self) -> Result<(W, PiXmlWriterStats), PiXmlError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(tags::TIME_SERIES)))?;
        let mut inner = self.writer.into_inner();
        inner.flush()?;
        Ok((inner, self.stats))
    }

    fn write_header(
        &mut self,
        header: &SeriesHeader,
        span: Option<(NaiveDateTime, NaiveDateTime)>,
    ) -> Result<(), PiXmlError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(tags::HEADER)))?;

        let series_type = header.series_type.as_deref().unwrap_or(DEFAULT_SERIES_TYPE);
        self.text_element(tags::TYPE, series_type)?;
        if let Some(module) = &header.module_instance_id {
            self.text_element(tags::MODULE_INSTANCE_ID, module)?;
        }
        self.text_element(tags::LOCATION_ID, &header.location_code)?;
        self.text_element(tags::PARAMETER_ID, &header.identity.parameter_id)?;

        let divider = header.identity.divider.to_string();
        let multiplier = header.identity.multiplier.to_string();
        let mut step = BytesStart::new(tags::TIME_STEP);
        step.push_attribute((tags::ATTR_UNIT, header.identity.timestep_unit.as_str()));
        if header.identity.divider != 1 {
            step.push_attribute((tags::ATTR_DIVIDER, divider.as_str()));
        }
        if header.identity.multiplier != 1 {
            step.push_attribute((tags::ATTR_MULTIPLIER, multiplier.as_str()));
        }
        self.writer.write_event(Event::Empty(step))?;

        if let Some((start, end)) = span {
            self.date_element(tags::START_DATE, start)?;
            self.date_element(tags::END_DATE, end)?;
        }

        self.text_element(tags::MISS_VAL, &header.missing_value)?;
        if let Some(long_name) = &header.long_name {
            self.text_element(tags::LONG_NAME, long_name)?;
        }
        if !header.location_name.is_empty() {
            self.text_element(tags::STATION_NAME, &header.location_name)?;
        }
        if !header.lat.is_nan() {
            self.text_element(tags::LAT, &header.lat.to_string())?;
        }
        if !header.lon.is_nan() {
            self.text_element(tags::LON, &header.lon.to_string())?;
        }
        if let Some(unit) = &header.unit {
            self.text_element(tags::UNITS, unit)?;
        }

        self.writer
            .write_event(Event::End(BytesEnd::new(tags::HEADER)))?;
        Ok(())
    }

    fn event_element(
        &mut self,
        header: &SeriesHeader,
        row: &EventRow,
        timestamp: NaiveDateTime,
    ) -> Result<(), PiXmlError> {
        let date = timestamp.format("%Y-%m-%d").to_string();
        let time = timestamp.format("%H:%M:%S").to_string();
        let value = if row.value.is_nan() {
            self.stats.missing_values += 1;
            header.missing_value.clone()
        } else {
            value_text(row.value, &header.missing_value)
        };
        let flag = row.flag.map(|f| f.to_string());

        let mut event = BytesStart::new(tags::EVENT);
        event.push_attribute((tags::ATTR_DATE, date.as_str()));
        event.push_attribute((tags::ATTR_TIME, time.as_str()));
        event.push_attribute((tags::ATTR_VALUE, value.as_str()));
        if let Some(flag) = &flag {
            event.push_attribute((tags::ATTR_FLAG, flag.as_str()));
        }
        if let Some(flag_source) = &row.flag_source {
            event.push_attribute((tags::ATTR_FLAG_SOURCE, flag_source.as_str()));
        }
        if let Some(comment) = &row.comment {
            event.push_attribute((tags::ATTR_COMMENT, comment.as_str()));
        }
        if let Some(user) = &row.user {
            event.push_attribute((tags::ATTR_USER, user.as_str()));
        }
        self.writer.write_event(Event::Empty(event))?;

        self.stats.events_written += 1;
        Ok(())
    }

    fn date_element(&mut self, name: &str, timestamp: NaiveDateTime) -> Result<(), PiXmlError> {
        let date = timestamp.format("%Y-%m-%d").to_string();
        let time = timestamp.format("%H:%M:%S").to_string();
        let mut element = BytesStart::new(name);
        element.push_attribute((tags::ATTR_DATE, date.as_str()));
        element.push_attribute((tags::ATTR_TIME, time.as_str()));
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), PiXmlError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

/// Text of a present value, never spelled like the series sentinel.
///
/// Readers compare `value` to `missVal` as text, so a real `-999` under a
/// `-999` sentinel is written as `-999.0`.
fn value_text(value: f64, missing_value: &str) -> String {
    let plain = value.to_string();
    if plain != missing_value {
        return plain;
    }
    let debug = format!("{:?}", value);
    if debug != missing_value {
        return debug;
    }
    format!("{:e}", value)
}

/// Serialize whole series into a PI-XML string
pub fn to_string<'a, I>(series: I, config: &PiXmlWriterConfig) -> Result<String, PiXmlError>
where
    I: IntoIterator<Item = &'a Series>,
{
    let mut writer = PiXmlWriter::new(Vec::new(), config)?;
    for s in series {
        writer.write(s)?;
    }
    let (bytes, _) = writer.finish()?;
    String::from_utf8(bytes).map_err(|e| PiXmlError::Utf8Error(e.utf8_error()))
}

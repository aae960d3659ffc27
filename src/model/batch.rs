use std::sync::Arc;

use arrow::array::{
    ArrayRef, Float64Builder, Int32Builder, StringBuilder, TimestampMillisecondBuilder,
};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, FixedOffset, NaiveDateTime};

use super::event::EventRow;
use super::header::SeriesHeader;
use super::identity::SeriesKey;
use super::timezone::TimezoneOffset;
use crate::schema::{create_event_schema, create_series_schema};

/// Growable columnar buffer of event rows.
///
/// Every row is tagged with the key of the series it belongs to. Rows of one
/// series are contiguous.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventColumns {
    /// Series key per row
    pub key: Vec<Arc<SeriesKey>>,
    /// Wall-clock timestamp per row
    pub timestamp: Vec<NaiveDateTime>,
    /// Value per row (NaN when missing)
    pub value: Vec<f64>,
    /// Flag per row
    pub flag: Vec<Option<i32>>,
    /// Flag source per row
    pub flag_source: Vec<Option<String>>,
    /// Comment per row
    pub comment: Vec<Option<String>>,
    /// User per row
    pub user: Vec<Option<String>>,
}

impl EventColumns {
    /// Empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with room for `capacity` rows
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            key: Vec::with_capacity(capacity),
            timestamp: Vec::with_capacity(capacity),
            value: Vec::with_capacity(capacity),
            flag: Vec::with_capacity(capacity),
            flag_source: Vec::with_capacity(capacity),
            comment: Vec::with_capacity(capacity),
            user: Vec::with_capacity(capacity),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.timestamp.len()
    }

    /// True when there are no rows
    pub fn is_empty(&self) -> bool {
        self.timestamp.is_empty()
    }

    /// Append one row
    pub fn push(&mut self, key: Arc<SeriesKey>, row: EventRow) {
        self.key.push(key);
        self.timestamp.push(row.timestamp);
        self.value.push(row.value);
        self.flag.push(row.flag);
        self.flag_source.push(row.flag_source);
        self.comment.push(row.comment);
        self.user.push(row.user);
    }

    /// Remove the oldest `n` rows and return them as a new buffer.
    ///
    /// Rows beyond `n` stay in `self`.
    pub fn split_front(&mut self, n: usize) -> EventColumns {
        let n = n.min(self.len());
        EventColumns {
            key: self.key.drain(..n).collect(),
            timestamp: self.timestamp.drain(..n).collect(),
            value: self.value.drain(..n).collect(),
            flag: self.flag.drain(..n).collect(),
            flag_source: self.flag_source.drain(..n).collect(),
            comment: self.comment.drain(..n).collect(),
            user: self.user.drain(..n).collect(),
        }
    }

    /// Copy out row `i`
    pub fn row(&self, i: usize) -> Option<EventRow> {
        if i >= self.len() {
            return None;
        }
        Some(EventRow {
            timestamp: self.timestamp[i],
            value: self.value[i],
            flag: self.flag[i],
            flag_source: self.flag_source[i].clone(),
            comment: self.comment[i].clone(),
            user: self.user[i].clone(),
        })
    }

    /// Iterate over `(key, row)` pairs
    pub fn rows(&self) -> impl Iterator<Item = (&Arc<SeriesKey>, EventRow)> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i).map(|row| (&self.key[i], row)))
    }

    /// Rows belonging to `key`, in order
    pub fn rows_for(&self, key: &SeriesKey) -> Vec<EventRow> {
        self.rows()
            .filter(|(k, _)| k.as_ref() == key)
            .map(|(_, row)| row)
            .collect()
    }
}

/// One chunk of extracted events.
///
/// `metadata` lists, in first-seen order, the headers of the series that
/// contributed rows to this batch (including a series carried over from the
/// previous batch) and of series without any events that were seen since
/// the previous batch.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Zero-based position of this batch in the extraction
    pub index: usize,
    /// Series headers in first-seen order
    pub metadata: Vec<Arc<SeriesHeader>>,
    /// Event rows
    pub data: EventColumns,
    /// Fixed offset of every timestamp in `data`
    pub timezone: TimezoneOffset,
}

impl Batch {
    /// Number of event rows
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the batch only carries metadata
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Header of `key`, if it is part of this batch
    pub fn header(&self, key: &SeriesKey) -> Option<&Arc<SeriesHeader>> {
        self.metadata
            .iter()
            .find(|h| h.identity == key.identity && h.location_code == key.location_code)
    }

    /// Timestamps with the document offset attached; `None` when naive
    pub fn localized_timestamps(&self) -> Option<Vec<DateTime<FixedOffset>>> {
        if self.timezone.is_naive() {
            return None;
        }
        self.data
            .timestamp
            .iter()
            .map(|ts| self.timezone.localize(*ts))
            .collect()
    }

    /// Convert the event rows into an Arrow record batch.
    ///
    /// With a known offset the timestamp column holds UTC epoch milliseconds
    /// and carries the offset as its timezone; otherwise it holds the
    /// wall-clock time without timezone.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let rows = self.len();
        let schema = Arc::new(create_event_schema(self.timezone));

        let mut code_builder = StringBuilder::with_capacity(rows, rows * 16);
        let mut location_builder = StringBuilder::with_capacity(rows, rows * 8);
        let mut timestamp_builder = TimestampMillisecondBuilder::with_capacity(rows)
            .with_timezone_opt(self.timezone.to_arrow_timezone());
        let mut value_builder = Float64Builder::with_capacity(rows);
        let mut flag_builder = Int32Builder::with_capacity(rows);
        let mut flag_source_builder = StringBuilder::new();
        let mut comment_builder = StringBuilder::new();
        let mut user_builder = StringBuilder::new();

        // Codes repeat for long runs; format each distinct key once.
        let mut last: Option<(&Arc<SeriesKey>, String)> = None;
        for i in 0..rows {
            let key = &self.data.key[i];
            let code = match &last {
                Some((k, code)) if Arc::ptr_eq(k, key) => code.clone(),
                _ => key.code(),
            };
            code_builder.append_value(&code);
            location_builder.append_value(&key.location_code);
            last = Some((key, code));

            let ts = self.data.timestamp[i];
            let instant = self.timezone.to_utc(ts).unwrap_or(ts);
            timestamp_builder.append_value(instant.and_utc().timestamp_millis());
            value_builder.append_value(self.data.value[i]);
            flag_builder.append_option(self.data.flag[i]);
            flag_source_builder.append_option(self.data.flag_source[i].as_deref());
            comment_builder.append_option(self.data.comment[i].as_deref());
            user_builder.append_option(self.data.user[i].as_deref());
        }

        let arrays: Vec<ArrayRef> = vec![
            Arc::new(code_builder.finish()),
            Arc::new(location_builder.finish()),
            Arc::new(timestamp_builder.finish()),
            Arc::new(value_builder.finish()),
            Arc::new(flag_builder.finish()),
            Arc::new(flag_source_builder.finish()),
            Arc::new(comment_builder.finish()),
            Arc::new(user_builder.finish()),
        ];

        RecordBatch::try_new(schema, arrays)
    }

    /// Convert the metadata list into an Arrow record batch, one row per header
    pub fn metadata_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let n = self.metadata.len();
        let mut code = StringBuilder::with_capacity(n, n * 16);
        let mut location_code = StringBuilder::with_capacity(n, n * 8);
        let mut parameter_id = StringBuilder::with_capacity(n, n * 8);
        let mut unit = StringBuilder::new();
        let mut name = StringBuilder::new();
        let mut location_name = StringBuilder::new();
        let mut lat = Float64Builder::with_capacity(n);
        let mut lon = Float64Builder::with_capacity(n);
        let mut missing_value = StringBuilder::new();
        let mut comment = StringBuilder::new();

        for header in &self.metadata {
            code.append_value(header.code());
            location_code.append_value(&header.location_code);
            parameter_id.append_value(&header.identity.parameter_id);
            unit.append_option(header.unit.as_deref());
            name.append_value(header.name());
            location_name.append_value(&header.location_name);
            lat.append_value(header.lat);
            lon.append_value(header.lon);
            missing_value.append_value(&header.missing_value);
            comment.append_option(header.comment.as_deref());
        }

        let arrays: Vec<ArrayRef> = vec![
            Arc::new(code.finish()),
            Arc::new(location_code.finish()),
            Arc::new(parameter_id.finish()),
            Arc::new(unit.finish()),
            Arc::new(name.finish()),
            Arc::new(location_name.finish()),
            Arc::new(lat.finish()),
            Arc::new(lon.finish()),
            Arc::new(missing_value.finish()),
            Arc::new(comment.finish()),
        ];

        RecordBatch::try_new(Arc::new(create_series_schema()), arrays)
    }
}

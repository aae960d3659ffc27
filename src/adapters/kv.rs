//! Key-value store adapter.
//!
//! Each series is stored as one row per time bucket (row key
//! `"{sensor}:{bucket}"`) holding one cell per event column, named
//! `"{YYYY-MM-DDTHH:MM:SS}:{column}"`. Cell names sort by timestamp, so a
//! time range maps onto a contiguous column range of each bucket row.

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{Batch, SeriesKey};

/// Format of the timestamp part of a cell name
pub const COLUMN_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Length of a formatted cell timestamp
const COLUMN_TIMESTAMP_LEN: usize = 19;

/// Cell column holding the event value
pub const VALUE_COLUMN: &str = "value";
/// Cell column holding the event flag
pub const FLAG_COLUMN: &str = "flag";
/// Cell column holding the flag source
pub const FLAG_SOURCE_COLUMN: &str = "flag_source";
/// Cell column holding the event comment
pub const COMMENT_COLUMN: &str = "comment";
/// Cell column holding the event user
pub const USER_COLUMN: &str = "user";

/// Errors of the key-value adapter
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// The backing store failed
    #[error("Store error: {0}")]
    Store(String),

    /// A cell name does not follow `"{timestamp}:{column}"`
    #[error("Malformed cell name '{0}'")]
    MalformedColumn(String),

    /// A bucket boundary falls outside the representable range
    #[error("Timestamp out of range: {0}")]
    OutOfRange(NaiveDateTime),
}

/// How much time one store row covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketSize {
    /// One row per hour
    Hourly,
    /// One row per day
    Daily,
    /// One row per calendar month
    #[default]
    Monthly,
    /// One row per calendar year
    Yearly,
}

impl BucketSize {
    /// `strftime` format of the bucket part of a row key
    pub fn key_format(&self) -> &'static str {
        match self {
            BucketSize::Hourly => "%Y-%m-%dT%H",
            BucketSize::Daily => "%Y-%m-%d",
            BucketSize::Monthly => "%Y-%m",
            BucketSize::Yearly => "%Y",
        }
    }

    /// First instant of the bucket containing `timestamp`
    pub fn bucket_start(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let date = timestamp.date();
        let start = match self {
            BucketSize::Hourly => date.and_hms_opt(timestamp.hour(), 0, 0),
            BucketSize::Daily => date.and_hms_opt(0, 0, 0),
            BucketSize::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
            BucketSize::Yearly => {
                NaiveDate::from_ymd_opt(date.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
            }
        };
        start.unwrap_or(timestamp)
    }

    /// Start of the bucket following the one starting at `start`
    pub fn next_bucket(&self, start: NaiveDateTime) -> Result<NaiveDateTime, KvError> {
        let next = match self {
            BucketSize::Hourly => start.checked_add_signed(TimeDelta::hours(1)),
            BucketSize::Daily => start.checked_add_signed(TimeDelta::days(1)),
            BucketSize::Monthly => start.checked_add_months(Months::new(1)),
            BucketSize::Yearly => start.checked_add_months(Months::new(12)),
        };
        next.ok_or(KvError::OutOfRange(start))
    }

    /// Row key of the bucket of `timestamp` for `sensor_id`
    pub fn row_key(&self, sensor_id: &str, timestamp: NaiveDateTime) -> String {
        format!("{}:{}", sensor_id, timestamp.format(self.key_format()))
    }
}

/// Minimal wide-row store interface
pub trait KeyValueStore {
    /// Insert (or overwrite) cells of a row
    fn insert_row(&mut self, row_key: &str, cells: Vec<(String, String)>) -> Result<(), KvError>;

    /// Cells of a row whose names lie in `column_start..=column_end`;
    /// `None` when the row does not exist
    fn get_row(
        &self,
        row_key: &str,
        column_start: &str,
        column_end: &str,
    ) -> Result<Option<BTreeMap<String, String>>, KvError>;
}

/// In-memory [`KeyValueStore`] with sorted rows and cells
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    rows: BTreeMap<String, BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Row keys in sorted order
    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn insert_row(&mut self, row_key: &str, cells: Vec<(String, String)>) -> Result<(), KvError> {
        self.rows
            .entry(row_key.to_string())
            .or_default()
            .extend(cells);
        Ok(())
    }

    fn get_row(
        &self,
        row_key: &str,
        column_start: &str,
        column_end: &str,
    ) -> Result<Option<BTreeMap<String, String>>, KvError> {
        Ok(self.rows.get(row_key).map(|row| {
            row.iter()
                .filter(|(name, _)| name.as_str() >= column_start && name.as_str() <= column_end)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }))
    }
}

/// Default sensor id of a series: `"{location}/{series code}"`
pub fn sensor_id(key: &SeriesKey) -> String {
    format!("{}/{}", key.location_code, key.code())
}

/// Writes batches into a [`KeyValueStore`]
pub struct KvWriter<'a, S: KeyValueStore> {
    store: &'a mut S,
    bucket: BucketSize,
    sensor_id: fn(&SeriesKey) -> String,
    cells_written: usize,
}

impl<'a, S: KeyValueStore> KvWriter<'a, S> {
    /// Writer with the given bucket size and the default sensor ids
    pub fn new(store: &'a mut S, bucket: BucketSize) -> Self {
        Self {
            store,
            bucket,
            sensor_id,
            cells_written: 0,
        }
    }

    /// Use a custom mapping from series to sensor id
    pub fn with_sensor_id(mut self, sensor_id: fn(&SeriesKey) -> String) -> Self {
        self.sensor_id = sensor_id;
        self
    }

    /// Cells written so far
    pub fn cells_written(&self) -> usize {
        self.cells_written
    }

    /// Write every row of a batch.
    ///
    /// Timestamps are stored in UTC when the batch offset is known and as
    /// wall-clock time otherwise. Cells of one bucket row are sent to the
    /// store in a single insert.
    pub fn write_batch(&mut self, batch: &Batch) -> Result<(), KvError> {
        let mut rows: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();

        for (key, row) in batch.data.rows() {
            let timestamp = batch.timezone.to_utc(row.timestamp).unwrap_or(row.timestamp);
            let row_key = self.bucket.row_key(&(self.sensor_id)(key), timestamp);
            let stamp = timestamp.format(COLUMN_TIMESTAMP_FORMAT).to_string();
            let cells = rows.entry(row_key).or_default();

            let mut cell = |column: &str, value: String| {
                cells.push((format!("{}:{}", stamp, column), value));
            };
            cell(VALUE_COLUMN, row.value.to_string());
            if let Some(flag) = row.flag {
                cell(FLAG_COLUMN, flag.to_string());
            }
            if let Some(flag_source) = row.flag_source {
                cell(FLAG_SOURCE_COLUMN, flag_source);
            }
            if let Some(comment) = row.comment {
                cell(COMMENT_COLUMN, comment);
            }
            if let Some(user) = row.user {
                cell(USER_COLUMN, user);
            }
        }

        for (row_key, cells) in rows {
            self.cells_written += cells.len();
            self.store.insert_row(&row_key, cells)?;
        }
        debug!("batch {}: {} cells written", batch.index, self.cells_written);
        Ok(())
    }
}

/// Rows read back from a store, in ascending timestamp order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KvFrame {
    /// Timestamp of every row
    pub index: Vec<NaiveDateTime>,
    /// Columns in first-seen order; `None` where a row has no cell
    pub columns: Vec<(String, Vec<Option<String>>)>,
}

impl KvFrame {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True when no rows were found
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Values of column `name`
    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }
}

/// Reads time ranges back from a [`KeyValueStore`]
pub struct KvReader<'a, S: KeyValueStore> {
    store: &'a S,
    bucket: BucketSize,
}

impl<'a, S: KeyValueStore> KvReader<'a, S> {
    /// Reader using the bucket size the data was written with
    pub fn new(store: &'a S, bucket: BucketSize) -> Self {
        Self { store, bucket }
    }

    /// Read the cells of `sensor_id` in `[start, end)`.
    ///
    /// With an empty `columns` list every column is returned.
    pub fn read(
        &self,
        sensor_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
        columns: &[&str],
    ) -> Result<KvFrame, KvError> {
        let column_start = start.format(COLUMN_TIMESTAMP_FORMAT).to_string();
        let column_end = end.format(COLUMN_TIMESTAMP_FORMAT).to_string();

        let mut rows: BTreeMap<NaiveDateTime, BTreeMap<String, String>> = BTreeMap::new();
        let mut names: Vec<String> = Vec::new();

        let mut stamp = self.bucket.bucket_start(start);
        while stamp < end {
            let row_key = self.bucket.row_key(sensor_id, stamp);
            let cells = self
                .store
                .get_row(&row_key, &column_start, &column_end)?
                .unwrap_or_default();

            for (name, value) in cells {
                let (timestamp, column) = split_column(&name)?;
                if timestamp < start || timestamp >= end {
                    continue;
                }
                if !columns.is_empty() && !columns.contains(&column) {
                    continue;
                }
                if !names.iter().any(|n| n == column) {
                    names.push(column.to_string());
                }
                rows.entry(timestamp)
                    .or_default()
                    .insert(column.to_string(), value);
            }
            stamp = self.bucket.next_bucket(stamp)?;
        }

        let index: Vec<NaiveDateTime> = rows.keys().copied().collect();
        let columns = names
            .into_iter()
            .map(|name| {
                let values = rows.values().map(|cells| cells.get(&name).cloned()).collect();
                (name, values)
            })
            .collect();

        Ok(KvFrame { index, columns })
    }
}

/// Split a cell name into its timestamp and column parts
pub(crate) fn split_column(name: &str) -> Result<(NaiveDateTime, &str), KvError> {
    let malformed = || KvError::MalformedColumn(name.to_string());
    if name.len() <= COLUMN_TIMESTAMP_LEN + 1 || !name.is_char_boundary(COLUMN_TIMESTAMP_LEN) {
        return Err(malformed());
    }
    let (stamp, rest) = name.split_at(COLUMN_TIMESTAMP_LEN);
    let column = rest.strip_prefix(':').ok_or_else(malformed)?;
    let timestamp =
        NaiveDateTime::parse_from_str(stamp, COLUMN_TIMESTAMP_FORMAT).map_err(|_| malformed())?;
    Ok((timestamp, column))
}

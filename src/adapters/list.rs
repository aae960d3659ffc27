//! List-of-events adapter.
//!
//! Input is a sequence of `{uuid, events: [{datetime, ...fields}]}` records,
//! typically decoded from JSON. Each record flattens into one columnar
//! [`ListFrame`] whose columns are the union of the field names of its
//! events.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Name of the timestamp field of an event
pub const DATETIME_FIELD: &str = "datetime";

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const DATETIME_FORMAT_FRACTION: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Errors of the list-of-events adapter
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// Input is not valid JSON of the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An event has no `datetime` field
    #[error("Event {index} of series {uuid} has no datetime")]
    MissingDatetime {
        /// Series the event belongs to
        uuid: Uuid,
        /// Position of the event in its series
        index: usize,
    },

    /// A `datetime` is not a UTC ISO-8601 string
    #[error("Invalid datetime '{value}' in series {uuid}")]
    InvalidDatetime {
        /// Series the event belongs to
        uuid: Uuid,
        /// Offending value
        value: String,
    },
}

/// One series as a list of loosely typed events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    /// Series identifier
    pub uuid: Uuid,
    /// Events, each a `datetime` plus arbitrary fields
    #[serde(default)]
    pub events: Vec<Map<String, Value>>,
}

/// Flattened table of one series
#[derive(Debug, Clone, PartialEq)]
pub struct ListFrame {
    /// Series identifier
    pub uuid: Uuid,
    /// Distinct event datetimes in first-seen order
    pub index: Vec<DateTime<Utc>>,
    /// Columns in first-seen order; `None` where an event lacks the field
    pub columns: Vec<(String, Vec<Option<Value>>)>,
}

impl ListFrame {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True for a series without events
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Values of column `name`
    pub fn column(&self, name: &str) -> Option<&[Option<Value>]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }
}

/// Decode a JSON array of event lists
pub fn from_json(json: &str) -> Result<Vec<EventList>, ListError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a UTC datetime, with or without fractional seconds
pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT_FRACTION))
        .ok()
        .map(|dt| dt.and_utc())
}

/// Flatten one event list into a frame.
///
/// Events sharing a datetime are merged into one row, later fields winning.
/// A field that is absent or JSON `null` is `None` in its column.
pub fn flatten(list: &EventList) -> Result<ListFrame, ListError> {
    let mut index: Vec<DateTime<Utc>> = Vec::new();
    let mut positions: HashMap<DateTime<Utc>, usize> = HashMap::new();
    let mut rows: Vec<Map<String, Value>> = Vec::new();
    let mut names: Vec<String> = Vec::new();

    for (i, event) in list.events.iter().enumerate() {
        let raw = event
            .get(DATETIME_FIELD)
            .and_then(Value::as_str)
            .ok_or(ListError::MissingDatetime {
                uuid: list.uuid,
                index: i,
            })?;
        let datetime = parse_datetime(raw).ok_or_else(|| ListError::InvalidDatetime {
            uuid: list.uuid,
            value: raw.to_string(),
        })?;

        let position = *positions.entry(datetime).or_insert_with(|| {
            index.push(datetime);
            rows.push(Map::new());
            rows.len() - 1
        });

        for (name, value) in event {
            if name == DATETIME_FIELD {
                continue;
            }
            if !names.contains(name) {
                names.push(name.clone());
            }
            rows[position].insert(name.clone(), value.clone());
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = rows
                .iter()
                .map(|row| row.get(&name).filter(|v| !v.is_null()).cloned())
                .collect();
            (name, values)
        })
        .collect();

    Ok(ListFrame {
        uuid: list.uuid,
        index,
        columns,
    })
}

/// Flatten every list, one frame per uuid in input order
pub fn flatten_all(lists: &[EventList]) -> impl Iterator<Item = Result<ListFrame, ListError>> + '_ {
    lists.iter().map(flatten)
}

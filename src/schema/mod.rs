//! # Batch Schema Definition
//!
//! Apache Arrow schemas for the two halves of an extracted batch.
//!
//! ## Event Columns
//!
//! | Column | Type | PI-XML source |
//! |--------|------|---------------|
//! | code | Utf8 | `parameterId::timeStep@unit::@divider::@multiplier` |
//! | location_code | Utf8 | header `locationId` |
//! | timestamp | Timestamp(ms, offset?) | event `date` + `time` |
//! | value | Float64 | event `value` (NaN when missing) |
//! | flag | Int32 (nullable) | event `flag` |
//! | flag_source | Utf8 (nullable) | event `flagSource` |
//! | comment | Utf8 (nullable) | event `comment` |
//! | user | Utf8 (nullable) | event `user` |
//!
//! The timestamp column carries the document's fixed offset as its Arrow
//! timezone when one is known. Without a `timeZone` element it is a plain
//! wall-clock timestamp.
//!
//! ## Series Columns
//!
//! One row per series header: code, location_code, parameter_id, unit, name,
//! location_name, lat, lon, miss_val, comment.

mod builders;
/// Column name constants.
pub mod columns;
mod constants;
mod validation;


pub use builders::{create_event_schema, create_series_schema};
pub use columns::*;
pub use constants::*;
pub use validation::{validate_event_schema, SchemaValidationError};

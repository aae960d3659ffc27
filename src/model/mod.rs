//! # Record Model
//!
//! The canonical in-memory representation of PI-XML content:
//!
//! - [`SeriesIdentity`] / [`SeriesKey`]: the composite identity of a series
//!   (parameter, time step, location), unique within a document.
//! - [`SeriesHeader`]: the immutable per-series metadata record.
//! - [`EventRow`]: one time-indexed observation.
//! - [`EventColumns`]: growable columnar buffer of event rows.
//! - [`Batch`]: one emitted chunk of rows plus the headers of the series that
//!   contributed to it.
//! - [`TimezoneOffset`]: the document's optional fixed UTC offset.

mod batch;
mod event;
mod header;
mod identity;
mod timezone;


pub use batch::{Batch, EventColumns};
pub use event::EventRow;
pub use header::{SeriesHeader, DEFAULT_MISSING_VALUE, LOCATION_NAME_MAX_CHARS};
pub(crate) use header::truncate_location_name;
pub use identity::{SeriesIdentity, SeriesKey};
pub use timezone::TimezoneOffset;

//! # PI-XML Module
//!
//! Streaming reading and writing of Delft-FEWS Published Interface (PI)
//! time series documents.
//!
//! ## Design Goals
//!
//! - **Streaming**: Process arbitrarily large documents in bounded memory
//! - **Fail fast**: Reject duplicate series before any data is produced
//! - **Lenient values**: A corrupt observation becomes NaN, never an error
//! - **Chunked output**: Deliver fixed-size batches for bulk loading
//!
//! ## PI-XML Structure
//!
//! ```text
//! TimeSeries (xmlns="http://www.wldelft.nl/fews/PI")
//! ├── timeZone (optional, decimal hours)
//! └── series* (many)
//!     ├── header
//!     │   ├── type, moduleInstanceId, locationId, parameterId
//!     │   ├── timeStep @unit [@divider] [@multiplier]
//!     │   ├── startDate, endDate, missVal, longName
//!     │   └── stationName, lat, lon, units
//!     ├── event* @date @time @value [@flag] [@flagSource] [@comment] [@user]
//!     └── comment (optional)
//! ```
//!
//! ## Passes
//!
//! Reading takes two sequential passes over independent readings of the
//! same [`XmlSource`]: [`validate`] checks series identities for duplicates,
//! then [`BulkReader`] streams the events into [`Batch`](crate::model::Batch)es.

mod error;
mod extract;
mod parse;
mod pruner;
mod series;
mod source;
mod timezone;
mod validate;
mod writer;

#[cfg(test)]
mod tests;

pub use error::PiXmlError;
pub use extract::{extract, BatchIterator, BulkReader, ExtractConfig, DEFAULT_CHUNK_SIZE};
pub use parse::{parse_flag, parse_timestamp, parse_timezone, parse_value};
pub use pruner::{Element, NodeEvent, PrunedNode, Pruner};
pub use series::{Series, SeriesIterator, SeriesReader};
pub use source::{MemorySource, XmlSource, DEFAULT_INPUT_BUFFER_SIZE};
pub use timezone::resolve_timezone;
pub use validate::{validate, ValidationSummary};
pub use writer::{to_string, PiXmlWriter, PiXmlWriterConfig, PiXmlWriterStats};

/// PI namespace, used as the default namespace of written documents
pub const PI_NAMESPACE: &str = "http://www.wldelft.nl/fews/PI";

/// XML Schema instance namespace
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Location of the PI time series schema
pub const PI_SCHEMA_LOCATION: &str =
    "http://fews.wldelft.nl/schemas/version1.0/pi-schemas/pi_timeseries.xsd";

/// Default `version` attribute of written documents
pub const PI_VERSION: &str = "1.2";

/// Element and attribute local names
pub mod tags {
    /// Document root
    pub const TIME_SERIES: &str = "TimeSeries";
    /// Document-level fixed offset
    pub const TIME_ZONE: &str = "timeZone";
    /// One series
    pub const SERIES: &str = "series";
    /// Series header
    pub const HEADER: &str = "header";
    /// One observation
    pub const EVENT: &str = "event";
    /// Trailing series comment
    pub const COMMENT: &str = "comment";

    /// Header: series type
    pub const TYPE: &str = "type";
    /// Header: module instance
    pub const MODULE_INSTANCE_ID: &str = "moduleInstanceId";
    /// Header: location code
    pub const LOCATION_ID: &str = "locationId";
    /// Header: parameter code
    pub const PARAMETER_ID: &str = "parameterId";
    /// Header: time step
    pub const TIME_STEP: &str = "timeStep";
    /// Header: first event
    pub const START_DATE: &str = "startDate";
    /// Header: last event
    pub const END_DATE: &str = "endDate";
    /// Header: missing value sentinel
    pub const MISS_VAL: &str = "missVal";
    /// Header: long name
    pub const LONG_NAME: &str = "longName";
    /// Header: station name
    pub const STATION_NAME: &str = "stationName";
    /// Header: latitude
    pub const LAT: &str = "lat";
    /// Header: longitude
    pub const LON: &str = "lon";
    /// Header: unit of the values
    pub const UNITS: &str = "units";

    /// timeStep unit attribute
    pub const ATTR_UNIT: &str = "unit";
    /// timeStep divider attribute
    pub const ATTR_DIVIDER: &str = "divider";
    /// timeStep multiplier attribute
    pub const ATTR_MULTIPLIER: &str = "multiplier";
    /// Date attribute of events, startDate and endDate
    pub const ATTR_DATE: &str = "date";
    /// Time attribute of events, startDate and endDate
    pub const ATTR_TIME: &str = "time";
    /// Event value
    pub const ATTR_VALUE: &str = "value";
    /// Event flag
    pub const ATTR_FLAG: &str = "flag";
    /// Event flag source
    pub const ATTR_FLAG_SOURCE: &str = "flagSource";
    /// Event comment
    pub const ATTR_COMMENT: &str = "comment";
    /// Event user
    pub const ATTR_USER: &str = "user";
}

use serde::Serialize;

use super::identity::{SeriesIdentity, SeriesKey};

/// Location names longer than this are truncated (in code points)
pub const LOCATION_NAME_MAX_CHARS: usize = 80;

/// Missing value literal assumed when a header has no `missVal` element
pub const DEFAULT_MISSING_VALUE: &str = "NaN";

/// Metadata of one PI-XML series.
///
/// Built once the `header` element of a series has been parsed and never
/// modified afterwards; batches share it through `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesHeader {
    /// Parameter and time step identity
    pub identity: SeriesIdentity,
    /// `locationId`
    pub location_code: String,
    /// `units`
    pub unit: Option<String>,
    /// `stationName`, truncated to [`LOCATION_NAME_MAX_CHARS`]
    pub location_name: String,
    /// `lat`, NaN when absent
    pub lat: f64,
    /// `lon`, NaN when absent
    pub lon: f64,
    /// `missVal`: the literal marking an event without observation
    pub missing_value: String,
    /// Text of the series' trailing `comment` element
    pub comment: Option<String>,
    /// `type` (instantaneous, accumulative, ...)
    pub series_type: Option<String>,
    /// `moduleInstanceId`
    pub module_instance_id: Option<String>,
    /// `longName`
    pub long_name: Option<String>,
}

impl SeriesHeader {
    /// Create a header with only the mandatory fields set
    pub fn new(identity: SeriesIdentity, location_code: impl Into<String>) -> Self {
        Self {
            identity,
            location_code: location_code.into(),
            unit: None,
            location_name: String::new(),
            lat: f64::NAN,
            lon: f64::NAN,
            missing_value: DEFAULT_MISSING_VALUE.to_string(),
            comment: None,
            series_type: None,
            module_instance_id: None,
            long_name: None,
        }
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the location name, truncating it to [`LOCATION_NAME_MAX_CHARS`]
    pub fn with_location_name(mut self, name: &str) -> Self {
        self.location_name = truncate_location_name(name);
        self
    }

    /// Set latitude and longitude
    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    /// Set the missing value sentinel
    pub fn with_missing_value(mut self, missing_value: impl Into<String>) -> Self {
        self.missing_value = missing_value.into();
        self
    }

    /// Set the series comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Composite key of this series
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.identity.clone(), self.location_code.clone())
    }

    /// Series code of the identity
    pub fn code(&self) -> String {
        self.identity.code()
    }

    /// Parameter id, also used as the series' display name
    pub fn name(&self) -> &str {
        &self.identity.parameter_id
    }

    /// Check the mandatory identity fields; returns the problem found
    pub fn validate(&self) -> Result<(), String> {
        if let Some(problem) = self.identity.problem() {
            return Err(problem.to_string());
        }
        if self.location_code.trim().is_empty() {
            return Err("locationId is empty".to_string());
        }
        Ok(())
    }

    /// True when `raw` is the missing value literal of this series
    pub fn is_missing(&self, raw: &str) -> bool {
        raw == self.missing_value
    }
}

/// Truncate a station name to [`LOCATION_NAME_MAX_CHARS`] code points
pub fn truncate_location_name(name: &str) -> String {
    name.chars().take(LOCATION_NAME_MAX_CHARS).collect()
}

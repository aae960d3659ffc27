//! Column names as constants for type safety

// Event columns
/// Series code
pub const CODE: &str = "code";
/// Location code
pub const LOCATION_CODE: &str = "location_code";
/// Event timestamp
pub const TIMESTAMP: &str = "timestamp";
/// Observed value
pub const VALUE: &str = "value";
/// Quality flag
pub const FLAG: &str = "flag";
/// Origin of the quality flag
pub const FLAG_SOURCE: &str = "flag_source";
/// Event comment (also used for the series comment)
pub const COMMENT: &str = "comment";
/// Editing user
pub const USER: &str = "user";

// Series columns
/// Parameter id
pub const PARAMETER_ID: &str = "parameter_id";
/// Unit of the values
pub const UNIT: &str = "unit";
/// Display name of the series
pub const NAME: &str = "name";
/// Station name
pub const LOCATION_NAME: &str = "location_name";
/// Latitude
pub const LAT: &str = "lat";
/// Longitude
pub const LON: &str = "lon";
/// Missing value sentinel
pub const MISS_VAL: &str = "miss_val";

use std::collections::HashMap;

use arrow::datatypes::{DataType, Field, Schema, SchemaBuilder, TimeUnit};

use super::columns;
use super::constants::{KEY_FORMAT_VERSION, KEY_PI_SOURCE, PIXML_FORMAT_VERSION};
use crate::model::TimezoneOffset;

/// Creates a Field annotated with the PI-XML element or attribute it is read from
fn field_with_source(name: &str, data_type: DataType, nullable: bool, pi_source: &str) -> Field {
    let mut metadata = HashMap::new();
    metadata.insert(KEY_PI_SOURCE.to_string(), pi_source.to_string());
    Field::new(name, data_type, nullable).with_metadata(metadata)
}

/// Creates the Arrow schema of the event rows of a batch.
///
/// The timestamp column is timezone-aware only when `timezone` is known.
///
/// # Example
///
/// ```
/// use pixml::model::TimezoneOffset;
/// use pixml::schema::create_event_schema;
///
/// let schema = create_event_schema(TimezoneOffset::from_hours(1.0));
/// assert_eq!(schema.fields().len(), 8);
/// ```
pub fn create_event_schema(timezone: TimezoneOffset) -> Schema {
    let mut builder = SchemaBuilder::new();

    // Series identification (required)
    builder.push(field_with_source(
        columns::CODE,
        DataType::Utf8,
        false,
        "header/parameterId+timeStep",
    ));
    builder.push(field_with_source(
        columns::LOCATION_CODE,
        DataType::Utf8,
        false,
        "header/locationId",
    ));

    builder.push(field_with_source(
        columns::TIMESTAMP,
        DataType::Timestamp(
            TimeUnit::Millisecond,
            timezone.to_arrow_timezone().map(Into::into),
        ),
        false,
        "event/@date+@time",
    ));

    // NaN marks missing values, so the column itself is never null
    builder.push(field_with_source(
        columns::VALUE,
        DataType::Float64,
        false,
        "event/@value",
    ));

    builder.push(field_with_source(columns::FLAG, DataType::Int32, true, "event/@flag"));
    builder.push(field_with_source(
        columns::FLAG_SOURCE,
        DataType::Utf8,
        true,
        "event/@flagSource",
    ));
    builder.push(field_with_source(
        columns::COMMENT,
        DataType::Utf8,
        true,
        "event/@comment",
    ));
    builder.push(field_with_source(columns::USER, DataType::Utf8, true, "event/@user"));

    let mut metadata = HashMap::new();
    metadata.insert(KEY_FORMAT_VERSION.to_string(), PIXML_FORMAT_VERSION.to_string());
    builder.finish().with_metadata(metadata)
}

/// Creates the Arrow schema of the series metadata of a batch
pub fn create_series_schema() -> Schema {
    let mut builder = SchemaBuilder::new();

    builder.push(field_with_source(
        columns::CODE,
        DataType::Utf8,
        false,
        "header/parameterId+timeStep",
    ));
    builder.push(field_with_source(
        columns::LOCATION_CODE,
        DataType::Utf8,
        false,
        "header/locationId",
    ));
    builder.push(field_with_source(
        columns::PARAMETER_ID,
        DataType::Utf8,
        false,
        "header/parameterId",
    ));
    builder.push(field_with_source(columns::UNIT, DataType::Utf8, true, "header/units"));
    builder.push(field_with_source(
        columns::NAME,
        DataType::Utf8,
        false,
        "header/parameterId",
    ));
    builder.push(field_with_source(
        columns::LOCATION_NAME,
        DataType::Utf8,
        false,
        "header/stationName",
    ));
    builder.push(field_with_source(columns::LAT, DataType::Float64, false, "header/lat"));
    builder.push(field_with_source(columns::LON, DataType::Float64, false, "header/lon"));
    builder.push(field_with_source(
        columns::MISS_VAL,
        DataType::Utf8,
        false,
        "header/missVal",
    ));
    builder.push(field_with_source(
        columns::COMMENT,
        DataType::Utf8,
        true,
        "series/comment",
    ));

    let mut metadata = HashMap::new();
    metadata.insert(KEY_FORMAT_VERSION.to_string(), PIXML_FORMAT_VERSION.to_string());
    builder.finish().with_metadata(metadata)
}

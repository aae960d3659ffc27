//! Conversion of pruned PI-XML elements into record model values.
//!
//! Header fields are mandatory where the series identity depends on them and
//! fail loudly otherwise. An event value equal to the sentinel, absent or
//! unparseable becomes NaN; absent optional attributes become `None`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::pruner::Element;
use super::tags;
use super::PiXmlError;
use crate::model::{
    truncate_location_name, EventRow, SeriesHeader, SeriesIdentity, SeriesKey,
    DEFAULT_MISSING_VALUE, TimezoneOffset,
};

/// Derive the composite key of a `header` element
pub fn parse_key(header: &Element, series: &str) -> Result<SeriesKey, PiXmlError> {
    let identity = parse_identity(header, series)?;
    let location_code = required_text(header, tags::LOCATION_ID, series)?;
    Ok(SeriesKey::new(identity, location_code))
}

/// Parse the identity fields of a `header` element
pub fn parse_identity(header: &Element, series: &str) -> Result<SeriesIdentity, PiXmlError> {
    let parameter_id = required_text(header, tags::PARAMETER_ID, series)?;
    let time_step = header
        .child(tags::TIME_STEP)
        .ok_or_else(|| malformed(series, "missing timeStep element"))?;
    let unit = time_step
        .attr(tags::ATTR_UNIT)
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| malformed(series, "timeStep has no unit attribute"))?;

    let divider = step_factor(time_step, tags::ATTR_DIVIDER, series)?;
    let multiplier = step_factor(time_step, tags::ATTR_MULTIPLIER, series)?;

    Ok(SeriesIdentity {
        parameter_id: parameter_id.to_string(),
        timestep_unit: unit.to_string(),
        divider,
        multiplier,
    })
}

/// Build the full header of a `series` element.
///
/// `series` is the element itself: the header is its first `header` child
/// and the comment, if any, its trailing `comment` child.
pub fn parse_series_header(series_element: &Element, series: &str) -> Result<SeriesHeader, PiXmlError> {
    let header = series_element
        .child(tags::HEADER)
        .ok_or_else(|| malformed(series, "series has no header element"))?;

    let identity = parse_identity(header, series)?;
    let location_code = required_text(header, tags::LOCATION_ID, series)?;

    let comment = series_element
        .children
        .last()
        .filter(|c| c.name == tags::COMMENT)
        .map(|c| c.text.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(SeriesHeader {
        identity,
        location_code: location_code.to_string(),
        unit: optional_text(header, tags::UNITS),
        location_name: header
            .child_text(tags::STATION_NAME)
            .map(truncate_location_name)
            .unwrap_or_default(),
        lat: float_or_nan(header.child_text(tags::LAT)),
        lon: float_or_nan(header.child_text(tags::LON)),
        missing_value: header
            .child(tags::MISS_VAL)
            .map(|m| m.text.clone())
            .unwrap_or_else(|| DEFAULT_MISSING_VALUE.to_string()),
        comment,
        series_type: optional_text(header, tags::TYPE),
        module_instance_id: optional_text(header, tags::MODULE_INSTANCE_ID),
        long_name: optional_text(header, tags::LONG_NAME),
    })
}

/// Parse one `event` element of the series described by `header`
pub fn parse_event(event: &Element, header: &SeriesHeader) -> Result<EventRow, PiXmlError> {
    let date = event.attr(tags::ATTR_DATE).unwrap_or_default();
    let time = event.attr(tags::ATTR_TIME).unwrap_or_default();
    let timestamp = parse_timestamp(date, time).ok_or_else(|| PiXmlError::InvalidTimestamp {
        series: header.key().to_string(),
        date: date.to_string(),
        time: time.to_string(),
    })?;

    Ok(EventRow {
        timestamp,
        value: parse_value(event.attr(tags::ATTR_VALUE), &header.missing_value),
        flag: event.attr(tags::ATTR_FLAG).and_then(parse_flag),
        flag_source: event.attr(tags::ATTR_FLAG_SOURCE).map(str::to_string),
        comment: event.attr(tags::ATTR_COMMENT).map(str::to_string),
        user: event.attr(tags::ATTR_USER).map(str::to_string),
    })
}

/// Combine `YYYY-MM-DD` and `HH:MM:SS` (optional fraction) attributes
pub fn parse_timestamp(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = NaiveTime::parse_from_str(time.trim(), "%H:%M:%S%.f").ok()?;
    Some(date.and_time(time))
}

/// Parse a raw `value` attribute against the series sentinel.
///
/// The raw string is compared to the sentinel before any number conversion,
/// so a sentinel such as `-999.0` only matches when written identically.
pub fn parse_value(raw: Option<&str>, missing_value: &str) -> f64 {
    match raw {
        Some(raw) if raw != missing_value => raw.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Parse a `flag` attribute; anything but an integer is treated as unset
pub fn parse_flag(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    raw.parse::<i32>().ok().or_else(|| {
        // Some exporters write integral flags as decimals, e.g. "2.0"
        raw.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && *f >= f64::from(i32::MIN) && *f <= f64::from(i32::MAX))
            .map(|f| f as i32)
    })
}

/// Parse the text of a `timeZone` element (decimal hours, empty means 0)
pub fn parse_timezone(text: &str) -> Result<TimezoneOffset, PiXmlError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(TimezoneOffset::UTC);
    }
    text.parse::<f64>()
        .ok()
        .filter(|h| h.is_finite() && h.abs() < 24.0)
        .map(TimezoneOffset::from_hours)
        .ok_or_else(|| PiXmlError::InvalidTimezone(text.to_string()))
}

fn required_text<'a>(header: &'a Element, name: &str, series: &str) -> Result<&'a str, PiXmlError> {
    header
        .child_text(name)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| malformed(series, &format!("missing {} element", name)))
}

fn optional_text(header: &Element, name: &str) -> Option<String> {
    header
        .child_text(name)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

fn step_factor(time_step: &Element, name: &str, series: &str) -> Result<u32, PiXmlError> {
    match time_step.attr(name) {
        None => Ok(1),
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| malformed(series, &format!("timeStep {} '{}' is not a positive integer", name, raw))),
    }
}

fn float_or_nan(raw: Option<&str>) -> f64 {
    raw.and_then(|r| r.parse::<f64>().ok()).unwrap_or(f64::NAN)
}

fn malformed(series: &str, reason: &str) -> PiXmlError {
    PiXmlError::MalformedHeader {
        series: series.to_string(),
        reason: reason.to_string(),
    }
}

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, TimeZone};

/// Fixed UTC offset of a PI-XML document, in minutes.
///
/// PI-XML only knows fixed offsets, stated once per document. `None` means
/// the document carries no `timeZone` element at all; timestamps then stay
/// offset-naive and it is up to the consumer to decide what they mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimezoneOffset(Option<i32>);

impl TimezoneOffset {
    /// No timezone information
    pub const NAIVE: TimezoneOffset = TimezoneOffset(None);

    /// UTC
    pub const UTC: TimezoneOffset = TimezoneOffset(Some(0));

    /// Offset in whole minutes east of UTC
    pub fn from_minutes(minutes: i32) -> Self {
        Self(Some(minutes))
    }

    /// Offset in (possibly fractional) hours, rounded to whole minutes
    pub fn from_hours(hours: f64) -> Self {
        Self(Some((hours * 60.0).round() as i32))
    }

    /// Offset in minutes, `None` when naive
    pub fn minutes(&self) -> Option<i32> {
        self.0
    }

    /// Offset in hours, `None` when naive
    pub fn hours(&self) -> Option<f64> {
        self.0.map(|m| f64::from(m) / 60.0)
    }

    /// True when no offset is known
    pub fn is_naive(&self) -> bool {
        self.0.is_none()
    }

    /// The chrono offset, `None` when naive or out of range (beyond ±24h)
    pub fn to_fixed_offset(&self) -> Option<FixedOffset> {
        self.0.and_then(|m| FixedOffset::east_opt(m * 60))
    }

    /// Attach this offset to a wall-clock timestamp
    pub fn localize(&self, timestamp: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        self.to_fixed_offset()
            .and_then(|offset| offset.from_local_datetime(&timestamp).single())
    }

    /// The UTC instant of a wall-clock timestamp in this offset
    pub fn to_utc(&self, timestamp: NaiveDateTime) -> Option<NaiveDateTime> {
        self.0
            .map(|m| timestamp - TimeDelta::minutes(i64::from(m)))
    }

    /// Move a wall-clock timestamp from `self` into `target`.
    ///
    /// When either side is naive the timestamp is returned unchanged.
    pub fn convert(&self, timestamp: NaiveDateTime, target: TimezoneOffset) -> NaiveDateTime {
        match (self.0, target.0) {
            (Some(from), Some(to)) => timestamp + TimeDelta::minutes(i64::from(to - from)),
            _ => timestamp,
        }
    }

    /// Offset as Arrow expects it in a timestamp type, e.g. `+05:30`
    pub fn to_arrow_timezone(&self) -> Option<String> {
        self.0.map(format_offset)
    }

    /// Offset as decimal hours for the `timeZone` element, e.g. `1.0`, `-3.5`
    pub fn to_pi_hours(&self) -> Option<String> {
        self.hours().map(|h| {
            if h.fract() == 0.0 {
                format!("{:.1}", h)
            } else {
                format!("{}", h)
            }
        })
    }
}

fn format_offset(minutes: i32) -> String {
    let sign = if minutes < 0 { '-' } else { '+' };
    let abs = minutes.unsigned_abs();
    format!("{}{:02}:{:02}", sign, abs / 60, abs % 60)
}

impl fmt::Display for TimezoneOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(m) => write!(f, "UTC{}", format_offset(m)),
            None => write!(f, "naive"),
        }
    }
}

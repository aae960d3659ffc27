use chrono::NaiveDateTime;

/// One observation of a series.
///
/// The timestamp is the wall-clock time exactly as written in the document;
/// the document's [`TimezoneOffset`](super::TimezoneOffset) travels with the
/// batch that carries the row.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    /// Date and time of the observation
    pub timestamp: NaiveDateTime,
    /// Observed value, NaN when missing
    pub value: f64,
    /// Quality flag
    pub flag: Option<i32>,
    /// Origin of the quality flag
    pub flag_source: Option<String>,
    /// Free-text event comment
    pub comment: Option<String>,
    /// User who last edited the event
    pub user: Option<String>,
}

impl EventRow {
    /// Create a row with no optional attributes
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self {
            timestamp,
            value,
            flag: None,
            flag_source: None,
            comment: None,
            user: None,
        }
    }

    /// Set the flag
    pub fn with_flag(mut self, flag: i32) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Set the flag source
    pub fn with_flag_source(mut self, flag_source: impl Into<String>) -> Self {
        self.flag_source = Some(flag_source.into());
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set the user
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// True when the value is missing
    pub fn is_missing(&self) -> bool {
        self.value.is_nan()
    }
}

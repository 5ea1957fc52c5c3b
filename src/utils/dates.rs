//! Prior-day date fragments used for log selection and archive naming

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Year / abbreviated month / day strings of a calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorDay {
    /// `%Y`, e.g. "2024"
    pub year: String,
    /// `%b`, e.g. "Jan"
    pub month: String,
    /// `%d`, zero padded, e.g. "07"
    pub day: String,
}

impl PriorDay {
    /// Fragments for an explicit date
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.format("%Y").to_string(),
            month: date.format("%b").to_string(),
            day: date.format("%d").to_string(),
        }
    }

    /// The calendar day before `now`
    pub fn before(now: NaiveDateTime) -> Self {
        Self::from_date(now.date() - Duration::days(1))
    }

    /// `YYYY-Mon-DD`, used in prior-day archive names
    pub fn dashed(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }

    /// `YYYY/Mon/DD`, used in dated object keys
    pub fn key_path(&self) -> String {
        format!("{}/{}/{}", self.year, self.month, self.day)
    }
}

/// Timestamp embedded in archive and run directory names
pub fn run_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

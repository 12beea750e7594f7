use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::ValidationError;

/// Sentinel used in the `endDate` field of an ongoing entry.
pub const CURRENT_SENTINEL: &str = "current";

/// A calendar month, serialized as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth(NaiveDate);

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .filter(|_| (1000..=9999).contains(&year))
            .map(YearMonth)
            .ok_or_else(|| ValidationError::InvalidDate(format!("{year:04}-{month:02}")))
    }

    /// `MM/YYYY`, the display form used by the export adapters.
    pub fn display_short(&self) -> String {
        self.0.format("%m/%Y").to_string()
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidDate(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).map_err(|_| invalid())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// End of an experience/education period: a concrete month or the `"current"` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EndDate {
    Current,
    Month(YearMonth),
}

impl EndDate {
    pub fn is_current(&self) -> bool {
        matches!(self, EndDate::Current)
    }
}

impl FromStr for EndDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(CURRENT_SENTINEL) {
            Ok(EndDate::Current)
        } else {
            s.parse().map(EndDate::Month)
        }
    }
}

impl fmt::Display for EndDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndDate::Current => f.write_str(CURRENT_SENTINEL),
            EndDate::Month(m) => m.fmt(f),
        }
    }
}

impl TryFrom<String> for EndDate {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EndDate> for String {
    fn from(value: EndDate) -> Self {
        value.to_string()
    }
}

/// Brings `current` and `end_date` into agreement.
///
/// `current == true` forces the sentinel; a sentinel without the flag is dropped.
pub fn normalize_period(current: &mut bool, end_date: &mut Option<EndDate>) {
    if *current {
        *end_date = Some(EndDate::Current);
    } else if matches!(end_date, Some(EndDate::Current)) {
        *end_date = None;
    }
}

/// Rejects a concrete end month earlier than the start month.
pub fn validate_period(start: YearMonth, end: Option<EndDate>) -> Result<(), ValidationError> {
    match end {
        Some(EndDate::Month(end)) if end < start => Err(ValidationError::EndBeforeStart {
            start: start.to_string(),
            end: end.to_string(),
        }),
        _ => Ok(()),
    }
}

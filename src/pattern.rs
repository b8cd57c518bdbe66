//! Timestamp patterns.
//!
//! A pattern is a (possibly partial) digit string selecting a set of
//! timestamps. Parsed patterns keep what the digits mean as a variant, so a
//! four digit month-day and a four digit year never get confused once the
//! pattern exists.
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::{timestamp::parse_digits, NoteError, Result, Timestamp};

/// Year used to validate month-day patterns; a leap year so `0229` is
/// accepted.
const MONTH_DAY_REFERENCE_YEAR: i32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StampPattern {
    /// Matches every timestamp.
    Any,
    /// `YYYY`
    Year(i32),
    /// `YYYYMM`
    YearMonth { year: i32, month: u32 },
    /// `YYYYMMDD`
    Date(NaiveDate),
    /// `MMDD`, any year.
    MonthDay { month: u32, day: u32 },
    /// `YYYYMMDDhhmmss`, any suffix (or none).
    Instant(NaiveDateTime),
    /// `YYYYMMDDhhmmss_SSS`, exactly one timestamp.
    Exact(Timestamp),
}

impl StampPattern {
    /// Parses user supplied pattern text.
    ///
    /// Four digits are read as a month-day when they form a valid month and
    /// day (`1030`), and as a year otherwise (`2020`).
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || NoteError::InvalidTimestampPattern {
            pattern: s.to_string(),
        };

        if s.is_empty() {
            return Ok(Self::Any);
        }

        if s.contains('_') {
            return Timestamp::parse(s)
                .ok()
                .filter(|stamp| stamp.suffix().is_some())
                .map(Self::Exact)
                .ok_or_else(invalid);
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        match s.len() {
            4 => {
                let month = parse_digits(&s[0..2]).ok_or_else(invalid)?;
                let day = parse_digits(&s[2..4]).ok_or_else(invalid)?;
                if NaiveDate::from_ymd_opt(MONTH_DAY_REFERENCE_YEAR, month, day).is_some() {
                    Ok(Self::MonthDay { month, day })
                } else {
                    let year = parse_digits(s).ok_or_else(invalid)?;
                    Ok(Self::Year(year as i32))
                }
            }
            6 => {
                let year = parse_digits(&s[0..4]).ok_or_else(invalid)? as i32;
                let month = parse_digits(&s[4..6]).ok_or_else(invalid)?;
                if (1..=12).contains(&month) {
                    Ok(Self::YearMonth { year, month })
                } else {
                    Err(invalid())
                }
            }
            8 => {
                let year = parse_digits(&s[0..4]).ok_or_else(invalid)? as i32;
                let month = parse_digits(&s[4..6]).ok_or_else(invalid)?;
                let day = parse_digits(&s[6..8]).ok_or_else(invalid)?;
                NaiveDate::from_ymd_opt(year, month, day)
                    .map(Self::Date)
                    .ok_or_else(invalid)
            }
            14 => Timestamp::parse(s)
                .map(|stamp| Self::Instant(stamp.time()))
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }

    /// Checks whether the timestamp is selected by this pattern.
    pub fn matches(&self, stamp: &Timestamp) -> bool {
        match *self {
            Self::Any => true,
            Self::Year(year) => stamp.year() == year,
            Self::YearMonth { year, month } => stamp.year() == year && stamp.month() == month,
            Self::Date(date) => stamp.date() == date,
            Self::MonthDay { month, day } => stamp.month() == month && stamp.day() == day,
            Self::Instant(time) => stamp.time() == time,
            Self::Exact(exact) => *stamp == exact,
        }
    }

    /// The single calendar day this pattern pins down, if any.
    pub fn date_portion(&self) -> Option<NaiveDate> {
        match *self {
            Self::Date(date) => Some(date),
            Self::Instant(time) => Some(time.date()),
            Self::Exact(stamp) => Some(stamp.date()),
            _ => None,
        }
    }
}

impl From<NaiveDate> for StampPattern {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<Timestamp> for StampPattern {
    fn from(stamp: Timestamp) -> Self {
        match stamp.suffix() {
            Some(_) => Self::Exact(stamp),
            None => Self::Instant(stamp.time()),
        }
    }
}

impl fmt::Display for StampPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => Ok(()),
            Self::Year(year) => write!(f, "{:04}", year),
            Self::YearMonth { year, month } => write!(f, "{:04}{:02}", year, month),
            Self::Date(date) => write!(f, "{:04}{:02}{:02}", date.year(), date.month(), date.day()),
            Self::MonthDay { month, day } => write!(f, "{:02}{:02}", month, day),
            Self::Instant(time) => write!(f, "{}", time.format("%Y%m%d%H%M%S")),
            Self::Exact(stamp) => write!(f, "{}", stamp),
        }
    }
}

/// Parses `pattern` and checks it against `stamp`.
///
/// An empty pattern matches everything.
pub fn matches(pattern: &str, stamp: &Timestamp) -> Result<bool> {
    Ok(StampPattern::parse(pattern)?.matches(stamp))
}

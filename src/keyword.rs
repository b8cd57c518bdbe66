//! Symbolic date keywords such as `today` or `last_week`.
//!
//! Keywords expand to calendar days relative to an explicit "today". Weeks
//! start on Monday.
use std::{fmt, str::FromStr};

use chrono::{Datelike, Days, NaiveDate};

use crate::{NoteError, Result};

const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    /// The most recent notes, capped by configuration.
    Recent,
    /// Every note.
    All,
}

/// What a keyword stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expansion {
    /// Concrete days, in ascending order.
    Dates(Vec<NaiveDate>),
    /// No date filter; keep only the newest N notes.
    Recent,
    /// No date filter and no cap.
    All,
}

impl Keyword {
    pub const ALL: [Keyword; 8] = [
        Keyword::Today,
        Keyword::Yesterday,
        Keyword::ThisWeek,
        Keyword::LastWeek,
        Keyword::ThisMonth,
        Keyword::LastMonth,
        Keyword::Recent,
        Keyword::All,
    ];

    /// Full name of the keyword.
    pub fn name(&self) -> &'static str {
        match self {
            Keyword::Today => "today",
            Keyword::Yesterday => "yesterday",
            Keyword::ThisWeek => "this_week",
            Keyword::LastWeek => "last_week",
            Keyword::ThisMonth => "this_month",
            Keyword::LastMonth => "last_month",
            Keyword::Recent => "recent",
            Keyword::All => "all",
        }
    }

    /// Abbreviated name, if the keyword has one.
    pub fn abbreviation(&self) -> Option<&'static str> {
        match self {
            Keyword::Today => Some("to"),
            Keyword::Yesterday => Some("ye"),
            Keyword::ThisWeek => Some("tw"),
            Keyword::LastWeek => Some("lw"),
            Keyword::ThisMonth => Some("tm"),
            Keyword::LastMonth => Some("lm"),
            Keyword::Recent => Some("re"),
            Keyword::All => None,
        }
    }

    /// Expands the keyword relative to `today`.
    pub fn expand(&self, today: NaiveDate) -> Expansion {
        match self {
            Keyword::Today => Expansion::Dates(vec![today]),
            Keyword::Yesterday => Expansion::Dates(today.pred_opt().into_iter().collect()),
            Keyword::ThisWeek => Expansion::Dates(dates_in_week(today)),
            Keyword::LastWeek => {
                let start = start_of_week(today) - Days::new(7);
                Expansion::Dates(dates_in_week(start))
            }
            Keyword::ThisMonth => Expansion::Dates(dates_in_month(today.year(), today.month())),
            Keyword::LastMonth => {
                let (year, month) = previous_month(today.year(), today.month());
                Expansion::Dates(dates_in_month(year, month))
            }
            Keyword::Recent => Expansion::Recent,
            Keyword::All => Expansion::All,
        }
    }
}

impl FromStr for Keyword {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        Keyword::ALL
            .into_iter()
            .find(|keyword| keyword.name() == s || keyword.abbreviation() == Some(s))
            .ok_or_else(|| NoteError::UnknownKeyword {
                keyword: s.to_string(),
            })
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expands a keyword into `YYYYMMDD` date patterns.
///
/// `recent` and `all` carry no dates and give an empty list.
pub fn expand_keyword(keyword: &str, today: NaiveDate) -> Result<Vec<String>> {
    let keyword: Keyword = keyword.parse()?;
    Ok(match keyword.expand(today) {
        Expansion::Dates(dates) => dates.into_iter().map(date_pattern).collect(),
        Expansion::Recent | Expansion::All => Vec::new(),
    })
}

/// `YYYYMMDD` form of a date.
pub fn date_pattern(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `month` (1-12) of `year`; 0 for an invalid month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        1..=12 => DAYS_IN_MONTH[(month - 1) as usize],
        _ => 0,
    }
}

/// Position of the date within its week, Monday being 0 and Sunday 6.
pub fn weekday_index(date: NaiveDate) -> u32 {
    (date.weekday().number_from_monday() - 1) % 7
}

/// The Monday on or before `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(weekday_index(date)))
}

/// The seven days of the Monday-start week containing `date`.
pub fn dates_in_week(date: NaiveDate) -> Vec<NaiveDate> {
    start_of_week(date).iter_days().take(7).collect()
}

/// Every day of the given month.
pub fn dates_in_month(year: i32, month: u32) -> Vec<NaiveDate> {
    (1..=days_in_month(year, month))
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 {
        (year - 1, 12)
    } else {
        (year, month - 1)
    }
}

//! Timestamps identifying notes.
//!
//! A timestamp is a local date-time with second precision plus an optional
//! three digit suffix used to tell apart notes created within the same
//! second. Its canonical text form is `YYYYMMDDhhmmss` or
//! `YYYYMMDDhhmmss_SSS`, which is also the file stem used by the repository.
use std::{fmt, str::FromStr, time::SystemTime};

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{NoteError, Result};

/// Largest suffix a timestamp may carry.
pub const MAX_SUFFIX: u32 = 999;

/// Number of distinct suffixes available for one instant.
pub const SUFFIX_SLOTS: usize = MAX_SUFFIX as usize + 1;

const STAMP_LEN: usize = 14;
const STAMP_WITH_SUFFIX_LEN: usize = 18;

/// Identifier of a note.
///
/// Ordering compares the instant first and the suffix second, where an
/// absent suffix sorts before any explicit one. An absent suffix is not
/// equal to suffix `000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    time: NaiveDateTime,
    suffix: Option<u16>,
}

impl Timestamp {
    /// Creates a timestamp without suffix. Sub-second precision is dropped.
    pub fn new(time: NaiveDateTime) -> Self {
        Self {
            time: time.with_nanosecond(0).unwrap_or(time),
            suffix: None,
        }
    }

    /// Captures the current local time.
    pub fn now() -> Self {
        Self::new(Local::now().naive_local())
    }

    /// Converts a file system time (birth or modification time) into a
    /// local timestamp.
    pub fn from_system_time(time: SystemTime) -> Self {
        Self::new(DateTime::<Local>::from(time).naive_local())
    }

    /// Parses the canonical 14 or 18 character form.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || NoteError::InvalidTimestampFormat {
            input: s.to_string(),
        };

        if !s.is_ascii() {
            return Err(invalid());
        }

        let (stamp, suffix) = match s.len() {
            STAMP_LEN => (s, None),
            STAMP_WITH_SUFFIX_LEN => {
                let (stamp, rest) = s.split_at(STAMP_LEN);
                let digits = rest.strip_prefix('_').ok_or_else(invalid)?;
                (stamp, Some(digits))
            }
            _ => return Err(invalid()),
        };

        let time = parse_stamp_digits(stamp).ok_or_else(invalid)?;
        let suffix = match suffix {
            Some(digits) => Some(parse_digits(digits).ok_or_else(invalid)? as u16),
            None => None,
        };

        Ok(Self { time, suffix })
    }

    /// Returns a copy carrying the given suffix.
    pub fn with_suffix(&self, suffix: u32) -> Result<Self> {
        if suffix > MAX_SUFFIX {
            return Err(NoteError::InvalidSuffix { suffix });
        }
        Ok(Self {
            time: self.time,
            suffix: Some(suffix as u16),
        })
    }

    /// Returns a copy without suffix.
    pub fn without_suffix(&self) -> Self {
        Self {
            time: self.time,
            suffix: None,
        }
    }

    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub fn suffix(&self) -> Option<u32> {
        self.suffix.map(u32::from)
    }

    pub fn date(&self) -> NaiveDate {
        self.time.date()
    }

    pub fn year(&self) -> i32 {
        self.time.year()
    }

    pub fn month(&self) -> u32 {
        self.time.month()
    }

    pub fn day(&self) -> u32 {
        self.time.day()
    }

    /// The `YYYYMMDD` part of the canonical form.
    pub fn date_pattern(&self) -> String {
        self.time.format("%Y%m%d").to_string()
    }

    /// Directory names (`YYYY`, `MM`) under which the note is stored.
    pub fn path_components(&self) -> (String, String) {
        (
            format!("{:04}", self.time.year()),
            format!("{:02}", self.time.month()),
        )
    }
}

/// Parses `YYYYMMDDhhmmss` into a valid calendar date-time.
fn parse_stamp_digits(stamp: &str) -> Option<NaiveDateTime> {
    if stamp.len() != STAMP_LEN {
        return None;
    }
    let year = parse_digits(&stamp[0..4])? as i32;
    let month = parse_digits(&stamp[4..6])?;
    let day = parse_digits(&stamp[6..8])?;
    let hour = parse_digits(&stamp[8..10])?;
    let minute = parse_digits(&stamp[10..12])?;
    let second = parse_digits(&stamp[12..14])?;

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)
}

/// Parses a non-empty run of ASCII digits.
pub(crate) fn parse_digits(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time.format("%Y%m%d%H%M%S"))?;
        if let Some(suffix) = self.suffix {
            write!(f, "_{:03}", suffix)?;
        }
        Ok(())
    }
}

impl FromStr for Timestamp {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use chrono::NaiveTime;

    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Timestamp {
        Timestamp::new(
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap(),
        )
    }

    #[test]
    fn test_parse_round_trip() {
        for s in [
            "20201030090000",
            "20201030180000_005",
            "20200229235959",
            "19991231000000_999",
            "20240101000000_000",
        ] {
            let stamp = Timestamp::parse(s).unwrap();
            assert_eq!(stamp.to_string(), s);
            assert_eq!(Timestamp::parse(&stamp.to_string()).unwrap(), stamp);
        }
    }

    #[test]
    fn test_parse_fields() {
        let stamp: Timestamp = "20201030180102_042".parse().unwrap();
        assert_eq!(stamp.year(), 2020);
        assert_eq!(stamp.month(), 10);
        assert_eq!(stamp.day(), 30);
        assert_eq!(stamp.time().time(), NaiveTime::from_hms_opt(18, 1, 2).unwrap());
        assert_eq!(stamp.suffix(), Some(42));
        assert_eq!(stamp.date_pattern(), "20201030");
        assert_eq!(
            stamp.path_components(),
            ("2020".to_string(), "10".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for s in [
            "",
            "2020",
            "202010300900",
            "2020103009000",
            "202010300900000",
            "20201030090000-005",
            "20201030090000_05",
            "20201030090000_0055",
            "2020103009000a",
            "20201030090000_00x",
            "２０２０1030090000",
        ] {
            match Timestamp::parse(s) {
                Err(NoteError::InvalidTimestampFormat { input }) => assert_eq!(input, s),
                other => panic!("expected InvalidTimestampFormat for {s:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_rejects_invalid_calendar_values() {
        for s in [
            "20201330090000",
            "20200231090000",
            "20210229090000",
            "20201030240000",
            "20201030096000",
            "20201030090060",
            "20201000090000",
        ] {
            assert!(
                matches!(
                    Timestamp::parse(s),
                    Err(NoteError::InvalidTimestampFormat { .. })
                ),
                "{s} should be rejected"
            );
        }
    }

    #[test]
    fn test_with_suffix_bounds() {
        let base = at(2020, 10, 30, 9, 0, 0);
        assert_eq!(base.with_suffix(0).unwrap().to_string(), "20201030090000_000");
        assert_eq!(base.with_suffix(999).unwrap().to_string(), "20201030090000_999");
        assert!(matches!(
            base.with_suffix(1000),
            Err(NoteError::InvalidSuffix { suffix: 1000 })
        ));
        // the original value is left untouched
        assert_eq!(base.suffix(), None);
    }

    #[test]
    fn test_absent_suffix_differs_from_zero() {
        let base = at(2020, 10, 30, 9, 0, 0);
        let zero = base.with_suffix(0).unwrap();
        assert_ne!(base, zero);
        assert_eq!(base.cmp(&zero), Ordering::Less);
        assert_eq!(zero.without_suffix(), base);
    }

    #[test]
    fn test_ordering_instant_before_suffix() {
        let earlier = at(2020, 10, 30, 9, 0, 0).with_suffix(999).unwrap();
        let later = at(2020, 10, 30, 9, 0, 1);
        assert_eq!(earlier.cmp(&later), Ordering::Less);

        let a = at(2020, 10, 30, 9, 0, 0).with_suffix(1).unwrap();
        let b = at(2020, 10, 30, 9, 0, 0).with_suffix(2).unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_now_has_no_subsecond_part() {
        let now = Timestamp::now();
        assert_eq!(now.time().nanosecond(), 0);
        assert_eq!(now.suffix(), None);
        assert_eq!(now.to_string().len(), 14);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let stamp = Timestamp::parse("20201030180000_005").unwrap();
        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, "\"20201030180000_005\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stamp);
        assert!(serde_json::from_str::<Timestamp>("\"2020\"").is_err());
    }
}

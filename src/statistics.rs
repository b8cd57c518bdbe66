//! Counting notes per year and month.
use std::collections::BTreeMap;

use crate::{NoteRepository, Result, StampPattern, Timestamp};

/// Note counts of a repository, grouped by year then month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    values: BTreeMap<i32, BTreeMap<u32, usize>>,
}

impl Statistics {
    pub fn collect<R: NoteRepository + ?Sized>(repository: &R) -> Result<Self> {
        Ok(Self::from_timestamps(
            &repository.entries(&StampPattern::Any)?,
        ))
    }

    pub fn from_timestamps(stamps: &[Timestamp]) -> Self {
        let mut values: BTreeMap<i32, BTreeMap<u32, usize>> = BTreeMap::new();
        for stamp in stamps {
            *values
                .entry(stamp.year())
                .or_default()
                .entry(stamp.month())
                .or_default() += 1;
        }
        Self { values }
    }

    pub fn total(&self) -> usize {
        self.values.values().flat_map(BTreeMap::values).sum()
    }

    /// `(year, count)`, oldest year first.
    pub fn yearly(&self) -> Vec<(i32, usize)> {
        self.values
            .iter()
            .map(|(year, months)| (*year, months.values().sum::<usize>()))
            .collect()
    }

    /// `(year, month, count)`, oldest month first.
    pub fn monthly(&self) -> Vec<(i32, u32, usize)> {
        self.values
            .iter()
            .flat_map(|(year, months)| {
                months
                    .iter()
                    .map(move |(month, count)| (*year, *month, *count))
            })
            .collect()
    }

    pub fn total_report(&self) -> String {
        self.total().to_string()
    }

    /// One `YYYY: n` line per year.
    pub fn yearly_report(&self) -> Vec<String> {
        self.yearly()
            .into_iter()
            .map(|(year, count)| format!("{:04}: {}", year, count))
            .collect()
    }

    /// One `YYYY/MM: n` line per month.
    pub fn monthly_report(&self) -> Vec<String> {
        self.monthly()
            .into_iter()
            .map(|(year, month, count)| format!("{:04}/{:02}: {}", year, month, count))
            .collect()
    }
}

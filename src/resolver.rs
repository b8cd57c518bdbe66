//! Turning command arguments into the timestamps of matching notes.
//!
//! Arguments are timestamp patterns (`20201030`, `1030`, ...) or keywords
//! (`today`, `tw`, ...). The result is always sorted newest first and holds
//! each timestamp once.
use chrono::{Local, NaiveDate};

use crate::{
    dates_in_week, Expansion, Keyword, NoteError, NoteRepository, Result, StampPattern, Timestamp,
};

/// Keyword used when no argument is given.
pub const DEFAULT_KEYWORD: &str = "today";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Expand each argument to every day of its (Monday-start) week.
    pub enumerate_week: bool,
    /// How many notes `recent` keeps; `None` or 0 keeps all.
    pub recent_cap: Option<usize>,
    /// Keyword standing in for an empty argument list.
    pub default_keyword: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Patterns,
    Recent,
    All,
}

/// Resolves `tokens` against the repository, relative to `today`.
pub fn resolve<S, R>(
    tokens: &[S],
    repository: &R,
    options: &ResolveOptions,
    today: NaiveDate,
) -> Result<Vec<Timestamp>>
where
    S: AsRef<str>,
    R: NoteRepository + ?Sized,
{
    let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();

    let (mode, patterns) = if options.enumerate_week {
        (Mode::Patterns, week_patterns(&tokens, today)?)
    } else if tokens.is_empty() {
        let keyword = options.default_keyword.as_deref().unwrap_or(DEFAULT_KEYWORD);
        collect_patterns(&[keyword], today)?
    } else {
        collect_patterns(&tokens, today)?
    };

    let mut stamps = match mode {
        Mode::Patterns => {
            let mut stamps = Vec::new();
            for pattern in &patterns {
                stamps.extend(repository.entries(pattern)?);
            }
            stamps
        }
        Mode::Recent | Mode::All => repository.entries(&StampPattern::Any)?,
    };

    stamps.sort_unstable_by(|a, b| b.cmp(a));
    stamps.dedup();

    if mode == Mode::Recent {
        if let Some(cap) = options.recent_cap.filter(|cap| *cap > 0) {
            stamps.truncate(cap);
        }
    }

    Ok(stamps)
}

/// [`resolve`] relative to the local clock.
pub fn resolve_now<S, R>(
    tokens: &[S],
    repository: &R,
    options: &ResolveOptions,
) -> Result<Vec<Timestamp>>
where
    S: AsRef<str>,
    R: NoteRepository + ?Sized,
{
    resolve(tokens, repository, options, Local::now().date_naive())
}

/// Parses full timestamps, dropping repeated ones but keeping the order in
/// which they were given.
pub fn read_timestamps<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Timestamp>> {
    let mut stamps: Vec<Timestamp> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let stamp = Timestamp::parse(token.as_ref().trim())?;
        if !stamps.contains(&stamp) {
            stamps.push(stamp);
        }
    }
    Ok(stamps)
}

/// Whether a token is meant as a timestamp pattern rather than a keyword.
fn looks_like_pattern(token: &str) -> bool {
    token.bytes().all(|b| b.is_ascii_digit() || b == b'_')
}

fn collect_patterns(tokens: &[&str], today: NaiveDate) -> Result<(Mode, Vec<StampPattern>)> {
    let mut mode = Mode::Patterns;
    let mut patterns: Vec<StampPattern> = Vec::new();
    let mut push = |pattern: StampPattern| {
        if !patterns.contains(&pattern) {
            patterns.push(pattern);
        }
    };

    for token in tokens {
        if looks_like_pattern(token) {
            push(StampPattern::parse(token)?);
            continue;
        }

        match token.parse::<Keyword>()?.expand(today) {
            Expansion::Dates(dates) => dates.into_iter().map(StampPattern::Date).for_each(&mut push),
            Expansion::Recent => mode = Mode::Recent,
            Expansion::All => {
                if mode != Mode::Recent {
                    mode = Mode::All;
                }
            }
        }
    }

    Ok((mode, patterns))
}

fn week_patterns(tokens: &[&str], today: NaiveDate) -> Result<Vec<StampPattern>> {
    let dates = if tokens.is_empty() {
        vec![today]
    } else {
        tokens
            .iter()
            .map(|token| {
                StampPattern::parse(token)
                    .ok()
                    .and_then(|pattern| pattern.date_portion())
                    .ok_or_else(|| NoteError::InvalidTimestampPatternAsDate {
                        pattern: token.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?
    };

    let mut patterns: Vec<StampPattern> = Vec::new();
    for date in dates {
        for day in dates_in_week(date) {
            let pattern = StampPattern::Date(day);
            if !patterns.contains(&pattern) {
                patterns.push(pattern);
            }
        }
    }
    Ok(patterns)
}

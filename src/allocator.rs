//! Choosing a free timestamp for a new or imported note.
//!
//! When the wanted timestamp is taken by a note with different text, the
//! suffixes `000` to `999` of the same instant are tried in order.
use crate::{timestamp::MAX_SUFFIX, NoteError, NoteRepository, Result, Timestamp, SUFFIX_SLOTS};

/// Result of a successful allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allocation {
    /// Nothing is stored under this timestamp yet.
    Available(Timestamp),
    /// A note with the very same text is already stored under this
    /// timestamp; there is nothing to create.
    AlreadyPresent(Timestamp),
}

/// Finds where a note with `content` wanting `desired` should go.
///
/// `exists` tells whether a timestamp is taken and `read` yields the text
/// stored under a taken one.
pub fn allocate_timestamp<E, R>(
    desired: Timestamp,
    content: &[String],
    exists: E,
    read: R,
) -> Result<Allocation>
where
    E: Fn(&Timestamp) -> bool,
    R: Fn(&Timestamp) -> Result<Vec<String>>,
{
    let suffixed = (0..=MAX_SUFFIX).map(|suffix| desired.with_suffix(suffix));

    for candidate in std::iter::once(Ok(desired)).chain(suffixed) {
        let candidate = candidate?;
        if !exists(&candidate) {
            return Ok(Allocation::Available(candidate));
        }
        if read(&candidate)? == content {
            return Ok(Allocation::AlreadyPresent(candidate));
        }
    }

    Err(NoteError::SuffixExhausted {
        desired,
        base: desired.without_suffix(),
        tried: SUFFIX_SLOTS,
    })
}

/// [`allocate_timestamp`] against a repository.
pub fn allocate_in<R>(repository: &R, desired: Timestamp, content: &[String]) -> Result<Allocation>
where
    R: NoteRepository + ?Sized,
{
    allocate_timestamp(
        desired,
        content,
        |stamp| repository.exists(stamp),
        |stamp| repository.read(stamp),
    )
}

/// What happened to a note handed to [`store_new_note`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// Stored under this timestamp.
    Created(Timestamp),
    /// Already stored with identical text; nothing was written.
    AlreadyPresent(Timestamp),
}

/// Allocates a timestamp near `desired` and stores `content` under it
/// unless identical text is already there.
pub fn store_new_note<R>(repository: &R, desired: Timestamp, content: &[String]) -> Result<StoreOutcome>
where
    R: NoteRepository + ?Sized,
{
    match allocate_in(repository, desired, content)? {
        Allocation::Available(stamp) => {
            repository.create(&stamp, content)?;
            Ok(StoreOutcome::Created(stamp))
        }
        Allocation::AlreadyPresent(stamp) => Ok(StoreOutcome::AlreadyPresent(stamp)),
    }
}

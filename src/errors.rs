//! Error types for the tnotes application.
//!
//! This module defines the error type shared by the timestamp core, the
//! repository and the command-line layer.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::Timestamp;

/// The main error type for the tnotes application.
#[derive(Error, Debug)]
pub enum NoteError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors raised while reading the YAML configuration file.
    #[error("Configuration error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Errors related to JSON output.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The text pattern given to search is not a valid regular expression.
    #[error("Invalid search pattern: {0}")]
    InvalidSearchPattern(#[from] regex::Error),

    /// A string could not be parsed into a timestamp.
    #[error("Invalid timestamp format: {input}")]
    InvalidTimestampFormat { input: String },

    /// A suffix outside of 0..=999 was requested.
    #[error("Invalid suffix: {suffix} (must be between 0 and 999)")]
    InvalidSuffix { suffix: u32 },

    /// A timestamp pattern has an unusable shape.
    #[error("Invalid timestamp pattern: {pattern}")]
    InvalidTimestampPattern { pattern: String },

    /// A timestamp pattern cannot be reduced to a single date.
    #[error("Invalid timestamp pattern as date: {pattern}")]
    InvalidTimestampPatternAsDate { pattern: String },

    /// An unrecognized symbolic keyword was given in place of a pattern.
    #[error("Unknown keyword: {keyword}")]
    UnknownKeyword { keyword: String },

    /// Every suffix for an instant is already taken.
    #[error(
        "Cannot allocate a timestamp for [{desired}]: all {tried} suffixes of [{base}] are in use"
    )]
    SuffixExhausted {
        desired: Timestamp,
        base: Timestamp,
        tried: usize,
    },

    /// No note is stored under the timestamp.
    #[error("Missing timestamp: {timestamp}")]
    MissingTimestamp { timestamp: Timestamp },

    /// A note is already stored under the timestamp.
    #[error("Duplicate timestamp: {timestamp}")]
    DuplicateTimestamp { timestamp: Timestamp },

    /// The text to store is empty.
    #[error("Empty text: a note must have some content")]
    EmptyText,

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// The configuration file given explicitly does not exist.
    #[error("No configuration file: {path}")]
    NoConfFile { path: PathBuf },

    /// None of the editor candidates could be found.
    #[error("No editor is available: {candidates:?}")]
    NoEditor { candidates: Vec<String> },

    /// An external program exited unsuccessfully.
    #[error("External program was aborted: {command}")]
    ProgramAbort { command: String },

    /// A mandatory command argument was not given.
    #[error("Missing argument: {name}")]
    MissingArgument { name: String },

    /// A human readable time string could not be understood.
    #[error("Invalid time string: {input}")]
    InvalidTimeString { input: String },
}

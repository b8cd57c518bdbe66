//! Shared types for the tnotes application.
//!
//! This module holds the crate-wide `Result` alias and the command-line
//! subcommands.
use std::path::PathBuf;

use clap::Subcommand;

use crate::NoteError;

/// A specialized Result type for tnotes operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Available subcommands for the tnotes application
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Add a new note
    Add {
        /// Timestamp to store the note under instead of the current time
        /// (full stamp, or 8 to 14 digits)
        #[clap(short, long)]
        timestamp: Option<String>,

        /// Text of the note; the editor is opened when omitted
        #[clap(long)]
        content: Option<String>,
    },

    /// List notes
    List {
        /// Enumerate every day of the week of each given date
        #[clap(short, long)]
        week: bool,

        /// Group the notes by day
        #[clap(short, long)]
        verbose: bool,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,

        /// Timestamp patterns or keywords (today, tw, lm, recent, all, ...)
        args: Vec<String>,
    },

    /// Pick a timestamp with a picker program
    Pick {
        /// Enumerate every day of the week of each given date
        #[clap(short, long)]
        week: bool,

        /// Timestamp patterns or keywords
        args: Vec<String>,
    },

    /// Show the content of notes
    Show {
        /// Timestamp patterns or keywords; read from standard input when
        /// omitted
        args: Vec<String>,
    },

    /// Search notes with a regular expression
    Search {
        /// Regular expression to look for
        pattern: String,

        /// Restrict the search to notes matching this timestamp pattern
        stamp_pattern: Option<String>,
    },

    /// Update the content of a note
    Update {
        /// Keep the timestamp of the note
        #[clap(short, long)]
        keep: bool,

        /// New text of the note; the editor is opened when omitted
        #[clap(long)]
        content: Option<String>,

        /// Timestamp of the note; read from standard input when omitted
        timestamp: Option<String>,
    },

    /// Delete notes
    Delete {
        /// Timestamps of the notes; read from standard input when omitted
        timestamps: Vec<String>,
    },

    /// Import files as notes
    Import {
        /// Files to import
        #[clap(required = true)]
        files: Vec<PathBuf>,
    },

    /// Write out a note into a file
    Export {
        /// Timestamp of the note; read from standard input when omitted
        timestamp: Option<String>,

        /// Destination file, `<timestamp>.md` by default
        file: Option<PathBuf>,
    },

    /// Show statistics of the repository
    Statistics {
        /// Count notes per year
        #[clap(short, long, conflicts_with = "monthly")]
        yearly: bool,

        /// Count notes per month
        #[clap(short, long)]
        monthly: bool,
    },

    /// Print the repository path
    Repo,

    /// Print the current configuration
    Conf,

    /// Convert a time string into a timestamp
    Stamp {
        /// Time such as "2020-11-06 16:51:15"
        time_str: String,
    },

    /// Convert a timestamp into a time string
    Time {
        /// Stamp of 8 to 14 digits
        stamp: String,
    },

    /// Print all command names on a single line
    Commands {
        /// Include the builtin helper commands
        #[clap(short, long = "deve-commands")]
        deve_commands: bool,
    },
}

impl Commands {
    /// Names of the note commands.
    pub const NAMES: [&'static str; 11] = [
        "add",
        "commands",
        "delete",
        "export",
        "import",
        "list",
        "pick",
        "search",
        "show",
        "statistics",
        "update",
    ];

    /// Names of the builtin helper commands.
    pub const BUILTINS: [&'static str; 4] = ["conf", "repo", "stamp", "time"];
}

//! Personal note-taking library
//!
//! Notes are plain text files identified by timestamps and stored in a
//! year/month directory tree. This library resolves timestamp patterns and
//! date keywords to notes, allocates collision-free timestamps, and provides
//! the command-line application built on top of them.

mod allocator;
mod cli;
mod config;
mod errors;
mod helper;
mod keyword;
mod note;
mod pattern;
mod resolver;
mod statistics;
mod storage;
mod timestamp;
mod types;

// Re-export key components
pub use allocator::*;
pub use cli::*;
pub use config::*;
pub use errors::*;
pub use helper::*;
pub use keyword::*;
pub use note::*;
pub use pattern::*;
pub use resolver::*;
pub use statistics::*;
pub use storage::*;
pub use timestamp::*;
pub use types::*;

//! Command-line layer: argument definitions and the command dispatcher.
mod app;
mod args;

pub use app::*;
pub use args::*;

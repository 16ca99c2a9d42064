//! Shared utilities for kvx CLI binaries.
//!
//! Log level parsing, logging setup, and number formatting for the summaries
//! printed to stderr.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_number, format_rate};
pub use logging::init_logging;

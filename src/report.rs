//! User-facing progress output.
//!
//! Progress goes to stdout, warnings and debug notes to stderr, each with
//! its own prefix so they can be told apart in a terminal or a log.

use colored::Colorize;
use std::fmt::Display;

/// Print a progress message: `==> msg`.
pub fn info(msg: impl Display) {
    println!("{} {}", "==>".blue().bold(), msg.to_string().bold());
}

/// Print a non-fatal warning: `Warning: msg`.
pub fn warn(msg: impl Display) {
    eprintln!("{} {}", "Warning:".yellow().bold(), msg);
}

/// Print a debug note, only when `enabled`.
pub fn debug(enabled: bool, msg: impl Display) {
    if enabled {
        eprintln!("{} {}", "debug:".dimmed(), msg);
    }
}

/// Print a fatal error and its cause chain.
pub fn error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
}

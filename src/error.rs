//! Typed errors for fleet analysis
//!
//! Library operations that can fail on bad input return `FleetError`.
//! Loading and CLI plumbing wrap these in `anyhow` with file context.

use thiserror::Error;

/// Errors raised by the selector, series builder, classifier configuration
/// and report settings
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Non-numeric value '{value}' for {machine} at {label}")]
    NonNumeric {
        machine: String,
        label: String,
        value: String,
    },

    #[error("Invalid tolerance band '{name}': {reason}")]
    InvalidTolerance { name: String, reason: String },

    #[error("Unknown verbosity level: {0}")]
    UnknownLevel(String),
}

//! Error types for configuration loading.
//!
//! Errors carry constant messages with structured context so failures stay
//! reproducible in tests; source errors are preserved, not interpolated.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A line was not of the `KEY=value` form.
    #[error("malformed configuration line")]
    MalformedLine {
        /// Path of the configuration file.
        path: PathBuf,
        /// 1-based line number of the offending line.
        line: usize,
        /// Offending line content.
        content: String,
    },
    /// A recognized key carried an invalid value.
    #[error("invalid configuration field")]
    InvalidField {
        /// Key that failed validation.
        field: String,
        /// Offending value when available.
        value: Option<String>,
        /// Static reason for the failure.
        reason: &'static str,
    },
}

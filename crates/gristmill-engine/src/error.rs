//! # Design
//!
//! - Constant-message structured errors for the generation engine.
//! - Capture operation context (paths, descriptors) to keep failures
//!   reproducible in tests.
//! - Preserve source errors without interpolating context into messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors produced by the generation engine.
///
/// Domain outcomes (busy, not-available, generation failure) are statuses
/// on the [`crate::request::GenerationReport`], not errors; these variants
/// cover invalid input and unexpected filesystem faults.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Descriptor could not be resolved to a product identity.
    #[error("invalid product descriptor")]
    InvalidDescriptor {
        /// Raw descriptor string as provided by the caller.
        descriptor: String,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// A product transitively depends on itself.
    #[error("dependency cycle detected")]
    DependencyCycle {
        /// Canonical filename of the product that closed the cycle.
        product: String,
    },
    /// IO failure while interacting with the cache filesystem.
    #[error("engine io failure")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A collaborator executable could not be spawned or awaited.
    #[error("failed to run collaborator executable")]
    Process {
        /// Executable that failed to run.
        executable: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// An advisory post-success directive failed. Never escalated to the
    /// request outcome; logged and dropped by the applier.
    #[error("directive application failed")]
    Directive {
        /// Directive that failed.
        directive: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl EngineError {
    pub(crate) fn invalid_descriptor(
        descriptor: impl Into<String>,
        reason: &'static str,
    ) -> Self {
        Self::InvalidDescriptor {
            descriptor: descriptor.into(),
            reason,
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn process(executable: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Process {
            executable: executable.into(),
            source,
        }
    }

    pub(crate) fn directive(
        directive: &'static str,
        path: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        Self::Directive {
            directive,
            path: path.into(),
            source,
        }
    }
}

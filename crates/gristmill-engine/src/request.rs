//! Request actions and the per-request outcome report.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::status::Status;

/// Operation requested for a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Action {
    /// Serve the artifact from cache, generating it first if needed.
    #[serde(rename = "MAKE")]
    Make,
    /// Delete the cached artifact.
    #[serde(rename = "DELETE")]
    Delete,
    /// Resolve and report the product's input listing.
    #[serde(rename = "INPUTS")]
    ListInputs,
}

impl Action {
    /// Wire spelling used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Make => "MAKE",
            Self::Delete => "DELETE",
            Self::ListInputs => "INPUTS",
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MAKE" => Ok(Self::Make),
            "DELETE" => Ok(Self::Delete),
            "INPUTS" => Ok(Self::ListInputs),
            other => Err(format!("unknown action '{other}'")),
        }
    }
}

/// Outcome of one generation request. Recursive children contribute only
/// through the input map; every report owns its fields exclusively.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// Per-request identifier.
    pub request_id: Uuid,
    /// Canonical filename of the requested product.
    pub product: String,
    /// Outcome status in the shared numeric taxonomy.
    pub status: Status,
    /// Generator or listing exit code, when a collaborator ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// Published artifact path; set only when a non-empty artifact exists.
    pub artifact: Option<PathBuf>,
    /// Resolved inputs: name to artifact path for MAKE, name to
    /// descriptor string for a bare INPUTS listing.
    pub inputs: BTreeMap<String, String>,
    /// Captured generator standard output, when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured generator standard error, when non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Diagnostic line describing a failure, when one was captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
    /// Request start time.
    pub started_at: DateTime<Utc>,
    /// Request completion time.
    pub finished_at: DateTime<Utc>,
}

impl GenerationReport {
    /// Fresh report for a product, in the initial no-content state.
    pub(crate) fn begun(product: String) -> Self {
        let now = Utc::now();
        Self {
            request_id: Uuid::new_v4(),
            product,
            status: Status::NO_CONTENT,
            exit_code: None,
            artifact: None,
            inputs: BTreeMap::new(),
            stdout: None,
            stderr: None,
            diagnostic: None,
            started_at: now,
            finished_at: now,
        }
    }
}

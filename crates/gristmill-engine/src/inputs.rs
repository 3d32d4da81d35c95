//! Input-listing collaborator invocation and output parsing.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::EngineResult;
use crate::exec;

/// Result of one input-listing invocation.
#[derive(Debug, Clone, Default)]
pub struct InputResolution {
    /// Listing script exit code; zero when the script was absent.
    pub exit_code: i32,
    /// Parsed `name → upstream descriptor string` pairs.
    pub inputs: BTreeMap<String, String>,
    /// Last output line retained as a diagnostic on failure.
    pub diagnostic: Option<String>,
}

impl InputResolution {
    /// `true` when the listing succeeded, including the no-script case.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run the input-listing executable if present. An absent script is a
/// valid zero-dependency state, not an error.
///
/// # Errors
///
/// Returns an error when the script exists but cannot be spawned.
pub fn resolve_listing(
    script: &Path,
    env: &BTreeMap<String, String>,
) -> EngineResult<InputResolution> {
    if !script.exists() {
        debug!(script = %script.display(), "no input-listing script; zero inputs");
        return Ok(InputResolution::default());
    }

    let workdir = script.parent().unwrap_or_else(|| Path::new("."));
    let output = exec::run(script, workdir, env)?;
    if output.succeeded() {
        let inputs = parse_listing(&output.stdout);
        debug!(script = %script.display(), count = inputs.len(), "input listing resolved");
        return Ok(InputResolution {
            exit_code: 0,
            inputs,
            diagnostic: None,
        });
    }

    warn!(
        script = %script.display(),
        exit_code = output.exit_code,
        "input listing failed"
    );
    Ok(InputResolution {
        exit_code: output.exit_code,
        inputs: BTreeMap::new(),
        diagnostic: output.last_line().map(str::to_string),
    })
}

/// Parse `name=value` lines. Blank lines and `#` comments are ignored;
/// a line without `=` is logged and skipped.
#[must_use]
pub fn parse_listing(text: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            warn!(line, "ignoring malformed input listing line");
            continue;
        };
        entries.insert(name.trim().to_string(), value.trim().to_string());
    }
    entries
}

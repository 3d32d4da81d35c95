//! Blocking invocation of collaborator executables.
//!
//! Collaborators are invoked with no arguments; everything they need
//! arrives through the working directory and a fully replaced
//! environment. Invocation blocks until the child exits; there is no
//! timeout, so a hung child blocks its request chain indefinitely.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::process::Command;

use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::paths::path_with_suffix;
use crate::status::Status;

/// Captured result of one collaborator invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// Child exit code; `-1` when the child terminated without one.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// `true` when the child exited zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Combined capture: standard output followed by standard error.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&self.stderr);
        }
        combined
    }

    /// Last non-empty line of the capture. Standard output is preferred:
    /// collaborators report their status there by convention.
    #[must_use]
    pub fn last_line(&self) -> Option<&str> {
        self.stdout
            .lines()
            .rev()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .or_else(|| {
                self.stderr
                    .lines()
                    .rev()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
            })
    }

    /// Status self-reported by the child: the leading integer token of
    /// the last output line, when it falls in the conventional code
    /// range.
    #[must_use]
    pub fn reported_status(&self) -> Option<Status> {
        let token = self.last_line()?.split_whitespace().next()?;
        token.parse::<u16>().ok().and_then(Status::from_code)
    }
}

/// Run `executable` with no arguments, `workdir` as working directory,
/// and `env` as the entire child environment, blocking until it exits.
///
/// # Errors
///
/// Returns an error when the child cannot be spawned or awaited. A
/// non-zero exit is not an error here; callers inspect the output.
pub fn run(
    executable: &Path,
    workdir: &Path,
    env: &BTreeMap<String, String>,
) -> EngineResult<ProcessOutput> {
    let output = Command::new(executable)
        .current_dir(workdir)
        .env_clear()
        .envs(env)
        .output()
        .map_err(|err| EngineError::process(executable, err))?;

    Ok(ProcessOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Persist non-empty captured streams beside the intended artifact as
/// `.stdout.log` / `.stderr.log` for postmortem diagnosis.
pub fn persist_failure_logs(final_path: &Path, output: &ProcessOutput) {
    for (suffix, content) in [(".stdout.log", &output.stdout), (".stderr.log", &output.stderr)] {
        if content.is_empty() {
            continue;
        }
        let log_path = path_with_suffix(final_path, suffix);
        warn!(path = %log_path.display(), "writing generator failure log");
        if let Err(err) = fs::write(&log_path, content) {
            warn!(path = %log_path.display(), error = %err, "failed to persist failure log");
        }
    }
}

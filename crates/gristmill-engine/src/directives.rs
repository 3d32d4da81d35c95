//! Post-success directive application.
//!
//! Directives are strictly advisory: each failure is caught, logged at
//! warn level, and never changes the request's outcome.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::{info, warn};

use crate::cache;
use crate::error::{EngineError, EngineResult};
use crate::paths::{ProductPaths, path_with_suffix};

/// Optional post-success instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Directive {
    /// Create or replace the static alias pointing at the artifact.
    Link,
    /// Create or replace the latest alias pointing at the artifact.
    Latest,
    /// Persist the captured generation output beside the artifact.
    Log,
}

impl Directive {
    /// Wire spelling used on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Link => "LINK",
            Self::Latest => "LATEST",
            Self::Log => "LOG",
        }
    }
}

impl FromStr for Directive {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LINK" => Ok(Self::Link),
            "LATEST" => Ok(Self::Latest),
            // DEBUG is a historical alias for LOG.
            "LOG" | "DEBUG" => Ok(Self::Log),
            other => Err(format!("unknown directive '{other}'")),
        }
    }
}

/// Apply every requested directive after a successful publication.
pub fn apply(directives: &BTreeSet<Directive>, paths: &ProductPaths, generator_output: &str) {
    for directive in directives {
        if let Err(err) = apply_one(*directive, paths, generator_output) {
            warn!(
                directive = directive.as_str(),
                error = %err,
                "directive application failed"
            );
        }
    }
}

fn apply_one(
    directive: Directive,
    paths: &ProductPaths,
    generator_output: &str,
) -> EngineResult<()> {
    match directive {
        Directive::Link => {
            alias(&paths.final_path, &paths.static_path, "LINK")?;
            info!(path = %paths.static_path.display(), "static alias updated");
        }
        Directive::Latest => {
            alias(&paths.final_path, &paths.latest_path, "LATEST")?;
            info!(path = %paths.latest_path.display(), "latest alias updated");
        }
        Directive::Log => {
            let log_path = path_with_suffix(&paths.final_path, ".log");
            fs::write(&log_path, generator_output)
                .map_err(|err| EngineError::directive("LOG", &log_path, err))?;
            info!(path = %log_path.display(), "generation log saved");
        }
    }
    Ok(())
}

fn alias(target: &Path, link: &Path, directive: &'static str) -> EngineResult<()> {
    if let Some(parent) = link.parent() {
        cache::ensure_dir(parent)?;
    }
    match fs::remove_file(link) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(EngineError::directive(directive, link, err)),
    }
    symlink(target, link).map_err(|err| EngineError::directive(directive, link, err))
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    // Platforms without symlinks publish the alias as a plain copy.
    fs::copy(target, link).map(|_| ())
}

//! Cache classification and the placeholder advisory lock.
//!
//! Coordination between independent callers happens only through
//! filesystem state: a zero-length file at the final artifact path marks a
//! generation in progress. Acquisition uses an atomic create-exclusive
//! open, so two callers that both classified a miss cannot both proceed;
//! the loser observes the placeholder and reports busy.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Cache classification for a product's final path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheState {
    /// Non-empty artifact present.
    Hit,
    /// Zero-length placeholder present: generation in progress elsewhere.
    Busy,
    /// Nothing at the final path.
    Miss,
}

/// Classify the final path per the placeholder protocol.
///
/// # Errors
///
/// Returns an error for filesystem faults other than the path being
/// absent.
pub fn classify(final_path: &Path) -> EngineResult<CacheState> {
    match fs::metadata(final_path) {
        Ok(meta) if meta.len() > 0 => Ok(CacheState::Hit),
        Ok(_) => Ok(CacheState::Busy),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(CacheState::Miss),
        Err(err) => Err(EngineError::io("cache.classify", final_path, err)),
    }
}

/// Create `dir` and its parents if missing, tolerating concurrent
/// creation by another caller.
///
/// # Errors
///
/// Returns an error when the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> EngineResult<()> {
    fs::create_dir_all(dir).map_err(|err| EngineError::io("cache.ensure_dir", dir, err))
}

/// Delete a published artifact.
///
/// # Errors
///
/// Returns an error when the artifact is absent or cannot be removed;
/// callers are expected to check existence first.
pub fn delete_artifact(final_path: &Path) -> EngineResult<()> {
    fs::remove_file(final_path).map_err(|err| EngineError::io("cache.delete", final_path, err))
}

/// Advisory generation lock: a zero-length file created exclusively at
/// the final artifact path.
///
/// Dropping the guard without publishing removes the placeholder, so a
/// failed generation does not leave the slot in perpetual busy state.
#[derive(Debug)]
pub struct PlaceholderLock {
    path: PathBuf,
    armed: bool,
}

impl PlaceholderLock {
    /// Attempt to acquire the placeholder. `Ok(None)` means another
    /// caller holds it (or an artifact appeared concurrently) and this
    /// request must report busy.
    ///
    /// # Errors
    ///
    /// Returns an error for filesystem faults other than the path already
    /// existing.
    pub fn acquire(final_path: &Path) -> EngineResult<Option<Self>> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(final_path)
        {
            Ok(_) => Ok(Some(Self {
                path: final_path.to_path_buf(),
                armed: true,
            })),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(None),
            Err(err) => Err(EngineError::io(
                "cache.acquire_placeholder",
                final_path,
                err,
            )),
        }
    }

    /// Atomically replace the placeholder with the completed temp
    /// artifact. A concurrent reader of the final path observes either
    /// the zero-length placeholder or the complete artifact.
    ///
    /// # Errors
    ///
    /// Returns an error when the rename fails; the placeholder is removed
    /// in that case.
    pub fn publish(mut self, temp_path: &Path) -> EngineResult<()> {
        fs::rename(temp_path, &self.path)
            .map_err(|err| EngineError::io("cache.publish", temp_path, err))?;
        self.armed = false;
        Ok(())
    }

    /// Remove the placeholder without publishing.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        if let Err(err) = fs::remove_file(&self.path)
            && err.kind() != io::ErrorKind::NotFound
        {
            warn!(path = %self.path.display(), error = %err, "failed to remove placeholder");
        }
    }
}

impl Drop for PlaceholderLock {
    fn drop(&mut self) {
        self.remove();
    }
}

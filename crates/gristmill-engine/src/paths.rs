//! Derivation of cache-relevant filesystem paths.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::descriptor::ProductDescriptor;
use crate::error::{EngineError, EngineResult};

/// Subdirectory of the partition that holds in-progress temp files.
const TMP_DIR_NAME: &str = "tmp";

/// Every filesystem location derived from one descriptor. Pure
/// computation; nothing here touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPaths {
    /// Directory expected to contain the product's collaborator executables.
    pub generator_dir: PathBuf,
    /// Final artifact location under the time and type partitions.
    pub final_path: PathBuf,
    /// In-progress location under the partition's `tmp/` subdirectory.
    pub temp_path: PathBuf,
    /// Static alias location: the time partition omitted.
    pub static_path: PathBuf,
    /// Latest alias location under the type partition.
    pub latest_path: PathBuf,
}

impl ProductPaths {
    /// Resolve every location for `descriptor` against the configured roots.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDescriptor` when the descriptor has no id or no
    /// output format.
    pub fn resolve(
        descriptor: &ProductDescriptor,
        product_root: &Path,
        cache_root: &Path,
    ) -> EngineResult<Self> {
        if descriptor.id.is_empty() {
            return Err(EngineError::invalid_descriptor(
                descriptor.filename(),
                "missing product id",
            ));
        }
        if descriptor.format.is_empty() {
            return Err(EngineError::invalid_descriptor(
                descriptor.filename(),
                "missing output format",
            ));
        }

        let type_segment = descriptor.type_segment();
        let filename = descriptor.filename();

        let partition = match descriptor.time_segment() {
            Some(time) => cache_root.join(time).join(&type_segment),
            None => cache_root.join(&type_segment),
        };
        let type_dir = cache_root.join(&type_segment);

        Ok(Self {
            generator_dir: product_root.join(&type_segment),
            final_path: partition.join(&filename),
            temp_path: partition.join(TMP_DIR_NAME).join(&filename),
            static_path: type_dir.join(&filename),
            latest_path: type_dir.join(descriptor.latest_filename()),
        })
    }
}

/// Append `suffix` to the final component of `path`
/// (`artifact.png` + `.log` → `artifact.png.log`).
#[must_use]
pub fn path_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

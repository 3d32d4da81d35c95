//! Typed configuration model.

use std::path::PathBuf;

use serde::Serialize;

use crate::defaults;

/// Engine configuration: filesystem roots and collaborator script names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineConfig {
    /// Root of the product definition tree; generator scripts live under
    /// one directory per dot-segment of the product id.
    pub product_root: PathBuf,
    /// Root of the artifact cache.
    pub cache_root: PathBuf,
    /// Filename of the generator executable within each product directory.
    pub generator_script: String,
    /// Filename of the input-listing executable within each product directory.
    pub input_script: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            product_root: PathBuf::from(defaults::PRODUCT_ROOT),
            cache_root: PathBuf::from(defaults::CACHE_ROOT),
            generator_script: defaults::GENERATOR_SCRIPT.to_string(),
            input_script: defaults::INPUT_SCRIPT.to_string(),
        }
    }
}

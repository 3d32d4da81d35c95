//! Built-in configuration defaults.

/// Default root of the product definition tree.
pub const PRODUCT_ROOT: &str = ".";

/// Default root of the artifact cache.
pub const CACHE_ROOT: &str = ".";

/// Default generator executable filename within a product directory.
pub const GENERATOR_SCRIPT: &str = "generate.sh";

/// Default input-listing executable filename within a product directory.
pub const INPUT_SCRIPT: &str = "input.sh";

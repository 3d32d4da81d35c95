//! File-based configuration for the gristmill product service.
//!
//! Layout: `model.rs` (typed configuration), `defaults.rs` (built-in
//! values), `loader.rs` (`KEY=value` file parsing), `error.rs`.
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::load;
pub use model::EngineConfig;

//! On-demand product generation engine.
//!
//! A request names a product (type id, optional timestamp, parameters) and
//! is resolved against a filesystem cache: a non-empty artifact is served
//! as-is, a zero-length placeholder means another caller is generating, and
//! a miss drives an external generator script after recursively resolving
//! the product's upstream inputs. Completed artifacts are published with a
//! single atomic rename.
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

pub mod cache;
pub mod descriptor;
pub mod directives;
pub mod error;
pub mod exec;
pub mod inputs;
pub mod paths;
pub mod request;
pub mod service;
pub mod status;

pub use cache::{CacheState, PlaceholderLock};
pub use descriptor::{ProductDescriptor, Timestamp};
pub use directives::Directive;
pub use error::{EngineError, EngineResult};
pub use exec::ProcessOutput;
pub use inputs::InputResolution;
pub use paths::ProductPaths;
pub use request::{Action, GenerationReport};
pub use service::ProductService;
pub use status::Status;

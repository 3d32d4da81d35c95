//! Test fixtures: executable collaborator scripts and product trees.
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

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script at `path`, creating parent
/// directories as needed.
///
/// # Errors
///
/// Returns an error if the script or its parent directories cannot be
/// written.
pub fn write_script(path: &Path, body: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, format!("#!/bin/sh\n{body}\n"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Directory holding the collaborator scripts for `product_id` under
/// `product_root` (one directory per dot-segment).
#[must_use]
pub fn product_dir(product_root: &Path, product_id: &str) -> PathBuf {
    let mut dir = product_root.to_path_buf();
    for segment in product_id.split('.') {
        dir.push(segment);
    }
    dir
}

/// Install a collaborator script named `script_name` for `product_id` and
/// return its path.
///
/// # Errors
///
/// Returns an error if the script cannot be written.
pub fn install_script(
    product_root: &Path,
    product_id: &str,
    script_name: &str,
    body: &str,
) -> io::Result<PathBuf> {
    let path = product_dir(product_root, product_id).join(script_name);
    write_script(&path, body)?;
    Ok(path)
}

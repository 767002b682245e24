//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::{fs, io, path::Path};
use tempfile::{tempdir, TempDir};

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times; subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[allow(dead_code)]
pub fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let ty = entry.file_type()?;
        if ty.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}

/// Copy a checked-in fixture vault (`tests/<name>`) into `<temp_dir>/vault`.
///
/// Converted output is expected under `<temp_dir>/source/sections`.
#[allow(dead_code)]
pub fn generate_test_root(vault: &str) -> io::Result<TempDir> {
    let temp_dir = tempdir()?;
    let content_root = Path::new("tests").join(vault);
    tracing::debug!("Copying content from {:?}", content_root);
    copy_dir_all(&content_root, temp_dir.path().join("vault"))?;
    Ok(temp_dir)
}

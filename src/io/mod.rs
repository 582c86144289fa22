//! Input/output helpers.
//!
//! - application CSV/JSON ingest (`ingest`)
//! - batch result export (`export`)

use std::fs;
use std::path::Path;

use crate::error::AppError;

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;

/// Create the parent directory of an output file if it is missing.
pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), AppError> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|e| AppError::runtime(format!("Failed to create '{}': {e}", parent.display()))),
        None => Ok(()),
    }
}

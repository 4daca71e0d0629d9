//! Library directory path expansion

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

/// Expand a leading `~` to the current user's home directory.
///
/// Only a `~` that is the whole path or is followed by a separator is
/// expanded; `~alice/...` and a `~` later in the path are left alone.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    expand_home_with(path, dirs::home_dir().as_deref())
}

fn expand_home_with(path: &str, home: Option<&Path>) -> Result<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return Ok(PathBuf::from(path)),
    };

    let home = home.ok_or_else(|| {
        PipelineError::config(format!("cannot expand '{}': home directory is unknown", path))
    })?;

    Ok(if rest.is_empty() {
        home.to_path_buf()
    } else {
        home.join(rest)
    })
}

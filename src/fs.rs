// src/fs.rs

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::error::{IoResultExt, Result};

/// Create the parent directory of `path` if it is missing. Succeeds when the
/// directory already exists or `path` has no parent component.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => fs::create_dir_all(dir).at_path(dir),
        _ => Ok(()),
    }
}

/// Temporary sibling used while `path` is being written: `.<name>.tmp`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

/// Run `write` against a temporary sibling of `path`, then rename it into
/// place. On failure the temporary file is removed and `path` is untouched.
pub fn publish<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let tmp = temp_path_for(path);
    if let Err(e) = write(&tmp) {
        silent_remove(&tmp);
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp, path) {
        silent_remove(&tmp);
        return Err(e).at_path(path);
    }
    Ok(())
}

/// Remove a file or directory if it exists, ignoring any error.
pub fn silent_remove(path: &Path) {
    let res = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        Ok(())
    };
    if let Err(e) = res {
        warn!(path = %path.display(), "could not remove: {}", e);
    }
}

/// File name without directory or extension: `a/b/name.ext` → `name`.
pub fn file_stem_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

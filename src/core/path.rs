//! Mapping between configuration locations and filesystem paths.
//!
//! Every configuration lives at `<root>/<program>/<file>`. These functions
//! compute that path and take it apart again; neither touches the filesystem.

use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};

/// Join a root, program name and file name into a full configuration path.
///
/// # Examples
///
/// ```rust
/// use progconf::core::build_path;
/// use std::path::Path;
///
/// let path = build_path("/etc", "fonts", "fonts.conf");
/// assert_eq!(path, Path::new("/etc/fonts/fonts.conf"));
/// ```
pub fn build_path(root: impl AsRef<Path>, program: &str, file: &str) -> PathBuf {
    root.as_ref().join(program).join(file)
}

/// Split a full configuration path into `(root, program, file)`.
///
/// The layout is assumed to be exactly three levels deep: the last segment is
/// the file, the one before it the program directory, and everything above is
/// the root.
///
/// # Errors
///
/// Returns [`ConfigError::DecompositionError`] when any of the three parts
/// would be empty, e.g. `fonts/fonts.conf` (no root) or a bare file name.
///
/// # Examples
///
/// ```rust
/// use progconf::core::split_path;
/// use std::path::PathBuf;
///
/// let (root, program, file) = split_path("/etc/fonts/fonts.conf").unwrap();
/// assert_eq!(root, PathBuf::from("/etc"));
/// assert_eq!(program, "fonts");
/// assert_eq!(file, "fonts.conf");
///
/// assert!(split_path("fonts.conf").is_err());
/// ```
pub fn split_path(full: impl AsRef<Path>) -> Result<(PathBuf, String, String)> {
    let full = full.as_ref();
    let fail = || ConfigError::DecompositionError(full.to_path_buf());

    let file = full.file_name().and_then(|f| f.to_str()).ok_or_else(fail)?;
    let dir = full.parent().ok_or_else(fail)?;
    let program = dir.file_name().and_then(|p| p.to_str()).ok_or_else(fail)?;
    let root = dir.parent().ok_or_else(fail)?;

    if root.as_os_str().is_empty() || program.is_empty() || file.is_empty() {
        return Err(fail());
    }

    Ok((root.to_path_buf(), program.to_string(), file.to_string()))
}

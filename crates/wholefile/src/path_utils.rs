// Copyright (c) The Wholefile Project Authors.
// Licensed under the MIT License.

use std::ffi::OsStr;
use std::io::{Error, ErrorKind, Result};
use std::path::{Component, Path, PathBuf};

/// Joins a relative `path` onto `base`, rejecting any traversal that would
/// escape the directory cone rooted at `base`.
///
/// `.` segments are dropped and `..` segments cancel a previously kept
/// segment; a `..` with nothing left to cancel is an escape and fails with
/// [`ErrorKind::InvalidInput`], as do absolute paths and drive prefixes.
///
/// # Limitations
///
/// Validation is purely lexical and does **not** resolve symbolic links. A
/// path such as `symlink_to_parent/../../etc/passwd` passes validation if
/// the symlink component is treated as a normal directory name.
pub fn safe_join(base: impl AsRef<Path>, path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut kept: Vec<&OsStr> = Vec::new();

    for component in path.as_ref().components() {
        match component {
            Component::Normal(segment) => kept.push(segment),
            Component::CurDir => {}
            Component::ParentDir => {
                if kept.pop().is_none() {
                    return Err(Error::new(ErrorKind::InvalidInput, "path escapes the directory"));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "absolute paths are not permitted in capability-based access",
                ));
            }
        }
    }

    let mut joined = base.as_ref().to_path_buf();
    joined.extend(kept);
    Ok(joined)
}

// src/core/paths.rs

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("Could not expand path '{path}': {reason}")]
    Expansion { path: String, reason: String },
    #[error("Could not determine the current directory")]
    CurrentDir {
        #[source]
        source: std::io::Error,
    },
}

/// Expands `~` and environment variables (`$VAR` / `%VAR%`) in a
/// user-supplied path string.
pub fn expand_user(input: &str) -> Result<PathBuf, PathError> {
    let expanded = shellexpand::full(input).map_err(|e| PathError::Expansion {
        path: input.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

/// Returns `path` simplified for display (strips Windows `\\?\` prefixes).
pub fn display(path: &Path) -> String {
    dunce::simplified(path).display().to_string()
}

/// Anchors a relative path at the current directory; absolute paths pass
/// through untouched.
pub fn absolutize(path: PathBuf) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(|e| PathError::CurrentDir { source: e })?;
    Ok(cwd.join(path))
}

/// Computes the relative path from `base` to `path` lexically, without
/// touching the filesystem.
///
/// Returns `None` when no purely lexical answer exists: a relative `path`
/// against an absolute `base`, or a `base` containing `..` components whose
/// targets cannot be known without resolving them.
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return if path.is_absolute() {
            Some(path.to_path_buf())
        } else {
            None
        };
    }

    let mut path_iter = path.components();
    let mut base_iter = base.components();
    let mut comps: Vec<Component<'_>> = Vec::new();
    loop {
        match (path_iter.next(), base_iter.next()) {
            (None, None) => break,
            (Some(p), None) => {
                comps.push(p);
                comps.extend(path_iter.by_ref());
                break;
            }
            (None, _) => comps.push(Component::ParentDir),
            (Some(p), Some(b)) if comps.is_empty() && p == b => {}
            (Some(p), Some(Component::CurDir)) => comps.push(p),
            (Some(_), Some(Component::ParentDir)) => return None,
            (Some(p), Some(_)) => {
                comps.push(Component::ParentDir);
                for _ in base_iter.by_ref() {
                    comps.push(Component::ParentDir);
                }
                comps.push(p);
                comps.extend(path_iter.by_ref());
                break;
            }
        }
    }
    Some(comps.iter().map(|c| c.as_os_str()).collect())
}

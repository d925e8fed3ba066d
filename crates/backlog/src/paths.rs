// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boundary-safe path containment.
//!
//! Naked prefix matching is forbidden: `docs/` must never match
//! `docs2/readme.md`. Containment is decided segment-wise after
//! normalization, case-sensitively.

use lv_core::{Policy, TaskSpec};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,
    #[error("path has a leading slash: {0:?}")]
    LeadingSlash(String),
    #[error("path contains a {1:?} segment: {0:?}")]
    BadSegment(String, String),
    #[error("path contains a backslash: {0:?}")]
    Backslash(String),
}

/// Normalize a declared path: forward slashes only, no leading slash, no
/// `.`/`..`/empty segments. A single trailing slash marks a directory
/// prefix and is preserved.
pub fn normalize_path(path: &str) -> Result<String, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    if path.contains('\\') {
        return Err(PathError::Backslash(path.to_string()));
    }
    if path.starts_with('/') {
        return Err(PathError::LeadingSlash(path.to_string()));
    }

    let is_dir_prefix = path.ends_with('/');
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    if trimmed.is_empty() {
        return Err(PathError::Empty);
    }
    for segment in trimmed.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(PathError::BadSegment(path.to_string(), segment.to_string()));
        }
    }

    let mut normalized = trimmed.to_string();
    if is_dir_prefix {
        normalized.push('/');
    }
    Ok(normalized)
}

/// Boundary-safe containment of a normalized path under one normalized
/// prefix. A slash-terminated prefix contains its own directory and
/// everything below it; a concrete file path contains only itself.
fn contained_in(path: &str, prefix: &str) -> bool {
    if path == prefix {
        return true;
    }
    match prefix.strip_suffix('/') {
        Some(dir) => path == dir || path.starts_with(prefix),
        // Concrete file: equality only, but tolerate a declared dir
        // prefix missing its slash by requiring a separator boundary.
        None => path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/')),
    }
}

/// Whether `path` is contained under any entry of `allowed`.
pub fn is_path_allowed(path: &str, allowed: &[String]) -> bool {
    let Ok(path) = normalize_path(path) else {
        return false;
    };
    allowed
        .iter()
        .any(|entry| normalize_path(entry).is_ok_and(|entry| contained_in(&path, &entry)))
}

/// Whether `path` is allowed by some policy prefix.
pub fn is_path_within_policy(path: &str, policy: &Policy) -> bool {
    is_path_allowed(path, &policy.allowed_path_prefixes)
}

/// Whether every path the task declares is allowed by the policy.
pub fn is_task_in_scope(task: &TaskSpec, policy: &Policy) -> bool {
    !task.allowed_paths.is_empty()
        && task.allowed_paths.iter().all(|p| is_path_within_policy(p, policy))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task editor contract.
//!
//! Editors are external collaborators: the docs and tests generators are
//! their own programs. The worker only needs this seam: hand it a
//! working tree and a task, get back the relative paths it touched. The
//! worker re-verifies every returned path against the task scope before
//! anything is staged.

use std::path::Path;

use async_trait::async_trait;
use lv_core::TaskSpec;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("editor failed: {0}")]
    Failed(String),
    #[error("editor I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait TaskEditor: Send + Sync {
    /// Apply the task's edit to the working tree. Returns the
    /// repo-relative paths that were modified.
    async fn edit(&self, workdir: &Path, task: &TaskSpec) -> Result<Vec<String>, EditorError>;
}

/// Runs an external editor program.
///
/// Contract: the program is invoked with the working tree as its current
/// directory, receives the task record as JSON on stdin, and prints one
/// repo-relative modified path per stdout line. A non-zero exit is a
/// failure; stderr is surfaced in the error summary.
pub struct CommandEditor {
    program: String,
}

impl CommandEditor {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

#[async_trait]
impl TaskEditor for CommandEditor {
    async fn edit(&self, workdir: &Path, task: &TaskSpec) -> Result<Vec<String>, EditorError> {
        use tokio::io::AsyncWriteExt;

        let task_json = serde_json::to_string(task)
            .map_err(|err| EditorError::Failed(format!("task not serializable: {err}")))?;

        let mut child = tokio::process::Command::new(&self.program)
            .current_dir(workdir)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(task_json.as_bytes()).await?;
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(EditorError::Failed(format!(
                "editor exited {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim(),
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod tests;

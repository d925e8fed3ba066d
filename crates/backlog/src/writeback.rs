// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backlog writeback: the worker's final commit marks the executed task
//! `status: completed, ready: false` and records attempt metadata. This
//! is the mechanism that prevents re-execution of a delivered task.
//!
//! The mutation operates on the YAML value tree so unrecognized fields in
//! the document survive round-tripping.

use lv_core::AttemptNote;
use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WritebackError {
    #[error("backlog is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("backlog has no tasks sequence")]
    NoTasks,
    #[error("task not found in backlog: {0}")]
    TaskNotFound(String),
}

/// Render the updated backlog document with `task_id` marked completed.
pub fn mark_task_completed(
    backlog_yaml: &str,
    task_id: &str,
    note: &AttemptNote,
) -> Result<String, WritebackError> {
    let mut doc: Value = serde_yaml::from_str(backlog_yaml)?;

    let tasks = doc
        .get_mut("tasks")
        .and_then(|t| t.as_sequence_mut())
        .ok_or(WritebackError::NoTasks)?;

    let task = tasks
        .iter_mut()
        .filter_map(|t| t.as_mapping_mut())
        .find(|m| m.get("id").and_then(|v| v.as_str()) == Some(task_id))
        .ok_or_else(|| WritebackError::TaskNotFound(task_id.to_string()))?;

    task.insert(Value::from("status"), Value::from("completed"));
    task.insert(Value::from("ready"), Value::from(false));

    let mut note_map = Mapping::new();
    note_map.insert(Value::from("attemptId"), Value::from(note.attempt_id.as_str()));
    note_map.insert(Value::from("branch"), Value::from(note.branch.as_str()));
    note_map.insert(Value::from("completedAt"), Value::from(note.completed_at.as_str()));

    match task.get_mut("attempts").and_then(|v| v.as_sequence_mut()) {
        Some(attempts) => attempts.push(Value::Mapping(note_map)),
        None => {
            task.insert(Value::from("attempts"), Value::Sequence(vec![Value::Mapping(note_map)]));
        }
    }

    Ok(serde_yaml::to_string(&doc)?)
}

#[cfg(test)]
#[path = "writeback_tests.rs"]
mod tests;

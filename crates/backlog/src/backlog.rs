// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `.leviathan/backlog.yaml` reader and task selection.

use std::collections::HashSet;

use lv_core::{Policy, TaskSpec, TaskStatus};
use serde::Deserialize;
use thiserror::Error;

use crate::paths::{is_task_in_scope, normalize_path};

#[derive(Debug, Error)]
pub enum BacklogError {
    #[error("backlog is not valid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("duplicate task id: {0}")]
    DuplicateTaskId(String),
    #[error("task {task}: {reason}")]
    InvalidTask { task: String, reason: String },
}

/// Parsed backlog: the ordered task list of one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Backlog {
    pub tasks: Vec<TaskSpec>,
}

#[derive(Debug, Deserialize)]
struct BacklogDoc {
    #[serde(default)]
    tasks: Vec<TaskSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StrictBacklogDoc {
    #[serde(rename = "schemaVersion")]
    _schema_version: u32,
    #[serde(default)]
    tasks: Vec<TaskSpec>,
}

impl Backlog {
    /// Parse and validate. Duplicate ids and malformed paths are rejected
    /// before scheduling ever sees the document.
    pub fn from_yaml(yaml: &str) -> Result<Self, BacklogError> {
        let probe: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let strict = probe.get("schemaVersion").is_some();

        let tasks = if strict {
            reject_unknown_task_keys(&probe)?;
            serde_yaml::from_str::<StrictBacklogDoc>(yaml)?.tasks
        } else {
            serde_yaml::from_str::<BacklogDoc>(yaml)?.tasks
        };

        let mut seen = HashSet::new();
        for task in &tasks {
            if task.id.is_empty() {
                return Err(BacklogError::InvalidTask {
                    task: task.title.clone(),
                    reason: "id must be non-empty".to_string(),
                });
            }
            if !seen.insert(task.id.clone()) {
                return Err(BacklogError::DuplicateTaskId(task.id.clone()));
            }
            for path in &task.allowed_paths {
                normalize_path(path).map_err(|err| BacklogError::InvalidTask {
                    task: task.id.clone(),
                    reason: err.to_string(),
                })?;
            }
        }

        Ok(Self { tasks })
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Whether every dependency exists in this backlog with
    /// `status: completed`.
    pub fn dependencies_satisfied(&self, task: &TaskSpec) -> bool {
        task.dependencies.iter().all(|dep| {
            self.get(dep).is_some_and(|t| t.status == TaskStatus::Completed)
        })
    }
}

/// Recognized task-record keys, for strict-mode validation.
/// `deny_unknown_fields` on the document only covers the top level.
const TASK_KEYS: &[&str] = &[
    "id",
    "title",
    "scope",
    "ready",
    "status",
    "priority",
    "allowedPaths",
    "dependencies",
    "acceptanceCriteria",
    "attempts",
];

fn reject_unknown_task_keys(probe: &serde_yaml::Value) -> Result<(), BacklogError> {
    let Some(tasks) = probe.get("tasks").and_then(|t| t.as_sequence()) else {
        return Ok(());
    };
    for task in tasks {
        let Some(mapping) = task.as_mapping() else {
            continue;
        };
        let id = task.get("id").and_then(|v| v.as_str()).unwrap_or("<missing id>");
        for key in mapping.keys() {
            if let Some(key) = key.as_str() {
                if !TASK_KEYS.contains(&key) {
                    return Err(BacklogError::InvalidTask {
                        task: id.to_string(),
                        reason: format!("unknown field {key:?}"),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Pick the task the scheduler should run: ready, pending, dependencies
/// satisfied, in scope. Highest priority wins; ties go to backlog order.
pub fn select_candidate<'a>(backlog: &'a Backlog, policy: &Policy) -> Option<&'a TaskSpec> {
    let mut best: Option<&TaskSpec> = None;
    for task in &backlog.tasks {
        if !task.is_executable()
            || !backlog.dependencies_satisfied(task)
            || !is_task_in_scope(task, policy)
        {
            continue;
        }
        match best {
            Some(current) if task.priority <= current.priority => {}
            _ => best = Some(task),
        }
    }
    best
}

#[cfg(test)]
#[path = "backlog_tests.rs"]
mod tests;

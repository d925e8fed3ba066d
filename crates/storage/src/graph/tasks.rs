// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task lifecycle handlers.

use lv_core::{EventKind, TaskStatus};

use super::{EdgeKind, Graph, TaskNode};
use crate::journal::JournalEntry;

/// Ensure a task node exists; attempts may reference tasks the control
/// plane never saw a `task.created` for.
pub(crate) fn ensure_task(graph: &mut Graph, target: &str, task_id: &str, title: &str) {
    let key = Graph::task_key(target, task_id);
    if !graph.tasks.contains_key(&key) {
        graph.tasks.insert(
            key.clone(),
            TaskNode {
                target: target.to_string(),
                id: task_id.to_string(),
                title: title.to_string(),
                status: TaskStatus::Pending,
                completed_by: None,
            },
        );
    }
    graph.push_edge(target, &key, EdgeKind::HasTask);
}

pub(crate) fn apply(graph: &mut Graph, entry: &JournalEntry) {
    match &entry.event.kind {
        EventKind::TaskCreated { task_id, title } => {
            ensure_task(graph, &entry.target, task_id, title);
        }

        EventKind::TaskUpdated { task_id, status } => {
            let key = Graph::task_key(&entry.target, task_id);
            if let Some(task) = graph.tasks.get_mut(&key) {
                // A completed task never returns to pending; only the
                // worker that produced the PR completes it.
                if task.status != TaskStatus::Completed {
                    task.status = *status;
                }
            }
        }

        EventKind::TaskCompleted { task_id, attempt_id } => {
            ensure_task(graph, &entry.target, task_id, task_id);
            let key = Graph::task_key(&entry.target, task_id);
            if let Some(task) = graph.tasks.get_mut(&key) {
                if task.status != TaskStatus::Completed {
                    task.status = TaskStatus::Completed;
                    task.completed_by = Some(attempt_id.to_string());
                }
            }
        }

        _ => {}
    }
}

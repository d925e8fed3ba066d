// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The projection is a pure function of the journal prefix.

use super::*;
use lv_core::EventKind;
use proptest::prelude::*;

fn arbitrary_kind() -> impl Strategy<Value = EventKind> {
    let attempt_ids = prop_oneof![Just("att-1"), Just("att-2"), Just("att-3")];
    let tasks = prop_oneof![Just("alpha"), Just("beta")];
    (attempt_ids, tasks, 0u8..6).prop_map(|(attempt, task, which)| {
        let attempt_id = lv_core::AttemptId::from_string(attempt);
        match which {
            0 => EventKind::AttemptCreated {
                attempt_id,
                task_id: task.to_string(),
                attempt_number: 1,
            },
            1 => EventKind::AttemptStarted { attempt_id },
            2 => EventKind::AttemptSucceeded { attempt_id },
            3 => EventKind::AttemptFailed {
                attempt_id,
                failure_kind: lv_core::FailureKind::Push,
                error_summary: "push rejected".to_string(),
                artifact: None,
            },
            4 => EventKind::AttemptCancelled { attempt_id, error_summary: None },
            _ => EventKind::AttemptInvalidated {
                attempt_id,
                reason: "reset".to_string(),
            },
        }
    })
}

proptest! {
    #[test]
    fn projection_is_deterministic(kinds in proptest::collection::vec(arbitrary_kind(), 0..40)) {
        let mut feed = Feed::new();
        let entries: Vec<JournalEntry> =
            kinds.into_iter().map(|k| feed.entry("demo", k)).collect();

        let mut a = Graph::default();
        a.apply_all(&entries);
        let mut b = Graph::default();
        b.apply_all(&entries);

        // Equality via canonical JSON; HashMap iteration order must not
        // leak into the comparison.
        let ja = serde_json::to_value(a.summary()).unwrap();
        let jb = serde_json::to_value(b.summary()).unwrap();
        prop_assert_eq!(ja, jb);
        prop_assert_eq!(a.consecutive_failures("demo"), b.consecutive_failures("demo"));
        prop_assert_eq!(a.running_attempts("demo"), b.running_attempts("demo"));
    }

    #[test]
    fn replaying_a_prefix_twice_is_idempotent(kinds in proptest::collection::vec(arbitrary_kind(), 1..20)) {
        let mut feed = Feed::new();
        let entries: Vec<JournalEntry> =
            kinds.into_iter().map(|k| feed.entry("demo", k)).collect();

        let mut once = Graph::default();
        once.apply_all(&entries);

        let mut twice = Graph::default();
        twice.apply_all(&entries);
        twice.apply_all(&entries);

        prop_assert_eq!(
            serde_json::to_value(once.summary()).unwrap(),
            serde_json::to_value(twice.summary()).unwrap()
        );
        prop_assert_eq!(once.attempts.len(), twice.attempts.len());
        prop_assert_eq!(
            once.consecutive_failures("demo"),
            twice.consecutive_failures("demo")
        );
    }
}

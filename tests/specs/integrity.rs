// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hash-chain integrity: tampering is detected at the exact event, the
//! alarm refuses further ingestion, and duplicate bundles stay out.

use lv_adapters::{ControlError, ControlPlane};
use lv_core::test_support::event_at;
use lv_core::{AttemptId, Bundle, EventKind, FakeClock};
use lv_storage::{ChainVerdict, Journal, RangeFilter};
use tempfile::TempDir;

use crate::support::Rig;

fn bundle(clock: &FakeClock, attempts: &[&str]) -> Bundle {
    Bundle::new(
        "demo",
        attempts
            .iter()
            .map(|a| {
                event_at(clock, EventKind::AttemptStarted {
                    attempt_id: AttemptId::from_string(a),
                })
            })
            .collect(),
    )
}

#[tokio::test]
async fn tampering_reports_first_divergence_and_raises_the_alarm() {
    let dir = TempDir::new().unwrap();
    let journal_dir = dir.path().join("journal");
    let clock = FakeClock::new();
    {
        let mut journal = Journal::open(&journal_dir).unwrap();
        journal.append(&bundle(&clock, &["att-1", "att-2", "att-3"])).unwrap();
        assert!(journal.verify_chain(0, None).unwrap().is_valid());
    }

    // Externally alter the second event's payload.
    let segment = journal_dir.join("events-000000.ndjson");
    let content = std::fs::read_to_string(&segment).unwrap();
    std::fs::write(&segment, content.replace("att-2", "att-evil")).unwrap();

    let journal = Journal::open(&journal_dir).unwrap();
    match journal.verify_chain(0, None).unwrap() {
        ChainVerdict::Divergent { seq, .. } => assert_eq!(seq, 2),
        verdict => panic!("tampering not detected: {verdict:?}"),
    }

    // The server refuses ingestion while the alarm is raised.
    let state = lv_server::AppState::new(journal, lv_storage::Graph::default());
    state.raise_alarm();
    let err = lv_server::append_bundle(&state, &bundle(&clock, &["att-4"])).unwrap_err();
    assert!(err.to_string().contains("integrity alarm"));
}

#[tokio::test]
async fn duplicate_bundle_submission_is_a_conflict_with_one_set_of_entries() {
    let rig = Rig::new();
    let bundle = bundle(&rig.clock, &["att-1"]);

    rig.control.submit(&bundle).await.unwrap();
    let err = rig.control.submit(&bundle).await.unwrap_err();
    assert!(matches!(err, ControlError::Conflict));

    let entries = rig
        .state
        .journal
        .lock()
        .range(0, None, &RangeFilter::default())
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn every_entry_chains_to_its_predecessor() {
    let rig = Rig::new();
    for n in 0..3 {
        rig.control
            .submit(&bundle(&rig.clock, &[&format!("att-{n}")]))
            .await
            .unwrap();
    }

    let journal = rig.state.journal.lock();
    let entries = journal.range(0, None, &RangeFilter::default()).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].prev_hash, lv_core::GENESIS_HASH);
    for pair in entries.windows(2) {
        assert_eq!(pair[1].prev_hash, pair[0].hash);
    }
    assert!(journal.verify_chain(0, None).unwrap().is_valid());
}

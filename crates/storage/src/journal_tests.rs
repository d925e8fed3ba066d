// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lv_core::test_support::event_at;
use lv_core::{AttemptId, EventId, EventKind, FakeClock};
use std::io::Write as _;
use tempfile::tempdir;

fn attempt_event(clock: &FakeClock, attempt: &str) -> Event {
    event_at(clock, EventKind::AttemptStarted { attempt_id: AttemptId::from_string(attempt) })
}

fn bundle_of(clock: &FakeClock, target: &str, attempts: &[&str]) -> Bundle {
    Bundle::new(target, attempts.iter().map(|a| attempt_event(clock, a)).collect())
}

#[test]
fn open_creates_dir_and_sidecar() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("journal");

    let journal = Journal::open(&path).unwrap();

    assert!(path.join("tip.json").exists());
    assert_eq!(journal.tip(), (0, GENESIS_HASH.to_string()));
}

#[test]
fn append_assigns_contiguous_seqs_and_chains() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open(dir.path().join("j")).unwrap();

    let receipt = journal.append(&bundle_of(&clock, "demo", &["att-1", "att-2"])).unwrap();
    assert_eq!(receipt.first_seq, 1);
    assert_eq!(receipt.last_seq, 2);

    let entries = journal.range(0, None, &RangeFilter::default()).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].seq, 1);
    assert_eq!(entries[0].prev_hash, GENESIS_HASH);
    assert_eq!(entries[1].prev_hash, entries[0].hash);
    assert_eq!(journal.tip(), (2, entries[1].hash.clone()));
    assert_eq!(receipt.tip_hash, entries[1].hash);
}

#[test]
fn append_rejects_empty_bundle_and_empty_target() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open(dir.path().join("j")).unwrap();

    let empty = Bundle::new("demo", vec![]);
    assert!(matches!(journal.append(&empty), Err(JournalError::EmptyBundle)));

    let no_target = bundle_of(&clock, "", &["att-1"]);
    assert!(matches!(journal.append(&no_target), Err(JournalError::EmptyTarget)));
}

#[test]
fn duplicate_event_id_rejects_whole_bundle() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open(dir.path().join("j")).unwrap();

    let mut bundle = bundle_of(&clock, "demo", &["att-1"]);
    bundle.events[0].event_id = EventId::from_string("evt-stable");
    journal.append(&bundle).unwrap();

    // Same id in a fresh bundle: conflict, nothing appended.
    let mut replay = bundle_of(&clock, "demo", &["att-2", "att-3"]);
    replay.events[1].event_id = EventId::from_string("evt-stable");
    let err = journal.append(&replay).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(journal.tip().0, 1);

    // Duplicate within one bundle is rejected too.
    let mut twice = bundle_of(&clock, "demo", &["att-4", "att-5"]);
    twice.events[1].event_id = twice.events[0].event_id;
    assert!(journal.append(&twice).unwrap_err().is_conflict());
}

#[test]
fn resubmitting_identical_bundle_conflicts() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open(dir.path().join("j")).unwrap();

    let bundle = bundle_of(&clock, "demo", &["att-1"]);
    journal.append(&bundle).unwrap();
    assert!(journal.append(&bundle).unwrap_err().is_conflict());
    assert_eq!(journal.range(0, None, &RangeFilter::default()).unwrap().len(), 1);
}

#[test]
fn reopen_restores_tip_and_id_index() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let path = dir.path().join("j");

    let bundle = bundle_of(&clock, "demo", &["att-1", "att-2"]);
    let tip = {
        let mut journal = Journal::open(&path).unwrap();
        journal.append(&bundle).unwrap();
        journal.tip()
    };

    let mut journal = Journal::open(&path).unwrap();
    assert_eq!(journal.tip(), tip);
    // The id index survives reopen.
    assert!(journal.append(&bundle).unwrap_err().is_conflict());
}

#[test]
fn range_filters_by_target_and_type() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open(dir.path().join("j")).unwrap();

    journal.append(&bundle_of(&clock, "demo", &["att-1"])).unwrap();
    journal.append(&bundle_of(&clock, "other", &["att-2"])).unwrap();
    journal
        .append(&Bundle::new(
            "demo",
            vec![event_at(
                &clock,
                EventKind::AttemptSucceeded { attempt_id: AttemptId::from_string("att-1") },
            )],
        ))
        .unwrap();

    let demo_only = RangeFilter { target: Some("demo".into()), event_type: None };
    assert_eq!(journal.range(0, None, &demo_only).unwrap().len(), 2);

    let started_only =
        RangeFilter { target: Some("demo".into()), event_type: Some("attempt.started".into()) };
    assert_eq!(journal.range(0, None, &started_only).unwrap().len(), 1);

    // since/until window.
    let window = journal.range(1, Some(2), &RangeFilter::default()).unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].seq, 2);
}

#[test]
fn segments_roll_over_and_read_in_order() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open_with_segment_size(dir.path().join("j"), 2).unwrap();

    for i in 0..5 {
        journal.append(&bundle_of(&clock, "demo", &[&format!("att-{i}")])).unwrap();
    }

    assert!(dir.path().join("j/events-000000.ndjson").exists());
    assert!(dir.path().join("j/events-000001.ndjson").exists());

    let entries = journal.range(0, None, &RangeFilter::default()).unwrap();
    let seqs: Vec<u64> = entries.iter().map(|e| e.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);

    // Reopen across segments keeps the chain tip.
    let tip = journal.tip();
    let reopened = Journal::open(dir.path().join("j")).unwrap();
    assert_eq!(reopened.tip(), tip);
}

#[test]
fn verify_chain_accepts_untampered_journal() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open(dir.path().join("j")).unwrap();
    journal.append(&bundle_of(&clock, "demo", &["att-1", "att-2", "att-3"])).unwrap();

    let verdict = journal.verify_chain(0, None).unwrap();
    assert_eq!(verdict, ChainVerdict::Valid { checked: 3 });
}

#[test]
fn verify_chain_reports_first_divergence_on_tamper() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let path = dir.path().join("j");
    {
        let mut journal = Journal::open(&path).unwrap();
        journal.append(&bundle_of(&clock, "demo", &["att-1", "att-2", "att-3"])).unwrap();
    }

    // Tamper with the second entry's payload, keeping valid JSON.
    let segment = path.join("events-000000.ndjson");
    let content = std::fs::read_to_string(&segment).unwrap();
    let tampered = content.replace("att-2", "att-X");
    assert_ne!(content, tampered);
    std::fs::write(&segment, tampered).unwrap();

    let journal = Journal::open(&path).unwrap();
    match journal.verify_chain(0, None).unwrap() {
        ChainVerdict::Divergent { seq, .. } => assert_eq!(seq, 2),
        verdict => panic!("expected divergence, got {verdict:?}"),
    }
}

#[test]
fn corrupt_tail_rotates_to_bak_and_preserves_valid_entries() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let path = dir.path().join("j");
    {
        let mut journal = Journal::open(&path).unwrap();
        journal.append(&bundle_of(&clock, "demo", &["att-1", "att-2"])).unwrap();
    }

    let segment = path.join("events-000000.ndjson");
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&segment).unwrap();
        f.write_all(b"not-valid-json\n").unwrap();
    }

    let journal = Journal::open(&path).unwrap();
    assert_eq!(journal.tip().0, 2);
    assert!(segment.with_extension("bak").exists());
    assert_eq!(journal.range(0, None, &RangeFilter::default()).unwrap().len(), 2);
}

#[test]
fn corrupt_tail_with_binary_data_is_handled() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let path = dir.path().join("j");
    {
        let mut journal = Journal::open(&path).unwrap();
        journal.append(&bundle_of(&clock, "demo", &["att-1"])).unwrap();
    }

    let segment = path.join("events-000000.ndjson");
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(&segment).unwrap();
        f.write_all(b"\x80\x81\xff\xfe\n").unwrap();
    }

    let journal = Journal::open(&path).unwrap();
    assert_eq!(journal.tip().0, 1);
    assert!(segment.with_extension("bak").exists());
}

#[test]
fn repeated_corruption_rotates_at_most_three_backups() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let path = dir.path().join("j");
    let segment = path.join("events-000000.ndjson");

    {
        let mut journal = Journal::open(&path).unwrap();
        journal.append(&bundle_of(&clock, "demo", &["att-1"])).unwrap();
    }

    for round in 0..4u8 {
        {
            let mut f = std::fs::OpenOptions::new().append(true).open(&segment).unwrap();
            f.write_all(format!("garbage-{round}\n").as_bytes()).unwrap();
        }
        Journal::open(&path).unwrap();
    }

    assert!(segment.with_extension("bak").exists());
    assert!(segment.with_extension("bak.2").exists());
    assert!(segment.with_extension("bak.3").exists());
    assert!(!segment.with_extension("bak.4").exists());
}

#[test]
fn journal_entry_wire_shape_flattens_event() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut journal = Journal::open(dir.path().join("j")).unwrap();
    journal.append(&bundle_of(&clock, "demo", &["att-1"])).unwrap();

    let entries = journal.range(0, None, &RangeFilter::default()).unwrap();
    let value = serde_json::to_value(&entries[0]).unwrap();
    let obj = value.as_object().unwrap();
    assert!(obj.contains_key("seq"));
    assert!(obj.contains_key("target"));
    assert!(obj.contains_key("prevHash"));
    assert!(obj.contains_key("hash"));
    assert!(obj.contains_key("eventId"));
    assert!(obj.contains_key("eventType"));
    assert!(obj.contains_key("payload"));
}

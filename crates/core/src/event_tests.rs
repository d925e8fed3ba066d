// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;

fn sample() -> Event {
    let clock = FakeClock::new();
    clock.set_epoch_ms(1_700_000_000_000);
    Event::now(
        &clock,
        "scheduler",
        EventKind::AttemptCreated {
            attempt_id: AttemptId::from_string("att-0000000000000000001"),
            task_id: "fix-readme".into(),
            attempt_number: 1,
        },
    )
}

#[test]
fn wire_shape_has_envelope_and_payload() {
    let event = sample();
    let value = serde_json::to_value(&event).unwrap();
    let obj = value.as_object().unwrap();

    assert!(obj.contains_key("eventId"));
    assert!(obj.contains_key("timestamp"));
    assert!(obj.contains_key("actorId"));
    assert_eq!(obj["eventType"], "attempt.created");

    let payload = obj["payload"].as_object().unwrap();
    assert_eq!(payload["taskId"], "fix-readme");
    assert_eq!(payload["attemptNumber"], 1);
}

#[test]
fn round_trips_through_json() {
    let event = sample();
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn timestamp_is_rfc3339_utc() {
    let event = sample();
    let value = serde_json::to_value(&event).unwrap();
    let ts = value["timestamp"].as_str().unwrap();
    assert!(ts.starts_with("2023-11-14T"), "unexpected timestamp {ts}");
    let parsed: chrono::DateTime<chrono::Utc> = ts.parse().unwrap();
    assert_eq!(parsed.timestamp_millis(), 1_700_000_000_000);
}

#[test]
fn unknown_event_type_deserializes_to_custom() {
    let json = r#"{
        "eventId": "evt-1",
        "timestamp": "2023-11-14T22:13:20Z",
        "actorId": "future-component",
        "eventType": "galaxy.exploded",
        "payload": {"whatever": true}
    }"#;
    let event: Event = serde_json::from_str(json).unwrap();
    assert_eq!(event.kind, EventKind::Custom);
}

#[test]
fn pr_created_flattens_pr_fields_into_payload() {
    let clock = FakeClock::new();
    let event = Event::now(
        &clock,
        "worker:att-1",
        EventKind::PrCreated {
            attempt_id: AttemptId::from_string("att-1"),
            pr: crate::pr::PullRequestRef {
                number: 42,
                url: "https://example.test/pr/42".into(),
                branch_name: "agent/fix-readme-att-1".into(),
                base_branch: "main".into(),
                head_commit: "deadbeef".into(),
            },
        },
    );
    let value = serde_json::to_value(&event).unwrap();
    let payload = value["payload"].as_object().unwrap();
    assert_eq!(payload["number"], 42);
    assert_eq!(payload["branchName"], "agent/fix-readme-att-1");
    assert_eq!(payload["attemptId"], "att-1");
}

#[test]
fn skip_reason_wire_values() {
    for (reason, expected) in [
        (SkipReason::AutonomyDisabled, "\"autonomyDisabled\""),
        (SkipReason::CircuitOpen, "\"circuitOpen\""),
        (SkipReason::PrCap, "\"prCap\""),
        (SkipReason::RunningCap, "\"runningCap\""),
        (SkipReason::FetchError, "\"fetchError\""),
        (SkipReason::NoCandidate, "\"noCandidate\""),
        (SkipReason::RetryCap, "\"retryCap\""),
        (SkipReason::DispatchError, "\"dispatchError\""),
    ] {
        assert_eq!(serde_json::to_string(&reason).unwrap(), expected);
    }
}

#[test]
fn type_name_matches_wire_tag() {
    let event = sample();
    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["eventType"], event.kind.type_name());
}

#[test]
fn attempt_id_accessor_covers_attempt_events() {
    let event = sample();
    assert_eq!(event.kind.attempt_id().map(|id| id.as_str()), Some("att-0000000000000000001"));

    let skip = EventKind::SchedulerSkipped {
        reason: SkipReason::PrCap,
        task_id: None,
        detail: None,
    };
    assert!(skip.attempt_id().is_none());
}

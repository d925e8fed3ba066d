// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn unconfigured_defaults_on_with_missing_source() {
    let switch = AutonomySwitch::unconfigured();
    let reading = switch.read();
    assert!(reading.enabled);
    assert_eq!(reading.source, "default(configMissing)");
}

#[test]
fn reads_file_on_every_call() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autonomy.yaml");
    std::fs::write(&path, "autonomyEnabled: true\n").unwrap();

    let switch = AutonomySwitch::new(Some(path.clone()));
    assert!(switch.read().enabled);

    // Operator flips the switch; the very next read sees it.
    std::fs::write(&path, "autonomyEnabled: false\n").unwrap();
    let reading = switch.read();
    assert!(!reading.enabled);
    assert!(reading.source.starts_with("file:"));
}

#[test]
fn missing_file_falls_back_to_last_known_good() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autonomy.yaml");
    std::fs::write(&path, "autonomyEnabled: false\n").unwrap();

    let switch = AutonomySwitch::new(Some(path.clone()));
    assert!(!switch.read().enabled);

    std::fs::remove_file(&path).unwrap();
    let reading = switch.read();
    assert!(!reading.enabled, "last-known-good false survives file removal");
    assert_eq!(reading.source, "lastKnownGood");
}

#[test]
fn missing_file_without_history_defaults_on() {
    let dir = tempdir().unwrap();
    let switch = AutonomySwitch::new(Some(dir.path().join("never-written.yaml")));
    let reading = switch.read();
    assert!(reading.enabled);
    assert_eq!(reading.source, "default(configMissing)");
}

#[test]
fn unparsable_file_falls_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("autonomy.yaml");
    std::fs::write(&path, "autonomyEnabled: false\n").unwrap();

    let switch = AutonomySwitch::new(Some(path.clone()));
    assert!(!switch.read().enabled);

    std::fs::write(&path, ":::garbage").unwrap();
    let reading = switch.read();
    assert!(!reading.enabled);
    assert_eq!(reading.source, "lastKnownGood");
}

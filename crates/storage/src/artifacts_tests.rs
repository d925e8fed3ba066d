// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

#[test]
fn put_shards_by_hash_prefix() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::open(dir.path().join("artifacts")).unwrap();

    let artifact = store.put(b"hello", "worker-log", Some("text/plain")).unwrap();

    assert_eq!(artifact.size, 5);
    assert_eq!(artifact.sha256.len(), 64);
    let expected = dir
        .path()
        .join("artifacts")
        .join(&artifact.sha256[..2])
        .join(&artifact.sha256);
    assert!(expected.exists());
    assert_eq!(std::fs::read(expected).unwrap(), b"hello");
}

#[test]
fn put_is_idempotent_by_content() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();

    let a = store.put(b"same bytes", "log", None).unwrap();
    let b = store.put(b"same bytes", "log", None).unwrap();
    assert_eq!(a.sha256, b.sha256);
    assert_eq!(a.uri, b.uri);
}

#[test]
fn get_round_trips_and_missing_is_none() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();

    let artifact = store.put(b"blob", "log", None).unwrap();
    assert_eq!(store.get(&artifact.sha256).unwrap().unwrap(), b"blob");
    assert!(store.contains(&artifact.sha256));

    let absent = "0".repeat(64);
    assert!(store.get(&absent).unwrap().is_none());
    assert!(!store.contains(&absent));
}

#[test]
fn malformed_hashes_are_rejected_not_traversed() {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::open(dir.path()).unwrap();

    assert!(matches!(
        store.get("../../etc/passwd"),
        Err(ArtifactStoreError::InvalidHash(_))
    ));
    assert!(matches!(store.get("abcd"), Err(ArtifactStoreError::InvalidHash(_))));
    assert!(!store.contains("zz"));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only, hash-chained event journal (file backend).
//!
//! Layout: a directory of line-delimited JSON segments
//! (`events-<n>.ndjson`) plus a `tip.json` sidecar recording the current
//! `(seq, hash)`. Bundles append atomically: either every event in the
//! bundle lands with a contiguous chain, or none do. Nothing is ever
//! updated or deleted; operator corrections are themselves events.

use lv_core::{canonical_json, chain_hash, Bundle, ChainError, Event, GENESIS_HASH};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Segments roll over after this many entries.
const SEGMENT_MAX_ENTRIES: u64 = 10_000;

/// How many rotated `.bak` files of a corrupt segment are kept.
const MAX_BACKUPS: u32 = 3;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("event not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error("duplicate event id: {0}")]
    DuplicateEventId(String),
    #[error("bundle has no events")]
    EmptyBundle,
    #[error("bundle target is empty")]
    EmptyTarget,
}

impl JournalError {
    /// I/O failures abort the bundle but may be retried by the client.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JournalError::Io(_))
    }

    /// Duplicate ids surface as HTTP 409.
    pub fn is_conflict(&self) -> bool {
        matches!(self, JournalError::DuplicateEventId(_))
    }
}

/// One persisted journal line: chain position plus the event itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub seq: u64,
    pub target: String,
    pub prev_hash: String,
    pub hash: String,
    #[serde(flatten)]
    pub event: Event,
}

/// Result of a successful bundle append.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendReceipt {
    pub first_seq: u64,
    pub last_seq: u64,
    pub tip_hash: String,
}

/// Outcome of a chain verification pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainVerdict {
    /// Every checked link holds.
    Valid { checked: u64 },
    /// First inconsistent entry and what went wrong there.
    Divergent { seq: u64, detail: String },
}

impl ChainVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChainVerdict::Valid { .. })
    }
}

/// Optional predicate for [`Journal::range`].
#[derive(Debug, Clone, Default)]
pub struct RangeFilter {
    pub target: Option<String>,
    pub event_type: Option<String>,
}

impl RangeFilter {
    fn matches(&self, entry: &JournalEntry) -> bool {
        if let Some(target) = &self.target {
            if &entry.target != target {
                return false;
            }
        }
        if let Some(ty) = &self.event_type {
            if entry.event.kind.type_name() != ty {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TipSidecar {
    seq: u64,
    hash: String,
}

/// File-backed journal. Single writer; readers go through `range`.
pub struct Journal {
    dir: PathBuf,
    write_seq: u64,
    tip_hash: String,
    seen_ids: HashSet<String>,
    segment_index: u64,
    entries_in_segment: u64,
    max_segment_entries: u64,
}

impl Journal {
    /// Open (or create) the journal in `dir`, scanning existing segments
    /// to rebuild the tip and the event-id index. A corrupt tail in the
    /// newest segment is rotated to `.bak` and dropped.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, JournalError> {
        Self::open_with_segment_size(dir, SEGMENT_MAX_ENTRIES)
    }

    pub fn open_with_segment_size(
        dir: impl Into<PathBuf>,
        max_segment_entries: u64,
    ) -> Result<Self, JournalError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let mut journal = Self {
            dir,
            write_seq: 0,
            tip_hash: GENESIS_HASH.to_string(),
            seen_ids: HashSet::new(),
            segment_index: 0,
            entries_in_segment: 0,
            max_segment_entries,
        };
        journal.scan()?;
        journal.write_sidecar()?;
        Ok(journal)
    }

    /// Latest `(seq, hash)`; `(0, GENESIS_HASH)` for an empty journal.
    pub fn tip(&self) -> (u64, String) {
        (self.write_seq, self.tip_hash.clone())
    }

    /// Append a bundle atomically. Events are chained in bundle order.
    pub fn append(&mut self, bundle: &Bundle) -> Result<AppendReceipt, JournalError> {
        if bundle.events.is_empty() {
            return Err(JournalError::EmptyBundle);
        }
        if bundle.target.is_empty() {
            return Err(JournalError::EmptyTarget);
        }

        // Idempotency: stable event ids, rejected on re-submission.
        let mut fresh: HashSet<&str> = HashSet::new();
        for event in &bundle.events {
            let id = event.event_id.as_str();
            if self.seen_ids.contains(id) || !fresh.insert(id) {
                return Err(JournalError::DuplicateEventId(id.to_string()));
            }
        }

        // Serialize every line before touching the file.
        let mut lines = String::new();
        let mut seq = self.write_seq;
        let mut prev = self.tip_hash.clone();
        let mut entries = Vec::with_capacity(bundle.events.len());
        for event in &bundle.events {
            seq += 1;
            let canonical = canonical_json(event)?;
            let hash = chain_hash(&prev, &canonical);
            let entry = JournalEntry {
                seq,
                target: bundle.target.clone(),
                prev_hash: prev.clone(),
                hash: hash.clone(),
                event: event.clone(),
            };
            lines.push_str(&serde_json::to_string(&entry)?);
            lines.push('\n');
            prev = hash;
            entries.push(entry);
        }

        if self.entries_in_segment >= self.max_segment_entries {
            self.segment_index += 1;
            self.entries_in_segment = 0;
        }

        // All-or-nothing write: on failure, truncate back to the length
        // we started from so no partial bundle survives.
        let path = self.segment_path(self.segment_index);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let start_len = file.seek(SeekFrom::End(0))?;
        if let Err(err) = file.write_all(lines.as_bytes()).and_then(|()| file.sync_data()) {
            let _ = file.set_len(start_len);
            return Err(JournalError::Io(err));
        }

        let first_seq = self.write_seq + 1;
        self.write_seq = seq;
        self.tip_hash = prev;
        self.entries_in_segment += entries.len() as u64;
        for event in &bundle.events {
            self.seen_ids.insert(event.event_id.as_str().to_string());
        }
        self.write_sidecar()?;

        Ok(AppendReceipt { first_seq, last_seq: seq, tip_hash: self.tip_hash.clone() })
    }

    /// Entries with `since_seq < seq <= until_seq`, in insertion order.
    pub fn range(
        &self,
        since_seq: u64,
        until_seq: Option<u64>,
        filter: &RangeFilter,
    ) -> Result<Vec<JournalEntry>, JournalError> {
        let until = until_seq.unwrap_or(u64::MAX);
        let mut out = Vec::new();
        for index in 0..=self.segment_index {
            let path = self.segment_path(index);
            if !path.exists() {
                continue;
            }
            for entry in read_segment(&path)? {
                if entry.seq > since_seq && entry.seq <= until && filter.matches(&entry) {
                    out.push(entry);
                }
            }
        }
        Ok(out)
    }

    /// Walk the chain and report the first inconsistency.
    ///
    /// Checks three things per entry: the prev-link matches the prior
    /// entry's hash, the stored hash matches the recomputed one, and
    /// sequence numbers are contiguous.
    pub fn verify_chain(
        &self,
        from_seq: u64,
        to_seq: Option<u64>,
    ) -> Result<ChainVerdict, JournalError> {
        let entries = self.range(from_seq.saturating_sub(1), to_seq, &RangeFilter::default())?;
        let mut checked = 0u64;
        let mut prev_hash: Option<String> = None;
        let mut prev_seq: Option<u64> = None;

        for entry in entries {
            if let Some(expected) = prev_seq {
                if entry.seq != expected + 1 {
                    return Ok(ChainVerdict::Divergent {
                        seq: entry.seq,
                        detail: format!("sequence gap: expected {}, found {}", expected + 1, entry.seq),
                    });
                }
            }
            if entry.seq == 1 && entry.prev_hash != GENESIS_HASH {
                return Ok(ChainVerdict::Divergent {
                    seq: 1,
                    detail: "first entry does not chain from genesis".to_string(),
                });
            }
            if let Some(prev) = &prev_hash {
                if &entry.prev_hash != prev {
                    return Ok(ChainVerdict::Divergent {
                        seq: entry.seq,
                        detail: "prevHash does not match prior entry".to_string(),
                    });
                }
            }
            let canonical = canonical_json(&entry.event)?;
            let recomputed = chain_hash(&entry.prev_hash, &canonical);
            if recomputed != entry.hash {
                return Ok(ChainVerdict::Divergent {
                    seq: entry.seq,
                    detail: "stored hash does not match recomputed hash".to_string(),
                });
            }
            prev_hash = Some(entry.hash);
            prev_seq = Some(entry.seq);
            checked += 1;
        }

        Ok(ChainVerdict::Valid { checked })
    }

    fn segment_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("events-{index:06}.ndjson"))
    }

    fn sidecar_path(&self) -> PathBuf {
        self.dir.join("tip.json")
    }

    fn write_sidecar(&self) -> Result<(), JournalError> {
        let sidecar = TipSidecar { seq: self.write_seq, hash: self.tip_hash.clone() };
        let tmp = self.dir.join("tip.json.tmp");
        fs::write(&tmp, serde_json::to_vec(&sidecar)?)?;
        fs::rename(&tmp, self.sidecar_path())?;
        Ok(())
    }

    /// Rebuild in-memory state from segment files.
    fn scan(&mut self) -> Result<(), JournalError> {
        let mut indices: Vec<u64> = Vec::new();
        for dirent in fs::read_dir(&self.dir)? {
            let name = dirent?.file_name();
            let name = name.to_string_lossy();
            if let Some(idx) = name
                .strip_prefix("events-")
                .and_then(|rest| rest.strip_suffix(".ndjson"))
                .and_then(|n| n.parse::<u64>().ok())
            {
                indices.push(idx);
            }
        }
        indices.sort_unstable();

        for (pos, index) in indices.iter().enumerate() {
            let path = self.segment_path(*index);
            let is_last = pos + 1 == indices.len();
            let (entries, clean) = read_segment_tolerant(&path)?;
            if !clean {
                if is_last {
                    // Same recovery the WAL used: rotate the corrupt file
                    // aside and rewrite only the valid prefix.
                    rotate_backups(&path)?;
                    rewrite_segment(&path, &entries)?;
                    warn!(segment = %path.display(), "rotated corrupt journal tail to .bak");
                } else {
                    warn!(
                        segment = %path.display(),
                        "corrupt line in sealed segment; entries after it are unreachable"
                    );
                }
            }
            for entry in entries {
                self.seen_ids.insert(entry.event.event_id.as_str().to_string());
                self.write_seq = entry.seq;
                self.tip_hash = entry.hash.clone();
                self.entries_in_segment += 1;
            }
            self.segment_index = *index;
            if !is_last {
                self.entries_in_segment = 0;
            }
        }
        Ok(())
    }
}

fn read_segment(path: &Path) -> Result<Vec<JournalEntry>, JournalError> {
    Ok(read_segment_tolerant(path)?.0)
}

/// Read entries up to the first undecodable line. Returns whether the
/// whole file was clean.
fn read_segment_tolerant(path: &Path) -> Result<(Vec<JournalEntry>, bool), JournalError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.split(b'\n') {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let Ok(text) = std::str::from_utf8(&line) else {
            return Ok((entries, false));
        };
        match serde_json::from_str::<JournalEntry>(text) {
            Ok(entry) => entries.push(entry),
            Err(_) => return Ok((entries, false)),
        }
    }
    Ok((entries, true))
}

fn rewrite_segment(path: &Path, entries: &[JournalEntry]) -> Result<(), JournalError> {
    let tmp = path.with_extension("ndjson.tmp");
    let mut out = String::new();
    for entry in entries {
        out.push_str(&serde_json::to_string(entry)?);
        out.push('\n');
    }
    fs::write(&tmp, out)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Keep `.bak` (newest), `.bak.2`, `.bak.3`; evict older ones.
fn rotate_backups(path: &Path) -> Result<(), JournalError> {
    for n in (2..=MAX_BACKUPS).rev() {
        let from = if n == 2 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{}", n - 1))
        };
        let to = path.with_extension(format!("bak.{n}"));
        if from.exists() {
            fs::rename(&from, &to)?;
        }
    }
    fs::copy(path, path.with_extension("bak"))?;
    Ok(())
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;

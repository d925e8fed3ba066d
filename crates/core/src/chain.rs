// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical serialization and the event hash chain.
//!
//! `hash = SHA-256(prevHash ‖ 0x1E ‖ canonical(event))`, hex-encoded. The
//! canonical form sorts object keys, emits no insignificant whitespace,
//! and NFC-normalizes every string so two encoders cannot disagree on the
//! bytes being hashed.

use crate::event::Event;
use serde_json::Value;
use sha2::{Digest, Sha256};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// `prevHash` of the first event in a journal.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// Separator between `prevHash` and the canonical event bytes.
const CHAIN_SEPARATOR: u8 = 0x1e;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("event not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Canonical JSON for hashing: sorted keys, compact, NFC strings.
pub fn canonical_json(event: &Event) -> Result<String, ChainError> {
    let value = serde_json::to_value(event)?;
    let mut out = String::with_capacity(256);
    write_value(&mut out, &value);
    Ok(out)
}

/// Hash one link of the chain.
pub fn chain_hash(prev_hash: &str, canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prev_hash.as_bytes());
    hasher.update([CHAIN_SEPARATOR]);
    hasher.update(canonical.as_bytes());
    hex(&hasher.finalize())
}

/// Hex SHA-256 of arbitrary bytes (artifact addressing).
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex(&hasher.finalize())
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            // Sort explicitly; do not rely on the map's own ordering.
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                if let Some(v) = map.get(key) {
                    write_value(out, v);
                }
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.nfc() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                use std::fmt::Write;
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! lv-storage: the append-only event journal, the graph projection
//! derived from it, and the content-addressed artifact store.

pub mod artifacts;
pub mod graph;
pub mod journal;
pub mod snapshot;

pub use artifacts::{ArtifactStore, ArtifactStoreError};
pub use graph::{
    AttemptDetail, AttemptNode, Edge, EdgeKind, EventHeader, Graph, GraphSummary, PrNode, PrState,
    TargetNode, TaskNode,
};
pub use journal::{
    AppendReceipt, ChainVerdict, Journal, JournalEntry, JournalError, RangeFilter,
};
pub use snapshot::{load_snapshot, write_snapshot, SnapshotError};

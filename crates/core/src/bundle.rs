// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bundles: the atomic unit of event ingestion.

use crate::artifact::ArtifactRef;
use crate::event::Event;
use crate::id::BundleId;
use serde::{Deserialize, Serialize};

/// A batch of events for one target, appended all-or-nothing.
///
/// Ordering inside a bundle is preserved; across bundles, order is
/// first-come at the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub bundle_id: BundleId,
    pub target: String,
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<ArtifactRef>,
}

impl Bundle {
    pub fn new(target: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            bundle_id: BundleId::new(),
            target: target.into(),
            events,
            artifacts: Vec::new(),
        }
    }

    pub fn with_artifacts(mut self, artifacts: Vec<ArtifactRef>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

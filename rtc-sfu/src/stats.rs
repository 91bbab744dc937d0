//! Statistics reports returned by `get_stats()`.
//!
//! The transport never interprets statistics: whatever the handler reports is
//! passed through to the caller keyed by stats object id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A collection of statistics objects keyed by their id.
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RTCStatsReport {
    pub reports: BTreeMap<String, serde_json::Value>,
}

impl RTCStatsReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the stats object stored under `id`.
    pub fn insert(&mut self, id: impl Into<String>, stats: serde_json::Value) {
        self.reports.insert(id.into(), stats);
    }

    pub fn get(&self, id: &str) -> Option<&serde_json::Value> {
        self.reports.get(id)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Iterates over stats objects whose `type` member equals `typ`.
    pub fn iter_by_type<'a>(
        &'a self,
        typ: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a serde_json::Value)> + 'a {
        self.reports
            .iter()
            .filter(move |(_, stats)| stats.get("type").and_then(|t| t.as_str()) == Some(typ))
    }
}

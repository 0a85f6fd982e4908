//! Newline-delimited JSON messages exchanged with the host process.

use std::collections::BTreeMap;

use omnisearch_fanout::{FanoutReport, HealthRecord, HealthSummary, HealthTracker, TaskOutcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Non-search commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostCommand {
    /// Return the per-capability health snapshot.
    Health,
}

/// One inbound line.
///
/// `{"id": "1", "query": "..."}` runs a search;
/// `{"id": "2", "command": "health"}` returns health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostRequest {
    /// Control command.
    Command {
        /// Caller-chosen correlation id.
        id: String,
        /// Which command to run.
        command: HostCommand,
    },
    /// Fan-out search.
    Search {
        /// Caller-chosen correlation id.
        id: String,
        /// Free-text query passed to every connected provider.
        query: String,
    },
}

impl HostRequest {
    /// Correlation id of this request.
    pub fn id(&self) -> &str {
        match self {
            Self::Command { id, .. } | Self::Search { id, .. } => id,
        }
    }
}

/// One outbound line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostResponse {
    /// Result of a search run.
    Search {
        /// Correlation id from the request.
        id: String,
        /// Identifier of the fan-out run, as logged.
        run_id: Uuid,
        /// One outcome per connected capability, in registry order.
        outcomes: Vec<TaskOutcome>,
        /// Health aggregate after the run.
        health: HealthSummary,
    },
    /// Health snapshot.
    Health {
        /// Correlation id from the request.
        id: String,
        /// Detail per capability, keyed by `integration.service`.
        capabilities: BTreeMap<String, HealthRecord>,
        /// Aggregate.
        health: HealthSummary,
    },
    /// The request could not be handled.
    Error {
        /// Correlation id, when the line was parseable enough to have one.
        id: Option<String>,
        /// What went wrong.
        error: String,
    },
}

impl HostResponse {
    /// Wrap a finished run.
    pub fn search(id: impl Into<String>, report: FanoutReport, health: HealthSummary) -> Self {
        Self::Search {
            id: id.into(),
            run_id: report.run_id,
            outcomes: report.outcomes,
            health,
        }
    }

    /// Snapshot `tracker`.
    pub fn health(id: impl Into<String>, tracker: &HealthTracker) -> Self {
        let capabilities = tracker
            .records()
            .into_iter()
            .map(|(capability, record)| (capability.key(), record))
            .collect();
        Self::Health {
            id: id.into(),
            capabilities,
            health: tracker.summary(),
        }
    }

    /// Build an error reply.
    pub fn error(id: Option<String>, error: impl Into<String>) -> Self {
        Self::Error {
            id,
            error: error.into(),
        }
    }
}

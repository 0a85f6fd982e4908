//! Per-capability health tracking.
//!
//! Records the last observed outcome for every capability that has completed
//! at least one task. A single failure flips a capability to unhealthy and a
//! single success flips it back; there is no time window or hysteresis.
//!
//! The tracker is shared by every concurrent run of one orchestrator, so all
//! methods take `&self` and synchronise on a single mutex. Entries are
//! independent and writes are short, so contention stays low.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{HealthStatus, ProviderCapability};

/// Health detail for a single capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    /// Current status.
    pub status: HealthStatus,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Error message of the most recent failure, cleared on success.
    pub last_error: Option<String>,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

/// Point-in-time aggregate over all tracked capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    /// Number of tracked capabilities.
    pub total: usize,
    /// How many are healthy.
    pub healthy: usize,
    /// How many are unhealthy.
    pub unhealthy: usize,
    /// `Unhealthy` if any capability is unhealthy, otherwise `Healthy`.
    pub overall: HealthStatus,
}

/// Concurrent map from capability to last observed health.
#[derive(Debug, Default)]
pub struct HealthTracker {
    entries: Mutex<HashMap<ProviderCapability, HealthRecord>>,
}

impl HealthTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the status of `capability`.
    pub fn record_outcome(&self, capability: &ProviderCapability, healthy: bool) {
        self.update(capability, healthy, None);
    }

    /// Record a success.
    pub fn record_success(&self, capability: &ProviderCapability) {
        self.update(capability, true, None);
    }

    /// Record a failure along with its error message.
    pub fn record_failure(&self, capability: &ProviderCapability, error: impl Into<String>) {
        self.update(capability, false, Some(error.into()));
    }

    fn update(&self, capability: &ProviderCapability, healthy: bool, error: Option<String>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Utc::now();
        let previous_failures = entries
            .get(capability)
            .map_or(0, |r| r.consecutive_failures);

        let record = if healthy {
            HealthRecord {
                status: HealthStatus::Healthy,
                consecutive_failures: 0,
                last_error: None,
                updated_at: now,
            }
        } else {
            HealthRecord {
                status: HealthStatus::Unhealthy,
                consecutive_failures: previous_failures.saturating_add(1),
                last_error: error,
                updated_at: now,
            }
        };

        if let Some(old) = entries.insert(capability.clone(), record) {
            if old.status == HealthStatus::Healthy && !healthy {
                tracing::warn!(capability = %capability, "capability became unhealthy");
            } else if old.status == HealthStatus::Unhealthy && healthy {
                tracing::info!(capability = %capability, "capability recovered");
            }
        }
    }

    /// Current status of one capability, `None` if it never completed a task.
    pub fn status(&self, capability: &ProviderCapability) -> Option<HealthStatus> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(capability)
            .map(|r| r.status)
    }

    /// Status of every tracked capability, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<ProviderCapability, HealthStatus> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(cap, record)| (cap.clone(), record.status))
            .collect()
    }

    /// Full detail for every tracked capability, ordered by key.
    pub fn records(&self) -> BTreeMap<ProviderCapability, HealthRecord> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(cap, record)| (cap.clone(), record.clone()))
            .collect()
    }

    /// Aggregate counts and overall status.
    pub fn summary(&self) -> HealthSummary {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let total = entries.len();
        let healthy = entries
            .values()
            .filter(|r| r.status == HealthStatus::Healthy)
            .count();
        let unhealthy = entries
            .values()
            .filter(|r| r.status == HealthStatus::Unhealthy)
            .count();
        let overall = if unhealthy > 0 {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Healthy
        };

        HealthSummary {
            total,
            healthy,
            unhealthy,
            overall,
        }
    }

    /// Forget every capability.
    pub fn reset(&self) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}

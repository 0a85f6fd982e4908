//! Core types: capabilities, task outcomes and health status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FanoutError;

/// Opaque, provider-shaped payload handed to the ranking stage untouched.
pub type ProviderPayload = serde_json::Value;

/// One searchable unit within a provider, e.g. `("google", "gmail")`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderCapability {
    /// Provider name (`google`, `slack`, `quickbooks`, ...).
    pub integration: String,
    /// Service within the provider (`gmail`, `messages`, `invoices`, ...).
    pub service: String,
}

impl ProviderCapability {
    /// Create a capability.
    pub fn new(integration: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            integration: integration.into(),
            service: service.into(),
        }
    }

    /// Health tracker key, `"integration.service"`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ProviderCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.integration, self.service)
    }
}

impl FromStr for ProviderCapability {
    type Err = FanoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((integration, service)) if !integration.is_empty() && !service.is_empty() => {
                Ok(Self::new(integration, service))
            }
            _ => Err(FanoutError::Config(format!(
                "capability key must look like \"integration.service\", got {s:?}"
            ))),
        }
    }
}

/// Terminal result of one search task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    /// Which capability this outcome belongs to.
    pub capability: ProviderCapability,
    /// Whether the provider call eventually succeeded.
    pub success: bool,
    /// Provider payload on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ProviderPayload>,
    /// Wall-clock time spent on the task, including retries and backoff.
    pub duration_ms: u64,
    /// Final error message on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of attempts made (0 if the task never ran).
    pub attempts: u32,
}

impl TaskOutcome {
    /// A successful outcome.
    pub fn succeeded(
        capability: ProviderCapability,
        data: ProviderPayload,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            capability,
            success: true,
            data: Some(data),
            duration_ms,
            error: None,
            attempts,
        }
    }

    /// A failed outcome.
    pub fn failed(
        capability: ProviderCapability,
        error: impl Into<String>,
        duration_ms: u64,
        attempts: u32,
    ) -> Self {
        Self {
            capability,
            success: false,
            data: None,
            duration_ms,
            error: Some(error.into()),
            attempts,
        }
    }
}

/// Last observed health of a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Last task succeeded.
    Healthy,
    /// Reserved; not set by the current logic.
    Degraded,
    /// Last task failed.
    Unhealthy,
}

impl HealthStatus {
    /// Lowercase name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

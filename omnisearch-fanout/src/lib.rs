//! # omnisearch-fanout
//!
//! Fan-out search orchestration across independently connected providers
//! (mail, file storage, calendars, chat, accounting, construction tools).
//!
//! Given a query and a [`ProviderRegistry`] of connected adapters, the
//! [`FanoutOrchestrator`] dispatches one search per connected capability,
//! bounds every attempt with a timeout, retries transient failures with
//! capped exponential backoff, and returns one [`TaskOutcome`] per task.
//!
//! ## Design
//!
//! - One spawned tokio task per capability; results collected in submission order
//! - Per-attempt deadlines cancel in-flight work through a `CancellationToken`
//! - Provider errors are tagged once at the adapter boundary ([`ErrorKind`])
//! - A failing provider never hides another provider's results
//! - Per-capability health is kept in memory by the orchestrator instance
//!
//! The crate does not rank, deduplicate or interpret payloads, and it does
//! not authenticate or persist anything.

pub mod capabilities;
pub mod config;
pub mod error;
pub mod health;
pub mod observability;
pub mod orchestrator;
pub mod provider;
pub mod resilience;
pub mod types;

pub use config::{FanoutConfig, RetryPolicy};
pub use error::{is_retryable, ErrorKind, FanoutError, NetworkFailure, ProviderError, Result};
pub use health::{HealthRecord, HealthSummary, HealthTracker};
pub use orchestrator::{build_tasks, FanoutOrchestrator, FanoutReport, SearchTask};
pub use provider::{ProviderRegistry, SearchProvider};
pub use types::{HealthStatus, ProviderCapability, ProviderPayload, TaskOutcome};

/// Re-exported so adapters can name the token type without a direct dependency.
pub use tokio_util::sync::CancellationToken;

//! Structured log event names and field keys.
//!
//! The resilience layer and orchestrator emit exactly four events. Their
//! names and fields are stable so log pipelines can key on them:
//!
//! ```text
//! integration_call_started   { integration, operation }
//! integration_call_completed { integration, operation, success, attempts, duration_ms }
//! retry_attempt              { attempt, delay_ms, error }
//! batch_completed            { total, successes, failures, total_duration_ms }
//! ```
//!
//! Events are emitted through `tracing` with the name in the `event` field.
//! Queries are only ever logged at trace level.

/// Emitted before the first attempt of a provider call.
pub const EVENT_CALL_STARTED: &str = "integration_call_started";

/// Emitted once the final outcome of a provider call is known.
pub const EVENT_CALL_COMPLETED: &str = "integration_call_completed";

/// Emitted before each backoff sleep.
pub const EVENT_RETRY_ATTEMPT: &str = "retry_attempt";

/// Emitted after every task in a fan-out run has reached a terminal state.
pub const EVENT_BATCH_COMPLETED: &str = "batch_completed";

/// Span wrapping one `execute_all` run.
pub const SPAN_FANOUT_RUN: &str = "omnisearch.fanout.run";

/// Span wrapping one task inside a run.
pub const SPAN_FANOUT_TASK: &str = "omnisearch.fanout.task";

//! Fault tolerance applied to every provider call.
//!
//! - [`timeout::with_timeout`]: per-attempt deadline that cancels in-flight work
//! - `retry::with_retry`: capped exponential backoff for transient errors
//! - [`executor::execute_with_resilience`]: the two composed, with call logging

pub mod executor;
mod retry;
pub mod timeout;

pub use executor::{execute_with_resilience, ResilientCall};
pub use timeout::with_timeout;

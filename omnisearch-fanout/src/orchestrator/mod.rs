//! Search orchestration: task construction and concurrent fan-out.
//!
//! [`tasks`] turns a provider registry and a query into independent search
//! tasks; [`fanout`] runs them concurrently through the resilience layer,
//! records health, and returns one outcome per task in submission order.

pub mod fanout;
pub mod tasks;

pub use fanout::{FanoutOrchestrator, FanoutReport};
pub use tasks::{build_tasks, SearchFuture, SearchTask};

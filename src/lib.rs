//! Omnisearch: one query, every connected workplace integration.
//!
//! This crate wires the [`omnisearch_fanout`] engine to the outside world:
//!
//! - **Config**: TOML file listing provider endpoints plus timeout/retry settings
//! - **Providers**: a generic HTTP/JSON adapter that tags every failure
//! - **Registry**: config entries become connected or disconnected slots
//! - **Host**: newline-delimited JSON over stdin/stdout (`omnisearch-host`)
//!
//! Logging goes to stderr via `tracing`.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;
pub mod providers;
pub mod registry;

pub use config::{AppConfig, LoggingConfig, ProviderConfig};
pub use error::{AppError, Result};
pub use host::StdioHost;
pub use providers::HttpSearchProvider;
pub use registry::{build_registry, build_registry_with, build_registry_with_client};

pub use omnisearch_fanout;

//! Newline-delimited JSON host for driving searches from another process.

pub mod contract;
pub mod stdio;

pub use contract::{HostCommand, HostRequest, HostResponse};
pub use stdio::StdioHost;

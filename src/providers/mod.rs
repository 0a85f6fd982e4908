//! Concrete search adapters.

pub mod http;

pub use http::HttpSearchProvider;

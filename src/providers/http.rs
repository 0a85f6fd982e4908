//! Generic HTTP/JSON search adapter.
//!
//! Issues `GET {endpoint}?q=<query>&limit=<n>` with an optional bearer token
//! and returns the JSON body untouched. Every failure is tagged with an
//! [`ErrorKind`](omnisearch_fanout::ErrorKind) here, at the adapter boundary.

use std::error::Error as StdError;
use std::time::Instant;

use async_trait::async_trait;
use omnisearch_fanout::{
    CancellationToken, NetworkFailure, ProviderCapability, ProviderError, ProviderPayload,
    SearchProvider,
};

use crate::error::{AppError, Result};

/// Longest error body excerpt carried into an error message.
const MAX_ERROR_BODY_CHARS: usize = 300;

/// Search adapter for any endpoint that speaks plain JSON over HTTP.
pub struct HttpSearchProvider {
    capability: ProviderCapability,
    endpoint: url::Url,
    token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpSearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSearchProvider")
            .field("capability", &self.capability)
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl HttpSearchProvider {
    /// Create an adapter for `endpoint` with its own HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Provider`] if `endpoint` is not an http(s) URL.
    pub fn new(
        capability: ProviderCapability,
        endpoint: &str,
        token: Option<String>,
    ) -> Result<Self> {
        Self::with_client(capability, endpoint, token, reqwest::Client::new())
    }

    /// Create an adapter that sends through `client`.
    ///
    /// Clones of one `reqwest::Client` share its connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Provider`] if `endpoint` is not an http(s) URL.
    pub fn with_client(
        capability: ProviderCapability,
        endpoint: &str,
        token: Option<String>,
        client: reqwest::Client,
    ) -> Result<Self> {
        let endpoint = url::Url::parse(endpoint)
            .map_err(|e| AppError::Provider(format!("{capability}: invalid endpoint: {e}")))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::Provider(format!(
                "{capability}: endpoint must use http or https"
            )));
        }
        Ok(Self {
            capability,
            endpoint,
            token,
            client,
        })
    }

    /// Capability served by this adapter.
    pub fn capability(&self) -> &ProviderCapability {
        &self.capability
    }

    async fn send(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<ProviderPayload, ProviderError> {
        let limit = limit.to_string();
        let mut request = self
            .client
            .get(self.endpoint.clone())
            .query(&[("q", query), ("limit", limit.as_str())])
            .header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| classify_reqwest_error(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;
        tracing::trace!(
            capability = %self.capability,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "provider responded"
        );

        if !status.is_success() {
            return Err(self.map_http_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::other(format!(
                "{} returned a non-JSON body: {e}",
                self.capability
            ))
        })
    }

    fn map_http_error(&self, status: reqwest::StatusCode, body: &str) -> ProviderError {
        let message = extract_error_message(body);
        ProviderError::from_status(
            status.as_u16(),
            format!("{} HTTP {}: {message}", self.capability, status.as_u16()),
        )
    }
}

#[async_trait]
impl SearchProvider for HttpSearchProvider {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> std::result::Result<ProviderPayload, ProviderError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ProviderError::cancelled(format!(
                "{} request cancelled",
                self.capability
            ))),
            result = self.send(query, limit) => result,
        }
    }
}

/// Pull a message out of `{"error": "..."}` or `{"error": {"message": "..."}}`,
/// falling back to a trimmed excerpt of the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            error
                .as_str()
                .or_else(|| error.get("message").and_then(|m| m.as_str()))
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().chars().take(MAX_ERROR_BODY_CHARS).collect())
}

/// Tag a transport error.
fn classify_reqwest_error(err: &reqwest::Error) -> ProviderError {
    let message = err.to_string();
    if err.is_timeout() {
        return ProviderError::timeout(message);
    }
    if err.is_decode() || err.is_builder() {
        return ProviderError::other(message);
    }

    let mut chain_text = String::new();
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            let failure = match io.kind() {
                std::io::ErrorKind::ConnectionRefused => NetworkFailure::ConnectionRefused,
                std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe => NetworkFailure::ConnectionReset,
                std::io::ErrorKind::TimedOut => NetworkFailure::ConnectTimeout,
                _ => NetworkFailure::Other,
            };
            if failure != NetworkFailure::Other {
                return ProviderError::network(failure, message);
            }
        }
        chain_text.push_str(&e.to_string().to_ascii_lowercase());
        chain_text.push(' ');
        source = e.source();
    }

    ProviderError::network(failure_from_chain_text(&chain_text), message)
}

/// Classify a transport failure from its lowercased error chain.
fn failure_from_chain_text(chain_text: &str) -> NetworkFailure {
    if chain_text.contains("dns error") || chain_text.contains("failed to lookup address") {
        NetworkFailure::HostNotFound
    } else if chain_text.contains("timed out") || chain_text.contains("timeout") {
        NetworkFailure::ConnectTimeout
    } else {
        NetworkFailure::Other
    }
}

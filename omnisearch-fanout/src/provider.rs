//! Provider adapter trait and the per-request registry of connections.
//!
//! Each adapter implements [`SearchProvider`] for one capability. A
//! [`ProviderRegistry`] is an explicit, ordered list of capabilities, each
//! with an adapter when the integration is connected and `None` when it is
//! not. Not being connected is not an error; the capability simply
//! contributes no task.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::capabilities;
use crate::error::ProviderError;
use crate::types::{ProviderCapability, ProviderPayload};

/// A searchable provider capability.
///
/// Implementations must be `Send + Sync`; the orchestrator runs them
/// concurrently from spawned tasks.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`, returning at most `limit` items in a
    /// provider-shaped payload.
    ///
    /// `cancel` fires when the attempt's deadline passes or the orchestrator
    /// shuts down. Implementations should stop in-flight I/O when it does.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] tagged with the failure kind. The kind
    /// decides whether the call is retried.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<ProviderPayload, ProviderError>;
}

/// One registry slot.
#[derive(Clone)]
pub struct RegistryEntry {
    /// The capability this slot represents.
    pub capability: ProviderCapability,
    /// Result limit passed to the adapter.
    pub limit: usize,
    /// The connected adapter, or `None` when the integration is not connected.
    pub provider: Option<Arc<dyn SearchProvider>>,
}

impl RegistryEntry {
    /// Whether an adapter is present.
    pub fn is_connected(&self) -> bool {
        self.provider.is_some()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("capability", &self.capability)
            .field("limit", &self.limit)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Ordered set of capabilities and their optional adapters for one request.
///
/// # Examples
///
/// ```
/// use omnisearch_fanout::provider::ProviderRegistry;
/// use omnisearch_fanout::types::ProviderCapability;
///
/// let registry = ProviderRegistry::new()
///     .disconnected(ProviderCapability::new("google", "gmail"));
/// assert_eq!(registry.len(), 1);
/// assert_eq!(registry.connected_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    entries: Vec<RegistryEntry>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot with an explicit limit.
    pub fn with(
        mut self,
        capability: ProviderCapability,
        limit: usize,
        provider: Option<Arc<dyn SearchProvider>>,
    ) -> Self {
        self.push(capability, limit, provider);
        self
    }

    /// Append a connected slot using the catalogued limit.
    pub fn connect(self, capability: ProviderCapability, provider: Arc<dyn SearchProvider>) -> Self {
        let limit = capabilities::default_limit(&capability);
        self.with(capability, limit, Some(provider))
    }

    /// Append a slot for a capability that is not connected.
    pub fn disconnected(self, capability: ProviderCapability) -> Self {
        let limit = capabilities::default_limit(&capability);
        self.with(capability, limit, None)
    }

    /// Append a slot in place.
    pub fn push(
        &mut self,
        capability: ProviderCapability,
        limit: usize,
        provider: Option<Arc<dyn SearchProvider>>,
    ) {
        self.entries.push(RegistryEntry {
            capability,
            limit,
            provider,
        });
    }

    /// All slots in registration order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Number of slots, connected or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of slots with an adapter.
    pub fn connected_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_connected()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider;

    #[async_trait]
    impl SearchProvider for StaticProvider {
        async fn search(
            &self,
            query: &str,
            limit: usize,
            _cancel: &CancellationToken,
        ) -> Result<ProviderPayload, ProviderError> {
            Ok(serde_json::json!({ "query": query, "limit": limit }))
        }
    }

    #[test]
    fn provider_trait_object_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn SearchProvider>();
    }

    #[test]
    fn connect_uses_catalogued_limit() {
        let registry = ProviderRegistry::new()
            .connect(ProviderCapability::new("google", "gmail"), Arc::new(StaticProvider))
            .connect(
                ProviderCapability::new("quickbooks", "invoices"),
                Arc::new(StaticProvider),
            );
        let limits: Vec<usize> = registry.entries().iter().map(|e| e.limit).collect();
        assert_eq!(limits, vec![5, 3]);
    }

    #[test]
    fn connected_count_ignores_missing_adapters() {
        let registry = ProviderRegistry::new()
            .connect(ProviderCapability::new("slack", "messages"), Arc::new(StaticProvider))
            .disconnected(ProviderCapability::new("dropbox", "files"))
            .with(ProviderCapability::new("procore", "rfis"), 2, None);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.connected_count(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn debug_reports_connection_not_adapter() {
        let registry = ProviderRegistry::new()
            .connect(ProviderCapability::new("slack", "messages"), Arc::new(StaticProvider));
        let debug = format!("{registry:?}");
        assert!(debug.contains("connected: true"));
    }

    #[tokio::test]
    async fn static_provider_echoes_arguments() {
        let provider = StaticProvider;
        let payload = provider
            .search("invoice 42", 3, &CancellationToken::new())
            .await
            .expect("static provider succeeds");
        assert_eq!(payload["query"], "invoice 42");
        assert_eq!(payload["limit"], 3);
    }
}

//! Search task construction.
//!
//! A [`SearchTask`] binds one capability's adapter call to a query and a
//! result limit. Tasks are independent, created fresh per query, and owned by
//! the run that built them.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::provider::ProviderRegistry;
use crate::types::{ProviderCapability, ProviderPayload};

/// Future returned by a task's invocable.
pub type SearchFuture = BoxFuture<'static, Result<ProviderPayload, ProviderError>>;

type Invocable = Box<dyn Fn(CancellationToken) -> SearchFuture + Send + Sync>;

/// One bound unit of work: a capability plus a ready-to-call search.
pub struct SearchTask {
    /// Capability this task searches.
    pub capability: ProviderCapability,
    /// Result limit baked into the call.
    pub limit: usize,
    invoke: Invocable,
}

impl SearchTask {
    /// Bind an invocable to a capability.
    ///
    /// The invocable is called once per attempt with that attempt's
    /// cancellation token.
    pub fn new<F>(capability: ProviderCapability, limit: usize, invoke: F) -> Self
    where
        F: Fn(CancellationToken) -> SearchFuture + Send + Sync + 'static,
    {
        Self {
            capability,
            limit,
            invoke: Box::new(invoke),
        }
    }

    /// Start one attempt.
    pub fn invoke(&self, cancel: CancellationToken) -> SearchFuture {
        (self.invoke)(cancel)
    }
}

impl fmt::Debug for SearchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchTask")
            .field("capability", &self.capability)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

/// Build one task per connected capability in `registry`, in registry order.
///
/// Capabilities without an adapter contribute nothing; that is how an
/// unconnected integration is represented.
pub fn build_tasks(registry: &ProviderRegistry, query: &str) -> Vec<SearchTask> {
    let query: Arc<str> = Arc::from(query);

    registry
        .entries()
        .iter()
        .filter_map(|entry| {
            let Some(provider) = entry.provider.as_ref().map(Arc::clone) else {
                tracing::debug!(
                    capability = %entry.capability,
                    "capability not connected; no task"
                );
                return None;
            };
            let query = Arc::clone(&query);
            let limit = entry.limit;

            Some(SearchTask::new(
                entry.capability.clone(),
                limit,
                move |cancel| {
                    let provider = Arc::clone(&provider);
                    let query = Arc::clone(&query);
                    async move { provider.search(&query, limit, &cancel).await }.boxed()
                },
            ))
        })
        .collect()
}

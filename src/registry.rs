//! Assemble a [`ProviderRegistry`] from configuration.
//!
//! A provider is connected when it is enabled and, if it names a token
//! variable, that variable is set. Anything else stays in the registry as a
//! disconnected slot so it shows up in listings but never dispatches.

use std::sync::Arc;

use omnisearch_fanout::{ProviderRegistry, SearchProvider};

use crate::config::AppConfig;
use crate::error::Result;
use crate::providers::HttpSearchProvider;

/// Build the registry, reading bearer tokens from the process environment.
///
/// # Errors
///
/// Returns an error if an enabled provider has an unusable endpoint.
pub fn build_registry(config: &AppConfig) -> Result<ProviderRegistry> {
    build_registry_with(config, |name| std::env::var(name).ok())
}

/// Build the registry with an explicit token lookup.
///
/// # Errors
///
/// Returns an error if an enabled provider has an unusable endpoint.
pub fn build_registry_with<F>(config: &AppConfig, token_lookup: F) -> Result<ProviderRegistry>
where
    F: Fn(&str) -> Option<String>,
{
    build_registry_with_client(config, token_lookup, reqwest::Client::new())
}

/// Build the registry with an explicit token lookup and HTTP client.
///
/// Every connected adapter sends through a clone of `client`, so all of
/// them share one connection pool.
///
/// # Errors
///
/// Returns an error if an enabled provider has an unusable endpoint.
pub fn build_registry_with_client<F>(
    config: &AppConfig,
    token_lookup: F,
    client: reqwest::Client,
) -> Result<ProviderRegistry>
where
    F: Fn(&str) -> Option<String>,
{
    let mut registry = ProviderRegistry::new();

    for provider in &config.providers {
        let capability = provider.capability();
        let limit = provider.effective_limit();

        if !provider.enabled {
            tracing::debug!(capability = %capability, "provider disabled");
            registry.push(capability, limit, None);
            continue;
        }

        let token = match &provider.token_env {
            Some(var) => match token_lookup(var).filter(|t| !t.trim().is_empty()) {
                Some(token) => Some(token),
                None => {
                    tracing::warn!(
                        capability = %capability,
                        token_env = %var,
                        "token variable not set; provider left disconnected"
                    );
                    registry.push(capability, limit, None);
                    continue;
                }
            },
            None => None,
        };

        let adapter: Arc<dyn SearchProvider> = Arc::new(HttpSearchProvider::with_client(
            capability.clone(),
            &provider.endpoint,
            token,
            client.clone(),
        )?);
        registry.push(capability, limit, Some(adapter));
    }

    tracing::info!(
        total = registry.len(),
        connected = registry.connected_count(),
        "provider registry built"
    );
    Ok(registry)
}

//! Catalogue of known provider capabilities and their fixed result limits.
//!
//! Broad capabilities (mail, files, events, chat) return up to
//! [`DEFAULT_LIMIT`] results. Fine-grained sub-resources such as accounting
//! line items or project RFIs return up to [`SUB_RESOURCE_LIMIT`].

use crate::types::ProviderCapability;

/// Result limit for broad capabilities and anything not catalogued.
pub const DEFAULT_LIMIT: usize = 5;

/// Result limit for fine-grained sub-resources.
pub const SUB_RESOURCE_LIMIT: usize = 3;

/// A catalogued `(integration, service)` pair with its result limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Provider name.
    pub integration: &'static str,
    /// Service within the provider.
    pub service: &'static str,
    /// Maximum results requested per query.
    pub limit: usize,
}

impl CatalogEntry {
    const fn new(integration: &'static str, service: &'static str, limit: usize) -> Self {
        Self {
            integration,
            service,
            limit,
        }
    }

    /// The capability this entry describes.
    pub fn capability(&self) -> ProviderCapability {
        ProviderCapability::new(self.integration, self.service)
    }
}

/// Every capability the host knows how to wire up, in dispatch order.
pub const KNOWN_CAPABILITIES: &[CatalogEntry] = &[
    CatalogEntry::new("google", "gmail", DEFAULT_LIMIT),
    CatalogEntry::new("google", "drive", DEFAULT_LIMIT),
    CatalogEntry::new("google", "calendar", DEFAULT_LIMIT),
    CatalogEntry::new("microsoft", "outlook", DEFAULT_LIMIT),
    CatalogEntry::new("microsoft", "onedrive", DEFAULT_LIMIT),
    CatalogEntry::new("microsoft", "calendar", DEFAULT_LIMIT),
    CatalogEntry::new("slack", "messages", DEFAULT_LIMIT),
    CatalogEntry::new("dropbox", "files", DEFAULT_LIMIT),
    CatalogEntry::new("quickbooks", "invoices", SUB_RESOURCE_LIMIT),
    CatalogEntry::new("quickbooks", "bills", SUB_RESOURCE_LIMIT),
    CatalogEntry::new("procore", "projects", DEFAULT_LIMIT),
    CatalogEntry::new("procore", "rfis", SUB_RESOURCE_LIMIT),
    CatalogEntry::new("procore", "submittals", SUB_RESOURCE_LIMIT),
];

/// Look up the catalogued entry for a pair.
pub fn lookup(integration: &str, service: &str) -> Option<&'static CatalogEntry> {
    KNOWN_CAPABILITIES
        .iter()
        .find(|e| e.integration == integration && e.service == service)
}

/// Fixed result limit for a capability; [`DEFAULT_LIMIT`] when not catalogued.
pub fn default_limit(capability: &ProviderCapability) -> usize {
    lookup(&capability.integration, &capability.service).map_or(DEFAULT_LIMIT, |e| e.limit)
}

//! Structured listing endpoints

use async_trait::async_trait;
use tracing::debug;

use super::extract::entries_from_json;
use super::{DiscoveryContext, DiscoveryError, DiscoveryStrategy};
use crate::CatalogEntry;

/// Queries JSON listing endpoints in order; first non-empty answer wins
#[derive(Debug, Clone, Default)]
pub struct StructuredEndpointStrategy {
    endpoints: Option<Vec<String>>,
}

impl StructuredEndpointStrategy {
    /// Use an explicit endpoint list instead of the ones derived from the context
    pub fn with_endpoints(endpoints: Vec<String>) -> Self {
        Self {
            endpoints: Some(endpoints),
        }
    }

    /// Endpoints tried for `ctx`
    pub fn endpoints(&self, ctx: &DiscoveryContext) -> Vec<String> {
        match &self.endpoints {
            Some(endpoints) => endpoints.clone(),
            None => vec![
                format!("{}/fonts", ctx.api_base),
                format!("{}/fonts/list", ctx.api_base),
                format!("{}/api/fonts", ctx.site_url),
            ],
        }
    }
}

#[async_trait]
impl DiscoveryStrategy for StructuredEndpointStrategy {
    fn name(&self) -> &'static str {
        "structured-endpoint"
    }

    async fn attempt(&self, ctx: &DiscoveryContext) -> Result<Vec<CatalogEntry>, DiscoveryError> {
        for url in self.endpoints(ctx) {
            let body = match ctx.get_text(&url).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(url = %url, error = %e, "Listing endpoint unavailable");
                    continue;
                }
            };

            let document: serde_json::Value = match serde_json::from_str(&body) {
                Ok(document) => document,
                Err(e) => {
                    debug!(url = %url, error = %e, "Listing endpoint returned invalid JSON");
                    continue;
                }
            };

            let entries = entries_from_json(&document);
            if entries.is_empty() {
                debug!(url = %url, "Listing endpoint returned no font names");
                continue;
            }
            debug!(url = %url, fonts = entries.len(), "Listing endpoint answered");
            return Ok(entries);
        }

        Ok(Vec::new())
    }
}

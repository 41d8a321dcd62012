//! Built-in font list
//!
//! A versioned list of slugs known to exist, embedded at compile time. It is
//! the last discovery strategy and trades completeness for availability. With
//! probing enabled a handful of extra candidate slugs are checked with `HEAD`
//! requests against the download endpoint and kept when they answer 200.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{DiscoveryContext, DiscoveryError, DiscoveryStrategy};
use crate::downloader::executor::download_url;
use crate::identifier::ResourceIdentifier;
use crate::CatalogEntry;

/// Embedded list data
const KNOWN_FONTS_JSON: &str = include_str!("known_fonts.json");

/// Upper bound on HEAD probes per run
pub const MAX_PROBES: usize = 10;

/// Embedded list (parsed once)
static EMBEDDED: Lazy<Result<FallbackList, String>> = Lazy::new(|| {
    serde_json::from_str(KNOWN_FONTS_JSON).map_err(|e| format!("Failed to parse font list: {e}"))
});

/// Versioned list of known and candidate slugs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackList {
    /// Date the list was last verified
    pub version: String,
    /// Slugs known to exist
    pub fonts: Vec<String>,
    /// Slugs worth probing
    #[serde(default)]
    pub potential: Vec<String>,
}

impl FallbackList {
    /// The list compiled into the binary
    pub fn embedded() -> Result<&'static Self, DiscoveryError> {
        EMBEDDED
            .as_ref()
            .map_err(|e| DiscoveryError::Fallback(e.clone()))
    }
}

#[derive(Debug, Clone)]
enum Source {
    Embedded,
    Custom(FallbackList),
}

/// Last-resort strategy backed by a [`FallbackList`]
#[derive(Debug, Clone)]
pub struct StaticFallbackStrategy {
    source: Source,
    probe: bool,
}

impl StaticFallbackStrategy {
    /// Use the embedded list
    pub fn embedded() -> Self {
        Self {
            source: Source::Embedded,
            probe: false,
        }
    }

    /// Use a caller-provided list
    pub fn with_list(list: FallbackList) -> Self {
        Self {
            source: Source::Custom(list),
            probe: false,
        }
    }

    /// Use a plain slug list with no probe candidates
    pub fn with_identifiers<I, S>(fonts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_list(FallbackList {
            version: "custom".to_string(),
            fonts: fonts.into_iter().map(Into::into).collect(),
            potential: Vec::new(),
        })
    }

    /// Enable or disable HEAD probing of candidate slugs
    pub fn with_probe(mut self, probe: bool) -> Self {
        self.probe = probe;
        self
    }

    fn list(&self) -> Result<&FallbackList, DiscoveryError> {
        match &self.source {
            Source::Embedded => FallbackList::embedded(),
            Source::Custom(list) => Ok(list),
        }
    }

    async fn probe_candidates(
        &self,
        ctx: &DiscoveryContext,
        list: &FallbackList,
        known: &[CatalogEntry],
    ) -> Vec<CatalogEntry> {
        let mut found = Vec::new();
        let candidates = list
            .potential
            .iter()
            .filter_map(|name| ResourceIdentifier::parse(name).ok())
            .filter(|id| known.iter().all(|e| &e.identifier != id))
            .take(MAX_PROBES);

        for candidate in candidates {
            let url = download_url(&ctx.api_base, &candidate);
            match ctx.head_status(&url).await {
                Ok(200) => {
                    debug!(font = %candidate, "Probe found font");
                    found.push(CatalogEntry::new(candidate));
                }
                Ok(status) => debug!(font = %candidate, status, "Probe rejected font"),
                Err(e) => debug!(font = %candidate, error = %e, "Probe failed"),
            }
        }
        found
    }
}

#[async_trait]
impl DiscoveryStrategy for StaticFallbackStrategy {
    fn name(&self) -> &'static str {
        "static-fallback"
    }

    async fn attempt(&self, ctx: &DiscoveryContext) -> Result<Vec<CatalogEntry>, DiscoveryError> {
        let list = self.list()?;
        warn!(version = %list.version, "Using built-in font list");

        let mut entries: Vec<CatalogEntry> = list
            .fonts
            .iter()
            .filter_map(|name| match ResourceIdentifier::parse(name) {
                Ok(id) => Some(CatalogEntry::new(id)),
                Err(e) => {
                    debug!(name = %name, error = %e, "Dropping invalid built-in name");
                    None
                }
            })
            .collect();

        if self.probe {
            let extra = self.probe_candidates(ctx, list, &entries).await;
            if !extra.is_empty() {
                info!(fonts = extra.len(), "Probing found additional fonts");
                entries.extend(extra);
            }
        }
        Ok(entries)
    }
}

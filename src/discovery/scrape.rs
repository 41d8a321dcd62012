//! Page scraping
//!
//! The public pages sometimes embed the font list as a JSON array in a script
//! block (`fonts: [...]`, `window.FONTS = [...]`). When no such array parses,
//! font slugs are recovered from anchor targets.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

use super::extract::entries_from_items;
use super::{DiscoveryContext, DiscoveryError, DiscoveryStrategy};
use crate::identifier::ResourceIdentifier;
use crate::CatalogEntry;

// Patterns are literals; compilation cannot fail at runtime.
static FONTS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fonts|FONTS").expect("valid marker regex"));

static FONT_PAGE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"href="[^"]*/fonts/([a-z0-9-]+)/?""#).expect("valid font link regex")
});

static TRAILING_SLUG_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"href="[^"]*?/([a-z-]+)""#).expect("valid slug link regex"));

/// Scrapes the public site for font names
#[derive(Debug, Clone, Default)]
pub struct PageScrapeStrategy {
    pages: Option<Vec<String>>,
}

impl PageScrapeStrategy {
    /// Scrape an explicit page list instead of the ones derived from the context
    pub fn with_pages(pages: Vec<String>) -> Self {
        Self { pages: Some(pages) }
    }

    /// Pages fetched for `ctx`
    pub fn pages(&self, ctx: &DiscoveryContext) -> Vec<String> {
        match &self.pages {
            Some(pages) => pages.clone(),
            None => vec![ctx.site_url.clone(), format!("{}/fonts", ctx.site_url)],
        }
    }
}

#[async_trait]
impl DiscoveryStrategy for PageScrapeStrategy {
    fn name(&self) -> &'static str {
        "page-scrape"
    }

    async fn attempt(&self, ctx: &DiscoveryContext) -> Result<Vec<CatalogEntry>, DiscoveryError> {
        for url in self.pages(ctx) {
            let html = match ctx.get_text(&url).await {
                Ok(html) => html,
                Err(e) => {
                    debug!(url = %url, error = %e, "Page unavailable");
                    continue;
                }
            };

            let entries = parse_catalog_page(&html);
            if !entries.is_empty() {
                debug!(url = %url, fonts = entries.len(), "Scraped fonts from page");
                return Ok(entries);
            }
        }
        Ok(Vec::new())
    }
}

/// Extract font entries from page markup
///
/// Embedded JSON arrays take precedence over links.
pub fn parse_catalog_page(html: &str) -> Vec<CatalogEntry> {
    let embedded = embedded_arrays(html);
    if !embedded.is_empty() {
        return embedded;
    }
    link_slugs(html)
        .into_iter()
        .map(CatalogEntry::new)
        .collect()
}

/// First JSON array following a `fonts`/`FONTS` marker that yields names
fn embedded_arrays(html: &str) -> Vec<CatalogEntry> {
    for marker in FONTS_MARKER.find_iter(html) {
        let rest = &html[marker.end()..];
        let Some(open) = rest.find('[') else {
            break;
        };

        let mut values = serde_json::Deserializer::from_str(&rest[open..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(Value::Array(items))) => {
                let entries = entries_from_items(&items);
                if !entries.is_empty() {
                    return entries;
                }
            }
            _ => continue,
        }
    }
    Vec::new()
}

/// Slugs recovered from anchors, in first-seen order
fn link_slugs(html: &str) -> Vec<ResourceIdentifier> {
    let font_pages = unique_slugs(FONT_PAGE_LINK.captures_iter(html).map(|c| c[1].to_string()));
    if !font_pages.is_empty() {
        return font_pages;
    }

    unique_slugs(
        TRAILING_SLUG_LINK
            .captures_iter(html)
            .map(|c| c[1].to_string())
            .filter(|name| name.len() > 2 && name.contains('-') && !name.starts_with("www")),
    )
}

fn unique_slugs(names: impl Iterator<Item = String>) -> Vec<ResourceIdentifier> {
    let mut seen = HashSet::new();
    names
        .filter(|name| seen.insert(name.clone()))
        .filter_map(|name| ResourceIdentifier::parse(&name).ok())
        .collect()
}

//! Font name extraction from JSON listings
//!
//! Listings seen in the wild come in a few shapes: a bare array, or an object
//! holding the array under `fonts`, `data`, `items`, or `results`. Elements are
//! either plain strings or objects naming the font in `slug`, `name`, or `id`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::identifier::ResourceIdentifier;
use crate::CatalogEntry;

/// Keys probed, in order, for a list of fonts
pub const LISTING_KEYS: [&str; 4] = ["fonts", "data", "items", "results"];

/// Keys probed, in order, for the name of one font
const NAME_KEYS: [&str; 3] = ["slug", "name", "id"];

/// Extract catalog entries from a JSON document
///
/// Names that do not normalize to a valid identifier are dropped.
pub fn entries_from_json(value: &Value) -> Vec<CatalogEntry> {
    match value {
        Value::Array(items) => entries_from_items(items),
        Value::Object(map) => LISTING_KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_array))
            .flat_map(|items| entries_from_items(items))
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract catalog entries from the elements of one listing array
pub fn entries_from_items(items: &[Value]) -> Vec<CatalogEntry> {
    items.iter().filter_map(entry_from_item).collect()
}

fn entry_from_item(item: &Value) -> Option<CatalogEntry> {
    match item {
        Value::String(raw) => normalize(raw).map(CatalogEntry::new),
        Value::Object(fields) => entry_from_object(fields),
        _ => None,
    }
}

fn entry_from_object(fields: &Map<String, Value>) -> Option<CatalogEntry> {
    let raw = NAME_KEYS
        .iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_str).filter(|s| !s.trim().is_empty()))?;
    let mut entry = CatalogEntry::new(normalize(raw)?);

    if let Some(name) = fields.get("name").and_then(Value::as_str) {
        entry = entry.with_display_name(name.trim());
    }
    if let Some(category) = fields.get("category").and_then(Value::as_str) {
        entry = entry.with_category(category.trim());
    }
    Some(entry)
}

fn normalize(raw: &str) -> Option<ResourceIdentifier> {
    match ResourceIdentifier::normalize(raw) {
        Ok(id) => Some(id),
        Err(e) => {
            debug!(name = raw, error = %e, "Dropping invalid font name");
            None
        }
    }
}

//! Versioned serialization wrapper for the persisted cart.
//!
//! The stored layout is `{ "version": <u32>, "items": [CartLineItem...] }`.
//! Decoding never rejects a payload just because its version differs from
//! [`SCHEMA_VERSION`]: older layouts are migrated forward and newer ones are
//! read best-effort. Losing a customer's cart on an upgrade is worse than
//! keeping slightly stale data.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use super::item::{CartLineItem, LineKey};

/// Current schema version of the cart envelope.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors decoding a stored envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The payload is not valid JSON or does not match the expected layout.
    #[error("cart envelope is malformed: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload has no `items` array in any known location.
    #[error("cart envelope has no items array")]
    MissingItems,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    items: &'a [CartLineItem],
}

/// Result of decoding a stored envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub items: Vec<CartLineItem>,
    /// Version found in the payload (0 when absent).
    pub stored_version: u32,
    /// The stored version, if a legacy layout had to be migrated.
    pub migrated_from: Option<u32>,
}

impl Decoded {
    /// Whether the payload should be written back in the current layout.
    ///
    /// Snapshots from a newer schema are never rewritten: this build would
    /// drop the fields it does not know.
    #[must_use]
    pub const fn needs_rewrite(&self) -> bool {
        self.migrated_from.is_some() && self.stored_version <= SCHEMA_VERSION
    }
}

/// Encode items into the current envelope layout.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(items: &[CartLineItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EnvelopeRef {
        version: SCHEMA_VERSION,
        items,
    })
}

/// Decode a stored envelope, migrating older layouts.
///
/// The returned items satisfy the cart invariants: no duplicate keys and no
/// zero quantities.
///
/// # Errors
///
/// Returns an error if the payload is not JSON or has no recognisable items.
pub fn decode(raw: &str) -> Result<Decoded, EnvelopeError> {
    let mut root: Value = serde_json::from_str(raw)?;

    let version = root
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);

    let nested = root.get("items").is_none();
    let items = take_items(&mut root).ok_or(EnvelopeError::MissingItems)?;

    if version > SCHEMA_VERSION {
        warn!(
            stored_version = version,
            current_version = SCHEMA_VERSION,
            "Cart was saved by a newer version, reading best-effort"
        );
    }

    // Older clients wrote the nested layout with legacy field names while
    // already stamping version 1, so the layout decides, not the number.
    let legacy = version < SCHEMA_VERSION || nested || items.iter().any(is_legacy_item);
    let items = if legacy { migrate_legacy(items) } else { items };

    let items: Vec<CartLineItem> = serde_json::from_value(Value::Array(items))?;

    Ok(Decoded {
        items: normalize(items),
        stored_version: version,
        migrated_from: legacy.then_some(version),
    })
}

/// Pull the items array out of the envelope, accepting the legacy nested
/// `{ "state": { "items": [...] } }` layout as well.
fn take_items(root: &mut Value) -> Option<Vec<Value>> {
    let slot = if root.get("items").is_some() {
        root.get_mut("items")
    } else {
        root.get_mut("state").and_then(|state| state.get_mut("items"))
    }?;

    match slot.take() {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

/// An item still using the field names of the first clients.
fn is_legacy_item(item: &Value) -> bool {
    item.as_object().is_some_and(|fields| {
        ["modelId", "price", "id"]
            .iter()
            .any(|old| fields.contains_key(*old))
            || fields.get("productId").is_some_and(Value::is_number)
    })
}

/// The first clients stored `modelId` (or a numeric `productId`), `price`
/// and `id` instead of `productId`, `unitPrice` and `displayId`.
fn migrate_legacy(items: Vec<Value>) -> Vec<Value> {
    const RENAMES: [(&str, &str); 3] = [
        ("modelId", "productId"),
        ("price", "unitPrice"),
        ("id", "displayId"),
    ];

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(mut fields) => {
                for (old, new) in RENAMES {
                    rename_field(&mut fields, old, new);
                }
                if let Some(Value::Number(id)) = fields.get("productId") {
                    let id = id.to_string();
                    fields.insert("productId".to_string(), Value::String(id));
                }
                if let Some(Value::Number(id)) = fields.get("displayId") {
                    let id = id.to_string();
                    fields.insert("displayId".to_string(), Value::String(id));
                }
                if fields.get("image").is_some_and(Value::is_null) {
                    fields.remove("image");
                }
                Value::Object(fields)
            }
            other => other,
        })
        .collect()
}

fn rename_field(fields: &mut Map<String, Value>, old: &str, new: &str) {
    if fields.contains_key(new) {
        return;
    }
    if let Some(value) = fields.remove(old) {
        fields.insert(new.to_string(), value);
    }
}

/// Enforce the cart invariants on externally supplied items: merge
/// duplicate keys (first entry's metadata wins) and drop empty lines.
pub(crate) fn normalize(items: Vec<CartLineItem>) -> Vec<CartLineItem> {
    let mut merged: Vec<CartLineItem> = Vec::with_capacity(items.len());
    let mut positions: HashMap<LineKey, usize> = HashMap::with_capacity(items.len());

    for item in items {
        if item.quantity == 0 {
            continue;
        }
        if let Some(existing) = positions.get(&item.key).and_then(|&i| merged.get_mut(i)) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            continue;
        }
        positions.insert(item.key.clone(), merged.len());
        merged.push(item);
    }

    merged
}

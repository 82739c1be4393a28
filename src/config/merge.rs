//! Deep merge of JSON documents.
//!
//! Objects merge key by key, recursively. Every other value (arrays included)
//! in the overlay replaces the base value wholesale. Keys that only exist in
//! the overlay are carried over untouched so newer config files survive a
//! round-trip through older builds.

use serde_json::Value;

/// Overlays `overlay` onto a copy of `base` and returns the result.
///
/// Neither input is modified. The result never aliases the caller's overlay.
#[must_use]
pub fn merge(base: &Value, overlay: &Value) -> Value {
    merge_into(base.clone(), overlay)
}

/// Overlays `overlay` onto an owned `base`, reusing its allocations.
#[must_use]
pub fn merge_into(base: Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay_obj)) => {
            for (key, value) in overlay_obj {
                let next = match merged.remove(key) {
                    Some(existing) => merge_into(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        (_, other) => other.clone(),
    }
}

//! Deep merge of two JSON documents.
//!
//! The overlay is layered on top of the base:
//! - Objects: merged key by key, recursively
//! - Arrays: concatenated, base elements first
//! - Anything else: the overlay value replaces the base value
//!
//! Keys that only exist in the base are kept where they are. Keys introduced
//! by the overlay are appended after them.

use serde_json::{Map, Value as JsonValue};

/// Merges `overlay` on top of `base`.
///
/// Total over every pair of values. Not commutative: swapping the arguments
/// changes both the conflict winner and the order of concatenated arrays.
pub fn merge(base: JsonValue, overlay: JsonValue) -> JsonValue {
    match (base, overlay) {
        (JsonValue::Object(mut base), JsonValue::Object(overlay)) => {
            merge_objects(&mut base, overlay);
            JsonValue::Object(base)
        }
        (JsonValue::Array(mut base), JsonValue::Array(overlay)) => {
            base.extend(overlay);
            JsonValue::Array(base)
        }
        (_, overlay) => overlay,
    }
}

fn merge_objects(base: &mut Map<String, JsonValue>, overlay: Map<String, JsonValue>) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => {
                // take() leaves the slot in place so the key keeps its position
                let current = existing.take();
                *existing = merge(current, value);
            }
            None => {
                base.insert(key, value);
            }
        }
    }
}

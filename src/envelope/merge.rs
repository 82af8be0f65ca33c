//! Recursive fragment merge.
//!
//! # Responsibilities
//! - Merge objects key by key, recursing where both sides are objects
//! - Concatenate arrays
//! - Overwrite scalars and mismatched shapes with the fragment's value
//!
//! # Design Decisions
//! - Later fragments win scalar conflicts; earlier keys survive otherwise,
//!   so stages can contribute in any order without clobbering each other
//! - Merging the same object/scalar fragment twice equals merging it once;
//!   arrays are the deliberate exception (concatenation is additive)

use serde_json::Value;

/// Deep-merge `fragment` into `target`.
pub fn deep_merge(target: &mut Value, fragment: Value) {
    match (target, fragment) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => deep_merge(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            existing.extend(incoming);
        }
        (slot, incoming) => {
            *slot = incoming;
        }
    }
}

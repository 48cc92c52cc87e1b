//! String interning
//!
//! Deduplicates strings into surrogate keys (keymap) and keeps the display
//! strings of keys (datamap for leaf values, rootmap for their grouping).
//!
//! ```text
//! keymap  "Windows 10" → 4      datamap 4 → "Windows 10"
//!         "Windows"    → 8      rootmap 8 → "Windows"
//!                               root    4 → 8
//! ```

use crate::error::Result;
use crate::registry::{IntStrMap, Metric, StrIntMap};
use crate::store::SlotSet;

/// Outcome of interning one string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interned {
    pub key: u32,
    /// False when the string was already known and nothing changed
    pub is_new: bool,
}

/// Key of `value` in the string → key table of `metric`
pub fn lookup(slots: &SlotSet, metric: Metric, value: &str) -> Option<u32> {
    slots.get::<StrIntMap>(metric)?.get(value).copied()
}

/// Return the key of `value`, allocating one with `allocate` when unseen.
///
/// `allocate` receives the same slot set, so sequences stored next to the
/// table can be used. Room for the new key is reserved before allocating.
pub fn intern<F>(slots: &mut SlotSet, metric: Metric, value: &str, allocate: F) -> Result<Interned>
where
    F: FnOnce(&mut SlotSet) -> Result<u32>,
{
    if let Some(key) = lookup(slots, metric, value) {
        return Ok(Interned { key, is_new: false });
    }

    slots.get_or_create::<StrIntMap>(metric)?.try_reserve(1)?;
    let key = allocate(slots)?;
    slots
        .get_or_create::<StrIntMap>(metric)?
        .insert(value.to_owned(), key);

    Ok(Interned { key, is_new: true })
}

/// Store `value` as the label of `key` unless one is already present.
/// Returns whether the label was written.
pub fn label(map: &mut IntStrMap, key: u32, value: &str) -> bool {
    if map.contains_key(&key) {
        return false;
    }
    map.insert(key, value.to_owned());
    true
}

/// Label of `key` in the key → string table of `metric`
pub fn resolve(slots: &SlotSet, metric: Metric, key: u32) -> Option<&str> {
    slots
        .get::<IntStrMap>(metric)?
        .get(&key)
        .map(String::as_str)
}

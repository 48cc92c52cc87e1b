//! Aggregation primitives
//!
//! Combine functions applied when a counter key already exists, and the
//! cross-date min/max fold used by report queries.

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::Result;

/// How a delta merges into an existing value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combine {
    /// Running total (hits, bandwidth, cumulative time)
    Sum,
    /// Largest value seen (max time served)
    Max,
}

/// Counter value types
pub trait Tally: Copy + Ord {
    fn saturating_add(self, other: Self) -> Self;
}

impl Tally for u32 {
    fn saturating_add(self, other: Self) -> Self {
        u32::saturating_add(self, other)
    }
}

impl Tally for u64 {
    fn saturating_add(self, other: Self) -> Self {
        u64::saturating_add(self, other)
    }
}

impl Combine {
    pub fn apply<V: Tally>(self, current: V, delta: V) -> V {
        match self {
            Combine::Sum => current.saturating_add(delta),
            Combine::Max => current.max(delta),
        }
    }
}

/// Make room for one more key so the next insert cannot fail
pub fn reserve<K: Eq + Hash, V>(map: &mut HashMap<K, V>) -> Result<()> {
    map.try_reserve(1)?;
    Ok(())
}

/// Insert `delta` under `key`, or combine it with the stored value.
/// Returns the value now stored.
pub fn accumulate<V: Tally>(map: &mut HashMap<u32, V>, key: u32, delta: V, how: Combine) -> V {
    let value = map
        .entry(key)
        .and_modify(|current| *current = how.apply(*current, delta))
        .or_insert(delta);
    *value
}

/// [`accumulate`] for string-keyed tables; the key is copied only when new
pub fn accumulate_named<V: Tally>(
    map: &mut HashMap<String, V>,
    key: &str,
    delta: V,
    how: Combine,
) -> V {
    match map.get_mut(key) {
        Some(current) => {
            *current = how.apply(*current, delta);
            *current
        }
        None => {
            map.insert(key.to_owned(), delta);
            delta
        }
    }
}

/// Smallest and largest of `values`, `None` when empty
pub fn min_max<V: Tally>(values: impl IntoIterator<Item = V>) -> Option<(V, V)> {
    values.into_iter().fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

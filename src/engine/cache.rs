//! Aggregate cache rebuild
//!
//! Recomputes every module's cache from the live date stores, oldest date
//! first. Strings the cache already knew keep their cache keys; date keys
//! are re-mapped to cache keys through each date's keymap.
//!
//! ```text
//! date keymap  "GET /" → 3          cache keymap  "GET /" → 17
//! date hits    3 → 12      ──▶      cache hits    17 → 12 (+ other dates)
//! ```

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::aggregate::{self, Combine, Tally};
use crate::error::{Result, TallyError};
use crate::interner;
use crate::keys::{KeyAllocator, Sequence};
use crate::module::Module;
use crate::registry::{
    Detached, IntIntMap, IntListMap, IntStrMap, Metric, MetricSlot, Shaped, SlotKey, SlotValue,
    StrIntMap, StrU64Map,
};
use crate::store::{ModuleStore, SlotSet};

use super::ingest::push_unique;
use super::Engine;

/// Date key → cache key of one module on one date
type Remap = HashMap<u32, u32>;

impl Engine {
    /// Rebuild the aggregate cache and drop every memoized raw data view.
    /// Date stores are left untouched.
    pub fn rebuild_cache(&mut self) -> Result<()> {
        let global = self.global.as_mut().ok_or(TallyError::Uninitialized)?;

        let mut skipped = 0usize;
        for module in Module::ALL {
            let (cache, global_seqs) = global.split_cache_mut(module);
            let previous = detach_keymap(cache.slots_mut());
            let released = cache.slots_mut().clear();
            debug!(module = %module, released, kept = previous.len(), "cache cleared");

            for store in self.dates.iter() {
                let dated = store.module(module);
                let remap = remap_keys(dated, cache.slots_mut(), global_seqs, &previous, module)?;
                skipped += replay(dated, cache.slots_mut(), &remap)?;
            }
        }

        if skipped > 0 {
            warn!(skipped, "entries without a keymap mapping left out of the cache");
        }
        self.raw_data.clear();
        info!(dates = self.dates.len(), "aggregate cache rebuilt");
        Ok(())
    }
}

/// Detach the cache keymap and hand back its string → cache key pairs
fn detach_keymap(cache: &mut SlotSet) -> StrIntMap {
    let Some(slot) = cache.take(Metric::Keymap) else {
        return StrIntMap::new();
    };

    match MetricSlot::destroy_shallow(slot) {
        Detached::Entries(entries) => entries
            .into_iter()
            .filter_map(|entry| match (entry.key, entry.value) {
                (SlotKey::Str(value), SlotValue::U32(ckey)) => Some((value, ckey)),
                _ => None,
            })
            .collect(),
        Detached::Partitions(_) => StrIntMap::new(),
    }
}

/// Intern every string of the date keymap into the cache, reusing the cache
/// key it had before the rebuild
fn remap_keys(
    dated: &ModuleStore,
    cache: &mut SlotSet,
    global_seqs: &mut SlotSet,
    previous: &StrIntMap,
    module: Module,
) -> Result<Remap> {
    let Some(keymap) = dated.slots().get::<StrIntMap>(Metric::Keymap) else {
        return Ok(Remap::new());
    };

    let mut remap = Remap::with_capacity(keymap.len());
    for (value, &key) in keymap {
        let cached = interner::intern(cache, Metric::Keymap, value, |_| match previous.get(value) {
            Some(&ckey) => Ok(ckey),
            None => KeyAllocator::new(&mut *global_seqs).next(&Sequence::CacheKeymap(module)),
        })?;
        remap.insert(key, cached.key);
    }
    Ok(remap)
}

/// Merge one date's module tables into the cache; returns entries skipped
/// for lack of a cache key
fn replay(dated: &ModuleStore, cache: &mut SlotSet, remap: &Remap) -> Result<usize> {
    let src = dated.slots();
    let mut skipped = 0;

    for metric in [Metric::Datamap, Metric::Rootmap, Metric::Methods, Metric::Protocols] {
        skipped += replay_labels(src, cache, metric, remap)?;
    }
    for metric in [Metric::Hits, Metric::Visitors] {
        skipped += replay_counts::<u32>(src, cache, metric, remap, Combine::Sum)?;
    }
    for metric in [Metric::Bw, Metric::Cumts] {
        skipped += replay_counts::<u64>(src, cache, metric, remap, Combine::Sum)?;
    }
    skipped += replay_counts::<u64>(src, cache, Metric::Maxts, remap, Combine::Max)?;
    skipped += replay_roots(src, cache, remap)?;
    skipped += replay_agents(src, cache, remap)?;
    replay_metadata(src, cache)?;

    Ok(skipped)
}

fn replay_labels(src: &SlotSet, cache: &mut SlotSet, metric: Metric, remap: &Remap) -> Result<usize> {
    let Some(labels) = src.get::<IntStrMap>(metric) else {
        return Ok(0);
    };

    let cached = cache.get_or_create::<IntStrMap>(metric)?;
    let mut skipped = 0;
    for (key, value) in labels {
        match remap.get(key) {
            Some(&ckey) => {
                aggregate::reserve(cached)?;
                interner::label(cached, ckey, value);
            }
            None => skipped += 1,
        }
    }
    Ok(skipped)
}

fn replay_counts<V>(
    src: &SlotSet,
    cache: &mut SlotSet,
    metric: Metric,
    remap: &Remap,
    how: Combine,
) -> Result<usize>
where
    V: Tally,
    HashMap<u32, V>: Shaped,
{
    let Some(counts) = src.get::<HashMap<u32, V>>(metric) else {
        return Ok(0);
    };

    let cached = cache.get_or_create::<HashMap<u32, V>>(metric)?;
    let mut skipped = 0;
    for (key, &value) in counts {
        match remap.get(key) {
            Some(&ckey) => {
                aggregate::reserve(cached)?;
                aggregate::accumulate(cached, ckey, value, how);
            }
            None => skipped += 1,
        }
    }
    Ok(skipped)
}

fn replay_roots(src: &SlotSet, cache: &mut SlotSet, remap: &Remap) -> Result<usize> {
    let Some(roots) = src.get::<IntIntMap>(Metric::Root) else {
        return Ok(0);
    };

    let cached = cache.get_or_create::<IntIntMap>(Metric::Root)?;
    let mut skipped = 0;
    for (key, root) in roots {
        match (remap.get(key), remap.get(root)) {
            (Some(&ckey), Some(&croot)) => {
                aggregate::reserve(cached)?;
                cached.insert(ckey, croot);
            }
            _ => skipped += 1,
        }
    }
    Ok(skipped)
}

fn replay_agents(src: &SlotSet, cache: &mut SlotSet, remap: &Remap) -> Result<usize> {
    let Some(agents) = src.get::<IntListMap>(Metric::Agents) else {
        return Ok(0);
    };

    let cached = cache.get_or_create::<IntListMap>(Metric::Agents)?;
    let mut skipped = 0;
    for (key, list) in agents {
        let Some(&ckey) = remap.get(key) else {
            skipped += 1;
            continue;
        };
        aggregate::reserve(cached)?;
        for &agent in list {
            push_unique(cached, ckey, agent)?;
        }
    }
    Ok(skipped)
}

fn replay_metadata(src: &SlotSet, cache: &mut SlotSet) -> Result<()> {
    let Some(meta) = src.get::<StrU64Map>(Metric::Metadata) else {
        return Ok(());
    };

    let cached = cache.get_or_create::<StrU64Map>(Metric::Metadata)?;
    for (name, &value) in meta {
        aggregate::reserve(cached)?;
        aggregate::accumulate_named(cached, name, value, Combine::Sum);
    }
    Ok(())
}

//! Insert family
//!
//! Every write lands in the date store and, where the metric is aggregated,
//! in the cache under the caller-supplied cache key. Table capacity is
//! reserved on both sides before either side is written.

use std::collections::HashMap;

use crate::aggregate::{self, Combine, Tally};
use crate::error::{Result, TallyError};
use crate::interner::{self, Interned};
use crate::keys::{self, KeyAllocator, Sequence};
use crate::module::Module;
use crate::registry::{
    IntIntMap, IntListMap, IntStrMap, IntU64Map, Metric, Shaped, StrIntMap, StrStrMap, StrU64Map,
    U64ByteMap,
};
use crate::store::{ModuleStore, SlotSet, TOTAL_KEY};

use super::{Counter, Engine, KeymapEntry};

impl Engine {
    // =========================================================================
    // Interning
    // =========================================================================

    /// Intern `value` in the module's keymap for `date` and in the cache.
    ///
    /// Table room and sequence headroom are checked on both sides first, so
    /// a failure leaves neither keymap changed.
    pub fn insert_keymap(&mut self, module: Module, date: u32, value: &str) -> Result<KeymapEntry> {
        self.with_date(date, |store, global| {
            let (dated, date_seqs) = store.split_mut(module);
            let (cache, global_seqs) = global.split_cache_mut(module);

            dated.slots_mut().get_or_create::<StrIntMap>(Metric::Keymap)?.try_reserve(1)?;
            cache.slots_mut().get_or_create::<StrIntMap>(Metric::Keymap)?.try_reserve(1)?;
            if dated.keymap(value).is_none() {
                KeyAllocator::new(date_seqs).prepare(&Sequence::Keymap(module))?;
            }
            if cache.keymap(value).is_none() {
                KeyAllocator::new(global_seqs).prepare(&Sequence::CacheKeymap(module))?;
            }

            let interned = interner::intern(dated.slots_mut(), Metric::Keymap, value, |_| {
                KeyAllocator::new(date_seqs).next(&Sequence::Keymap(module))
            })?;
            let cached = interner::intern(cache.slots_mut(), Metric::Keymap, value, |_| {
                KeyAllocator::new(global_seqs).next(&Sequence::CacheKeymap(module))
            })?;

            Ok(KeymapEntry {
                key: interned.key,
                ckey: cached.key,
                is_new: interned.is_new,
            })
        })
    }

    /// Display string of a leaf key. Returns whether the date side was written.
    pub fn insert_datamap(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        value: &str,
        ckey: u32,
    ) -> Result<bool> {
        self.insert_label(module, date, Metric::Datamap, key, value, ckey)
    }

    /// Display string of a root key
    pub fn insert_rootmap(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        value: &str,
        ckey: u32,
    ) -> Result<bool> {
        self.insert_label(module, date, Metric::Rootmap, key, value, ckey)
    }

    pub fn insert_method(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        value: &str,
        ckey: u32,
    ) -> Result<bool> {
        self.insert_label(module, date, Metric::Methods, key, value, ckey)
    }

    pub fn insert_protocol(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        value: &str,
        ckey: u32,
    ) -> Result<bool> {
        self.insert_label(module, date, Metric::Protocols, key, value, ckey)
    }

    /// Link data key `key` to root key `root` on `date`, and `ckey` to
    /// `croot` in the cache
    pub fn insert_root(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        root: u32,
        ckey: u32,
        croot: u32,
    ) -> Result<()> {
        self.with_date(date, |store, global| {
            let dated = store
                .module_mut(module)
                .slots_mut()
                .get_or_create::<IntIntMap>(Metric::Root)?;
            let cached = global
                .cache_mut(module)
                .slots_mut()
                .get_or_create::<IntIntMap>(Metric::Root)?;
            aggregate::reserve(dated)?;
            aggregate::reserve(cached)?;

            dated.insert(key, root);
            cached.insert(ckey, croot);
            Ok(())
        })
    }

    // =========================================================================
    // Counters
    // =========================================================================

    /// Add `inc` hits; returns the date's total for `key`
    pub fn insert_hits(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        inc: u32,
        ckey: u32,
    ) -> Result<u32> {
        self.with_date(date, |store, global| {
            accumulate_pair(
                store.module_mut(module),
                global.cache_mut(module),
                Metric::Hits,
                (key, ckey),
                inc,
                Combine::Sum,
            )
        })
    }

    /// Count visitor `uniq_key` for `key` once per date. Returns the date's
    /// visitor count for `key`.
    ///
    /// The (visitor, key) presence table of the date is owned by this call:
    /// a pair already present leaves both counts untouched.
    pub fn insert_visitor(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        uniq_key: u32,
        ckey: u32,
    ) -> Result<u32> {
        self.with_date(date, |store, global| {
            let dated = store.module_mut(module);
            let composite = keys::encode(uniq_key, key);
            if dated.has_uniq(composite) {
                return dated.visitors(key).ok_or_else(|| {
                    TallyError::NotFound(format!(
                        "visitor count of key {} on {} ({})",
                        key, date, module
                    ))
                });
            }

            aggregate::reserve(dated.slots_mut().get_or_create::<U64ByteMap>(Metric::Uniqmap)?)?;
            let visitors = accumulate_pair(
                dated,
                global.cache_mut(module),
                Metric::Visitors,
                (key, ckey),
                1,
                Combine::Sum,
            )?;
            dated
                .slots_mut()
                .get_or_create::<U64ByteMap>(Metric::Uniqmap)?
                .insert(composite, 1);
            Ok(visitors)
        })
    }

    pub fn insert_bw(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        inc: u64,
        ckey: u32,
    ) -> Result<u64> {
        self.insert_u64(module, date, Metric::Bw, (key, ckey), inc, Combine::Sum)
    }

    /// Add time served (microseconds)
    pub fn insert_cumts(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        inc: u64,
        ckey: u32,
    ) -> Result<u64> {
        self.insert_u64(module, date, Metric::Cumts, (key, ckey), inc, Combine::Sum)
    }

    /// Keep the largest time served (microseconds)
    pub fn insert_maxts(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        value: u64,
        ckey: u32,
    ) -> Result<u64> {
        self.insert_u64(module, date, Metric::Maxts, (key, ckey), value, Combine::Max)
    }

    /// Append user-agent `agent` to the list of `key`. Returns true if the
    /// date's list did not hold it yet.
    pub fn insert_agent(
        &mut self,
        module: Module,
        date: u32,
        key: u32,
        agent: u32,
        ckey: u32,
    ) -> Result<bool> {
        self.with_date(date, |store, global| {
            let dated = store
                .module_mut(module)
                .slots_mut()
                .get_or_create::<IntListMap>(Metric::Agents)?;
            let cached = global
                .cache_mut(module)
                .slots_mut()
                .get_or_create::<IntListMap>(Metric::Agents)?;
            aggregate::reserve(dated)?;
            aggregate::reserve(cached)?;

            push_unique(cached, ckey, agent)?;
            push_unique(dated, key, agent)
        })
    }

    /// Add `value` to the named module counter; returns the date's total
    pub fn insert_meta_data(
        &mut self,
        module: Module,
        date: u32,
        name: &str,
        value: u64,
    ) -> Result<u64> {
        self.with_date(date, |store, global| {
            let dated = store
                .module_mut(module)
                .slots_mut()
                .get_or_create::<StrU64Map>(Metric::Metadata)?;
            let cached = global
                .cache_mut(module)
                .slots_mut()
                .get_or_create::<StrU64Map>(Metric::Metadata)?;
            aggregate::reserve(dated)?;
            aggregate::reserve(cached)?;

            aggregate::accumulate_named(cached, name, value, Combine::Sum);
            Ok(aggregate::accumulate_named(dated, name, value, Combine::Sum))
        })
    }

    // =========================================================================
    // Keys
    // =========================================================================

    /// Intern a visitor identity (ip|date|agent) for `date`
    pub fn insert_unique_key(&mut self, date: u32, identity: &str) -> Result<Interned> {
        self.with_date(date, |store, _| {
            interner::intern(store.slots_mut(), Metric::UniqueKeys, identity, |slots| {
                KeyAllocator::new(slots).next(&Sequence::UniqueKeys)
            })
        })
    }

    /// Intern a user agent in the process-wide catalog
    pub fn insert_agent_key(&mut self, agent: &str) -> Result<Interned> {
        let global = self.global_mut()?;
        interner::intern(global.slots_mut(), Metric::AgentKeys, agent, |slots| {
            KeyAllocator::new(slots).next(&Sequence::AgentKeys)
        })
    }

    /// Store the user-agent string of `key`; the first value wins
    pub fn insert_agent_value(&mut self, key: u32, agent: &str) -> Result<bool> {
        let global = self.global_mut()?;
        label_into(global.slots_mut(), Metric::AgentVals, key, agent)
    }

    /// Next free-form key of `date`
    pub fn next_key(&mut self, date: u32) -> Result<u32> {
        self.with_date(date, |store, _| {
            KeyAllocator::new(store.slots_mut()).next(&Sequence::Date)
        })
    }

    /// Next free-form process-scoped key
    pub fn next_global_key(&mut self) -> Result<u32> {
        let global = self.global_mut()?;
        KeyAllocator::new(global.slots_mut()).next(&Sequence::Global)
    }

    // =========================================================================
    // Global Bookkeeping
    // =========================================================================

    /// Resolved hostname of `ip`; the first value wins
    pub fn insert_hostname(&mut self, ip: &str, host: &str) -> Result<bool> {
        let hostnames = self
            .global_mut()?
            .slots_mut()
            .get_or_create::<StrStrMap>(Metric::Hostnames)?;
        if hostnames.contains_key(ip) {
            return Ok(false);
        }
        aggregate::reserve(hostnames)?;
        hostnames.insert(ip.to_owned(), host.to_owned());
        Ok(true)
    }

    pub fn insert_last_parse(&mut self, key: u32, value: u32) -> Result<()> {
        let last_parse = self
            .global_mut()?
            .slots_mut()
            .get_or_create::<IntIntMap>(Metric::LastParse)?;
        aggregate::reserve(last_parse)?;
        last_parse.insert(key, value);
        Ok(())
    }

    pub fn inc_overall(&mut self, counter: Counter, inc: u32) -> Result<u32> {
        let overall = self
            .global_mut()?
            .slots_mut()
            .get_or_create::<StrIntMap>(Metric::Overall)?;
        aggregate::reserve(overall)?;
        Ok(aggregate::accumulate_named(overall, counter.name(), inc, Combine::Sum))
    }

    /// Count valid requests on `date`; returns the date's total
    pub fn inc_cnt_valid(&mut self, date: u32, inc: u32) -> Result<u32> {
        self.with_date(date, |store, _| {
            let totals = store.slots_mut().get_or_create::<IntIntMap>(Metric::CntValid)?;
            aggregate::reserve(totals)?;
            Ok(aggregate::accumulate(totals, TOTAL_KEY, inc, Combine::Sum))
        })
    }

    /// Count bytes served on `date`; returns the date's total
    pub fn inc_cnt_bw(&mut self, date: u32, inc: u64) -> Result<u64> {
        self.with_date(date, |store, _| {
            let totals = store.slots_mut().get_or_create::<IntU64Map>(Metric::CntBw)?;
            aggregate::reserve(totals)?;
            Ok(aggregate::accumulate(totals, TOTAL_KEY, inc, Combine::Sum))
        })
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn insert_label(
        &mut self,
        module: Module,
        date: u32,
        metric: Metric,
        key: u32,
        value: &str,
        ckey: u32,
    ) -> Result<bool> {
        self.with_date(date, |store, global| {
            let dated = store.module_mut(module).slots_mut().get_or_create::<IntStrMap>(metric)?;
            let cached = global.cache_mut(module).slots_mut().get_or_create::<IntStrMap>(metric)?;
            aggregate::reserve(dated)?;
            aggregate::reserve(cached)?;

            interner::label(cached, ckey, value);
            Ok(interner::label(dated, key, value))
        })
    }

    fn insert_u64(
        &mut self,
        module: Module,
        date: u32,
        metric: Metric,
        keys: (u32, u32),
        delta: u64,
        how: Combine,
    ) -> Result<u64> {
        self.with_date(date, |store, global| {
            accumulate_pair(
                store.module_mut(module),
                global.cache_mut(module),
                metric,
                keys,
                delta,
                how,
            )
        })
    }
}

/// Combine `delta` into the date table under `key` and into the cache
/// table under `ckey`; returns the date-side value
fn accumulate_pair<V>(
    dated: &mut ModuleStore,
    cache: &mut ModuleStore,
    metric: Metric,
    (key, ckey): (u32, u32),
    delta: V,
    how: Combine,
) -> Result<V>
where
    V: Tally,
    HashMap<u32, V>: Shaped,
{
    let dated = dated.slots_mut().get_or_create::<HashMap<u32, V>>(metric)?;
    let cached = cache.slots_mut().get_or_create::<HashMap<u32, V>>(metric)?;
    aggregate::reserve(dated)?;
    aggregate::reserve(cached)?;

    aggregate::accumulate(cached, ckey, delta, how);
    Ok(aggregate::accumulate(dated, key, delta, how))
}

fn label_into(slots: &mut SlotSet, metric: Metric, key: u32, value: &str) -> Result<bool> {
    let labels = slots.get_or_create::<IntStrMap>(metric)?;
    aggregate::reserve(labels)?;
    Ok(interner::label(labels, key, value))
}

pub(super) fn push_unique(lists: &mut IntListMap, key: u32, item: u32) -> Result<bool> {
    let list = lists.entry(key).or_default();
    if list.contains(&item) {
        return Ok(false);
    }
    list.try_reserve(1)?;
    list.push(item);
    Ok(true)
}

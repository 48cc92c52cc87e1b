//! Query family
//!
//! Module lookups read the aggregate cache and take cache keys. Lookups
//! scoped to one date read that date's store and report `NotFound` for an
//! unknown date or key. Min/max folds scan every live date.

use std::collections::HashMap;

use crate::aggregate::{self, Tally};
use crate::error::{Result, TallyError};
use crate::module::Module;
use crate::registry::{IntIntMap, Metric, Shaped, U64ByteMap};
use crate::store::ModuleStore;

use super::{Counter, Engine};

impl Engine {
    // =========================================================================
    // Cache Lookups
    // =========================================================================

    /// Cache key of `value`
    pub fn get_keymap(&self, module: Module, value: &str) -> Option<u32> {
        self.cache(module)?.keymap(value)
    }

    pub fn get_datamap(&self, module: Module, ckey: u32) -> Option<&str> {
        self.cache(module)?.datamap(ckey)
    }

    pub fn get_rootmap(&self, module: Module, ckey: u32) -> Option<&str> {
        self.cache(module)?.rootmap(ckey)
    }

    /// Root display string of data key `ckey`
    pub fn get_root(&self, module: Module, ckey: u32) -> Option<&str> {
        let cache = self.cache(module)?;
        cache.rootmap(cache.root(ckey)?)
    }

    /// Cache keys of every data key grouped under `root`
    pub fn get_keymap_list_from_key(&self, module: Module, root: &str) -> Vec<u32> {
        let Some(cache) = self.cache(module) else {
            return Vec::new();
        };
        let Some(rkey) = cache.keymap(root) else {
            return Vec::new();
        };

        let mut keys: Vec<u32> = cache
            .slots()
            .get::<IntIntMap>(Metric::Root)
            .map(|roots| {
                roots
                    .iter()
                    .filter(|(_, &r)| r == rkey)
                    .map(|(&key, _)| key)
                    .collect()
            })
            .unwrap_or_default();
        keys.sort_unstable();
        keys
    }

    pub fn get_hits(&self, module: Module, ckey: u32) -> Option<u32> {
        self.cache(module)?.hits(ckey)
    }

    pub fn get_visitors(&self, module: Module, ckey: u32) -> Option<u32> {
        self.cache(module)?.visitors(ckey)
    }

    pub fn get_bw(&self, module: Module, ckey: u32) -> Option<u64> {
        self.cache(module)?.bw(ckey)
    }

    pub fn get_cumts(&self, module: Module, ckey: u32) -> Option<u64> {
        self.cache(module)?.cumts(ckey)
    }

    pub fn get_maxts(&self, module: Module, ckey: u32) -> Option<u64> {
        self.cache(module)?.maxts(ckey)
    }

    pub fn get_method(&self, module: Module, ckey: u32) -> Option<&str> {
        self.cache(module)?.method(ckey)
    }

    pub fn get_protocol(&self, module: Module, ckey: u32) -> Option<&str> {
        self.cache(module)?.protocol(ckey)
    }

    /// User-agent keys seen for `ckey`
    pub fn get_host_agent_list(&self, module: Module, ckey: u32) -> Option<&[u32]> {
        self.cache(module)?.agents(ckey)
    }

    pub fn get_meta_data(&self, module: Module, name: &str) -> Option<u64> {
        self.cache(module)?.metadata(name)
    }

    // =========================================================================
    // Global Lookups
    // =========================================================================

    /// User-agent string of agent key `key`
    pub fn get_host_agent_val(&self, key: u32) -> Option<&str> {
        self.global.as_ref()?.agent_value(key)
    }

    pub fn get_agent_key(&self, agent: &str) -> Option<u32> {
        self.global.as_ref()?.agent_key(agent)
    }

    pub fn get_hostname(&self, ip: &str) -> Option<&str> {
        self.global.as_ref()?.hostname(ip)
    }

    pub fn get_last_parse(&self, key: u32) -> Option<u32> {
        self.global.as_ref()?.last_parse(key)
    }

    pub fn get_overall(&self, counter: Counter) -> Option<u32> {
        self.global.as_ref()?.overall(counter.name())
    }

    // =========================================================================
    // Date Lookups
    // =========================================================================

    /// Key of visitor identity `identity` on `date`
    pub fn get_unique_key(&self, date: u32, identity: &str) -> Result<u32> {
        self.date_store(date)?
            .unique_key(identity)
            .ok_or_else(|| not_found(date, "unique key", identity))
    }

    /// Date-scoped key of `value`
    pub fn get_keymap_on(&self, module: Module, date: u32, value: &str) -> Result<u32> {
        self.date_store(date)?
            .module(module)
            .keymap(value)
            .ok_or_else(|| not_found(date, "keymap entry", value))
    }

    pub fn get_datamap_on(&self, module: Module, date: u32, key: u32) -> Result<&str> {
        self.date_store(date)?
            .module(module)
            .datamap(key)
            .ok_or_else(|| not_found(date, "datamap key", key))
    }

    pub fn get_hits_on(&self, module: Module, date: u32, key: u32) -> Result<u32> {
        self.date_store(date)?
            .module(module)
            .hits(key)
            .ok_or_else(|| not_found(date, "hits key", key))
    }

    pub fn get_visitors_on(&self, module: Module, date: u32, key: u32) -> Result<u32> {
        self.date_store(date)?
            .module(module)
            .visitors(key)
            .ok_or_else(|| not_found(date, "visitors key", key))
    }

    pub fn get_bw_on(&self, module: Module, date: u32, key: u32) -> Result<u64> {
        self.date_store(date)?
            .module(module)
            .bw(key)
            .ok_or_else(|| not_found(date, "bandwidth key", key))
    }

    // =========================================================================
    // Sizes and Totals
    // =========================================================================

    /// Live dates, ascending
    pub fn sorted_dates(&self) -> Vec<u32> {
        self.dates.sorted_dates()
    }

    pub fn size_dates(&self) -> usize {
        self.dates.len()
    }

    /// Distinct data keys in the module's cache
    pub fn get_size_datamap(&self, module: Module) -> usize {
        self.cache(module).map_or(0, |cache| cache.size(Metric::Datamap))
    }

    /// (visitor, key) pairs seen across every date
    pub fn get_size_uniqmap(&self, module: Module) -> usize {
        self.dates
            .iter()
            .filter_map(|store| {
                store
                    .module(module)
                    .slots()
                    .get::<U64ByteMap>(Metric::Uniqmap)
            })
            .map(HashMap::len)
            .sum()
    }

    /// Valid requests over every date
    pub fn sum_valid(&self) -> u64 {
        self.dates
            .iter()
            .filter_map(|store| store.cnt_valid())
            .fold(0u64, |total, n| total.saturating_add(u64::from(n)))
    }

    /// Bytes served over every date
    pub fn sum_bw(&self) -> u64 {
        self.dates
            .iter()
            .filter_map(|store| store.cnt_bw())
            .fold(0u64, u64::saturating_add)
    }

    // =========================================================================
    // Cross-Date Folds
    // =========================================================================

    pub fn get_hits_min_max(&self, module: Module) -> Option<(u32, u32)> {
        self.min_max::<u32>(module, Metric::Hits)
    }

    pub fn get_visitors_min_max(&self, module: Module) -> Option<(u32, u32)> {
        self.min_max::<u32>(module, Metric::Visitors)
    }

    pub fn get_bw_min_max(&self, module: Module) -> Option<(u64, u64)> {
        self.min_max::<u64>(module, Metric::Bw)
    }

    pub fn get_cumts_min_max(&self, module: Module) -> Option<(u64, u64)> {
        self.min_max::<u64>(module, Metric::Cumts)
    }

    pub fn get_maxts_min_max(&self, module: Module) -> Option<(u64, u64)> {
        self.min_max::<u64>(module, Metric::Maxts)
    }

    fn min_max<V>(&self, module: Module, metric: Metric) -> Option<(V, V)>
    where
        V: Tally,
        HashMap<u32, V>: Shaped,
    {
        let values = self
            .dates
            .iter()
            .filter_map(|store| store.module(module).slots().get::<HashMap<u32, V>>(metric))
            .flat_map(|table| table.values().copied());
        aggregate::min_max(values)
    }

    fn cache(&self, module: Module) -> Option<&ModuleStore> {
        Some(self.global.as_ref()?.cache(module))
    }
}

fn not_found(date: u32, what: &str, key: impl std::fmt::Display) -> TallyError {
    TallyError::NotFound(format!("{} {} on date {}", what, key, date))
}

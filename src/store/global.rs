//! Global store
//!
//! Date-independent slots plus the aggregate cache: one module store per
//! module holding the cross-date merged view, keyed by cache keys.

use crate::module::Module;
use crate::registry::{IntIntMap, IntStrMap, Metric, MetricScope, StrIntMap, StrStrMap};

use super::module::ModuleStore;
use super::slots::{SlotOptions, SlotSet};

#[derive(Debug)]
pub struct GlobalStore {
    slots: SlotSet,
    cache: [ModuleStore; Module::COUNT],
}

impl GlobalStore {
    pub fn new(options: &SlotOptions) -> Self {
        Self {
            slots: SlotSet::new(MetricScope::Global, None, options),
            cache: std::array::from_fn(|i| {
                let module = Module::ALL[i];
                ModuleStore::new(module, format!("CACHE_{}", module.name()), options)
            }),
        }
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    /// Aggregate cache of `module`
    pub fn cache(&self, module: Module) -> &ModuleStore {
        &self.cache[module.index()]
    }

    pub fn cache_mut(&mut self, module: Module) -> &mut ModuleStore {
        &mut self.cache[module.index()]
    }

    /// A cache module store together with the global slots (sequences)
    pub fn split_cache_mut(&mut self, module: Module) -> (&mut ModuleStore, &mut SlotSet) {
        (&mut self.cache[module.index()], &mut self.slots)
    }

    // =========================================================================
    // Point Lookups
    // =========================================================================

    pub fn agent_key(&self, agent: &str) -> Option<u32> {
        self.slots.get::<StrIntMap>(Metric::AgentKeys)?.get(agent).copied()
    }

    pub fn agent_value(&self, key: u32) -> Option<&str> {
        self.slots
            .get::<IntStrMap>(Metric::AgentVals)?
            .get(&key)
            .map(String::as_str)
    }

    pub fn hostname(&self, ip: &str) -> Option<&str> {
        self.slots
            .get::<StrStrMap>(Metric::Hostnames)?
            .get(ip)
            .map(String::as_str)
    }

    pub fn last_parse(&self, key: u32) -> Option<u32> {
        self.slots.get::<IntIntMap>(Metric::LastParse)?.get(&key).copied()
    }

    pub fn overall(&self, name: &str) -> Option<u32> {
        self.slots.get::<StrIntMap>(Metric::Overall)?.get(name).copied()
    }

    /// Deep-destroy the store; returns entries released
    pub fn destroy(self) -> usize {
        let cache: usize = self.cache.into_iter().map(ModuleStore::destroy).sum();
        cache + self.slots.destroy()
    }
}

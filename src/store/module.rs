//! Module store
//!
//! The metric slots of one analysis module, either for one date or for the
//! aggregate cache.

use std::collections::HashMap;

use crate::interner;
use crate::module::Module;
use crate::registry::{IntListMap, Metric, MetricScope, Shaped, StrU64Map, U64ByteMap};

use super::slots::{SlotOptions, SlotSet};

#[derive(Debug)]
pub struct ModuleStore {
    module: Module,
    slots: SlotSet,
}

impl ModuleStore {
    pub fn new(module: Module, label: String, options: &SlotOptions) -> Self {
        Self {
            module,
            slots: SlotSet::new(MetricScope::Module, Some(label), options),
        }
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    // =========================================================================
    // Point Lookups
    // =========================================================================

    pub fn keymap(&self, value: &str) -> Option<u32> {
        interner::lookup(&self.slots, Metric::Keymap, value)
    }

    pub fn datamap(&self, key: u32) -> Option<&str> {
        self.label(Metric::Datamap, key)
    }

    pub fn rootmap(&self, key: u32) -> Option<&str> {
        self.label(Metric::Rootmap, key)
    }

    pub fn method(&self, key: u32) -> Option<&str> {
        self.label(Metric::Methods, key)
    }

    pub fn protocol(&self, key: u32) -> Option<&str> {
        self.label(Metric::Protocols, key)
    }

    /// Root key of a data key
    pub fn root(&self, key: u32) -> Option<u32> {
        self.value::<u32>(Metric::Root, key)
    }

    pub fn hits(&self, key: u32) -> Option<u32> {
        self.value::<u32>(Metric::Hits, key)
    }

    pub fn visitors(&self, key: u32) -> Option<u32> {
        self.value::<u32>(Metric::Visitors, key)
    }

    pub fn bw(&self, key: u32) -> Option<u64> {
        self.value::<u64>(Metric::Bw, key)
    }

    pub fn cumts(&self, key: u32) -> Option<u64> {
        self.value::<u64>(Metric::Cumts, key)
    }

    pub fn maxts(&self, key: u32) -> Option<u64> {
        self.value::<u64>(Metric::Maxts, key)
    }

    pub fn agents(&self, key: u32) -> Option<&[u32]> {
        self.slots
            .get::<IntListMap>(Metric::Agents)?
            .get(&key)
            .map(Vec::as_slice)
    }

    pub fn metadata(&self, key: &str) -> Option<u64> {
        self.slots.get::<StrU64Map>(Metric::Metadata)?.get(key).copied()
    }

    /// Whether the composite (visitor, data key) pair was seen
    pub fn has_uniq(&self, composite: u64) -> bool {
        self.slots
            .get::<U64ByteMap>(Metric::Uniqmap)
            .is_some_and(|map| map.contains_key(&composite))
    }

    // =========================================================================
    // Sizes
    // =========================================================================

    pub fn size(&self, metric: Metric) -> usize {
        self.slots.slot(metric).map_or(0, |slot| slot.len())
    }

    /// Deep-destroy the store; returns entries released
    pub fn destroy(self) -> usize {
        self.slots.destroy()
    }

    fn label(&self, metric: Metric, key: u32) -> Option<&str> {
        interner::resolve(&self.slots, metric, key)
    }

    fn value<V: Copy>(&self, metric: Metric, key: u32) -> Option<V>
    where
        HashMap<u32, V>: Shaped,
    {
        self.slots
            .get::<HashMap<u32, V>>(metric)?
            .get(&key)
            .copied()
    }
}

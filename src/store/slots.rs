//! Slot sets
//!
//! The lazily populated metric → slot mapping shared by module stores, date
//! stores and the global store. A slot exists only once something was
//! written to its metric.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::{Result, TallyError};
use crate::registry::{Metric, MetricScope, MetricSlot, Shaped};

/// Settings applied to every slot a set creates
#[derive(Debug, Clone, Default)]
pub struct SlotOptions {
    /// Entries reserved when a table is allocated
    pub capacity: usize,
    /// Tag slots with persistence identifiers
    pub persist: bool,
}

impl From<&Config> for SlotOptions {
    fn from(config: &Config) -> Self {
        Self {
            capacity: config.initial_capacity,
            persist: config.persist_slots,
        }
    }
}

/// Metric → slot mapping of one scope
#[derive(Debug)]
pub struct SlotSet {
    scope: MetricScope,
    /// Suffix of persistence ids (module name), if any
    label: Option<String>,
    options: SlotOptions,
    slots: BTreeMap<Metric, MetricSlot>,
}

impl SlotSet {
    pub fn new(scope: MetricScope, label: Option<String>, options: &SlotOptions) -> Self {
        Self {
            scope,
            label,
            options: options.clone(),
            slots: BTreeMap::new(),
        }
    }

    pub fn scope(&self) -> MetricScope {
        self.scope
    }

    /// Number of instantiated slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Instantiated slots in metric order
    pub fn iter(&self) -> impl Iterator<Item = &MetricSlot> {
        self.slots.values()
    }

    pub fn slot(&self, metric: Metric) -> Option<&MetricSlot> {
        self.slots.get(&metric)
    }

    /// Concrete table of `metric`, if it was ever written
    pub fn get<T: Shaped>(&self, metric: Metric) -> Option<&T> {
        self.slots.get(&metric)?.table::<T>()
    }

    pub fn get_mut<T: Shaped>(&mut self, metric: Metric) -> Option<&mut T> {
        self.slots.get_mut(&metric)?.table_mut::<T>()
    }

    /// Slot of `metric`, allocated on first use
    pub fn slot_or_create(&mut self, metric: Metric) -> Result<&mut MetricSlot> {
        if !metric.allowed_in(self.scope) {
            return Err(TallyError::InvalidArgument(format!(
                "metric {} is not available in {:?} scope",
                metric.name(),
                self.scope
            )));
        }

        if !self.slots.contains_key(&metric) {
            let slot = MetricSlot::new(metric, self.options.capacity, self.persistence_id(metric))?;
            self.slots.insert(metric, slot);
        }

        self.slots
            .get_mut(&metric)
            .ok_or_else(|| TallyError::NotFound(format!("slot {}", metric.name())))
    }

    /// Concrete table of `metric`, allocated on first use
    pub fn get_or_create<T: Shaped>(&mut self, metric: Metric) -> Result<&mut T> {
        if metric.shape() != T::SHAPE {
            return Err(TallyError::InvalidArgument(format!(
                "metric {} is stored as {}, not {}",
                metric.name(),
                metric.shape().name(),
                T::SHAPE.name()
            )));
        }

        let slot = self.slot_or_create(metric)?;
        let shape = slot.shape();
        slot.table_mut::<T>().ok_or_else(|| {
            TallyError::InvalidArgument(format!(
                "slot {} holds a {} table",
                metric.name(),
                shape.name()
            ))
        })
    }

    /// Detach one slot from the set
    pub fn take(&mut self, metric: Metric) -> Option<MetricSlot> {
        self.slots.remove(&metric)
    }

    /// Deep-destroy every slot, leaving the set empty; returns entries released
    pub fn clear(&mut self) -> usize {
        std::mem::take(&mut self.slots)
            .into_values()
            .map(MetricSlot::destroy_deep)
            .sum()
    }

    /// Deep-destroy the set; returns entries released
    pub fn destroy(mut self) -> usize {
        self.clear()
    }

    fn persistence_id(&self, metric: Metric) -> Option<String> {
        if !self.options.persist {
            return None;
        }
        let shape = metric.shape().name();
        Some(match &self.label {
            Some(label) => format!("{}_{}_{}.db", shape, metric.name(), label),
            None => format!("{}_{}.db", shape, metric.name()),
        })
    }
}

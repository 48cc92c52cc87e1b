//! Date store
//!
//! Everything learned about one calendar date: one module store per module,
//! held inline, plus the date-level slots (visitor identities, totals and
//! the date-scoped key sequences).

use crate::error::{Result, TallyError};
use crate::module::Module;
use crate::registry::{IntIntMap, IntU64Map, Metric, MetricScope, StrIntMap};

use super::module::ModuleStore;
use super::slots::{SlotOptions, SlotSet};

/// Key under which per-date totals are stored
pub const TOTAL_KEY: u32 = 1;

/// Check that `date` is a real calendar day in YYYYMMDD form
pub fn validate_date(date: u32) -> Result<()> {
    let year = date / 1_00_00;
    let month = date / 100 % 100;
    let day = date % 100;
    if year == 0 || !(1..=12).contains(&month) || !(1..=days_in_month(year, month)).contains(&day) {
        return Err(TallyError::InvalidArgument(format!(
            "date key {} is not a YYYYMMDD calendar day",
            date
        )));
    }
    Ok(())
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[derive(Debug)]
pub struct DateStore {
    date: u32,
    modules: [ModuleStore; Module::COUNT],
    slots: SlotSet,
}

impl DateStore {
    pub fn new(date: u32, options: &SlotOptions) -> Self {
        Self {
            date,
            modules: std::array::from_fn(|i| {
                let module = Module::ALL[i];
                ModuleStore::new(module, module.name().to_string(), options)
            }),
            slots: SlotSet::new(MetricScope::Date, None, options),
        }
    }

    pub fn date(&self) -> u32 {
        self.date
    }

    pub fn module(&self, module: Module) -> &ModuleStore {
        &self.modules[module.index()]
    }

    pub fn module_mut(&mut self, module: Module) -> &mut ModuleStore {
        &mut self.modules[module.index()]
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleStore> {
        self.modules.iter()
    }

    pub fn slots(&self) -> &SlotSet {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut SlotSet {
        &mut self.slots
    }

    /// A module store together with the date-level slots (sequences)
    pub fn split_mut(&mut self, module: Module) -> (&mut ModuleStore, &mut SlotSet) {
        (&mut self.modules[module.index()], &mut self.slots)
    }

    /// Key of a visitor identity (ip|date|agent) on this date
    pub fn unique_key(&self, identity: &str) -> Option<u32> {
        self.slots.get::<StrIntMap>(Metric::UniqueKeys)?.get(identity).copied()
    }

    /// Valid requests counted on this date
    pub fn cnt_valid(&self) -> Option<u32> {
        self.slots.get::<IntIntMap>(Metric::CntValid)?.get(&TOTAL_KEY).copied()
    }

    /// Bytes served on this date
    pub fn cnt_bw(&self) -> Option<u64> {
        self.slots.get::<IntU64Map>(Metric::CntBw)?.get(&TOTAL_KEY).copied()
    }

    /// Deep-destroy the store; returns entries released
    pub fn destroy(self) -> usize {
        let modules: usize = self.modules.into_iter().map(ModuleStore::destroy).sum();
        modules + self.slots.destroy()
    }
}

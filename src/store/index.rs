//! Date index
//!
//! Ordered date → [`DateStore`] mapping, held in a slot of the nested shape.
//! Dates are created on first reference and torn down synchronously.

use tracing::{debug, info};

use crate::error::{Result, TallyError};
use crate::registry::{DateMap, Detached, Metric, MetricSlot, Shaped};

use super::date::{validate_date, DateStore};
use super::slots::SlotOptions;

#[derive(Debug)]
pub struct DateIndex {
    slot: MetricSlot,
    options: SlotOptions,
}

impl DateIndex {
    pub fn new(options: &SlotOptions) -> Result<Self> {
        let persistence_id = options
            .persist
            .then(|| format!("{}_{}.db", Metric::Dates.shape().name(), Metric::Dates.name()));

        Ok(Self {
            slot: MetricSlot::new(Metric::Dates, 0, persistence_id)?,
            options: options.clone(),
        })
    }

    /// The underlying slot (enumerates dates for a persistence writer)
    pub fn slot(&self) -> &MetricSlot {
        &self.slot
    }

    pub fn len(&self) -> usize {
        self.slot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_empty()
    }

    pub fn contains(&self, date: u32) -> bool {
        self.dates().is_some_and(|dates| dates.contains_key(&date))
    }

    pub fn get(&self, date: u32) -> Option<&DateStore> {
        self.dates()?.get(&date)
    }

    pub fn get_mut(&mut self, date: u32) -> Option<&mut DateStore> {
        self.slot.table_mut::<DateMap>()?.get_mut(&date)
    }

    /// Store of `date`, created on first reference
    pub fn get_or_create(&mut self, date: u32) -> Result<&mut DateStore> {
        let options = &self.options;
        let dates = self
            .slot
            .table_mut::<DateMap>()
            .ok_or_else(|| TallyError::InvalidArgument("date index is not an IGKH table".into()))?;

        if !dates.contains_key(&date) {
            validate_date(date)?;
            debug!(date, "date store created");
        }

        Ok(dates
            .entry(date)
            .or_insert_with(|| DateStore::new(date, options)))
    }

    /// Remove `date` without tearing it down
    pub fn remove(&mut self, date: u32) -> Option<DateStore> {
        self.slot.table_mut::<DateMap>()?.remove(&date)
    }

    /// Remove and deep-destroy `date`. Returns false if it was not present.
    pub fn invalidate(&mut self, date: u32) -> bool {
        match self.remove(date) {
            Some(store) => {
                let released = store.destroy();
                info!(date, released, "date invalidated");
                true
            }
            None => false,
        }
    }

    /// Dates in ascending order
    pub fn sorted_dates(&self) -> Vec<u32> {
        self.dates()
            .map(|dates| dates.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn first_date(&self) -> Option<u32> {
        self.dates()?.keys().next().copied()
    }

    /// Date stores in ascending date order
    pub fn iter(&self) -> impl Iterator<Item = &DateStore> {
        self.dates().into_iter().flat_map(|dates| dates.values())
    }

    /// Detach every date from the index, then deep-destroy each one.
    /// Returns entries released.
    pub fn clear(&mut self) -> usize {
        let Some(dates) = self.slot.table_mut::<DateMap>() else {
            return 0;
        };

        match std::mem::take(dates).destroy_shallow() {
            Detached::Partitions(partitions) => partitions
                .into_iter()
                .map(|(date, store)| {
                    let released = store.destroy();
                    debug!(date, released, "date store destroyed");
                    released + 1
                })
                .sum(),
            Detached::Entries(entries) => entries.len(),
        }
    }

    fn dates(&self) -> Option<&DateMap> {
        self.slot.table::<DateMap>()
    }
}

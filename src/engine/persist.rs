//! Persistence hook
//!
//! Enumerates slot contents for an external writer and feeds them back on
//! restore. The encoding and the storage medium belong to the caller; a
//! snapshot is plain serde data.
//!
//! The aggregate cache is never part of a snapshot: it is derived state and
//! is rebuilt from the restored dates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TallyError};
use crate::module::Module;
use crate::registry::{Metric, MetricScope, MetricShape, SlotEntry};
use crate::store::{validate_date, SlotSet};

use super::Engine;

/// Container a slot belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotScope {
    Global,
    Date(u32),
    DateModule(u32, Module),
}

/// Every live entry of one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub scope: SlotScope,
    pub metric: Metric,
    /// Persistence id, when slots are tagged
    pub persistence_id: Option<String>,
    pub entries: Vec<SlotEntry>,
}

impl Engine {
    /// Copy out every global, date and date-module slot
    pub fn snapshot(&self) -> Result<Vec<SlotSnapshot>> {
        let global = self.global_store()?;

        let mut snapshots = capture(SlotScope::Global, global.slots());
        for store in self.date_index().iter() {
            let date = store.date();
            snapshots.extend(capture(SlotScope::Date(date), store.slots()));
            for module in store.modules() {
                snapshots.extend(capture(
                    SlotScope::DateModule(date, module.module()),
                    module.slots(),
                ));
            }
        }
        Ok(snapshots)
    }

    /// Insert snapshot entries back into their slots, then rebuild the
    /// aggregate cache.
    ///
    /// Snapshots may only fill dates the index does not hold yet and global
    /// tables that are still empty, so live keys and sequences are never
    /// overwritten. Every snapshot is checked before anything is written; if
    /// writing still fails, the dates and global tables created by this call
    /// are removed again.
    pub fn restore(&mut self, snapshots: Vec<SlotSnapshot>) -> Result<()> {
        self.global_store()?;
        for snapshot in &snapshots {
            self.check_restorable(snapshot)?;
        }

        let mut created = BTreeSet::new();
        let mut touched = Vec::new();
        match self.apply(snapshots, &mut created, &mut touched) {
            Ok(restored) => {
                info!(restored, dates = self.size_dates(), "snapshot restored");
                self.rebuild_cache()
            }
            Err(e) => {
                warn!(error = %e, dates = created.len(), "restore failed, rolling back");
                for date in created {
                    self.dates.remove(date);
                }
                if let Some(global) = self.global.as_mut() {
                    for metric in touched {
                        global.slots_mut().take(metric);
                    }
                }
                Err(e)
            }
        }
    }

    fn check_restorable(&self, snapshot: &SlotSnapshot) -> Result<()> {
        let metric = snapshot.metric;
        let occupied = match snapshot.scope {
            SlotScope::Global => self
                .global_store()?
                .slots()
                .slot(metric)
                .is_some_and(|slot| !slot.is_empty()),
            SlotScope::Date(date) | SlotScope::DateModule(date, _) => {
                validate_date(date)?;
                self.dates.contains(date)
            }
        };

        if occupied {
            return Err(TallyError::InvalidArgument(format!(
                "{:?} already holds {} data",
                snapshot.scope,
                metric.name()
            )));
        }
        if metric.shape() == MetricShape::IntStore || !metric.allowed_in(snapshot.scope.into()) {
            return Err(TallyError::InvalidArgument(format!(
                "metric {} cannot be restored into {:?}",
                metric.name(),
                snapshot.scope
            )));
        }
        if let Some(entry) = snapshot.entries.iter().find(|e| !e.fits(metric.shape())) {
            return Err(TallyError::InvalidArgument(format!(
                "entry {:?} does not fit metric {} ({})",
                entry,
                metric.name(),
                metric.shape().name()
            )));
        }
        Ok(())
    }

    fn apply(
        &mut self,
        snapshots: Vec<SlotSnapshot>,
        created: &mut BTreeSet<u32>,
        touched: &mut Vec<Metric>,
    ) -> Result<usize> {
        let mut restored = 0usize;
        for snapshot in snapshots {
            match snapshot.scope {
                SlotScope::Global => touched.push(snapshot.metric),
                SlotScope::Date(date) | SlotScope::DateModule(date, _) => {
                    if !self.dates.contains(date) {
                        created.insert(date);
                    }
                }
            }

            let slots = self.slots_for(snapshot.scope)?;
            let slot = slots.slot_or_create(snapshot.metric)?;
            for entry in snapshot.entries {
                slot.restore(entry)?;
                restored += 1;
            }
        }
        Ok(restored)
    }

    fn slots_for(&mut self, scope: SlotScope) -> Result<&mut SlotSet> {
        match scope {
            SlotScope::Global => Ok(self.global_mut()?.slots_mut()),
            SlotScope::Date(date) => Ok(self.dates.get_or_create(date)?.slots_mut()),
            SlotScope::DateModule(date, module) => Ok(self
                .dates
                .get_or_create(date)?
                .module_mut(module)
                .slots_mut()),
        }
    }
}

impl From<SlotScope> for MetricScope {
    fn from(scope: SlotScope) -> Self {
        match scope {
            SlotScope::Global => MetricScope::Global,
            SlotScope::Date(_) => MetricScope::Date,
            SlotScope::DateModule(..) => MetricScope::Module,
        }
    }
}

fn capture(scope: SlotScope, slots: &SlotSet) -> Vec<SlotSnapshot> {
    slots
        .iter()
        .map(|slot| SlotSnapshot {
            scope,
            metric: slot.metric(),
            persistence_id: slot.persistence_id().map(str::to_owned),
            entries: slot.entries().collect(),
        })
        .collect()
}

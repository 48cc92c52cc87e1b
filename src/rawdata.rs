//! Raw data builder
//!
//! Materializes the sorted (key, value) view of a module's primary metric
//! from the aggregate cache, for report generation. Views are memoized per
//! module and only dropped when explicitly invalidated.

use std::cmp::Ordering;

use crate::module::Module;
use crate::registry::{IntIntMap, IntStrMap, Metric};
use crate::store::ModuleStore;

/// Metric a module's report is ordered by
pub fn primary_metric(module: Module) -> Metric {
    match module {
        // one row per date; its label is the display date
        Module::Visitors => Metric::Datamap,
        _ => Metric::Hits,
    }
}

/// Value of one raw data row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum RawValue {
    Hits(u32),
    Data(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDataItem {
    /// Cache key of the row
    pub key: u32,
    pub value: RawValue,
}

/// Sorted view of one module: value descending, key ascending on ties
#[derive(Debug, Clone)]
pub struct RawData {
    module: Module,
    items: Vec<RawDataItem>,
}

impl RawData {
    pub fn build(cache: &ModuleStore) -> Self {
        let module = cache.module();
        let mut items: Vec<RawDataItem> = match primary_metric(module) {
            Metric::Datamap => cache
                .slots()
                .get::<IntStrMap>(Metric::Datamap)
                .map(|map| {
                    map.iter()
                        .map(|(&key, data)| RawDataItem {
                            key,
                            value: RawValue::Data(data.clone()),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            metric => cache
                .slots()
                .get::<IntIntMap>(metric)
                .map(|map| {
                    map.iter()
                        .map(|(&key, &hits)| RawDataItem {
                            key,
                            value: RawValue::Hits(hits),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        };

        items.sort_by(compare);
        Self { module, items }
    }

    pub fn module(&self) -> Module {
        self.module
    }

    pub fn items(&self) -> &[RawDataItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawDataItem> {
        self.items.iter()
    }
}

fn compare(a: &RawDataItem, b: &RawDataItem) -> Ordering {
    b.value.cmp(&a.value).then(a.key.cmp(&b.key))
}

/// Memoized views, one per module
#[derive(Debug)]
pub(crate) struct RawDataCache {
    built: [Option<RawData>; Module::COUNT],
}

impl RawDataCache {
    pub(crate) fn new() -> Self {
        Self {
            built: std::array::from_fn(|_| None),
        }
    }

    pub(crate) fn get_or_build(&mut self, cache: &ModuleStore) -> &RawData {
        self.built[cache.module().index()].get_or_insert_with(|| RawData::build(cache))
    }

    pub(crate) fn is_built(&self, module: Module) -> bool {
        self.built[module.index()].is_some()
    }

    pub(crate) fn invalidate(&mut self, module: Module) {
        self.built[module.index()] = None;
    }

    pub(crate) fn clear(&mut self) {
        self.built.iter_mut().for_each(|view| *view = None);
    }
}

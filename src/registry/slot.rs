//! Metric slots
//!
//! A slot binds one metric to one table. The shape's behavior triple is
//! resolved once when the slot is created and reused for its whole life.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Result, TallyError};

use super::shape::{Metric, MetricShape};
use super::table::{Detached, ShapeOps, Shaped, Table};

// =============================================================================
// Entries (persistence hook)
// =============================================================================

/// Key of one slot entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotKey {
    U32(u32),
    U64(u64),
    Str(String),
}

/// Value of one slot entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotValue {
    U8(u8),
    U32(u32),
    U64(u64),
    Str(String),
    List(Vec<u32>),
    /// A nested date partition, enumerated through its own slots
    Partition,
}

/// One live key → value pair of a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotEntry {
    pub key: SlotKey,
    pub value: SlotValue,
}

impl SlotEntry {
    pub fn new(key: impl Into<SlotKey>, value: impl Into<SlotValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Whether the entry can be stored in a table of `shape`. Nested
    /// partitions are never restored through an entry.
    pub fn fits(&self, shape: MetricShape) -> bool {
        use SlotKey as K;
        use SlotValue as V;

        matches!(
            (shape, &self.key, &self.value),
            (MetricShape::IntInt, K::U32(_), V::U32(_))
                | (MetricShape::IntStr, K::U32(_), V::Str(_))
                | (MetricShape::IntU64, K::U32(_), V::U64(_))
                | (MetricShape::StrInt, K::Str(_), V::U32(_))
                | (MetricShape::StrStr, K::Str(_), V::Str(_))
                | (MetricShape::IntList, K::U32(_), V::List(_))
                | (MetricShape::StrU64, K::Str(_), V::U64(_))
                | (MetricShape::U64Byte, K::U64(_), V::U8(_))
        )
    }
}

impl From<u32> for SlotKey {
    fn from(key: u32) -> Self {
        SlotKey::U32(key)
    }
}

impl From<u64> for SlotKey {
    fn from(key: u64) -> Self {
        SlotKey::U64(key)
    }
}

impl From<String> for SlotKey {
    fn from(key: String) -> Self {
        SlotKey::Str(key)
    }
}

impl From<u8> for SlotValue {
    fn from(value: u8) -> Self {
        SlotValue::U8(value)
    }
}

impl From<u32> for SlotValue {
    fn from(value: u32) -> Self {
        SlotValue::U32(value)
    }
}

impl From<u64> for SlotValue {
    fn from(value: u64) -> Self {
        SlotValue::U64(value)
    }
}

impl From<String> for SlotValue {
    fn from(value: String) -> Self {
        SlotValue::Str(value)
    }
}

impl From<Vec<u32>> for SlotValue {
    fn from(value: Vec<u32>) -> Self {
        SlotValue::List(value)
    }
}

/// Lazy iterator over the entries of a slot
pub struct Entries<'a> {
    inner: Box<dyn Iterator<Item = SlotEntry> + 'a>,
}

impl Iterator for Entries<'_> {
    type Item = SlotEntry;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

// =============================================================================
// Metric Slot
// =============================================================================

/// One metric table, optionally tagged for an external persistence writer
pub struct MetricSlot {
    metric: Metric,
    ops: &'static ShapeOps,
    table: Table,
    persistence_id: Option<String>,
}

impl MetricSlot {
    /// Allocate an empty table for `metric`
    pub fn new(metric: Metric, capacity: usize, persistence_id: Option<String>) -> Result<Self> {
        let ops = metric.shape().ops();
        let table = (ops.allocate)(capacity)?;
        trace!(metric = metric.name(), shape = metric.shape().name(), "slot allocated");

        Ok(Self {
            metric,
            ops,
            table,
            persistence_id,
        })
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn shape(&self) -> MetricShape {
        self.table.shape()
    }

    pub fn persistence_id(&self) -> Option<&str> {
        self.persistence_id.as_deref()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Concrete table, if `T` matches the slot's shape
    pub fn table<T: Shaped>(&self) -> Option<&T> {
        T::peel(&self.table)
    }

    pub fn table_mut<T: Shaped>(&mut self) -> Option<&mut T> {
        T::peel_mut(&mut self.table)
    }

    /// Enumerate every live entry. Each call starts from the beginning.
    pub fn entries(&self) -> Entries<'_> {
        let inner: Box<dyn Iterator<Item = SlotEntry> + '_> = match &self.table {
            Table::IntInt(m) => Box::new(m.iter().map(|(&k, &v)| SlotEntry::new(k, v))),
            Table::IntStr(m) => Box::new(m.iter().map(|(&k, v)| SlotEntry::new(k, v.clone()))),
            Table::IntU64(m) => Box::new(m.iter().map(|(&k, &v)| SlotEntry::new(k, v))),
            Table::StrInt(m) => Box::new(m.iter().map(|(k, &v)| SlotEntry::new(k.clone(), v))),
            Table::StrStr(m) => {
                Box::new(m.iter().map(|(k, v)| SlotEntry::new(k.clone(), v.clone())))
            }
            Table::IntList(m) => Box::new(m.iter().map(|(&k, v)| SlotEntry::new(k, v.clone()))),
            Table::StrU64(m) => Box::new(m.iter().map(|(k, &v)| SlotEntry::new(k.clone(), v))),
            Table::IntStore(m) => Box::new(m.keys().map(|&date| SlotEntry {
                key: SlotKey::U32(date),
                value: SlotValue::Partition,
            })),
            Table::U64Byte(m) => Box::new(m.iter().map(|(&k, &v)| SlotEntry::new(k, v))),
        };
        Entries { inner }
    }

    /// Insert one entry produced by [`MetricSlot::entries`], replacing any
    /// value already stored under its key
    pub fn restore(&mut self, entry: SlotEntry) -> Result<()> {
        if !entry.fits(self.shape()) {
            return Err(mismatch(self.metric, &entry));
        }

        match (&mut self.table, entry) {
            (Table::IntInt(m), SlotEntry { key: SlotKey::U32(k), value: SlotValue::U32(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (Table::IntStr(m), SlotEntry { key: SlotKey::U32(k), value: SlotValue::Str(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (Table::IntU64(m), SlotEntry { key: SlotKey::U32(k), value: SlotValue::U64(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (Table::StrInt(m), SlotEntry { key: SlotKey::Str(k), value: SlotValue::U32(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (Table::StrStr(m), SlotEntry { key: SlotKey::Str(k), value: SlotValue::Str(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (Table::IntList(m), SlotEntry { key: SlotKey::U32(k), value: SlotValue::List(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (Table::StrU64(m), SlotEntry { key: SlotKey::Str(k), value: SlotValue::U64(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (Table::U64Byte(m), SlotEntry { key: SlotKey::U64(k), value: SlotValue::U8(v) }) => {
                m.try_reserve(1)?;
                m.insert(k, v);
            }
            (_, entry) => return Err(mismatch(self.metric, &entry)),
        }
        Ok(())
    }

    /// Free the table and all values it holds; returns entries released
    pub fn destroy_deep(self) -> usize {
        (self.ops.destroy_deep)(self.table)
    }

    /// Free the table structure and hand its values back
    pub fn destroy_shallow(self) -> Detached {
        (self.ops.destroy_shallow)(self.table)
    }
}

/// Error for an entry that does not fit the shape of `metric`
fn mismatch(metric: Metric, entry: &SlotEntry) -> TallyError {
    TallyError::InvalidArgument(format!(
        "entry {:?} does not fit metric {} ({})",
        entry,
        metric.name(),
        metric.shape().name()
    ))
}

impl fmt::Debug for MetricSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSlot")
            .field("metric", &self.metric)
            .field("shape", &self.shape())
            .field("len", &self.len())
            .field("persistence_id", &self.persistence_id)
            .finish()
    }
}

//! Metric tables
//!
//! One concrete table type per shape, erased behind [`Table`] inside a slot.
//! The behavior triple of each shape (allocate, deep destroy, shallow
//! destroy) lives in the [`Shaped`] impl of its table type and is exposed to
//! type-erased callers through the static [`SHAPE_OPS`] table.

use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::store::DateStore;

use super::shape::MetricShape;
use super::slot::SlotEntry;

// =============================================================================
// Concrete Table Types
// =============================================================================

pub type IntIntMap = HashMap<u32, u32>;
pub type IntStrMap = HashMap<u32, String>;
pub type IntU64Map = HashMap<u32, u64>;
pub type StrIntMap = HashMap<String, u32>;
pub type StrStrMap = HashMap<String, String>;
pub type IntListMap = HashMap<u32, Vec<u32>>;
pub type StrU64Map = HashMap<String, u64>;
/// Ordered so that dates enumerate ascending
pub type DateMap = BTreeMap<u32, DateStore>;
pub type U64ByteMap = HashMap<u64, u8>;

/// A type-erased metric table
#[derive(Debug)]
pub enum Table {
    IntInt(IntIntMap),
    IntStr(IntStrMap),
    IntU64(IntU64Map),
    StrInt(StrIntMap),
    StrStr(StrStrMap),
    IntList(IntListMap),
    StrU64(StrU64Map),
    IntStore(DateMap),
    U64Byte(U64ByteMap),
}

impl Table {
    pub fn shape(&self) -> MetricShape {
        match self {
            Table::IntInt(_) => MetricShape::IntInt,
            Table::IntStr(_) => MetricShape::IntStr,
            Table::IntU64(_) => MetricShape::IntU64,
            Table::StrInt(_) => MetricShape::StrInt,
            Table::StrStr(_) => MetricShape::StrStr,
            Table::IntList(_) => MetricShape::IntList,
            Table::StrU64(_) => MetricShape::StrU64,
            Table::IntStore(_) => MetricShape::IntStore,
            Table::U64Byte(_) => MetricShape::U64Byte,
        }
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        match self {
            Table::IntInt(m) => m.len(),
            Table::IntStr(m) => m.len(),
            Table::IntU64(m) => m.len(),
            Table::StrInt(m) => m.len(),
            Table::StrStr(m) => m.len(),
            Table::IntList(m) => m.len(),
            Table::StrU64(m) => m.len(),
            Table::IntStore(m) => m.len(),
            Table::U64Byte(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Values handed back by a shallow destroy
#[derive(Debug)]
pub enum Detached {
    /// Key/value pairs of a scalar, string or list table
    Entries(Vec<SlotEntry>),
    /// Date stores of the nested shape, still intact
    Partitions(Vec<(u32, DateStore)>),
}

// =============================================================================
// Shape Behavior
// =============================================================================

/// A concrete table type bound to one shape
pub trait Shaped: Sized {
    const SHAPE: MetricShape;

    /// Create an empty table with room for `capacity` entries
    fn allocate(capacity: usize) -> Result<Self>;

    /// Free the table and everything it holds; returns entries released
    fn destroy_deep(self) -> usize;

    /// Free the table structure and hand its values back
    fn destroy_shallow(self) -> Detached;

    fn into_table(self) -> Table;

    /// Recover the concrete table, or give the table back untouched
    fn take(table: Table) -> std::result::Result<Self, Table>;

    fn peel(table: &Table) -> Option<&Self>;

    fn peel_mut(table: &mut Table) -> Option<&mut Self>;
}

macro_rules! hash_shape {
    ($map:ty, $variant:ident) => {
        impl Shaped for $map {
            const SHAPE: MetricShape = MetricShape::$variant;

            fn allocate(capacity: usize) -> Result<Self> {
                let mut map = <$map>::new();
                map.try_reserve(capacity)?;
                Ok(map)
            }

            fn destroy_deep(self) -> usize {
                self.len()
            }

            fn destroy_shallow(self) -> Detached {
                Detached::Entries(
                    self.into_iter()
                        .map(|(key, value)| SlotEntry::new(key, value))
                        .collect(),
                )
            }

            fn into_table(self) -> Table {
                Table::$variant(self)
            }

            fn take(table: Table) -> std::result::Result<Self, Table> {
                match table {
                    Table::$variant(map) => Ok(map),
                    other => Err(other),
                }
            }

            fn peel(table: &Table) -> Option<&Self> {
                match table {
                    Table::$variant(map) => Some(map),
                    _ => None,
                }
            }

            fn peel_mut(table: &mut Table) -> Option<&mut Self> {
                match table {
                    Table::$variant(map) => Some(map),
                    _ => None,
                }
            }
        }
    };
}

hash_shape!(IntIntMap, IntInt);
hash_shape!(IntStrMap, IntStr);
hash_shape!(IntU64Map, IntU64);
hash_shape!(StrIntMap, StrInt);
hash_shape!(StrStrMap, StrStr);
hash_shape!(IntListMap, IntList);
hash_shape!(StrU64Map, StrU64);
hash_shape!(U64ByteMap, U64Byte);

impl Shaped for DateMap {
    const SHAPE: MetricShape = MetricShape::IntStore;

    fn allocate(_capacity: usize) -> Result<Self> {
        Ok(BTreeMap::new())
    }

    fn destroy_deep(self) -> usize {
        self.into_values().map(|store| store.destroy() + 1).sum()
    }

    fn destroy_shallow(self) -> Detached {
        Detached::Partitions(self.into_iter().collect())
    }

    fn into_table(self) -> Table {
        Table::IntStore(self)
    }

    fn take(table: Table) -> std::result::Result<Self, Table> {
        match table {
            Table::IntStore(map) => Ok(map),
            other => Err(other),
        }
    }

    fn peel(table: &Table) -> Option<&Self> {
        match table {
            Table::IntStore(map) => Some(map),
            _ => None,
        }
    }

    fn peel_mut(table: &mut Table) -> Option<&mut Self> {
        match table {
            Table::IntStore(map) => Some(map),
            _ => None,
        }
    }
}

// =============================================================================
// Dispatch Table
// =============================================================================

/// Type-erased behavior triple of one shape
pub struct ShapeOps {
    pub allocate: fn(usize) -> Result<Table>,
    pub destroy_deep: fn(Table) -> usize,
    pub destroy_shallow: fn(Table) -> Detached,
}

fn allocate_as<T: Shaped>(capacity: usize) -> Result<Table> {
    T::allocate(capacity).map(Shaped::into_table)
}

// A table that does not match `T` is routed to its own shape's behavior.
fn destroy_deep_as<T: Shaped>(table: Table) -> usize {
    match T::take(table) {
        Ok(table) => table.destroy_deep(),
        Err(other) => (other.shape().ops().destroy_deep)(other),
    }
}

fn destroy_shallow_as<T: Shaped>(table: Table) -> Detached {
    match T::take(table) {
        Ok(table) => table.destroy_shallow(),
        Err(other) => (other.shape().ops().destroy_shallow)(other),
    }
}

macro_rules! shape_ops {
    ($map:ty) => {
        ShapeOps {
            allocate: allocate_as::<$map>,
            destroy_deep: destroy_deep_as::<$map>,
            destroy_shallow: destroy_shallow_as::<$map>,
        }
    };
}

/// Indexed by `MetricShape as usize`
pub static SHAPE_OPS: [ShapeOps; MetricShape::COUNT] = [
    shape_ops!(IntIntMap),
    shape_ops!(IntStrMap),
    shape_ops!(IntU64Map),
    shape_ops!(StrIntMap),
    shape_ops!(StrStrMap),
    shape_ops!(IntListMap),
    shape_ops!(StrU64Map),
    shape_ops!(DateMap),
    shape_ops!(U64ByteMap),
];

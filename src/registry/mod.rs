//! Registry Module
//!
//! The closed set of metric shapes and the metrics bound to them.
//!
//! ## Responsibilities
//! - Enumerate the 9 storage shapes (key type × value type)
//! - Allocate, deep-destroy and shallow-destroy a table of any shape
//! - Bind each metric id to its shape and allowed scope
//! - Wrap one table in a [`MetricSlot`] with an optional persistence id
//!
//! ## Shapes
//! ```text
//! ┌────────┬──────────┬────────────────────────────────────────┐
//! │ Tag    │ Key      │ Value                                  │
//! ├────────┼──────────┼────────────────────────────────────────┤
//! │ II32   │ u32      │ u32        hits, visitors, root, ...   │
//! │ IS32   │ u32      │ string     datamap, rootmap, methods   │
//! │ IU64   │ u32      │ u64        bandwidth, serve times      │
//! │ SI32   │ string   │ u32        keymap, sequences           │
//! │ SS32   │ string   │ string     hostnames                   │
//! │ IGSL   │ u32      │ [u32]      user agents per host        │
//! │ SU64   │ string   │ u64        metadata                    │
//! │ IGKH   │ u32      │ DateStore  the date index              │
//! │ U648   │ u64      │ u8         visitor presence            │
//! └────────┴──────────┴────────────────────────────────────────┘
//! ```

mod shape;
mod slot;
mod table;

pub use shape::{Metric, MetricScope, MetricShape};
pub use slot::{Entries, MetricSlot, SlotEntry, SlotKey, SlotValue};
pub use table::{
    DateMap, Detached, IntIntMap, IntListMap, IntStrMap, IntU64Map, ShapeOps, Shaped, StrIntMap,
    StrStrMap, StrU64Map, Table, U64ByteMap, SHAPE_OPS,
};

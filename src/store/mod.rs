//! Store Module
//!
//! Nested ownership of every metric slot.
//!
//! ## Responsibilities
//! - Lazily instantiate slots per scope (module, date, global)
//! - Own one module store per module inside each date store
//! - Keep dates ordered and tear them down synchronously
//!
//! ## Ownership
//! ```text
//! DateIndex ──owns──▶ DateStore (per YYYYMMDD)
//!                       ├── [ModuleStore; 16] ──owns──▶ MetricSlot ▶ Table
//!                       └── SlotSet (unique keys, totals, sequences)
//!
//! GlobalStore
//!   ├── SlotSet (agents, hostnames, counters, sequences)
//!   └── [ModuleStore; 16]  aggregate cache, keyed by cache keys
//! ```

mod date;
mod global;
mod index;
mod module;
mod slots;

pub use date::{validate_date, DateStore, TOTAL_KEY};
pub use global::GlobalStore;
pub use index::DateIndex;
pub use module::ModuleStore;
pub use slots::{SlotOptions, SlotSet};

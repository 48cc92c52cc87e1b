//! # logtally
//!
//! An in-process, date-partitioned metric store for real-time log analytics:
//! - Nine fixed table shapes behind one slot abstraction
//! - Per-date partitions that can be dropped in one step
//! - String interning into compact surrogate keys
//! - A cross-date aggregate cache and sorted raw data views for reports
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Parser / Report collaborators                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ insert_* / get_* / raw_data
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │             (context object, single writer)                  │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │   DateIndex     │                │   GlobalStore   │
//!   │ YYYYMMDD → Date │                │ agents, counters│
//!   └────────┬────────┘                │ aggregate cache │
//!            │                         └────────┬────────┘
//!            ▼                                  │
//!   ┌─────────────────┐                         ▼
//!   │ DateStore       │                ┌─────────────────┐
//!   │ [ModuleStore;16]│──▶ MetricSlot  │ RawData (sorted)│
//!   └─────────────────┘    (9 shapes)  └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod module;

pub mod keys;
pub mod registry;
pub mod store;
pub mod interner;
pub mod aggregate;
pub mod rawdata;
pub mod engine;
pub mod shared;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, TallyError};
pub use config::Config;
pub use module::Module;
pub use engine::{Counter, Engine, KeymapEntry, SlotScope, SlotSnapshot};
pub use rawdata::{RawData, RawDataItem, RawValue};
pub use shared::SharedEngine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of logtally
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

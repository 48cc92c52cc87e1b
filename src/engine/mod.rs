//! Engine Module
//!
//! The context object that owns the whole store graph.
//!
//! ## Responsibilities
//! - Create the global store at init, tear everything down at free_all
//! - Route inserts into the date store (created on demand) and the
//!   aggregate cache
//! - Enforce the retention window
//! - Serve point lookups, cross-date folds and raw data views
//!
//! ## Concurrency Model
//! No internal locking: every mutation takes `&mut self`, so the borrow
//! checker serializes writers. Wrap the engine in
//! [`SharedEngine`](crate::shared::SharedEngine) to share it across threads.

mod cache;
mod ingest;
mod persist;
mod query;

pub use persist::{SlotScope, SlotSnapshot};

use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, TallyError};
use crate::module::Module;
use crate::rawdata::{RawData, RawDataCache};
use crate::store::{validate_date, DateIndex, DateStore, GlobalStore, SlotOptions};

/// Result of interning a string into a module's keymap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeymapEntry {
    /// Date-scoped key
    pub key: u32,
    /// Aggregate-cache key, stable across dates
    pub ckey: u32,
    /// Whether the string was new on this date
    pub is_new: bool,
}

/// Process-wide bookkeeping counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Lines processed
    Processed,
    /// Lines that failed to parse
    Invalid,
    /// Requests dropped by IP exclusion
    ExcludedIps,
    /// Seconds spent parsing
    ProcessingTime,
}

impl Counter {
    pub fn name(self) -> &'static str {
        match self {
            Counter::Processed => "processed",
            Counter::Invalid => "invalid",
            Counter::ExcludedIps => "excluded_ip",
            Counter::ProcessingTime => "processing_time",
        }
    }
}

/// The storage engine
pub struct Engine {
    config: Config,
    options: SlotOptions,
    global: Option<GlobalStore>,
    dates: DateIndex,
    raw_data: RawDataCache,
}

impl Engine {
    /// Create an initialized engine
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let options = SlotOptions::from(&config);
        let dates = DateIndex::new(&options)?;

        let mut engine = Self {
            config,
            options,
            global: None,
            dates,
            raw_data: RawDataCache::new(),
        };
        engine.init();
        Ok(engine)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create the global store. No-op when already initialized.
    pub fn init(&mut self) {
        if self.global.is_none() {
            self.global = Some(GlobalStore::new(&self.options));
            info!("storage initialized");
        }
    }

    /// Tear down every date, then the global store. No-op when already
    /// torn down.
    pub fn free_all(&mut self) {
        let Some(global) = self.global.take() else {
            return;
        };

        let dates = self.dates.len();
        let mut released = self.dates.clear();
        released += global.destroy();
        self.raw_data.clear();
        info!(dates, released, "storage freed");
    }

    pub fn is_initialized(&self) -> bool {
        self.global.is_some()
    }

    /// Register `date` without writing any metric. Returns true if created.
    pub fn insert_date(&mut self, date: u32) -> Result<bool> {
        let existed = self.dates.contains(date);
        self.with_date(date, |_, _| Ok(()))?;
        Ok(!existed)
    }

    /// Remove `date` and everything learned about it, then rebuild the
    /// aggregate cache from the remaining dates
    pub fn invalidate_date(&mut self, date: u32) -> Result<()> {
        if self.global.is_none() {
            return Err(TallyError::Uninitialized);
        }
        if !self.dates.invalidate(date) {
            return Err(TallyError::AlreadyInvalidated(date));
        }
        self.rebuild_cache()
    }

    // =========================================================================
    // Raw Data
    // =========================================================================

    /// Sorted view of the module's primary metric, built on first request
    pub fn raw_data(&mut self, module: Module) -> Result<&RawData> {
        let global = self.global.as_ref().ok_or(TallyError::Uninitialized)?;
        Ok(self.raw_data.get_or_build(global.cache(module)))
    }

    /// Drop the memoized view of `module`; call after writes a report must see
    pub fn invalidate_raw_data(&mut self, module: Module) {
        self.raw_data.invalidate(module);
    }

    pub fn has_raw_data(&self, module: Module) -> bool {
        self.raw_data.is_built(module)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn date_index(&self) -> &DateIndex {
        &self.dates
    }

    pub fn global_store(&self) -> Result<&GlobalStore> {
        self.global.as_ref().ok_or(TallyError::Uninitialized)
    }

    /// Store of `date`, NotFound when absent
    pub fn date_store(&self, date: u32) -> Result<&DateStore> {
        self.dates
            .get(date)
            .ok_or_else(|| TallyError::NotFound(format!("date {}", date)))
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn global_mut(&mut self) -> Result<&mut GlobalStore> {
        self.global.as_mut().ok_or(TallyError::Uninitialized)
    }

    /// Run `f` against the store of `date` (created on demand) and the
    /// global store.
    ///
    /// A date created here is removed again if `f` fails; the retention
    /// window is applied only after `f` succeeds.
    fn with_date<R, F>(&mut self, date: u32, f: F) -> Result<R>
    where
        F: FnOnce(&mut DateStore, &mut GlobalStore) -> Result<R>,
    {
        if self.global.is_none() {
            return Err(TallyError::Uninitialized);
        }

        let created = !self.dates.contains(date);
        if created {
            validate_date(date)?;
            self.check_window(date)?;
        }

        let global = self.global.as_mut().ok_or(TallyError::Uninitialized)?;
        let result = self
            .dates
            .get_or_create(date)
            .and_then(|store| f(store, global));

        match result {
            Ok(value) => {
                if created {
                    self.enforce_window()?;
                }
                Ok(value)
            }
            Err(e) => {
                if created {
                    self.dates.remove(date);
                }
                Err(e)
            }
        }
    }

    fn check_window(&self, date: u32) -> Result<()> {
        let Some(keep) = self.config.keep_last else {
            return Ok(());
        };
        match self.dates.first_date() {
            Some(oldest) if self.dates.len() >= keep && date < oldest => {
                Err(TallyError::OutOfWindow { date, oldest })
            }
            _ => Ok(()),
        }
    }

    fn enforce_window(&mut self) -> Result<()> {
        let Some(keep) = self.config.keep_last else {
            return Ok(());
        };

        let mut evicted = false;
        while self.dates.len() > keep {
            let Some(oldest) = self.dates.first_date() else {
                break;
            };
            warn!(date = oldest, keep, "evicting date outside retention window");
            evicted |= self.dates.invalidate(oldest);
        }

        if evicted {
            self.rebuild_cache()?;
        }
        Ok(())
    }
}

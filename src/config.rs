//! Configuration for logtally
//!
//! Centralized configuration with sensible defaults.

use crate::error::{Result, TallyError};

/// Main configuration for an engine instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Retention Configuration
    // -------------------------------------------------------------------------
    /// Number of most recent dates to keep. `None` keeps every date.
    pub keep_last: Option<usize>,

    // -------------------------------------------------------------------------
    // Table Configuration
    // -------------------------------------------------------------------------
    /// Entries reserved up front when a metric table is first allocated
    pub initial_capacity: usize,

    // -------------------------------------------------------------------------
    // Persistence Hook Configuration
    // -------------------------------------------------------------------------
    /// Tag every metric slot with a persistence identifier
    ///   {SHAPE}_{METRIC}[_{MODULE}].db
    pub persist_slots: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keep_last: None,
            initial_capacity: 0,
            persist_slots: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reject settings the engine cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.keep_last == Some(0) {
            return Err(TallyError::Config(
                "keep_last must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Keep only the `days` most recent dates
    pub fn keep_last(mut self, days: usize) -> Self {
        self.config.keep_last = Some(days);
        self
    }

    /// Set the initial capacity of freshly allocated tables
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Tag slots with persistence identifiers
    pub fn persist_slots(mut self, enabled: bool) -> Self {
        self.config.persist_slots = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

//! Shared engine handle
//!
//! Single-writer/multi-reader access to one [`Engine`] from several threads:
//! a parser thread takes the write lock per batch, report threads take read
//! locks.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

/// Cloneable, thread-safe handle to an engine
#[derive(Clone)]
pub struct SharedEngine {
    inner: Arc<RwLock<Engine>>,
}

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Open an engine and wrap it
    pub fn open(config: Config) -> Result<Self> {
        Ok(Self::new(Engine::open(config)?))
    }

    /// Shared access; blocks while a writer holds the lock
    pub fn read(&self) -> RwLockReadGuard<'_, Engine> {
        self.inner.read()
    }

    /// Exclusive access
    pub fn write(&self) -> RwLockWriteGuard<'_, Engine> {
        self.inner.write()
    }

    /// Run `f` under the write lock
    pub fn with_write<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut *self.inner.write())
    }

    /// Unwrap the engine if this is the last handle
    pub fn into_inner(self) -> std::result::Result<Engine, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

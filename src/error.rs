//! Error types for logtally
//!
//! Provides a unified error type for all store operations.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result type alias using TallyError
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type for logtally operations
#[derive(Debug, Error)]
pub enum TallyError {
    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    // -------------------------------------------------------------------------
    // Memory Errors
    // -------------------------------------------------------------------------
    #[error("Allocation failed: {0}")]
    AllocationFailure(#[from] TryReserveError),

    // -------------------------------------------------------------------------
    // Argument Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Date Lifecycle Errors
    // -------------------------------------------------------------------------
    #[error("Date {0} is not present (already invalidated?)")]
    AlreadyInvalidated(u32),

    #[error("Date {date} is older than the retention window (oldest kept: {oldest})")]
    OutOfWindow { date: u32, oldest: u32 },

    #[error("Storage is not initialized")]
    Uninitialized,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

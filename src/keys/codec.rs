//! Composite key codec
//!
//! ## Layout
//! ```text
//! ┌──────────────────────┬──────────────────────┐
//! │   x (high 32 bits)   │   y (low 32 bits)    │
//! └──────────────────────┴──────────────────────┘
//! ```

/// Pack two 32-bit values into one 64-bit key
#[inline]
pub fn encode(x: u32, y: u32) -> u64 {
    ((x as u64) << 32) | y as u64
}

/// Split a 64-bit key back into the pair it was built from
#[inline]
pub fn decode(key: u64) -> (u32, u32) {
    ((key >> 32) as u32, key as u32)
}

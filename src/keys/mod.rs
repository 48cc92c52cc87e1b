//! Keys Module
//!
//! Integer identities used in place of strings and pairs.
//!
//! ## Responsibilities
//! - Pack two 32-bit identities into one 64-bit key (and back)
//! - Hand out monotonic surrogate keys per date or per process
//!
//! Keys are plain integers, never references: a key issued inside a date
//! that was later invalidated simply stops resolving.

mod allocator;
mod codec;

pub use allocator::{KeyAllocator, Sequence};
pub use codec::{decode, encode};

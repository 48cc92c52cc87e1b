//! Tests for the composite key codec
//!
//! These tests verify:
//! - decode(encode(x, y)) gives back (x, y), including the extremes
//! - The high half carries x and the low half carries y
//! - Distinct pairs never collide

use std::collections::HashSet;

use logtally::keys::{decode, encode};

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_encode_decode_round_trip() {
    for (x, y) in [(0, 0), (1, 2), (7, 0), (0, 7), (123_456, 654_321)] {
        assert_eq!(decode(encode(x, y)), (x, y));
    }
}

#[test]
fn test_extremes_round_trip() {
    assert_eq!(decode(encode(u32::MAX, u32::MAX)), (u32::MAX, u32::MAX));
    assert_eq!(decode(encode(u32::MAX, 0)), (u32::MAX, 0));
    assert_eq!(decode(encode(0, u32::MAX)), (0, u32::MAX));
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_layout_high_and_low_halves() {
    assert_eq!(encode(1, 0), 1u64 << 32);
    assert_eq!(encode(0, 1), 1);
    assert_eq!(encode(2, 3), (2u64 << 32) | 3);
}

#[test]
fn test_decode_arbitrary_u64() {
    let key = 0xDEAD_BEEF_0000_0042u64;
    assert_eq!(decode(key), (0xDEAD_BEEF, 0x42));
    assert_eq!(encode(0xDEAD_BEEF, 0x42), key);
}

#[test]
fn test_swapped_pairs_do_not_collide() {
    let mut seen = HashSet::new();
    for x in 0..50u32 {
        for y in 0..50u32 {
            assert!(seen.insert(encode(x, y)));
        }
    }
    assert_eq!(seen.len(), 2_500);
}

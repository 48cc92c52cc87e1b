//! Tests for the query family
//!
//! These tests verify:
//! - Cross-date min/max folds
//! - Date-scoped lookups report NotFound for unknown dates and keys
//! - Root correlation and root → data key listing
//! - Sizes and sorted dates

use logtally::{Config, Engine, Module, TallyError};

// =============================================================================
// Helper Functions
// =============================================================================

fn engine() -> Engine {
    Engine::open(Config::default()).unwrap()
}

/// Intern `value` on `date` and add `hits` hits to it; returns (key, ckey)
fn hit(engine: &mut Engine, module: Module, date: u32, value: &str, hits: u32) -> (u32, u32) {
    let entry = engine.insert_keymap(module, date, value).unwrap();
    engine.insert_datamap(module, date, entry.key, value, entry.ckey).unwrap();
    engine.insert_hits(module, date, entry.key, hits, entry.ckey).unwrap();
    (entry.key, entry.ckey)
}

// =============================================================================
// Min/Max Tests
// =============================================================================

#[test]
fn test_bw_min_max_across_dates() {
    let mut engine = engine();

    for (date, bytes) in [(2024_01_01, 100), (2024_01_02, 500), (2024_01_03, 10)] {
        let entry = engine.insert_keymap(Module::Requests, date, "/").unwrap();
        engine.insert_bw(Module::Requests, date, entry.key, bytes, entry.ckey).unwrap();
    }

    assert_eq!(engine.get_bw_min_max(Module::Requests), Some((10, 500)));
}

#[test]
fn test_min_max_empty_is_none() {
    let mut engine = engine();
    assert_eq!(engine.get_hits_min_max(Module::Requests), None);

    hit(&mut engine, Module::Hosts, 2024_01_01, "10.0.0.1", 3);
    assert_eq!(engine.get_hits_min_max(Module::Requests), None);
    assert_eq!(engine.get_hits_min_max(Module::Hosts), Some((3, 3)));
}

#[test]
fn test_min_max_folds_every_entry() {
    let mut engine = engine();
    hit(&mut engine, Module::Requests, 2024_01_01, "/a", 7);
    hit(&mut engine, Module::Requests, 2024_01_01, "/b", 2);
    hit(&mut engine, Module::Requests, 2024_01_02, "/a", 11);

    let (key, ckey) = hit(&mut engine, Module::Requests, 2024_01_02, "/c", 4);
    engine.insert_cumts(Module::Requests, 2024_01_02, key, 900, ckey).unwrap();
    engine.insert_maxts(Module::Requests, 2024_01_02, key, 300, ckey).unwrap();
    engine.insert_visitor(Module::Requests, 2024_01_02, key, 1, ckey).unwrap();

    assert_eq!(engine.get_hits_min_max(Module::Requests), Some((2, 11)));
    assert_eq!(engine.get_cumts_min_max(Module::Requests), Some((900, 900)));
    assert_eq!(engine.get_maxts_min_max(Module::Requests), Some((300, 300)));
    assert_eq!(engine.get_visitors_min_max(Module::Requests), Some((1, 1)));
}

#[test]
fn test_min_max_ignores_invalidated_dates() {
    let mut engine = engine();
    hit(&mut engine, Module::Requests, 2024_01_01, "/", 1_000);
    hit(&mut engine, Module::Requests, 2024_01_02, "/", 5);

    engine.invalidate_date(2024_01_01).unwrap();
    assert_eq!(engine.get_hits_min_max(Module::Requests), Some((5, 5)));
}

// =============================================================================
// Date Lookup Tests
// =============================================================================

#[test]
fn test_unknown_date_is_not_found() {
    let engine = engine();

    assert!(matches!(
        engine.get_hits_on(Module::Requests, 2024_01_01, 1),
        Err(TallyError::NotFound(_))
    ));
    assert!(matches!(engine.date_store(2024_01_01), Err(TallyError::NotFound(_))));
}

#[test]
fn test_unknown_key_is_not_found() {
    let mut engine = engine();
    hit(&mut engine, Module::Requests, 2024_01_01, "/", 1);

    assert!(matches!(
        engine.get_hits_on(Module::Requests, 2024_01_01, 99),
        Err(TallyError::NotFound(_))
    ));
    assert!(matches!(
        engine.get_keymap_on(Module::Requests, 2024_01_01, "/missing"),
        Err(TallyError::NotFound(_))
    ));
    assert!(matches!(
        engine.get_bw_on(Module::Requests, 2024_01_01, 1),
        Err(TallyError::NotFound(_))
    ));
    assert!(matches!(
        engine.get_unique_key(2024_01_01, "nobody"),
        Err(TallyError::NotFound(_))
    ));
}

#[test]
fn test_invalidated_date_is_not_found() {
    let mut engine = engine();
    let (key, _) = hit(&mut engine, Module::Requests, 2024_01_01, "/", 1);
    hit(&mut engine, Module::Requests, 2024_01_02, "/", 1);

    engine.invalidate_date(2024_01_01).unwrap();

    assert_eq!(engine.sorted_dates(), vec![2024_01_02]);
    assert!(matches!(
        engine.get_hits_on(Module::Requests, 2024_01_01, key),
        Err(TallyError::NotFound(_))
    ));
    assert!(matches!(
        engine.get_datamap_on(Module::Requests, 2024_01_01, key),
        Err(TallyError::NotFound(_))
    ));
}

// =============================================================================
// Root Correlation Tests
// =============================================================================

#[test]
fn test_root_lookup_and_listing() {
    let mut engine = engine();
    let date = 2024_01_01;

    let windows = engine.insert_keymap(Module::Os, date, "Windows").unwrap();
    engine.insert_rootmap(Module::Os, date, windows.key, "Windows", windows.ckey).unwrap();

    let mut leaves = Vec::new();
    for leaf in ["Windows 10", "Windows 11"] {
        let (key, ckey) = hit(&mut engine, Module::Os, date, leaf, 1);
        engine.insert_root(Module::Os, date, key, windows.key, ckey, windows.ckey).unwrap();
        leaves.push(ckey);
    }
    let (_, ubuntu) = hit(&mut engine, Module::Os, date, "Ubuntu 10.10", 1);

    assert_eq!(engine.get_rootmap(Module::Os, windows.ckey), Some("Windows"));
    assert_eq!(engine.get_root(Module::Os, leaves[0]), Some("Windows"));
    assert_eq!(engine.get_root(Module::Os, ubuntu), None);
    assert_eq!(engine.get_keymap_list_from_key(Module::Os, "Windows"), leaves);
    assert!(engine.get_keymap_list_from_key(Module::Os, "Linux").is_empty());
}

// =============================================================================
// Size Tests
// =============================================================================

#[test]
fn test_sizes() {
    let mut engine = engine();
    hit(&mut engine, Module::Requests, 2024_01_02, "/a", 1);
    hit(&mut engine, Module::Requests, 2024_01_01, "/b", 1);
    hit(&mut engine, Module::Requests, 2024_01_01, "/a", 1);

    assert_eq!(engine.size_dates(), 2);
    assert_eq!(engine.sorted_dates(), vec![2024_01_01, 2024_01_02]);
    assert_eq!(engine.get_size_datamap(Module::Requests), 2);
    assert_eq!(engine.get_size_datamap(Module::Hosts), 0);
}

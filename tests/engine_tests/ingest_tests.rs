//! Tests for the insert family
//!
//! These tests verify:
//! - Counter accumulation (sum, max) on the date and in the cache
//! - Keymap dedupe per date with stable cache keys across dates
//! - First-value-wins labels
//! - Visitor counting through the unique-pair map, keyed by ordered pairs
//! - Agent lists without duplicates
//! - Global bookkeeping (hostnames, last parse, counters, totals)
//! - Rejected dates leave nothing behind
//! - A keymap insert that fails on either side changes neither keymap

use logtally::keys::encode;
use logtally::registry::{Metric, SlotEntry};
use logtally::{Config, Counter, Engine, Module, SlotScope, SlotSnapshot, TallyError};

// =============================================================================
// Helper Functions
// =============================================================================

const D1: u32 = 2024_01_01;
const D2: u32 = 2024_01_02;

fn engine() -> Engine {
    Engine::open(Config::default()).unwrap()
}

// =============================================================================
// Counter Tests
// =============================================================================

#[test]
fn test_hits_accumulate() {
    let mut engine = engine();
    let entry = engine.insert_keymap(Module::Requests, D1, "/index.html").unwrap();

    assert_eq!(engine.insert_hits(Module::Requests, D1, entry.key, 3, entry.ckey).unwrap(), 3);
    assert_eq!(engine.insert_hits(Module::Requests, D1, entry.key, 4, entry.ckey).unwrap(), 7);
    assert_eq!(engine.insert_hits(Module::Requests, D1, entry.key, 5, entry.ckey).unwrap(), 12);

    let mut single = self::engine();
    let other = single.insert_keymap(Module::Requests, D1, "/index.html").unwrap();
    single.insert_hits(Module::Requests, D1, other.key, 12, other.ckey).unwrap();

    assert_eq!(
        engine.get_hits_on(Module::Requests, D1, entry.key).unwrap(),
        single.get_hits_on(Module::Requests, D1, other.key).unwrap()
    );
    assert_eq!(engine.get_hits(Module::Requests, entry.ckey), Some(12));
}

#[test]
fn test_maxts_keeps_largest() {
    let orders = [[100, 50, 300], [300, 100, 50], [50, 300, 100]];
    for values in orders {
        let mut engine = engine();
        let entry = engine.insert_keymap(Module::Requests, D1, "/slow").unwrap();
        for value in values {
            engine.insert_maxts(Module::Requests, D1, entry.key, value, entry.ckey).unwrap();
        }
        assert_eq!(engine.get_maxts(Module::Requests, entry.ckey), Some(300));
    }
}

#[test]
fn test_bw_and_cumts_sum() {
    let mut engine = engine();
    let entry = engine.insert_keymap(Module::Requests, D1, "/big").unwrap();

    engine.insert_bw(Module::Requests, D1, entry.key, 1_000, entry.ckey).unwrap();
    engine.insert_bw(Module::Requests, D1, entry.key, 24, entry.ckey).unwrap();
    engine.insert_cumts(Module::Requests, D1, entry.key, 250, entry.ckey).unwrap();
    engine.insert_cumts(Module::Requests, D1, entry.key, 750, entry.ckey).unwrap();

    assert_eq!(engine.get_bw(Module::Requests, entry.ckey), Some(1_024));
    assert_eq!(engine.get_cumts(Module::Requests, entry.ckey), Some(1_000));
}

#[test]
fn test_cache_sums_across_dates() {
    let mut engine = engine();
    let first = engine.insert_keymap(Module::Requests, D1, "/").unwrap();
    let second = engine.insert_keymap(Module::Requests, D2, "/").unwrap();

    engine.insert_hits(Module::Requests, D1, first.key, 2, first.ckey).unwrap();
    engine.insert_hits(Module::Requests, D2, second.key, 5, second.ckey).unwrap();

    assert_eq!(first.ckey, second.ckey);
    assert_eq!(engine.get_hits_on(Module::Requests, D1, first.key).unwrap(), 2);
    assert_eq!(engine.get_hits_on(Module::Requests, D2, second.key).unwrap(), 5);
    assert_eq!(engine.get_hits(Module::Requests, first.ckey), Some(7));
}

#[test]
fn test_counters_saturate() {
    let mut engine = engine();
    let entry = engine.insert_keymap(Module::Requests, D1, "/").unwrap();

    engine.insert_hits(Module::Requests, D1, entry.key, u32::MAX - 1, entry.ckey).unwrap();
    let hits = engine.insert_hits(Module::Requests, D1, entry.key, 10, entry.ckey).unwrap();

    assert_eq!(hits, u32::MAX);
}

// =============================================================================
// Interning Tests
// =============================================================================

#[test]
fn test_keymap_dedupe() {
    let mut engine = engine();

    let first = engine.insert_keymap(Module::Os, D1, "Ubuntu 10.10").unwrap();
    engine.insert_datamap(Module::Os, D1, first.key, "Ubuntu 10.10", first.ckey).unwrap();
    let second = engine.insert_keymap(Module::Os, D1, "Ubuntu 10.10").unwrap();

    assert!(first.is_new);
    assert!(!second.is_new);
    assert_eq!(first.key, second.key);
    assert_eq!(first.ckey, second.ckey);
    assert_eq!(engine.get_datamap(Module::Os, second.ckey), Some("Ubuntu 10.10"));
    assert_eq!(engine.get_datamap_on(Module::Os, D1, second.key).unwrap(), "Ubuntu 10.10");
}

#[test]
fn test_keymap_keys_are_date_scoped() {
    let mut engine = engine();

    let a = engine.insert_keymap(Module::Requests, D1, "/a").unwrap();
    let b = engine.insert_keymap(Module::Requests, D1, "/b").unwrap();
    let b2 = engine.insert_keymap(Module::Requests, D2, "/b").unwrap();
    let host = engine.insert_keymap(Module::Hosts, D1, "10.0.0.1").unwrap();

    assert_eq!((a.key, b.key), (1, 2));
    assert_eq!(b2.key, 1);
    assert!(b2.is_new);
    assert_eq!(b2.ckey, b.ckey);
    assert_eq!(host.key, 1);
    assert_eq!(engine.get_keymap_on(Module::Requests, D2, "/b").unwrap(), 1);
    assert_eq!(engine.get_keymap(Module::Requests, "/b"), Some(b.ckey));
}

#[test]
fn test_labels_keep_first_value() {
    let mut engine = engine();
    let entry = engine.insert_keymap(Module::Requests, D1, "/").unwrap();

    assert!(engine.insert_method(Module::Requests, D1, entry.key, "GET", entry.ckey).unwrap());
    assert!(!engine.insert_method(Module::Requests, D1, entry.key, "POST", entry.ckey).unwrap());
    engine.insert_protocol(Module::Requests, D1, entry.key, "HTTP/2", entry.ckey).unwrap();

    assert_eq!(engine.get_method(Module::Requests, entry.ckey), Some("GET"));
    assert_eq!(engine.get_protocol(Module::Requests, entry.ckey), Some("HTTP/2"));
}

// =============================================================================
// Visitor Tests
// =============================================================================

#[test]
fn test_visitor_counted_once_per_date() {
    let mut engine = engine();
    let entry = engine.insert_keymap(Module::Requests, D1, "/").unwrap();

    assert_eq!(engine.insert_visitor(Module::Requests, D1, entry.key, 1, entry.ckey).unwrap(), 1);
    assert_eq!(engine.insert_visitor(Module::Requests, D1, entry.key, 1, entry.ckey).unwrap(), 1);
    assert_eq!(engine.insert_visitor(Module::Requests, D1, entry.key, 2, entry.ckey).unwrap(), 2);

    let next = engine.insert_keymap(Module::Requests, D2, "/").unwrap();
    assert_eq!(engine.insert_visitor(Module::Requests, D2, next.key, 1, next.ckey).unwrap(), 1);

    assert_eq!(engine.get_visitors(Module::Requests, entry.ckey), Some(3));
    assert_eq!(engine.get_visitors_on(Module::Requests, D1, entry.key).unwrap(), 2);
    assert_eq!(engine.get_size_uniqmap(Module::Requests), 3);
}

#[test]
fn test_visitor_pairs_are_ordered() {
    let mut engine = engine();
    let first = engine.insert_keymap(Module::Hosts, D1, "10.0.0.1").unwrap();
    let second = engine.insert_keymap(Module::Hosts, D1, "10.0.0.2").unwrap();

    // visitor `second.key` on key `first.key` is not visitor `first.key` on key `second.key`
    assert_eq!(
        engine.insert_visitor(Module::Hosts, D1, first.key, second.key, first.ckey).unwrap(),
        1
    );
    assert_eq!(
        engine.insert_visitor(Module::Hosts, D1, second.key, first.key, second.ckey).unwrap(),
        1
    );
    assert_eq!(
        engine.insert_visitor(Module::Hosts, D1, first.key, second.key, first.ckey).unwrap(),
        1
    );

    assert_eq!(engine.get_visitors(Module::Hosts, first.ckey), Some(1));
    assert_eq!(engine.get_visitors(Module::Hosts, second.ckey), Some(1));
    assert_eq!(engine.get_size_uniqmap(Module::Hosts), 2);
}

#[test]
fn test_seen_pair_without_count_is_not_found() {
    let mut engine = engine();
    engine
        .restore(vec![SlotSnapshot {
            scope: SlotScope::DateModule(D1, Module::Hosts),
            metric: Metric::Uniqmap,
            persistence_id: None,
            entries: vec![SlotEntry::new(encode(7, 4), 1u8)],
        }])
        .unwrap();

    assert!(matches!(
        engine.insert_visitor(Module::Hosts, D1, 4, 7, 1),
        Err(TallyError::NotFound(_))
    ));
    assert!(matches!(
        engine.get_visitors_on(Module::Hosts, D1, 4),
        Err(TallyError::NotFound(_))
    ));
    assert_eq!(engine.get_visitors(Module::Hosts, 1), None);
}

// =============================================================================
// Agent and Metadata Tests
// =============================================================================

#[test]
fn test_agents_without_duplicates() {
    let mut engine = engine();
    let host = engine.insert_keymap(Module::Hosts, D1, "10.0.0.1").unwrap();
    let curl = engine.insert_agent_key("curl/8.0").unwrap().key;
    let wget = engine.insert_agent_key("Wget/1.21").unwrap().key;
    engine.insert_agent_value(curl, "curl/8.0").unwrap();

    assert!(engine.insert_agent(Module::Hosts, D1, host.key, curl, host.ckey).unwrap());
    assert!(!engine.insert_agent(Module::Hosts, D1, host.key, curl, host.ckey).unwrap());
    assert!(engine.insert_agent(Module::Hosts, D1, host.key, wget, host.ckey).unwrap());

    assert_eq!(engine.get_host_agent_list(Module::Hosts, host.ckey), Some(&[curl, wget][..]));
    assert_eq!(engine.get_host_agent_val(curl), Some("curl/8.0"));
    assert_eq!(engine.get_host_agent_val(wget), None);
}

#[test]
fn test_meta_data_sums() {
    let mut engine = engine();

    assert_eq!(engine.insert_meta_data(Module::Requests, D1, "bytes", 10).unwrap(), 10);
    assert_eq!(engine.insert_meta_data(Module::Requests, D1, "bytes", 5).unwrap(), 15);
    engine.insert_meta_data(Module::Requests, D2, "bytes", 1).unwrap();

    assert_eq!(engine.get_meta_data(Module::Requests, "bytes"), Some(16));
    assert_eq!(engine.get_meta_data(Module::Requests, "hits"), None);
}

// =============================================================================
// Global Bookkeeping Tests
// =============================================================================

#[test]
fn test_hostnames_keep_first_value() {
    let mut engine = engine();

    assert!(engine.insert_hostname("10.0.0.1", "gateway.lan").unwrap());
    assert!(!engine.insert_hostname("10.0.0.1", "other.lan").unwrap());
    assert_eq!(engine.get_hostname("10.0.0.1"), Some("gateway.lan"));
    assert_eq!(engine.get_hostname("10.0.0.2"), None);
}

#[test]
fn test_last_parse_overwrites() {
    let mut engine = engine();

    engine.insert_last_parse(1, 100).unwrap();
    engine.insert_last_parse(1, 200).unwrap();
    assert_eq!(engine.get_last_parse(1), Some(200));
}

#[test]
fn test_overall_counters() {
    let mut engine = engine();

    engine.inc_overall(Counter::Processed, 10).unwrap();
    assert_eq!(engine.inc_overall(Counter::Processed, 5).unwrap(), 15);
    engine.inc_overall(Counter::Invalid, 1).unwrap();

    assert_eq!(engine.get_overall(Counter::Processed), Some(15));
    assert_eq!(engine.get_overall(Counter::Invalid), Some(1));
    assert_eq!(engine.get_overall(Counter::ExcludedIps), None);
}

#[test]
fn test_date_totals() {
    let mut engine = engine();

    engine.inc_cnt_valid(D1, 3).unwrap();
    assert_eq!(engine.inc_cnt_valid(D1, 2).unwrap(), 5);
    engine.inc_cnt_valid(D2, 1).unwrap();
    engine.inc_cnt_bw(D1, 1_000).unwrap();
    engine.inc_cnt_bw(D2, 24).unwrap();

    assert_eq!(engine.sum_valid(), 6);
    assert_eq!(engine.sum_bw(), 1_024);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_malformed_date_leaves_nothing() {
    let mut engine = engine();

    let result = engine.insert_keymap(Module::Requests, 2024_13_01, "/");
    assert!(matches!(result, Err(TallyError::InvalidArgument(_))));
    assert_eq!(engine.size_dates(), 0);
    assert_eq!(engine.get_keymap(Module::Requests, "/"), None);
}

fn exhausted(scope: SlotScope, sequence: &str) -> SlotSnapshot {
    SlotSnapshot {
        scope,
        metric: Metric::Seqs,
        persistence_id: None,
        entries: vec![SlotEntry::new(sequence.to_string(), u32::MAX)],
    }
}

#[test]
fn test_exhausted_date_keymap_leaves_cache_untouched() {
    let mut engine = engine();
    engine.restore(vec![exhausted(SlotScope::Date(D1), "keymap:REQUESTS")]).unwrap();

    let result = engine.insert_keymap(Module::Requests, D1, "/new");
    assert!(matches!(result, Err(TallyError::InvalidArgument(_))));
    assert_eq!(engine.get_keymap(Module::Requests, "/new"), None);
    assert!(matches!(
        engine.get_keymap_on(Module::Requests, D1, "/new"),
        Err(TallyError::NotFound(_))
    ));

    // the cache sequence was not consumed by the failed call
    let entry = engine.insert_keymap(Module::Requests, D2, "/new").unwrap();
    assert_eq!((entry.key, entry.ckey), (1, 1));
}

#[test]
fn test_exhausted_cache_keymap_leaves_date_untouched() {
    let mut engine = engine();
    engine.restore(vec![exhausted(SlotScope::Global, "cache:REQUESTS")]).unwrap();
    engine.insert_date(D1).unwrap();

    let result = engine.insert_keymap(Module::Requests, D1, "/");
    assert!(matches!(result, Err(TallyError::InvalidArgument(_))));
    assert!(matches!(
        engine.get_keymap_on(Module::Requests, D1, "/"),
        Err(TallyError::NotFound(_))
    ));

    assert!(engine.insert_keymap(Module::Requests, D2, "/").is_err());
    assert_eq!(engine.sorted_dates(), vec![D1]);
}

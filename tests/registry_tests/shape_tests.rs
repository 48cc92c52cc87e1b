//! Tests for the shape registry
//!
//! These tests verify:
//! - The nine shapes and their tags
//! - The dispatch table allocates and destroys every shape
//! - Deep destroy counts released entries, shallow destroy hands them back
//! - Metrics are bound to one shape and one scope

use std::collections::HashSet;

use logtally::registry::{
    Detached, IntIntMap, IntStrMap, Metric, MetricScope, MetricShape, Shaped, SlotEntry, Table,
    SHAPE_OPS,
};

// =============================================================================
// Helper Functions
// =============================================================================

const METRICS: [Metric; 24] = [
    Metric::Keymap,
    Metric::Rootmap,
    Metric::Datamap,
    Metric::Uniqmap,
    Metric::Root,
    Metric::Hits,
    Metric::Visitors,
    Metric::Bw,
    Metric::Cumts,
    Metric::Maxts,
    Metric::Methods,
    Metric::Protocols,
    Metric::Agents,
    Metric::Metadata,
    Metric::UniqueKeys,
    Metric::CntValid,
    Metric::CntBw,
    Metric::Dates,
    Metric::AgentKeys,
    Metric::AgentVals,
    Metric::Hostnames,
    Metric::LastParse,
    Metric::Overall,
    Metric::Seqs,
];

// =============================================================================
// Shape Tests
// =============================================================================

#[test]
fn test_nine_shapes_with_tags() {
    let tags: Vec<&str> = MetricShape::ALL.iter().map(|s| s.name()).collect();
    assert_eq!(
        tags,
        ["II32", "IS32", "IU64", "SI32", "SS32", "IGSL", "SU64", "IGKH", "U648"]
    );
    assert_eq!(MetricShape::COUNT, 9);
    assert_eq!(SHAPE_OPS.len(), MetricShape::COUNT);
}

#[test]
fn test_dispatch_allocates_matching_shape() {
    for shape in MetricShape::ALL {
        let table = (shape.ops().allocate)(16).unwrap();
        assert_eq!(table.shape(), shape);
        assert!(table.is_empty());
        assert_eq!((shape.ops().destroy_deep)(table), 0);
    }
}

#[test]
fn test_deep_destroy_counts_entries() {
    let mut hits = IntIntMap::new();
    hits.insert(1, 10);
    hits.insert(2, 20);
    hits.insert(3, 30);

    let released = (MetricShape::IntInt.ops().destroy_deep)(hits.into_table());
    assert_eq!(released, 3);
}

#[test]
fn test_shallow_destroy_hands_back_entries() {
    let mut labels = IntStrMap::new();
    labels.insert(4, "Windows 10".to_string());

    match (MetricShape::IntStr.ops().destroy_shallow)(labels.into_table()) {
        Detached::Entries(entries) => {
            assert_eq!(entries, vec![SlotEntry::new(4u32, "Windows 10".to_string())]);
        }
        Detached::Partitions(_) => panic!("expected entries"),
    }
}

#[test]
fn test_mismatched_table_uses_its_own_behavior() {
    let mut hits = IntIntMap::new();
    hits.insert(1, 1);

    // II32 table handed to the IS32 destroy entry
    let released = (MetricShape::IntStr.ops().destroy_deep)(Table::IntInt(hits));
    assert_eq!(released, 1);
}

#[test]
fn test_take_gives_back_foreign_table() {
    let table = IntIntMap::new().into_table();
    let table = IntStrMap::take(table).unwrap_err();
    assert_eq!(table.shape(), MetricShape::IntInt);
    assert!(IntIntMap::take(table).is_ok());
}

// =============================================================================
// Metric Binding Tests
// =============================================================================

#[test]
fn test_every_shape_backs_some_metric() {
    let used: HashSet<&str> = METRICS.iter().map(|m| m.shape().name()).collect();
    assert_eq!(used.len(), MetricShape::COUNT);
}

#[test]
fn test_metric_shapes() {
    assert_eq!(Metric::Keymap.shape(), MetricShape::StrInt);
    assert_eq!(Metric::Datamap.shape(), MetricShape::IntStr);
    assert_eq!(Metric::Hits.shape(), MetricShape::IntInt);
    assert_eq!(Metric::Bw.shape(), MetricShape::IntU64);
    assert_eq!(Metric::Agents.shape(), MetricShape::IntList);
    assert_eq!(Metric::Metadata.shape(), MetricShape::StrU64);
    assert_eq!(Metric::Hostnames.shape(), MetricShape::StrStr);
    assert_eq!(Metric::Dates.shape(), MetricShape::IntStore);
    assert_eq!(Metric::Uniqmap.shape(), MetricShape::U64Byte);
}

#[test]
fn test_metric_scopes() {
    assert!(Metric::Hits.allowed_in(MetricScope::Module));
    assert!(!Metric::Hits.allowed_in(MetricScope::Global));
    assert!(Metric::UniqueKeys.allowed_in(MetricScope::Date));
    assert!(!Metric::UniqueKeys.allowed_in(MetricScope::Module));
    assert!(Metric::Hostnames.allowed_in(MetricScope::Global));
    assert!(Metric::Seqs.allowed_in(MetricScope::Date));
    assert!(Metric::Seqs.allowed_in(MetricScope::Global));
    assert!(!Metric::Seqs.allowed_in(MetricScope::Module));
}

#[test]
fn test_metric_names_are_unique() {
    let names: HashSet<&str> = METRICS.iter().map(|m| m.name()).collect();
    assert_eq!(names.len(), METRICS.len());
}

// Consolidation tests.

use super::*;
use serde_json::json;

fn record(value: serde_json::Value) -> CrossPropertyRecord {
    serde_json::from_value(value).unwrap()
}

fn key(host: &str, resource_type: &str, http_code: u16) -> CrossPropertyKey {
    CrossPropertyKey::new(host, resource_type, "text/html", 0, http_code, true, true)
}

fn tree(value: serde_json::Value) -> CounterTree {
    serde_json::from_value(value).unwrap()
}

fn reference_batches() -> Vec<Vec<CrossPropertyRecord>> {
    let stats_part_0 = vec![
        record(json!({
            "cross_properties": ["www.site.com", "homepage", "text/html", 0, 200, true, true],
            "counters": {"pages_nb": 10}
        })),
        record(json!({
            "cross_properties": ["my.site.com", "product", "text/html", 0, 301, true, true],
            "counters": {"pages_nb": 30}
        })),
        record(json!({
            "cross_properties": ["my.site.com", "product", "text/html", 0, 200, true, true],
            "counters": {
                "pages_nb": 10,
                "inlinks_internal_nb": {
                    "total": 1,
                    "nofollow": 1,
                    "follow": 0,
                    "nofollow_combinations": {"link_meta": 1}
                }
            }
        })),
    ];
    let stats_part_1 = vec![
        record(json!({
            "cross_properties": ["my.site.com", "product", "text/html", 0, 200, true, true],
            "counters": {
                "pages_nb": 12,
                "inlinks_internal_nb": {
                    "total": 11,
                    "nofollow": 11,
                    "follow": 0,
                    "nofollow_combinations": {"link_meta": 1, "link": 10}
                }
            }
        })),
        record(json!({
            "cross_properties": ["music.site.com", "artist", "text/html", 0, 404, true, true],
            "counters": {"pages_nb": 30}
        })),
    ];
    let stats_part_2 = vec![record(json!({
        "cross_properties": ["music.site.com", "artist", "text/html", 0, 200, true, true],
        "counters": {"pages_nb": 130}
    }))];
    let metadata_only_part = vec![
        record(json!({
            "cross_properties": ["music.site.com", "artist", "text/html", 0, 200, true, true],
            "counters": {"metadata_nb": {"h1": {"filled": 100, "unique": 90}}}
        })),
        record(json!({
            "cross_properties": ["music.site.com", "artist", "text/html", 0, 404, true, true],
            "counters": {"metadata_nb": {"title": 20, "unique": 20}}
        })),
    ];
    vec![stats_part_0, stats_part_1, stats_part_2, metadata_only_part]
}

#[test]
fn test_consolidate_reference_batches() {
    let metrics = MetricsConsolidator::new(reference_batches())
        .consolidate()
        .unwrap();

    assert_eq!(metrics.len(), 5);
    assert_eq!(
        metrics.get(&key("music.site.com", "artist", 200)),
        Some(&tree(json!({
            "pages_nb": 130,
            "metadata_nb": {"h1": {"filled": 100, "unique": 90}}
        })))
    );
    assert_eq!(
        metrics.get(&key("music.site.com", "artist", 404)),
        Some(&tree(json!({
            "pages_nb": 30,
            "metadata_nb": {"title": 20, "unique": 20}
        })))
    );
    assert_eq!(
        metrics.get(&key("www.site.com", "homepage", 200)),
        Some(&tree(json!({"pages_nb": 10})))
    );
    assert_eq!(
        metrics.get(&key("my.site.com", "product", 200)),
        Some(&tree(json!({
            "pages_nb": 22,
            "inlinks_internal_nb": {
                "total": 12,
                "nofollow": 12,
                "follow": 0,
                "nofollow_combinations": {"link_meta": 2, "link": 10}
            }
        })))
    );
    assert_eq!(
        metrics.get(&key("my.site.com", "product", 301)),
        Some(&tree(json!({"pages_nb": 30})))
    );
}

#[test]
fn test_metadata_only_batch_does_not_overwrite() {
    let k = key("site.com", "page", 200);
    let numeric = vec![CrossPropertyRecord::new(k.clone(), tree(json!({"pages_nb": 10})))];
    let metadata = vec![CrossPropertyRecord::new(
        k.clone(),
        tree(json!({"metadata_nb": {"h1": {"filled": 100, "unique": 90}}})),
    )];

    for batches in [
        vec![numeric.clone(), metadata.clone()],
        vec![metadata, numeric],
    ] {
        let metrics = MetricsConsolidator::new(batches).consolidate().unwrap();
        assert_eq!(
            metrics.get(&k),
            Some(&tree(json!({
                "pages_nb": 10,
                "metadata_nb": {"h1": {"filled": 100, "unique": 90}}
            })))
        );
    }
}

#[test]
fn test_consolidate_is_order_and_grouping_independent() {
    let all: Vec<CrossPropertyRecord> = reference_batches().into_iter().flatten().collect();
    let expected = MetricsConsolidator::new(reference_batches())
        .consolidate()
        .unwrap();

    // Single batch, reversed order.
    let mut reversed = all.clone();
    reversed.reverse();
    assert_eq!(
        MetricsConsolidator::new(vec![reversed]).consolidate().unwrap(),
        expected
    );

    // One record per batch.
    let singletons: Vec<Vec<CrossPropertyRecord>> = all.iter().cloned().map(|r| vec![r]).collect();
    assert_eq!(
        MetricsConsolidator::new(singletons).consolidate().unwrap(),
        expected
    );

    // Consolidate two halves separately, then consolidate the results.
    let (left, right) = all.split_at(3);
    let left = MetricsConsolidator::new(vec![left.to_vec()])
        .consolidate()
        .unwrap();
    let right = MetricsConsolidator::new(vec![right.to_vec()])
        .consolidate()
        .unwrap();
    assert_eq!(
        MetricsConsolidator::new(vec![right.clone().into_records(), left.clone().into_records()])
            .consolidate()
            .unwrap(),
        expected
    );

    let mut merged = left;
    merged.merge(right).unwrap();
    assert_eq!(merged, expected);
}

#[test]
fn test_schema_mismatch_is_reported() {
    let k = key("site.com", "page", 200);
    let batches = vec![
        vec![CrossPropertyRecord::new(
            k.clone(),
            tree(json!({"metadata_nb": {"h1": 3}})),
        )],
        vec![CrossPropertyRecord::new(
            k,
            tree(json!({"metadata_nb": {"h1": {"filled": 1}}})),
        )],
    ];

    let err = MetricsConsolidator::new(batches).consolidate().unwrap_err();
    assert_eq!(
        err,
        ConsolidationError::SchemaMismatch {
            path: "metadata_nb.h1".to_string()
        }
    );
}

#[test]
fn test_counter_tree_merge_mismatch_at_root() {
    let mut count = CounterTree::Count(1);
    let err = count.merge(CounterTree::default()).unwrap_err();
    assert_eq!(
        err,
        ConsolidationError::SchemaMismatch {
            path: "(root)".to_string()
        }
    );
}

#[test]
fn test_flatten_rejects_colliding_paths() {
    let colliding = tree(json!({"a.b": 1, "a": {"b": 2}}));
    assert_eq!(
        colliding.flatten().unwrap_err(),
        ConsolidationError::PathCollision {
            path: "a.b".to_string()
        }
    );

    let batches = vec![vec![CrossPropertyRecord::new(
        key("my.site.com", "product", 200),
        colliding,
    )]];
    assert!(consolidate(batches.clone(), false).is_ok());
    assert!(matches!(
        consolidate(batches, true),
        Err(ConsolidationError::PathCollision { .. })
    ));
}

#[test]
fn test_counter_tree_empty_node_is_identity() {
    let original = tree(json!({"pages_nb": 4, "a": {"b": 1}}));
    let mut merged = original.clone();
    merged.merge(CounterTree::default()).unwrap();
    assert_eq!(merged, original);

    let mut empty = CounterTree::default();
    empty.merge(original.clone()).unwrap();
    assert_eq!(empty, original);
}

#[test]
fn test_counter_tree_paths() {
    let counters = tree(json!({"inlinks_internal_nb": {"total": 12, "nofollow_combinations": {"link": 10}}}));
    assert_eq!(counters.count_at("inlinks_internal_nb.total"), Some(12));
    assert_eq!(
        counters.count_at("inlinks_internal_nb.nofollow_combinations.link"),
        Some(10)
    );
    assert_eq!(counters.count_at("inlinks_internal_nb"), None);
    assert_eq!(counters.count_at("inlinks_internal_nb.total.more"), None);
    assert!(counters.get("").is_some());
}

#[test]
fn test_flatten_is_projection_of_nested() {
    let view = consolidate(reference_batches(), true).unwrap();
    let ConsolidatedView::Flat(flat) = view else {
        panic!("expected flat view");
    };
    let counters = flat.get(&key("my.site.com", "product", 200)).unwrap();
    let expected: BTreeMap<String, u64> = [
        ("pages_nb", 22),
        ("inlinks_internal_nb.total", 12),
        ("inlinks_internal_nb.nofollow", 12),
        ("inlinks_internal_nb.follow", 0),
        ("inlinks_internal_nb.nofollow_combinations.link_meta", 2),
        ("inlinks_internal_nb.nofollow_combinations.link", 10),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    assert_eq!(counters, &expected);

    let ConsolidatedView::Nested(nested) = consolidate(reference_batches(), false).unwrap() else {
        panic!("expected nested view");
    };
    assert_eq!(nested.flatten().unwrap(), flat);
}

#[test]
fn test_key_serializes_as_array() {
    let k = key("my.site.com", "product", 200);
    let value = serde_json::to_value(&k).unwrap();
    assert_eq!(
        value,
        json!(["my.site.com", "product", "text/html", 0, 200, true, true])
    );
    assert!(serde_json::from_value::<CrossPropertyKey>(json!(["a", "b"])).is_err());
}

#[test]
fn test_serialized_output_shape() {
    let batches = vec![vec![CrossPropertyRecord::new(
        key("www.site.com", "homepage", 200),
        tree(json!({"pages_nb": 10, "metadata_nb": {"h1": 2}})),
    )]];

    let nested = serde_json::to_value(consolidate(batches.clone(), false).unwrap()).unwrap();
    assert_eq!(
        nested,
        json!([{
            "cross_properties": ["www.site.com", "homepage", "text/html", 0, 200, true, true],
            "counters": {"metadata_nb": {"h1": 2}, "pages_nb": 10}
        }])
    );

    let flat = serde_json::to_value(consolidate(batches, true).unwrap()).unwrap();
    assert_eq!(
        flat,
        json!([{
            "cross_properties": ["www.site.com", "homepage", "text/html", 0, 200, true, true],
            "counters": {"metadata_nb.h1": 2, "pages_nb": 10}
        }])
    );
}

#[test]
fn test_read_batch_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("batch.json");
    std::fs::write(
        &path,
        r#"[{"cross_properties": ["a.com", "page", "text/html", 1, 200, false, true], "counters": {"pages_nb": 3}}]"#,
    )
    .unwrap();

    let batch = read_batch(&path).unwrap();
    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].cross_properties.depth, 1);
    assert!(!batch[0].cross_properties.index);
    assert_eq!(batch[0].counters.count_at("pages_nb"), Some(3));

    assert!(read_batch(&dir.path().join("missing.json")).is_err());
}

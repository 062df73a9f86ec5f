//! Tests for the tidy tree layout

use std::collections::BTreeMap;

use mindmap::application::services::sample_records;
use mindmap::domain::record::normalize;
use mindmap::domain::{
    BoxMetrics, Layout, LayoutConfig, LayoutEngine, Point, RawRecord, TreeArena, TreeBuilder,
};
use mindmap::util::testing;

fn tree_of(records: &[RawRecord], collapse_depth: usize) -> TreeArena {
    TreeBuilder::new()
        .with_collapse_depth(collapse_depth)
        .build(&normalize(records))
        .expect("tree")
}

fn abcd() -> Vec<RawRecord> {
    vec![
        RawRecord::new("1", None, "A"),
        RawRecord::new("2", Some("1"), "B"),
        RawRecord::new("3", Some("1"), "C"),
        RawRecord::new("4", Some("2"), "D"),
    ]
}

fn layout(tree: &TreeArena) -> Layout {
    LayoutEngine::default().layout(tree)
}

fn toggle(tree: &mut TreeArena, id: &str) {
    let idx = tree.find(id).expect("node");
    tree.toggle(idx).expect("expandable");
}

#[test]
fn given_small_tree_when_laying_out_then_ranks_by_depth_and_centers_parent() {
    testing::init_test_setup();

    // Arrange
    let tree = tree_of(&abcd(), 2);

    // Act
    let layout = layout(&tree);

    // Assert
    let pos = layout.positions();
    assert_eq!(pos["1"], Point::new(0.0, 0.0));
    assert_eq!(pos["2"], Point::new(400.0, -110.0));
    assert_eq!(pos["3"], Point::new(400.0, 110.0));
    assert_eq!(pos["4"], Point::new(800.0, -110.0));
}

#[test]
fn given_collapse_then_expand_when_laying_out_then_positions_restored() {
    testing::init_test_setup();

    // Arrange
    let mut tree = tree_of(&abcd(), 2);
    let before = layout(&tree).positions();

    // Act
    toggle(&mut tree, "2");
    let collapsed = layout(&tree);
    toggle(&mut tree, "2");
    let restored = layout(&tree).positions();

    // Assert
    assert!(!collapsed.contains("4"));
    assert_eq!(collapsed.len(), 3);
    assert_eq!(restored, before);
}

#[test]
fn given_same_state_when_laying_out_twice_then_identical() {
    let tree = tree_of(&sample_records(), 2);
    assert_eq!(layout(&tree), layout(&tree));
}

#[test]
fn given_fully_expanded_tree_when_laying_out_then_boxes_on_a_rank_never_overlap() {
    testing::init_test_setup();

    // Arrange
    let tree = tree_of(&sample_records(), usize::MAX);
    let min_gap = LayoutConfig::default().min_gap;

    // Act
    let layout = layout(&tree);

    // Assert
    let mut ranks: BTreeMap<usize, Vec<(f32, f32)>> = BTreeMap::new();
    for node in &layout.nodes {
        ranks.entry(node.depth).or_default().push(node.span());
    }
    for spans in ranks.values_mut() {
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in spans.windows(2) {
            assert!(
                pair[1].0 - pair[0].1 >= min_gap - 1e-3,
                "overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }
    assert_eq!(layout.len(), 12);
}

#[test]
fn given_layout_when_inspecting_edges_then_one_per_visible_child_anchored_at_boxes() {
    let tree = tree_of(&sample_records(), 2);
    let layout = layout(&tree);

    assert_eq!(layout.edges.len(), layout.len() - 1);
    for edge in &layout.edges {
        let parent = layout.get(&edge.from_id).expect("parent placed");
        let child = layout.get(&edge.to_id).expect("child placed");
        assert_eq!(child.parent_id.as_deref(), Some(edge.from_id.as_str()));
        assert_eq!(edge.curve.start, parent.right_anchor());
        assert_eq!(edge.curve.end, child.left_anchor());
    }
}

#[test]
fn given_long_leaf_description_when_laying_out_then_box_grows() {
    testing::init_test_setup();

    // Arrange: 140 chars at 28 per line is 5 lines
    let records = vec![
        RawRecord::new("1", None, "Root"),
        RawRecord::new("2", Some("1"), "Leaf").with_description("x".repeat(140)),
        RawRecord::new("3", Some("1"), "Plain"),
    ];
    let tree = tree_of(&records, 2);

    // Act
    let layout = layout(&tree);

    // Assert
    assert_eq!(layout.get("2").map(|n| n.height), Some(140.0));
    assert_eq!(layout.get("3").map(|n| n.height), Some(60.0));
    assert_eq!(layout.get("1").map(|n| n.height), Some(70.0));
}

#[test]
fn given_tall_siblings_when_laying_out_then_separation_exceeds_default() {
    let records = vec![
        RawRecord::new("1", None, "Root"),
        RawRecord::new("2", Some("1"), "Tall")
            .with_description("x".repeat(224))
            .with_image_url("https://example.com/a.png"),
        RawRecord::new("3", Some("1"), "Tall too")
            .with_description("x".repeat(224))
            .with_image_url("https://example.com/b.png"),
    ];
    let tree = tree_of(&records, 2);

    let layout = layout(&tree);

    // 60 + 8 * 14 + 10 + 70 = 252 per box
    let metrics = BoxMetrics::default();
    let height = layout.get("2").map(|n| n.height).expect("placed");
    assert_eq!(height, 252.0);
    let gap = layout.positions()["3"].y - layout.positions()["2"].y;
    assert_eq!(gap, height + LayoutConfig::default().min_gap);
    assert!(gap > 220.0);
    assert_eq!(metrics.description_lines(&"x".repeat(224)), 8);
}

#[test]
fn given_empty_tree_when_laying_out_then_empty_layout() {
    let layout = layout(&TreeArena::new());
    assert!(layout.is_empty());
    assert!(layout.bounds().is_none());
}

#[test]
fn given_point_inside_box_when_hit_testing_then_finds_node() {
    let tree = tree_of(&abcd(), 2);
    let layout = layout(&tree);

    assert_eq!(
        layout.node_at(Point::new(405.0, 110.0)).map(|n| n.id.as_str()),
        Some("3")
    );
    assert!(layout.node_at(Point::new(200.0, 0.0)).is_none());
}

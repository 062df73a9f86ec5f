//! Tidy tree layout over the visible part of the hierarchy.
//!
//! Coordinates are screen oriented: `x` runs along the rank axis (depth grows
//! to the right), `y` along the sibling-spread axis. Sibling subtrees are packed
//! level by level against each other's contour, so a parent ends up centered
//! between its first and last visible child and no two boxes on a level overlap.

use std::collections::{BTreeMap, HashMap};

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::TreeArena;
use crate::domain::sizing::BoxMetrics;

const LINK_BADGE_INSET: f32 = 20.0;
const LINK_BADGE_RADIUS: f32 = 15.0;

/// Spacing constants of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance between rank bands
    pub rank_separation: f32,
    /// Minimum center distance of adjacent siblings; cousins get twice this
    pub sibling_separation: f32,
    /// Minimum free space between two boxes on the same rank
    pub min_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_separation: 400.0,
            sibling_separation: 220.0,
            min_gap: 16.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, to: Point, t: f32) -> Point {
        Point {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }

    pub fn distance(self, other: Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A visible node with its computed box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub depth: usize,
    pub position: Point,
    pub width: f32,
    pub height: f32,
    /// Has children, shown or hidden
    pub expandable: bool,
    pub expanded: bool,
    pub has_link: bool,
}

impl PlacedNode {
    /// Middle of the right box edge, where outgoing edges start.
    pub fn right_anchor(&self) -> Point {
        Point::new(self.position.x + self.width / 2.0, self.position.y)
    }

    /// Middle of the left box edge, where the incoming edge ends.
    pub fn left_anchor(&self) -> Point {
        Point::new(self.position.x - self.width / 2.0, self.position.y)
    }

    pub fn contains(&self, p: Point) -> bool {
        (p.x - self.position.x).abs() <= self.width / 2.0
            && (p.y - self.position.y).abs() <= self.height / 2.0
    }

    /// Center and radius of the external-link badge in the top right corner.
    pub fn link_badge(&self) -> Option<(Point, f32)> {
        self.has_link.then(|| {
            let center = Point::new(
                self.position.x + self.width / 2.0 - LINK_BADGE_INSET,
                self.position.y - self.height / 2.0 + LINK_BADGE_INSET,
            );
            (center, LINK_BADGE_RADIUS)
        })
    }

    /// Vertical span occupied on the spread axis.
    pub fn span(&self) -> (f32, f32) {
        (
            self.position.y - self.height / 2.0,
            self.position.y + self.height / 2.0,
        )
    }
}

/// Cubic Bézier that only bends horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Curve {
    pub start: Point,
    pub control_start: Point,
    pub control_end: Point,
    pub end: Point,
}

impl Curve {
    pub fn between(start: Point, end: Point) -> Self {
        let mid_x = (start.x + end.x) / 2.0;
        Self {
            start,
            control_start: Point::new(mid_x, start.y),
            control_end: Point::new(mid_x, end.y),
            end,
        }
    }

    /// Degenerate curve folded into one point.
    pub fn collapsed_at(p: Point) -> Self {
        Self {
            start: p,
            control_start: p,
            control_end: p,
            end: p,
        }
    }

    pub fn lerp(&self, to: &Curve, t: f32) -> Curve {
        Curve {
            start: self.start.lerp(to.start, t),
            control_start: self.control_start.lerp(to.control_start, t),
            control_end: self.control_end.lerp(to.control_end, t),
            end: self.end.lerp(to.end, t),
        }
    }

    /// SVG path data, e.g. `M110,0C310,0 310,-110 510,-110`.
    pub fn to_svg(&self) -> String {
        format!(
            "M{},{}C{},{} {},{} {},{}",
            self.start.x,
            self.start.y,
            self.control_start.x,
            self.control_start.y,
            self.control_end.x,
            self.control_end.y,
            self.end.x,
            self.end.y
        )
    }
}

/// Link between a visible parent and one of its visible children.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgePath {
    pub from_id: String,
    pub to_id: String,
    pub curve: Curve,
}

impl EdgePath {
    pub fn between(parent: &PlacedNode, child: &PlacedNode) -> Self {
        Self {
            from_id: parent.id.clone(),
            to_id: child.id.clone(),
            curve: Curve::between(parent.right_anchor(), child.left_anchor()),
        }
    }
}

/// Result of one layout pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    /// Visible nodes in preorder
    pub nodes: Vec<PlacedNode>,
    /// Edges in preorder of their child
    pub edges: Vec<EdgePath>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Layout {
    fn push(&mut self, node: PlacedNode) {
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    pub fn get(&self, id: &str) -> Option<&PlacedNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node positions keyed by id.
    pub fn positions(&self) -> BTreeMap<String, Point> {
        self.nodes
            .iter()
            .map(|n| (n.id.clone(), n.position))
            .collect()
    }

    /// Topmost node whose box contains `p` (later nodes are drawn above).
    pub fn node_at(&self, p: Point) -> Option<&PlacedNode> {
        self.nodes.iter().rev().find(|n| n.contains(p))
    }

    /// Bounding box (top-left, bottom-right) of all boxes.
    pub fn bounds(&self) -> Option<(Point, Point)> {
        let first = self.nodes.first()?;
        let init = (first.position, first.position);
        Some(self.nodes.iter().fold(init, |(min, max), n| {
            let (top, bottom) = n.span();
            (
                Point::new(min.x.min(n.position.x - n.width / 2.0), min.y.min(top)),
                Point::new(max.x.max(n.position.x + n.width / 2.0), max.y.max(bottom)),
            )
        }))
    }
}

#[derive(Debug, Clone, Copy)]
struct Extent {
    center: f32,
    half: f32,
}

/// Outermost boxes of one level of a subtree, relative to the subtree root.
#[derive(Debug, Clone, Copy)]
struct Level {
    top: Extent,
    bottom: Extent,
}

impl Level {
    fn single(height: f32) -> Self {
        let extent = Extent {
            center: 0.0,
            half: height / 2.0,
        };
        Self {
            top: extent,
            bottom: extent,
        }
    }

    fn shifted(self, by: f32) -> Self {
        Self {
            top: Extent {
                center: self.top.center + by,
                ..self.top
            },
            bottom: Extent {
                center: self.bottom.center + by,
                ..self.bottom
            },
        }
    }
}

type Contour = Vec<Level>;

/// Computes positions and edge geometry for the visible tree.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
    metrics: BoxMetrics,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig, metrics: BoxMetrics) -> Self {
        Self { config, metrics }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn metrics(&self) -> &BoxMetrics {
        &self.metrics
    }

    #[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
    pub fn layout(&self, tree: &TreeArena) -> Layout {
        let mut layout = Layout::default();
        if tree.root().is_none() {
            return layout;
        }

        // First walk (bottom-up): subtree contours and child offsets
        let mut heights: HashMap<Index, f32> = HashMap::new();
        let mut contours: HashMap<Index, Contour> = HashMap::new();
        let mut offsets: HashMap<Index, f32> = HashMap::new();

        for (idx, node) in tree.iter_postorder() {
            let height = self
                .metrics
                .box_height(&node.data, node.depth, node.is_visible_leaf());
            heights.insert(idx, height);

            let children = node.branch.visible();
            let mut contour: Contour = vec![Level::single(height)];
            if let (Some(_), Some(_)) = (children.first(), children.last()) {
                let mut merged: Contour = Vec::new();
                let mut placed: Vec<f32> = Vec::with_capacity(children.len());
                for child in children {
                    let child_contour = contours.remove(child).unwrap_or_default();
                    let offset = if merged.is_empty() {
                        0.0
                    } else {
                        self.required_offset(&merged, &child_contour)
                    };
                    merge_contour(&mut merged, &child_contour, offset);
                    placed.push(offset);
                }
                let mid = (placed[0] + placed[placed.len() - 1]) / 2.0;
                for (child, offset) in children.iter().zip(&placed) {
                    offsets.insert(*child, offset - mid);
                }
                contour.extend(merged.into_iter().map(|level| level.shifted(-mid)));
            }
            contours.insert(idx, contour);
        }

        // Second walk (top-down): absolute positions
        let mut spread: HashMap<Index, f32> = HashMap::new();
        for (idx, node) in tree.iter() {
            let y = match node.parent {
                Some(parent) => {
                    spread.get(&parent).copied().unwrap_or(0.0)
                        + offsets.get(&idx).copied().unwrap_or(0.0)
                }
                None => 0.0,
            };
            spread.insert(idx, y);

            layout.push(PlacedNode {
                id: node.data.id.clone(),
                parent_id: node
                    .parent
                    .and_then(|p| tree.get_node(p))
                    .map(|p| p.data.id.clone()),
                depth: node.depth,
                position: Point::new(node.depth as f32 * self.config.rank_separation, y),
                width: self.metrics.node_width,
                height: heights
                    .get(&idx)
                    .copied()
                    .unwrap_or(self.metrics.base_height),
                expandable: node.has_children(),
                expanded: !node.is_visible_leaf(),
                has_link: node.data.link().is_some(),
            });
        }

        let edges: Vec<EdgePath> = layout
            .nodes
            .iter()
            .filter_map(|child| {
                let parent = layout.get(child.parent_id.as_deref()?)?;
                Some(EdgePath::between(parent, child))
            })
            .collect();
        layout.edges = edges;

        debug!(nodes = layout.len(), edges = layout.edges.len(), "layout computed");
        layout
    }

    /// Smallest offset placing `right` below the already merged siblings.
    fn required_offset(&self, merged: &Contour, right: &Contour) -> f32 {
        merged
            .iter()
            .zip(right.iter())
            .enumerate()
            .map(|(level, (left, right))| {
                // Adjacent nodes are siblings on the first level, cousins below
                let units = if level == 0 { 1.0 } else { 2.0 };
                let separation = (units * self.config.sibling_separation)
                    .max(left.bottom.half + right.top.half + self.config.min_gap);
                left.bottom.center + separation - right.top.center
            })
            .fold(f32::NEG_INFINITY, f32::max)
    }
}

fn merge_contour(merged: &mut Contour, incoming: &Contour, offset: f32) {
    for (level, next) in incoming.iter().enumerate() {
        let next = next.shifted(offset);
        match merged.get_mut(level) {
            Some(existing) => existing.bottom = next.bottom,
            None => merged.push(next),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::NodeData;

    fn data(id: &str) -> NodeData {
        NodeData {
            id: id.into(),
            name: id.into(),
            url: String::new(),
            description: String::new(),
            image_url: String::new(),
        }
    }

    #[test]
    fn given_two_children_when_laying_out_then_parent_centered_between_them() {
        let mut tree = TreeArena::new();
        let root = tree.insert_node(data("r"), None);
        tree.insert_node(data("a"), Some(root));
        tree.insert_node(data("b"), Some(root));

        let layout = LayoutEngine::default().layout(&tree);

        let a = layout.get("a").unwrap().position;
        let b = layout.get("b").unwrap().position;
        assert_eq!(layout.get("r").unwrap().position, Point::ORIGIN);
        assert_eq!(a, Point::new(400.0, -110.0));
        assert_eq!(b, Point::new(400.0, 110.0));
    }

    #[test]
    fn given_cousins_when_laying_out_then_use_double_separation() {
        //   r
        //  / \
        // a   b
        // |   |
        // c   d
        let mut tree = TreeArena::new();
        let r = tree.insert_node(data("r"), None);
        let a = tree.insert_node(data("a"), Some(r));
        let b = tree.insert_node(data("b"), Some(r));
        tree.insert_node(data("c"), Some(a));
        tree.insert_node(data("d"), Some(b));

        let layout = LayoutEngine::default().layout(&tree);

        let c = layout.get("c").unwrap().position.y;
        let d = layout.get("d").unwrap().position.y;
        assert_eq!(d - c, 440.0);
    }

    #[test]
    fn given_edge_when_rendering_svg_then_matches_path_syntax() {
        let curve = Curve::between(Point::new(110.0, 0.0), Point::new(290.0, -110.0));
        assert_eq!(curve.to_svg(), "M110,0C200,0 200,-110 290,-110");
    }
}

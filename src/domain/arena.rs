use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use tracing::instrument;

use crate::domain::record::NormalizedRecord;

/// Data payload for tree nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: String,
    pub image_url: String,
}

impl NodeData {
    /// Trimmed description, `None` when blank.
    pub fn description(&self) -> Option<&str> {
        Some(self.description.trim()).filter(|d| !d.is_empty())
    }

    /// Trimmed image URL, `None` when blank.
    pub fn image_url(&self) -> Option<&str> {
        Some(self.image_url.trim()).filter(|i| !i.is_empty())
    }

    /// External link, `None` when blank.
    pub fn link(&self) -> Option<&str> {
        Some(self.url.trim()).filter(|u| !u.is_empty())
    }
}

impl From<&NormalizedRecord> for NodeData {
    fn from(record: &NormalizedRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.label.clone(),
            url: record.url.clone(),
            description: record.description.clone(),
            image_url: record.image_url.clone(),
        }
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Expansion state of a node, owning its child links.
///
/// A node shows its children (`Expanded`) or keeps them hidden for later
/// re-expansion (`Collapsed`). Childless nodes are `Expanded` with no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Expanded(Vec<Index>),
    Collapsed(Vec<Index>),
}

impl Default for Branch {
    fn default() -> Self {
        Branch::Expanded(Vec::new())
    }
}

impl Branch {
    /// Children taking part in layout.
    pub fn visible(&self) -> &[Index] {
        match self {
            Branch::Expanded(children) => children,
            Branch::Collapsed(_) => &[],
        }
    }

    /// All children regardless of state.
    pub fn all(&self) -> &[Index] {
        match self {
            Branch::Expanded(children) | Branch::Collapsed(children) => children,
        }
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Branch::Expanded(_) => Visibility::Expanded,
            Branch::Collapsed(_) => Visibility::Collapsed,
        }
    }

    fn push(&mut self, child: Index) {
        match self {
            Branch::Expanded(children) | Branch::Collapsed(children) => children.push(child),
        }
    }

    fn into_state(self, target: Visibility) -> Self {
        let children = match self {
            Branch::Expanded(children) | Branch::Collapsed(children) => children,
        };
        match target {
            Visibility::Expanded => Branch::Expanded(children),
            Visibility::Collapsed => Branch::Collapsed(children),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Expanded,
    Collapsed,
}

impl Visibility {
    pub fn flipped(self) -> Self {
        match self {
            Visibility::Expanded => Visibility::Collapsed,
            Visibility::Collapsed => Visibility::Expanded,
        }
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Distance from the root (root = 0)
    pub depth: usize,
    pub branch: Branch,
}

impl TreeNode {
    pub fn has_children(&self) -> bool {
        !self.branch.all().is_empty()
    }

    /// True when no children are currently shown.
    pub fn is_visible_leaf(&self) -> bool {
        self.branch.visible().is_empty()
    }
}

/// Arena-based tree holding one rooted hierarchy.
///
/// Nodes are addressed by generational index; ids map to indices in O(1).
#[derive(Debug, Default)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
    by_id: HashMap<String, Index>,
}

impl TreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(level = "trace", skip(self, data), fields(id = %data.id))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let depth = parent
            .and_then(|p| self.arena.get(p))
            .map(|p| p.depth + 1)
            .unwrap_or(0);
        let id = data.id.clone();
        let node = TreeNode {
            data,
            parent,
            depth,
            branch: Branch::default(),
        };
        let node_idx = self.arena.insert(node);
        self.by_id.insert(id, node_idx);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.branch.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.root.and_then(|r| self.arena.get(r))
    }

    pub fn find(&self, id: &str) -> Option<Index> {
        self.by_id.get(id).copied()
    }

    pub fn find_node(&self, id: &str) -> Option<&TreeNode> {
        self.find(id).and_then(|idx| self.arena.get(idx))
    }

    /// Number of nodes in the tree, hidden ones included.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn visible_children(&self, idx: Index) -> &[Index] {
        self.arena
            .get(idx)
            .map(|n| n.branch.visible())
            .unwrap_or(&[])
    }

    /// Ancestors from parent up to the root.
    pub fn ancestors(&self, idx: Index) -> impl Iterator<Item = Index> + '_ {
        std::iter::successors(self.arena.get(idx).and_then(|n| n.parent), move |&p| {
            self.arena.get(p).and_then(|n| n.parent)
        })
    }

    /// Put a node into the given state. Returns the resulting state, or
    /// `None` when the node is unknown or has no children.
    pub fn set_visibility(&mut self, idx: Index, target: Visibility) -> Option<Visibility> {
        let node = self.arena.get_mut(idx)?;
        if !node.has_children() {
            return None;
        }
        let branch = std::mem::take(&mut node.branch);
        node.branch = branch.into_state(target);
        Some(target)
    }

    /// Flip the expansion state of a node with children.
    #[instrument(level = "debug", skip(self))]
    pub fn toggle(&mut self, idx: Index) -> Option<Visibility> {
        let current = self.arena.get(idx)?.branch.visibility();
        self.set_visibility(idx, current.flipped())
    }

    /// Collapse every node with children at `depth` or deeper, expand the rest.
    #[instrument(level = "debug", skip(self))]
    pub fn collapse_from_depth(&mut self, depth: usize) {
        let indices: Vec<Index> = self.arena.iter().map(|(idx, _)| idx).collect();
        for idx in indices {
            let target = match self.arena.get(idx) {
                Some(node) if node.depth >= depth => Visibility::Collapsed,
                Some(_) => Visibility::Expanded,
                None => continue,
            };
            self.set_visibility(idx, target);
        }
    }

    /// Preorder over visible nodes.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, false)
    }

    /// Preorder over all nodes, hidden ones included.
    pub fn iter_all(&self) -> TreeIterator<'_> {
        TreeIterator::new(self, true)
    }

    /// Postorder over visible nodes.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Ids of visible nodes in preorder.
    pub fn visible_ids(&self) -> Vec<String> {
        self.iter().map(|(_, n)| n.data.id.clone()).collect()
    }

    /// Number of levels in the full tree.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.iter_all()
            .map(|(_, n)| n.depth + 1)
            .max()
            .unwrap_or(0)
    }

    /// Ids of nodes without any children.
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter_all()
            .filter(|(_, n)| !n.has_children())
            .map(|(_, n)| n.data.id.clone())
            .collect()
    }
}

pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
    include_hidden: bool,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena, include_hidden: bool) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self {
            arena,
            stack,
            include_hidden,
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.arena.get_node(current_idx)?;
        let children = if self.include_hidden {
            node.branch.all()
        } else {
            node.branch.visible()
        };
        // Push children in reverse order for top-to-bottom traversal
        for &child in children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.branch.visible().iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(id: &str) -> NodeData {
        NodeData {
            id: id.to_string(),
            name: id.to_uppercase(),
            url: String::new(),
            description: String::new(),
            image_url: String::new(),
        }
    }

    //      a
    //     / \
    //    b   c
    //    |
    //    d
    fn sample() -> TreeArena {
        let mut tree = TreeArena::new();
        let a = tree.insert_node(data("a"), None);
        let b = tree.insert_node(data("b"), Some(a));
        tree.insert_node(data("c"), Some(a));
        tree.insert_node(data("d"), Some(b));
        tree
    }

    #[test]
    fn given_tree_when_iterating_then_preorder_and_postorder_follow_child_order() {
        let tree = sample();
        let pre: Vec<_> = tree.iter().map(|(_, n)| n.data.id.as_str()).collect();
        let post: Vec<_> = tree
            .iter_postorder()
            .map(|(_, n)| n.data.id.as_str())
            .collect();
        assert_eq!(pre, vec!["a", "b", "d", "c"]);
        assert_eq!(post, vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn given_collapsed_node_when_iterating_then_hidden_children_skipped() {
        let mut tree = sample();
        let b = tree.find("b").unwrap();
        assert_eq!(tree.toggle(b), Some(Visibility::Collapsed));
        assert_eq!(tree.visible_ids(), vec!["a", "b", "c"]);
        assert_eq!(tree.iter_all().count(), 4);
        assert!(tree.get_node(b).unwrap().is_visible_leaf());
    }

    #[test]
    fn given_leaf_when_toggling_then_nothing_changes() {
        let mut tree = sample();
        let c = tree.find("c").unwrap();
        assert_eq!(tree.toggle(c), None);
        assert_eq!(tree.get_node(c).unwrap().branch.visibility(), Visibility::Expanded);
    }

    #[test]
    fn given_tree_when_querying_depth_and_ancestors_then_matches_shape() {
        let tree = sample();
        assert_eq!(tree.depth(), 3);
        let d = tree.find("d").unwrap();
        let chain: Vec<_> = tree
            .ancestors(d)
            .map(|i| tree.get_node(i).unwrap().data.id.clone())
            .collect();
        assert_eq!(chain, vec!["b", "a"]);
        assert_eq!(tree.leaf_nodes(), vec!["d", "c"]);
    }
}

//! Text rendering of the hierarchy via `termtree`.

use generational_arena::Index;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{TreeArena, TreeNode, Visibility};

pub trait TreeNodeConvert {
    /// Visible part of the hierarchy.
    fn to_tree_string(&self) -> Tree<String>;
    /// Whole hierarchy, collapsed subtrees included.
    fn to_full_tree_string(&self) -> Tree<String>;
}

fn label(node: &TreeNode) -> String {
    let marker = match (node.has_children(), node.branch.visibility()) {
        (false, _) => "   ",
        (true, Visibility::Expanded) => "[-]",
        (true, Visibility::Collapsed) => "[+]",
    };
    format!("{} {} ({})", marker, node.data.name, node.data.id)
}

fn build_tree(arena: &TreeArena, node_idx: Index, parent_tree: &mut Tree<String>, all: bool) {
    let Some(node) = arena.get_node(node_idx) else {
        return;
    };
    let children = if all {
        node.branch.all()
    } else {
        node.branch.visible()
    };
    for &child_idx in children {
        if let Some(child) = arena.get_node(child_idx) {
            let mut child_tree = Tree::new(label(child));
            build_tree(arena, child_idx, &mut child_tree, all);
            parent_tree.push(child_tree);
        }
    }
}

fn render(arena: &TreeArena, all: bool) -> Tree<String> {
    match arena.root().and_then(|r| arena.get_node(r).map(|n| (r, n))) {
        Some((root_idx, root)) => {
            let mut tree = Tree::new(label(root));
            build_tree(arena, root_idx, &mut tree, all);
            tree
        }
        None => Tree::new("Empty tree".to_string()),
    }
}

impl TreeNodeConvert for TreeArena {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        render(self, false)
    }

    #[instrument(level = "debug", skip(self))]
    fn to_full_tree_string(&self) -> Tree<String> {
        render(self, true)
    }
}

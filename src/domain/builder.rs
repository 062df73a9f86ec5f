//! Tree builder turning flat parent-linked records into one rooted hierarchy.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeData, TreeArena};
use crate::domain::record::NormalizedRecord;

/// Depth from which nodes with children start collapsed.
pub const DEFAULT_COLLAPSE_DEPTH: usize = 2;

/// Degrade-gracefully decisions taken during the last build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Records with an unresolved parent seen after the root was assigned
    pub detached: Vec<String>,
    /// Records naming themselves as parent
    pub self_parented: Vec<String>,
    /// Ids occurring more than once (last occurrence wins)
    pub duplicates: Vec<String>,
    /// Records not reachable from the root
    pub unreachable: usize,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.detached.is_empty()
            && self.self_parented.is_empty()
            && self.duplicates.is_empty()
            && self.unreachable == 0
    }
}

/// Constructs the hierarchy from normalized records.
pub struct TreeBuilder {
    collapse_depth: usize,
    relationship_cache: HashMap<usize, Vec<usize>>,
    report: BuildReport,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self {
            collapse_depth: DEFAULT_COLLAPSE_DEPTH,
            relationship_cache: HashMap::new(),
            report: BuildReport::default(),
        }
    }

    pub fn with_collapse_depth(mut self, depth: usize) -> Self {
        self.collapse_depth = depth;
        self
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Build the tree, or `None` when no record qualifies as root.
    ///
    /// Records are linked in input order: the first record whose parent does
    /// not resolve becomes the root, later ones stay unattached. Self-parenting
    /// links are ignored. The initial collapse policy is applied to the result.
    ///
    /// With repeated ids only the last record takes part in linking: the
    /// `parentId` of an earlier duplicate is discarded along with its fields,
    /// so `[{1, null}, {2, null}, {1, "2"}]` roots at "2" with "1" below it.
    #[instrument(level = "debug", skip_all, fields(records = records.len()))]
    pub fn build(&mut self, records: &[NormalizedRecord]) -> Option<TreeArena> {
        self.relationship_cache.clear();
        self.report = BuildReport::default();

        // First pass: id lookup, last occurrence wins
        let mut by_id: HashMap<&str, usize> = HashMap::with_capacity(records.len());
        for (pos, record) in records.iter().enumerate() {
            if by_id.insert(record.id.as_str(), pos).is_some() {
                warn!(id = %record.id, "duplicate id, later record wins");
                if !self.report.duplicates.contains(&record.id) {
                    self.report.duplicates.push(record.id.clone());
                }
            }
        }

        // Second pass: resolve parents in input order
        let mut root: Option<usize> = None;
        for (pos, record) in records.iter().enumerate() {
            if by_id.get(record.id.as_str()) != Some(&pos) {
                continue;
            }
            let parent = record
                .parent_id
                .as_deref()
                .filter(|p| !p.is_empty())
                .and_then(|p| by_id.get(p).copied());

            match parent {
                None if root.is_none() => {
                    debug!(id = %record.id, "root assigned");
                    root = Some(pos);
                }
                None => {
                    warn!(
                        id = %record.id,
                        "unresolved parent after root assigned, record left unattached"
                    );
                    self.report.detached.push(record.id.clone());
                }
                Some(parent_pos) if parent_pos == pos => {
                    debug!(id = %record.id, "self-parent ignored");
                    self.report.self_parented.push(record.id.clone());
                }
                Some(parent_pos) => {
                    self.relationship_cache
                        .entry(parent_pos)
                        .or_default()
                        .push(pos);
                }
            }
        }

        let root = root?;
        let mut tree = self.build_tree(records, root);

        self.report.unreachable = by_id.len() - tree.len();
        if self.report.unreachable > 0 {
            warn!(
                unreachable = self.report.unreachable,
                "records not reachable from root were left out"
            );
        }

        tree.collapse_from_depth(self.collapse_depth);
        Some(tree)
    }

    fn build_tree(&self, records: &[NormalizedRecord], root: usize) -> TreeArena {
        let mut tree = TreeArena::new();
        let mut stack = vec![(root, None)];

        while let Some((pos, parent_idx)) = stack.pop() {
            let current_idx = tree.insert_node(NodeData::from(&records[pos]), parent_idx);

            // Reverse so that children are inserted in input order
            if let Some(children) = self.relationship_cache.get(&pos) {
                for &child in children.iter().rev() {
                    stack.push((child, Some(current_idx)));
                }
            }
        }

        tree
    }
}

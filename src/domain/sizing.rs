//! Node box metrics derived from content.

use serde::{Deserialize, Serialize};

use crate::domain::arena::NodeData;

/// Constants driving the box size of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxMetrics {
    pub node_width: f32,
    pub base_height: f32,
    /// Extra room for the larger root title
    pub root_extra: f32,
    pub chars_per_line: usize,
    pub max_leaf_lines: usize,
    pub line_height: f32,
    /// Padding below a fully shown description
    pub leaf_padding: f32,
    /// Allowance for a description clamped to two lines
    pub clamped_description: f32,
    pub image_height: f32,
}

impl Default for BoxMetrics {
    fn default() -> Self {
        Self {
            node_width: 220.0,
            base_height: 60.0,
            root_extra: 10.0,
            chars_per_line: 28,
            max_leaf_lines: 8,
            line_height: 14.0,
            leaf_padding: 10.0,
            clamped_description: 24.0,
            image_height: 70.0,
        }
    }
}

impl BoxMetrics {
    /// Estimated line count of a fully shown description, capped.
    pub fn description_lines(&self, description: &str) -> usize {
        let chars = description.chars().count();
        let per_line = self.chars_per_line.max(1);
        chars.div_ceil(per_line).min(self.max_leaf_lines)
    }

    /// Box height for a node at `depth`; `is_leaf` means no visible children.
    pub fn box_height(&self, data: &NodeData, depth: usize, is_leaf: bool) -> f32 {
        let mut height = self.base_height;
        if depth == 0 {
            height += self.root_extra;
        }
        match data.description() {
            Some(text) if is_leaf => {
                let lines = self.description_lines(text) as f32;
                height += lines * self.line_height + self.leaf_padding;
            }
            Some(_) => height += self.clamped_description,
            None => {}
        }
        if data.image_url().is_some() {
            height += self.image_height;
        }
        height.max(self.base_height)
    }
}

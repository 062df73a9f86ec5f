//! Renderable content of a node box and of the detail view.

use serde::{Deserialize, Serialize};

use crate::domain::arena::TreeNode;
use crate::domain::layout::PlacedNode;

pub const NO_DETAILS: &str = "No further details available.";
const ELLIPSIS: char = '…';

/// Typography constants used to fit titles into a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardStyle {
    pub root_title_px: f32,
    pub branch_title_px: f32,
    pub title_px: f32,
    /// Average glyph width as a fraction of the font size
    pub glyph_ratio: f32,
    /// Horizontal padding on each side of the box content
    pub padding: f32,
    /// Line clamp for descriptions of nodes showing their children
    pub clamp_lines: usize,
}

impl Default for CardStyle {
    fn default() -> Self {
        Self {
            root_title_px: 18.0,
            branch_title_px: 15.0,
            title_px: 13.0,
            glyph_ratio: 0.6,
            padding: 12.0,
            clamp_lines: 2,
        }
    }
}

impl CardStyle {
    pub fn title_px(&self, depth: usize) -> f32 {
        match depth {
            0 => self.root_title_px,
            1 => self.branch_title_px,
            _ => self.title_px,
        }
    }

    /// Characters that fit into one title line of a box `width` wide.
    pub fn title_capacity(&self, width: f32, depth: usize) -> usize {
        let inner = (width - 2.0 * self.padding).max(0.0);
        let glyph = self.title_px(depth) * self.glyph_ratio;
        if glyph <= 0.0 {
            return usize::MAX;
        }
        (inner / glyph).floor() as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToggleBadge {
    Expand,
    Collapse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionView {
    pub text: String,
    /// `None` shows the full text
    pub clamp_lines: Option<usize>,
}

/// Content of one node box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCard {
    pub id: String,
    pub title: String,
    pub title_px: f32,
    pub description: Option<DescriptionView>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub badge: Option<ToggleBadge>,
    pub width: f32,
    pub height: f32,
}

impl NodeCard {
    pub fn compose(node: &TreeNode, placed: &PlacedNode, style: &CardStyle) -> Self {
        let capacity = style.title_capacity(placed.width, node.depth);
        let is_leaf = node.is_visible_leaf();
        let badge = node.has_children().then_some(if is_leaf {
            ToggleBadge::Expand
        } else {
            ToggleBadge::Collapse
        });

        Self {
            id: node.data.id.clone(),
            title: truncate(&node.data.name, capacity),
            title_px: style.title_px(node.depth),
            description: node.data.description().map(|text| DescriptionView {
                text: text.to_string(),
                clamp_lines: (!is_leaf).then_some(style.clamp_lines),
            }),
            image_url: node.data.image_url().map(str::to_string),
            link: node.data.link().map(str::to_string),
            badge,
            width: placed.width,
            height: placed.height,
        }
    }
}

/// Shorten `text` to at most `capacity` characters, ending in an ellipsis when cut.
pub fn truncate(text: &str, capacity: usize) -> String {
    if text.chars().count() <= capacity {
        return text.to_string();
    }
    if capacity == 0 {
        return String::new();
    }
    let mut cut: String = text.chars().take(capacity - 1).collect();
    cut.truncate(cut.trim_end().len());
    cut.push(ELLIPSIS);
    cut
}

/// Modal detail view of a childless node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetail {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub description: String,
    pub link: Option<String>,
}

impl NodeDetail {
    /// Detail view for a node with content worth showing, `None` otherwise.
    pub fn for_node(node: &TreeNode) -> Option<Self> {
        if node.has_children() {
            return None;
        }
        let data = &node.data;
        if data.description().is_none() && data.image_url().is_none() {
            return None;
        }
        Some(Self {
            id: data.id.clone(),
            name: data.name.clone(),
            image_url: data.image_url().map(str::to_string),
            description: data.description().unwrap_or(NO_DETAILS).to_string(),
            link: data.link().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Short", 10, "Short")]
    #[case("Exactly ten", 11, "Exactly ten")]
    #[case("A rather long title", 10, "A rather…")]
    #[case("abc", 0, "")]
    fn given_title_when_truncating_then_fits_capacity(
        #[case] text: &str,
        #[case] capacity: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(truncate(text, capacity), expected);
    }

    #[test]
    fn given_depths_when_computing_capacity_then_smaller_fonts_fit_more() {
        let style = CardStyle::default();
        // inner width 196
        assert_eq!(style.title_capacity(220.0, 0), 18);
        assert_eq!(style.title_capacity(220.0, 1), 21);
        assert_eq!(style.title_capacity(220.0, 2), 25);
    }
}

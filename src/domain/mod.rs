//! Domain layer: hierarchy model, layout and presentation rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod card;
pub mod error;
pub mod layout;
pub mod record;
pub mod sizing;
pub mod tree_traits;

pub use arena::{Branch, NodeData, TreeArena, TreeNode, Visibility};
pub use builder::{BuildReport, TreeBuilder, DEFAULT_COLLAPSE_DEPTH};
pub use card::{CardStyle, NodeCard, NodeDetail, ToggleBadge};
pub use error::{DomainError, DomainResult};
pub use layout::{Curve, EdgePath, Layout, LayoutConfig, LayoutEngine, PlacedNode, Point};
pub use record::{normalize, NormalizedRecord, RawRecord, RecordPayload};
pub use sizing::BoxMetrics;
pub use tree_traits::TreeNodeConvert;

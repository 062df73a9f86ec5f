//! Interaction controller: user gestures against the tree, layout and camera.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::application::camera::{Camera, CameraTransition, FramingPolicy, ScaleExtent, Viewport};
use crate::application::transition::{Frame, FrameNode, Phase, Transition, TransitionTiming};
use crate::domain::arena::{TreeArena, Visibility};
use crate::domain::card::{CardStyle, NodeCard, NodeDetail};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::layout::{Layout, LayoutConfig, LayoutEngine, Point};
use crate::domain::sizing::BoxMetrics;

/// Everything the controller needs besides the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewOptions {
    pub layout: LayoutConfig,
    pub metrics: BoxMetrics,
    pub card: CardStyle,
    pub timing: TransitionTiming,
    pub framing: FramingPolicy,
    pub scale_extent: ScaleExtent,
    pub viewport: Viewport,
}

/// Result of a click on a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ClickOutcome {
    Toggled { id: String, visibility: Visibility },
    DetailOpened(NodeDetail),
    LinkRequested { id: String, url: String },
    Ignored,
}

pub struct InteractionController {
    tree: TreeArena,
    engine: LayoutEngine,
    options: ViewOptions,
    layout: Layout,
    transition: Option<Transition>,
    camera: Camera,
    camera_transition: Option<CameraTransition>,
    viewport: Viewport,
    detail: Option<NodeDetail>,
}

impl InteractionController {
    /// Take ownership of a freshly built tree and frame it for the viewport.
    #[instrument(level = "debug", skip_all, fields(nodes = tree.len()))]
    pub fn new(tree: TreeArena, options: ViewOptions) -> Self {
        let engine = LayoutEngine::new(options.layout.clone(), options.metrics.clone());
        let layout = engine.layout(&tree);
        let viewport = options.viewport;
        let camera = Camera::default();
        let camera_transition = CameraTransition::new(
            camera,
            options.framing.initial(&viewport),
            options.framing.initial_ms,
        );
        Self {
            tree,
            engine,
            options,
            layout,
            transition: None,
            camera,
            camera_transition: Some(camera_transition),
            viewport,
            detail: None,
        }
    }

    /// Replace the hierarchy wholesale, as on a new data load, and re-frame
    /// the root from the displayed camera.
    pub fn replace_tree(&mut self, tree: TreeArena) {
        info!(nodes = tree.len(), "tree replaced");
        self.settle_camera();
        self.tree = tree;
        self.layout = self.engine.layout(&self.tree);
        self.transition = None;
        self.detail = None;
        self.camera_transition = Some(CameraTransition::new(
            self.camera,
            self.options.framing.initial(&self.viewport),
            self.options.framing.initial_ms,
        ));
    }

    pub fn tree(&self) -> &TreeArena {
        &self.tree
    }

    /// Target layout of the current state.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn options(&self) -> &ViewOptions {
        &self.options
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn detail(&self) -> Option<&NodeDetail> {
        self.detail.as_ref()
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some() || self.camera_transition.is_some()
    }

    /// Toggle a node with children, open the detail view of a childless node
    /// with content, ignore the rest.
    #[instrument(level = "debug", skip(self))]
    pub fn click(&mut self, id: &str) -> DomainResult<ClickOutcome> {
        let idx = self
            .tree
            .find(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))?;
        if !self.layout.contains(id) {
            return Err(DomainError::HiddenNode(id.to_string()));
        }
        let (has_children, detail) = match self.tree.get_node(idx) {
            Some(node) => (node.has_children(), NodeDetail::for_node(node)),
            None => return Err(DomainError::UnknownNode(id.to_string())),
        };

        if has_children {
            let visibility = self.toggle(id)?;
            return Ok(ClickOutcome::Toggled {
                id: id.to_string(),
                visibility,
            });
        }
        match detail {
            Some(detail) => {
                debug!(id, "detail opened");
                self.detail = Some(detail.clone());
                Ok(ClickOutcome::DetailOpened(detail))
            }
            None => Ok(ClickOutcome::Ignored),
        }
    }

    /// Click at a screen position: link badge, node box, or background.
    pub fn click_at(&mut self, screen: Point) -> ClickOutcome {
        let world = self.camera().to_world(screen);
        let frame = self.frame();
        let Some(hit) = hit_test(&frame, world) else {
            debug!(x = screen.x, y = screen.y, "click on background");
            return ClickOutcome::Ignored;
        };

        if let Some(placed) = self.layout.get(&hit.id) {
            if let Some((badge, radius)) = placed.link_badge() {
                // Badge geometry is relative to the box; the box may be mid-flight
                let center = Point::new(
                    badge.x - placed.position.x + hit.position.x,
                    badge.y - placed.position.y + hit.position.y,
                );
                if center.distance(world) <= radius {
                    let url = self
                        .tree
                        .find_node(&hit.id)
                        .and_then(|n| n.data.link())
                        .map(str::to_string);
                    if let Some(url) = url {
                        info!(id = %hit.id, %url, "link requested");
                        return ClickOutcome::LinkRequested { id: hit.id, url };
                    }
                }
            }
        }
        self.click(&hit.id).unwrap_or(ClickOutcome::Ignored)
    }

    /// Flip a node's expansion state and start the transition to the new layout.
    pub fn toggle(&mut self, id: &str) -> DomainResult<Visibility> {
        let idx = self
            .tree
            .find(id)
            .ok_or_else(|| DomainError::UnknownNode(id.to_string()))?;
        let displayed = self.frame();
        let visibility = self
            .tree
            .toggle(idx)
            .ok_or_else(|| DomainError::NotExpandable(id.to_string()))?;

        self.layout = self.engine.layout(&self.tree);
        self.transition = Some(Transition::between(
            &displayed,
            &self.layout,
            &self.tree,
            &self.options.timing,
        ));
        debug!(id, ?visibility, visible = self.layout.len(), "toggled");
        Ok(visibility)
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Interrupt a running camera animation, keeping the displayed camera.
    fn settle_camera(&mut self) {
        if let Some(transition) = self.camera_transition.take() {
            self.camera = transition.current();
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.settle_camera();
        self.camera.pan(dx, dy);
    }

    /// Zoom by `factor` around the screen point `focal`.
    pub fn zoom(&mut self, factor: f32, focal: Point) {
        self.settle_camera();
        self.camera.zoom_about(factor, focal, &self.options.scale_extent);
    }

    /// Animate back to the default framing of the current viewport.
    pub fn reset_view(&mut self) {
        self.settle_camera();
        let target = self.options.framing.reset(&self.viewport);
        debug!(?target, "reset view");
        self.camera_transition = Some(CameraTransition::new(
            self.camera,
            target,
            self.options.framing.reset_ms,
        ));
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Advance running animations by `dt_ms` and return what is displayed.
    pub fn tick(&mut self, dt_ms: f32) -> Frame {
        if let Some(transition) = self.transition.as_mut() {
            transition.advance(dt_ms);
            if transition.is_finished() {
                self.transition = None;
            }
        }
        if let Some(transition) = self.camera_transition.as_mut() {
            transition.advance(dt_ms);
            if transition.is_finished() {
                self.camera = transition.target();
                self.camera_transition = None;
            }
        }
        self.frame()
    }

    /// Displayed nodes and edges at this instant.
    pub fn frame(&self) -> Frame {
        match &self.transition {
            Some(transition) => transition.frame(),
            None => Frame::settled(&self.layout),
        }
    }

    /// Displayed camera at this instant.
    pub fn camera(&self) -> Camera {
        self.camera_transition
            .as_ref()
            .map(CameraTransition::current)
            .unwrap_or(self.camera)
    }

    /// Box contents of every visible node, in preorder.
    pub fn cards(&self) -> Vec<NodeCard> {
        self.layout
            .nodes
            .iter()
            .filter_map(|placed| {
                let node = self.tree.find_node(&placed.id)?;
                Some(NodeCard::compose(node, placed, &self.options.card))
            })
            .collect()
    }
}

fn hit_test(frame: &Frame, world: Point) -> Option<FrameNode> {
    frame
        .nodes
        .iter()
        .rev()
        .filter(|n| n.phase != Phase::Exiting)
        .find(|n| {
            (world.x - n.position.x).abs() <= n.width / 2.0
                && (world.y - n.position.y).abs() <= n.height / 2.0
        })
        .cloned()
}

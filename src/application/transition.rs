//! Keyed transitions between two layouts.
//!
//! Nodes and edges are matched by stable id. Entering elements grow out of
//! their nearest previously shown ancestor, exiting ones shrink into their
//! nearest still visible ancestor while fading out, and the rest move from
//! where they are currently displayed to their new target.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::arena::TreeArena;
use crate::domain::layout::{Curve, Layout, Point};

/// Durations in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionTiming {
    pub enter_ms: f32,
    pub update_ms: f32,
    pub exit_ms: f32,
}

impl Default for TransitionTiming {
    fn default() -> Self {
        Self {
            enter_ms: 400.0,
            update_ms: 400.0,
            exit_ms: 300.0,
        }
    }
}

/// Cubic in-out easing on `[0, 1]`.
pub fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0) * 2.0;
    if t <= 1.0 {
        t * t * t / 2.0
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Entering,
    Updating,
    Exiting,
    Settled,
}

/// One element of a keyed reconciliation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciled<'a, T, U> {
    Enter(&'a U),
    Update(&'a T, &'a U),
    Exit(&'a T),
}

/// Match `displayed` against `target` by key.
///
/// Targets come first in their own order (entering or updating), followed by
/// the displayed elements without a target in their displayed order.
pub fn reconcile<'a, T, U>(
    displayed: &'a [T],
    target: &'a [U],
    displayed_key: impl Fn(&T) -> &str,
    target_key: impl Fn(&U) -> &str,
) -> Vec<Reconciled<'a, T, U>> {
    use std::collections::HashMap;

    let by_key: HashMap<&str, &T> = displayed.iter().map(|d| (displayed_key(d), d)).collect();
    let mut matched = std::collections::HashSet::new();

    let mut result: Vec<Reconciled<'a, T, U>> = target
        .iter()
        .map(|t| {
            let key = target_key(t);
            match by_key.get(key) {
                Some(d) => {
                    matched.insert(key);
                    Reconciled::Update(*d, t)
                }
                None => Reconciled::Enter(t),
            }
        })
        .collect();

    result.extend(
        displayed
            .iter()
            .filter(|d| !matched.contains(displayed_key(*d)))
            .map(Reconciled::Exit),
    );
    result
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameNode {
    pub id: String,
    pub position: Point,
    pub opacity: f32,
    pub phase: Phase,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameEdge {
    pub from_id: String,
    /// Edges are keyed by their child
    pub to_id: String,
    pub curve: Curve,
    pub opacity: f32,
    pub phase: Phase,
}

/// What is on screen at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<FrameEdge>,
}

impl Frame {
    /// Frame showing `layout` at rest.
    pub fn settled(layout: &Layout) -> Self {
        Self {
            nodes: layout
                .nodes
                .iter()
                .map(|n| FrameNode {
                    id: n.id.clone(),
                    position: n.position,
                    opacity: 1.0,
                    phase: Phase::Settled,
                    width: n.width,
                    height: n.height,
                })
                .collect(),
            edges: layout
                .edges
                .iter()
                .map(|e| FrameEdge {
                    from_id: e.from_id.clone(),
                    to_id: e.to_id.clone(),
                    curve: e.curve,
                    opacity: 1.0,
                    phase: Phase::Settled,
                })
                .collect(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&FrameNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, to_id: &str) -> Option<&FrameEdge> {
        self.edges.iter().find(|e| e.to_id == to_id)
    }
}

#[derive(Debug, Clone)]
struct Track<T> {
    from: T,
    to: T,
    from_opacity: f32,
    to_opacity: f32,
    duration_ms: f32,
    phase: Phase,
}

impl<T> Track<T> {
    /// Eased progress, `None` once the track has completed.
    fn eased(&self, elapsed_ms: f32) -> Option<f32> {
        (elapsed_ms < self.duration_ms).then(|| ease_cubic_in_out(elapsed_ms / self.duration_ms))
    }

    fn opacity(&self, eased: f32) -> f32 {
        self.from_opacity + (self.to_opacity - self.from_opacity) * eased
    }

    fn is_gone(&self, elapsed_ms: f32) -> bool {
        self.phase == Phase::Exiting && elapsed_ms >= self.duration_ms
    }
}

#[derive(Debug, Clone)]
struct NodeTrack {
    id: String,
    width: f32,
    height: f32,
    track: Track<Point>,
}

#[derive(Debug, Clone)]
struct EdgeTrack {
    from_id: String,
    to_id: String,
    track: Track<Curve>,
}

/// Animation from the displayed frame to a new layout.
#[derive(Debug, Clone)]
pub struct Transition {
    nodes: Vec<NodeTrack>,
    edges: Vec<EdgeTrack>,
    elapsed_ms: f32,
    duration_ms: f32,
}

impl Transition {
    /// Plan the animation from `displayed` to `next`.
    ///
    /// `tree` is the hierarchy after the state change; it still contains the
    /// nodes that are about to disappear.
    pub fn between(
        displayed: &Frame,
        next: &Layout,
        tree: &TreeArena,
        timing: &TransitionTiming,
    ) -> Self {
        let fallback = tree
            .root_node()
            .and_then(|r| next.get(&r.data.id))
            .map(|r| r.position)
            .unwrap_or(Point::ORIGIN);

        // Nearest ancestor satisfying `lookup`
        let anchor = |id: &str, lookup: &dyn Fn(&str) -> Option<Point>| -> Point {
            tree.find(id)
                .into_iter()
                .flat_map(|idx| tree.ancestors(idx))
                .filter_map(|idx| tree.get_node(idx))
                .find_map(|n| lookup(&n.data.id))
                .unwrap_or(fallback)
        };
        let shown_before = |id: &str| displayed.node(id).map(|n| n.position);
        let shown_after = |id: &str| next.get(id).map(|n| n.position);

        let mut entering = 0;
        let mut exiting = 0;

        let nodes: Vec<NodeTrack> = reconcile(
            &displayed.nodes,
            &next.nodes,
            |d| d.id.as_str(),
            |t| t.id.as_str(),
        )
        .into_iter()
        .map(|r| match r {
            Reconciled::Enter(target) => {
                entering += 1;
                NodeTrack {
                    id: target.id.clone(),
                    width: target.width,
                    height: target.height,
                    track: Track {
                        from: anchor(&target.id, &shown_before),
                        to: target.position,
                        from_opacity: 1.0,
                        to_opacity: 1.0,
                        duration_ms: timing.enter_ms,
                        phase: Phase::Entering,
                    },
                }
            }
            Reconciled::Update(shown, target) => NodeTrack {
                id: target.id.clone(),
                width: target.width,
                height: target.height,
                track: Track {
                    from: shown.position,
                    to: target.position,
                    from_opacity: shown.opacity,
                    to_opacity: 1.0,
                    duration_ms: timing.update_ms,
                    phase: Phase::Updating,
                },
            },
            Reconciled::Exit(shown) => {
                exiting += 1;
                NodeTrack {
                    id: shown.id.clone(),
                    width: shown.width,
                    height: shown.height,
                    track: Track {
                        from: shown.position,
                        to: anchor(&shown.id, &shown_after),
                        from_opacity: shown.opacity,
                        to_opacity: 0.0,
                        duration_ms: timing.exit_ms,
                        phase: Phase::Exiting,
                    },
                }
            }
        })
        .collect();

        let edges: Vec<EdgeTrack> = reconcile(
            &displayed.edges,
            &next.edges,
            |d| d.to_id.as_str(),
            |t| t.to_id.as_str(),
        )
        .into_iter()
        .map(|r| match r {
            Reconciled::Enter(target) => EdgeTrack {
                from_id: target.from_id.clone(),
                to_id: target.to_id.clone(),
                track: Track {
                    from: Curve::collapsed_at(anchor(&target.to_id, &shown_before)),
                    to: target.curve,
                    from_opacity: 1.0,
                    to_opacity: 1.0,
                    duration_ms: timing.enter_ms,
                    phase: Phase::Entering,
                },
            },
            Reconciled::Update(shown, target) => EdgeTrack {
                from_id: target.from_id.clone(),
                to_id: target.to_id.clone(),
                track: Track {
                    from: shown.curve,
                    to: target.curve,
                    from_opacity: shown.opacity,
                    to_opacity: 1.0,
                    duration_ms: timing.update_ms,
                    phase: Phase::Updating,
                },
            },
            Reconciled::Exit(shown) => EdgeTrack {
                from_id: shown.from_id.clone(),
                to_id: shown.to_id.clone(),
                track: Track {
                    from: shown.curve,
                    to: Curve::collapsed_at(anchor(&shown.to_id, &shown_after)),
                    from_opacity: shown.opacity,
                    to_opacity: 0.0,
                    duration_ms: timing.exit_ms,
                    phase: Phase::Exiting,
                },
            },
        })
        .collect();

        let duration_ms = nodes
            .iter()
            .map(|n| n.track.duration_ms)
            .chain(edges.iter().map(|e| e.track.duration_ms))
            .fold(0.0, f32::max);

        debug!(entering, exiting, duration_ms, "transition planned");
        Self {
            nodes,
            edges,
            elapsed_ms: 0.0,
            duration_ms,
        }
    }

    pub fn advance(&mut self, dt_ms: f32) {
        self.elapsed_ms = (self.elapsed_ms + dt_ms.max(0.0)).min(self.duration_ms);
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_ms >= self.duration_ms
    }

    /// Displayed state at the current instant. Exited elements are dropped.
    pub fn frame(&self) -> Frame {
        let finished = self.is_finished();
        let phase = |p: Phase| if finished { Phase::Settled } else { p };

        let nodes = self
            .nodes
            .iter()
            .filter(|n| !n.track.is_gone(self.elapsed_ms))
            .map(|n| {
                let (position, opacity) = match n.track.eased(self.elapsed_ms) {
                    Some(t) => (n.track.from.lerp(n.track.to, t), n.track.opacity(t)),
                    None => (n.track.to, n.track.to_opacity),
                };
                FrameNode {
                    id: n.id.clone(),
                    position,
                    opacity,
                    phase: phase(n.track.phase),
                    width: n.width,
                    height: n.height,
                }
            })
            .collect();

        let edges = self
            .edges
            .iter()
            .filter(|e| !e.track.is_gone(self.elapsed_ms))
            .map(|e| {
                let (curve, opacity) = match e.track.eased(self.elapsed_ms) {
                    Some(t) => (e.track.from.lerp(&e.track.to, t), e.track.opacity(t)),
                    None => (e.track.to, e.track.to_opacity),
                };
                FrameEdge {
                    from_id: e.from_id.clone(),
                    to_id: e.to_id.clone(),
                    curve,
                    opacity,
                    phase: phase(e.track.phase),
                }
            })
            .collect();

        Frame { nodes, edges }
    }
}

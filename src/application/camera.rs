//! Pan/zoom camera and viewport framing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::transition::ease_cubic_in_out;
use crate::domain::layout::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleExtent {
    pub min: f32,
    pub max: f32,
}

impl Default for ScaleExtent {
    fn default() -> Self {
        Self { min: 0.1, max: 3.0 }
    }
}

impl ScaleExtent {
    /// Both bounds finite and positive, `min <= max`.
    pub fn validate(&self) -> Result<(), String> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(self.min) || !positive(self.max) {
            return Err(format!(
                "zoom bounds must be finite and positive: min = {}, max = {}",
                self.min, self.max
            ));
        }
        if self.min > self.max {
            return Err(format!("zoom min {} exceeds max {}", self.min, self.max));
        }
        Ok(())
    }

    pub fn clamp(&self, scale: f32) -> f32 {
        scale.max(self.min).min(self.max)
    }
}

/// Affine view transform: `screen = world * scale + translate`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Camera {
    pub translate: Point,
    pub scale: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            translate: Point::ORIGIN,
            scale: 1.0,
        }
    }
}

impl Camera {
    pub fn new(translate: Point, scale: f32) -> Self {
        Self { translate, scale }
    }

    pub fn to_screen(&self, world: Point) -> Point {
        Point::new(
            world.x * self.scale + self.translate.x,
            world.y * self.scale + self.translate.y,
        )
    }

    pub fn to_world(&self, screen: Point) -> Point {
        Point::new(
            (screen.x - self.translate.x) / self.scale,
            (screen.y - self.translate.y) / self.scale,
        )
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.translate.x += dx;
        self.translate.y += dy;
    }

    /// Multiply the scale by `factor`, keeping the world point under the
    /// screen point `focal` in place. Non-finite or non-positive factors are
    /// ignored.
    pub fn zoom_about(&mut self, factor: f32, focal: Point, extent: &ScaleExtent) {
        if !factor.is_finite() || factor <= 0.0 {
            debug!(factor, "zoom factor ignored");
            return;
        }
        let anchor = self.to_world(focal);
        self.scale = extent.clamp(self.scale * factor);
        self.translate = Point::new(
            focal.x - anchor.x * self.scale,
            focal.y - anchor.y * self.scale,
        );
    }

    pub fn lerp(&self, to: &Camera, t: f32) -> Camera {
        Camera {
            translate: self.translate.lerp(to.translate, t),
            scale: self.scale + (to.scale - self.scale) * t,
        }
    }
}

/// Where the root lands for a given viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramingPolicy {
    /// Viewports narrower than this use the narrow framing
    pub narrow_breakpoint: f32,
    pub narrow_offset: f32,
    pub narrow_initial_scale: f32,
    pub narrow_reset_scale: f32,
    /// Horizontal root offset as a fraction of the viewport width
    pub wide_offset_ratio: f32,
    pub wide_scale: f32,
    pub initial_ms: f32,
    pub reset_ms: f32,
}

impl Default for FramingPolicy {
    fn default() -> Self {
        Self {
            narrow_breakpoint: 640.0,
            narrow_offset: 80.0,
            narrow_initial_scale: 0.6,
            narrow_reset_scale: 0.5,
            wide_offset_ratio: 0.25,
            wide_scale: 0.85,
            initial_ms: 800.0,
            reset_ms: 500.0,
        }
    }
}

impl FramingPolicy {
    pub fn is_narrow(&self, viewport: &Viewport) -> bool {
        viewport.width < self.narrow_breakpoint
    }

    fn frame(&self, viewport: &Viewport, narrow_scale: f32) -> Camera {
        let (x, scale) = if self.is_narrow(viewport) {
            (self.narrow_offset, narrow_scale)
        } else {
            (viewport.width * self.wide_offset_ratio, self.wide_scale)
        };
        Camera::new(Point::new(x, viewport.height / 2.0), scale)
    }

    /// Camera after the first load.
    pub fn initial(&self, viewport: &Viewport) -> Camera {
        self.frame(viewport, self.narrow_initial_scale)
    }

    /// Camera after an explicit reset.
    pub fn reset(&self, viewport: &Viewport) -> Camera {
        self.frame(viewport, self.narrow_reset_scale)
    }
}

/// Animated camera move.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraTransition {
    from: Camera,
    to: Camera,
    elapsed_ms: f32,
    duration_ms: f32,
}

impl CameraTransition {
    pub fn new(from: Camera, to: Camera, duration_ms: f32) -> Self {
        Self {
            from,
            to,
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

    pub fn target(&self) -> Camera {
        self.to
    }

    pub fn current(&self) -> Camera {
        if self.is_finished() {
            return self.to;
        }
        let t = ease_cubic_in_out(self.elapsed_ms / self.duration_ms);
        self.from.lerp(&self.to, t)
    }
}

//! Application layer: interaction engine, services and use cases
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod camera;
pub mod controller;
pub mod error;
pub mod error_ext;
pub mod services;
pub mod transition;

pub use camera::{Camera, CameraTransition, FramingPolicy, ScaleExtent, Viewport};
pub use controller::{ClickOutcome, InteractionController, ViewOptions};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::{IoResultExt, JsonResultExt};
pub use transition::{
    ease_cubic_in_out, Frame, FrameEdge, FrameNode, Phase, Transition, TransitionTiming,
};

//! Lifecycle of a mounted pillar: frame loop, input and teardown.
//!
//! The controller is generic over a [`SessionFactory`], which builds the
//! graphics resources, and a [`Host`], which schedules frames and delivers
//! events. [`HeadlessHost`] drives it deterministically.

pub mod controller;
pub mod headless;
pub mod host;
pub mod session;
pub mod timing;

pub use controller::{
    FallbackReason, FrameOutcome, LightPillar, PillarState, PillarView, PLACEHOLDER_MESSAGE,
};
pub use headless::{FrameTally, HeadlessHost};
pub use host::{ContainerRect, FrameHandle, Host, Listener, PointerEvent};
pub use session::{RenderSession, SessionFactory, SessionSpec};

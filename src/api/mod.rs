//! Session-level API
//!
//! The host feeds tracker frames and lifecycle events into an
//! [`OverlaySession`] and reads back a [`FrameReport`] per frame.

pub mod session;
pub mod types;

pub use session::{AnchorBinding, BindingKey, OverlaySession, PoiNodes, SessionSettings};
pub use types::{
    CameraFrame, FrameInput, FrameReport, PoiPlacement, SessionError, SessionResult,
    SessionState, TrackedMarker, TrackingState,
};

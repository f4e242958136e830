//! AR Discover projection engine
//!
//! Places labels for fixed real-world points of interest around a detected
//! image marker: geodesic offsets in a local tangent plane, compression of
//! far-away points, constant on-screen label size and a smoothed anchor
//! bearing.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod scene;
pub mod utils;
pub mod api;

// Re-export commonly used types
pub use self::core::{Coordinate, LocalOffset, Location, LocationAnchor, PointOfInterest, EARTH_RADIUS_M};
pub use algorithms::{
    CameraOptics, CompressionMode, CompressionPolicy, LabelLayout, ProjectedOffset,
    RenderSurface, ScreenScale, ScreenScalePolicy,
};
pub use processing::{BearingEstimator, MarkerMounting, ScalarKalmanFilter};
pub use scene::{LabelFactory, LabelRequest, LabelTicket, MockScene, NodeKind, QueuedLabelFactory, SceneGraph};
pub use utils::{builtin_anchors, ConfigError, ConfigurationManager, SystemConfig};
pub use api::{
    CameraFrame, FrameInput, FrameReport, OverlaySession, PoiPlacement, SessionError,
    SessionSettings, SessionState, TrackedMarker, TrackingState,
};

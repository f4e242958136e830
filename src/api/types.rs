//! Common API types and data structures

use crate::algorithms::{CameraOptics, RenderSurface};
use crate::scene::LabelTicket;
use nalgebra::Isometry3;
use serde::Serialize;
use thiserror::Error;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Session error types
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// Marker name does not match any configured anchor
    #[error("no location anchor is configured for marker '{identifier}'")]
    UnknownAnchor { identifier: String },
    /// Label completion belongs to a binding that has been discarded
    #[error("label ticket {ticket:?} belongs to a discarded anchor binding")]
    StaleLabelTicket { ticket: LabelTicket },
    /// Label completion for a ticket that was never issued or already used
    #[error("label ticket {ticket:?} is not pending")]
    UnknownLabelTicket { ticket: LabelTicket },
    /// Measured label metrics cannot be converted to meters
    #[error("invalid label metrics: width {width_px} px at density {density}")]
    InvalidLabelMetrics { width_px: f64, density: f64 },
}

/// Tracking state of a marker as reported by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Tracking,
    Paused,
    Stopped,
}

/// Marker reported by the tracker this frame
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMarker {
    /// Asset name, matches `LocationAnchor::identifier`
    pub name: String,
    pub tracking_state: TrackingState,
    /// Pose in session world space
    pub pose: Isometry3<f64>,
}

impl TrackedMarker {
    pub fn new(name: impl Into<String>, tracking_state: TrackingState, pose: Isometry3<f64>) -> Self {
        Self {
            name: name.into(),
            tracking_state,
            pose,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking_state == TrackingState::Tracking
    }
}

/// Camera state for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct CameraFrame {
    /// Camera pose in session world space
    pub pose: Isometry3<f64>,
    pub optics: CameraOptics,
}

/// Everything the tracker and renderer report for one frame
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    pub markers: Vec<TrackedMarker>,
    pub camera: CameraFrame,
    pub surface: RenderSurface,
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No marker has been matched to an anchor yet
    NoActiveAnchor,
    /// An anchor binding is active
    Tracking,
}

/// Where one point of interest was placed this frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoiPlacement {
    pub name: String,
    /// Location node position relative to the anchor node (meters)
    pub position: [f64; 3],
    /// Uniform screen-scale factor, absent when optics were degenerate
    pub scale: Option<f64>,
    pub true_distance_m: f64,
    pub display_distance_m: f64,
}

/// Outcome of one frame update
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    pub state: SessionState,
    pub active_anchor: Option<String>,
    /// Unfiltered bearing measured this frame (radians)
    pub raw_bearing: Option<f64>,
    /// Smoothed rotation applied to the anchor node (radians)
    pub anchor_rotation: Option<f64>,
    /// Uncertainty of the smoothed rotation
    pub rotation_uncertainty: Option<f64>,
    pub placements: Vec<PoiPlacement>,
}

impl FrameReport {
    pub fn idle(frame_index: u64) -> Self {
        Self {
            frame_index,
            state: SessionState::NoActiveAnchor,
            active_anchor: None,
            raw_bearing: None,
            anchor_rotation: None,
            rotation_uncertainty: None,
            placements: Vec::new(),
        }
    }
}

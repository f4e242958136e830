//! Scene graph abstraction for the rendering engine
//!
//! The projection engine never touches a concrete 3D engine. It drives
//! whatever implements [`SceneGraph`]: node creation, parent/child
//! attachment, local transforms and a look-at helper. Label renderables are
//! built asynchronously by a [`LabelFactory`].

pub mod label;
pub mod mock;

pub use label::{LabelFactory, LabelRequest, LabelTicket, QueuedLabelFactory};
pub use mock::{MockNodeKey, MockScene};

use nalgebra::{UnitQuaternion, Vector3};
use std::fmt::Debug;
use std::hash::Hash;

/// Role of a node in the label hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Follows the detected marker's pose
    Marker,
    /// Carries the smoothed anchor bearing
    Anchor,
    /// Positioned at a point of interest's projected offset
    Location,
    /// Rotated every frame to face the camera
    CameraFacing,
    /// Scaled every frame to keep a constant screen size
    ScreenScale,
    /// Label renderable supplied by the host
    Label,
}

/// Capability interface implemented by the host rendering engine
pub trait SceneGraph {
    /// Handle of a node owned by the engine
    type NodeId: Copy + Eq + Hash + Debug;

    /// Create a detached node at the scene root
    fn create_node(&mut self, kind: NodeKind) -> Self::NodeId;

    /// Remove a node together with all of its children
    fn remove_node(&mut self, node: Self::NodeId);

    /// Re-parent `child` under `parent`
    fn add_child(&mut self, parent: Self::NodeId, child: Self::NodeId);

    /// Set the node's position relative to its parent (meters)
    fn set_position(&mut self, node: Self::NodeId, position: Vector3<f64>);

    /// Set the node's rotation relative to its parent
    fn set_rotation(&mut self, node: Self::NodeId, rotation: UnitQuaternion<f64>);

    /// Set the node's scale relative to its parent
    fn set_scale(&mut self, node: Self::NodeId, scale: Vector3<f64>);

    /// Position of the node in world space, `None` if it no longer exists
    fn world_position(&self, node: Self::NodeId) -> Option<Vector3<f64>>;

    /// Rotate the node so its local -Z axis points at `target` (world space)
    fn look_at(&mut self, node: Self::NodeId, target: &Vector3<f64>);

    fn contains(&self, node: Self::NodeId) -> bool;
}

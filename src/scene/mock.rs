//! In-memory scene graph for tests and offline replay

use super::{NodeKind, SceneGraph};
use nalgebra::{Matrix4, UnitQuaternion, Vector3};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle of a node in a [`MockScene`]
    pub struct MockNodeKey;
}

/// Node state tracked by the mock scene
#[derive(Debug, Clone, PartialEq)]
pub struct MockNode {
    pub kind: NodeKind,
    pub parent: Option<MockNodeKey>,
    pub children: Vec<MockNodeKey>,
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub scale: Vector3<f64>,
}

impl MockNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }

    /// Translation * rotation * scale
    pub fn local_transform(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

/// Mock scene graph for testing
#[derive(Debug, Default)]
pub struct MockScene {
    nodes: SlotMap<MockNodeKey, MockNode>,
    look_at_calls: usize,
}

impl MockScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, key: MockNodeKey) -> Option<&MockNode> {
        self.nodes.get(key)
    }

    /// Number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of live nodes of the given kind
    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.values().filter(|node| node.kind == kind).count()
    }

    pub fn parent(&self, key: MockNodeKey) -> Option<MockNodeKey> {
        self.nodes.get(key).and_then(|node| node.parent)
    }

    pub fn children(&self, key: MockNodeKey) -> &[MockNodeKey] {
        self.nodes
            .get(key)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Number of `look_at` calls that changed a rotation
    pub fn look_at_calls(&self) -> usize {
        self.look_at_calls
    }

    /// Composed transform from node space to world space
    pub fn world_transform(&self, key: MockNodeKey) -> Option<Matrix4<f64>> {
        let node = self.nodes.get(key)?;
        let mut transform = node.local_transform();
        let mut current = node.parent;

        while let Some(parent_key) = current {
            let parent = self.nodes.get(parent_key)?;
            transform = parent.local_transform() * transform;
            current = parent.parent;
        }

        Some(transform)
    }

    /// Composed rotation from node space to world space, ignoring scale
    pub fn world_rotation(&self, key: MockNodeKey) -> Option<UnitQuaternion<f64>> {
        let node = self.nodes.get(key)?;
        let mut rotation = node.rotation;
        let mut current = node.parent;

        while let Some(parent_key) = current {
            let parent = self.nodes.get(parent_key)?;
            rotation = parent.rotation * rotation;
            current = parent.parent;
        }

        Some(rotation)
    }

    fn is_ancestor(&self, ancestor: MockNodeKey, key: MockNodeKey) -> bool {
        let mut current = Some(key);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.nodes.get(k).and_then(|node| node.parent);
        }
        false
    }

    fn detach(&mut self, key: MockNodeKey) {
        let parent = self.nodes.get_mut(key).and_then(|node| node.parent.take());
        if let Some(parent_key) = parent {
            if let Some(parent) = self.nodes.get_mut(parent_key) {
                parent.children.retain(|child| *child != key);
            }
        }
    }
}

impl SceneGraph for MockScene {
    type NodeId = MockNodeKey;

    fn create_node(&mut self, kind: NodeKind) -> MockNodeKey {
        self.nodes.insert(MockNode::new(kind))
    }

    fn remove_node(&mut self, node: MockNodeKey) {
        self.detach(node);

        let mut stack = vec![node];
        while let Some(key) = stack.pop() {
            if let Some(removed) = self.nodes.remove(key) {
                stack.extend(removed.children);
            }
        }
    }

    fn add_child(&mut self, parent: MockNodeKey, child: MockNodeKey) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        // Refuse to create a cycle
        if self.is_ancestor(child, parent) {
            return;
        }

        self.detach(child);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children.push(child);
        }
    }

    fn set_position(&mut self, node: MockNodeKey, position: Vector3<f64>) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.position = position;
        }
    }

    fn set_rotation(&mut self, node: MockNodeKey, rotation: UnitQuaternion<f64>) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.rotation = rotation;
        }
    }

    fn set_scale(&mut self, node: MockNodeKey, scale: Vector3<f64>) {
        if let Some(node) = self.nodes.get_mut(node) {
            node.scale = scale;
        }
    }

    fn world_position(&self, node: MockNodeKey) -> Option<Vector3<f64>> {
        let transform = self.world_transform(node)?;
        Some(Vector3::new(
            transform[(0, 3)],
            transform[(1, 3)],
            transform[(2, 3)],
        ))
    }

    fn look_at(&mut self, node: MockNodeKey, target: &Vector3<f64>) {
        let Some(position) = self.world_position(node) else {
            return;
        };

        let direction = target - position;
        let up = Vector3::y();
        if direction.norm() < 1e-9 || direction.cross(&up).norm() < 1e-9 {
            return;
        }

        // Local -Z ends up pointing at the target
        let world_rotation = UnitQuaternion::face_towards(&(-direction), &up);
        let parent_rotation = self
            .parent(node)
            .and_then(|parent| self.world_rotation(parent))
            .unwrap_or_else(UnitQuaternion::identity);

        if let Some(node) = self.nodes.get_mut(node) {
            node.rotation = parent_rotation.inverse() * world_rotation;
            self.look_at_calls += 1;
        }
    }

    fn contains(&self, node: MockNodeKey) -> bool {
        self.nodes.contains_key(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_world_position_composes_parent_chain() {
        let mut scene = MockScene::new();
        let root = scene.create_node(NodeKind::Anchor);
        let child = scene.create_node(NodeKind::Location);
        scene.add_child(root, child);

        // Quarter turn about +Y maps local +X to world -Z
        scene.set_rotation(
            root,
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2),
        );
        scene.set_position(child, Vector3::new(10.0, 2.0, 0.0));

        let world = scene.world_position(child).unwrap();
        assert_relative_eq!(world, Vector3::new(0.0, 2.0, -10.0), epsilon = 1e-9);
    }

    #[test]
    fn test_scale_applies_to_children() {
        let mut scene = MockScene::new();
        let parent = scene.create_node(NodeKind::ScreenScale);
        let label = scene.create_node(NodeKind::Label);
        scene.add_child(parent, label);

        scene.set_scale(parent, Vector3::repeat(3.0));
        scene.set_position(label, Vector3::new(0.5, 0.0, 0.0));

        let world = scene.world_position(label).unwrap();
        assert_relative_eq!(world, Vector3::new(1.5, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_remove_node_removes_subtree() {
        let mut scene = MockScene::new();
        let anchor = scene.create_node(NodeKind::Anchor);
        let location = scene.create_node(NodeKind::Location);
        let label = scene.create_node(NodeKind::Label);
        scene.add_child(anchor, location);
        scene.add_child(location, label);
        let other = scene.create_node(NodeKind::Marker);

        scene.remove_node(anchor);

        assert!(!scene.contains(anchor));
        assert!(!scene.contains(location));
        assert!(!scene.contains(label));
        assert!(scene.contains(other));
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_add_child_refuses_cycles() {
        let mut scene = MockScene::new();
        let a = scene.create_node(NodeKind::Anchor);
        let b = scene.create_node(NodeKind::Location);
        scene.add_child(a, b);
        scene.add_child(b, a);

        assert_eq!(scene.parent(b), Some(a));
        assert_eq!(scene.parent(a), None);
    }

    #[test]
    fn test_look_at_points_negative_z_towards_target() {
        let mut scene = MockScene::new();
        let anchor = scene.create_node(NodeKind::Anchor);
        let facing = scene.create_node(NodeKind::CameraFacing);
        scene.add_child(anchor, facing);
        scene.set_rotation(
            anchor,
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.7),
        );
        scene.set_position(facing, Vector3::new(5.0, 0.0, -20.0));

        let target = Vector3::new(0.0, 1.5, 0.0);
        scene.look_at(facing, &target);

        let position = scene.world_position(facing).unwrap();
        let forward = scene.world_rotation(facing).unwrap() * -Vector3::z();
        let expected = (target - position).normalize();
        assert_relative_eq!(forward, expected, epsilon = 1e-9);
        assert_eq!(scene.look_at_calls(), 1);
    }

    #[test]
    fn test_look_at_ignores_degenerate_direction() {
        let mut scene = MockScene::new();
        let node = scene.create_node(NodeKind::CameraFacing);

        scene.look_at(node, &Vector3::zeros());
        scene.look_at(node, &Vector3::new(0.0, 4.0, 0.0));

        assert_eq!(scene.look_at_calls(), 0);
        assert_eq!(scene.node(node).unwrap().rotation, UnitQuaternion::identity());
    }
}

//! Frame update orchestrator
//!
//! [`OverlaySession`] binds a detected marker to its configured
//! [`LocationAnchor`], keeps the anchor's bearing smoothed across frames and
//! places one label chain per point of interest:
//!
//! ```text
//! anchor -> location -> camera-facing -> screen-scale -> label
//! ```
//!
//! At most one binding is live. Confirming a different marker discards the
//! previous binding together with every node it created. Frames confirm a
//! marker only the first time it is tracked, so markers seen together do not
//! keep replacing each other.

use crate::algorithms::{CompressionPolicy, LabelLayout, ProjectedOffset, ScreenScalePolicy};
use crate::api::types::{
    FrameInput, FrameReport, PoiPlacement, SessionError, SessionResult, SessionState,
};
use crate::core::{LocationAnchor, PointOfInterest, BEARING_MEASUREMENT_UNCERTAINTY_DEG};
use crate::processing::{marker_yaw, BearingEstimator, MarkerMounting};
use crate::scene::{LabelFactory, LabelRequest, LabelTicket, NodeKind, SceneGraph};
use crate::utils::config::SystemConfig;
use log::{debug, info, warn};
use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use slotmap::{new_key_type, SlotMap};
use std::collections::{HashMap, HashSet};

new_key_type! {
    /// Handle of an anchor binding
    pub struct BindingKey;
}

/// Tunables the session runs with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub compression: CompressionPolicy,
    pub screen_scale: ScreenScalePolicy,
    /// Bearing measurement variance (radians)
    pub measurement_uncertainty: f64,
    pub marker_mounting: MarkerMounting,
    /// Unwrap each bearing measurement towards the current estimate
    pub unwrap_bearing: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            compression: CompressionPolicy::default(),
            screen_scale: ScreenScalePolicy::default(),
            measurement_uncertainty: BEARING_MEASUREMENT_UNCERTAINTY_DEG.to_radians(),
            marker_mounting: MarkerMounting::Vertical,
            unwrap_bearing: true,
        }
    }
}

impl From<&SystemConfig> for SessionSettings {
    fn from(config: &SystemConfig) -> Self {
        Self {
            compression: config.compression.to_policy(),
            screen_scale: config.screen_scale.to_policy(),
            measurement_uncertainty: config.orientation.measurement_uncertainty_rad(),
            marker_mounting: config.orientation.marker_mounting,
            unwrap_bearing: config.orientation.unwrap_bearing,
        }
    }
}

/// Node chain built for one point of interest once its label is ready
#[derive(Debug, Clone, PartialEq)]
pub struct PoiNodes<N> {
    pub poi: PointOfInterest,
    pub ticket: LabelTicket,
    pub location: N,
    pub camera_facing: N,
    pub screen_scale: N,
    pub label: N,
}

/// Runtime association of a detected marker with its anchor
#[derive(Debug, Clone)]
pub struct AnchorBinding<N> {
    pub anchor: LocationAnchor,
    /// Label tickets issued for this binding carry this generation
    pub generation: u64,
    /// Follows the tracked marker pose
    pub marker_node: N,
    /// Rotated by the smoothed bearing; parent of every location node
    pub anchor_node: N,
    pub orientation: BearingEstimator,
    pub pois: Vec<PoiNodes<N>>,
    /// Label requests not yet completed
    pub pending_labels: HashMap<LabelTicket, PointOfInterest>,
}

impl<N: Copy> AnchorBinding<N> {
    pub fn poi_nodes(&self, ticket: LabelTicket) -> Option<&PoiNodes<N>> {
        self.pois.iter().find(|nodes| nodes.ticket == ticket)
    }
}

/// Per-frame driver for the label overlay
pub struct OverlaySession<S: SceneGraph, F: LabelFactory> {
    anchors: Vec<LocationAnchor>,
    settings: SessionSettings,
    scene: S,
    labels: F,
    bindings: SlotMap<BindingKey, AnchorBinding<S::NodeId>>,
    binding_index: HashMap<String, BindingKey>,
    active: Option<BindingKey>,
    generation: u64,
    frame_index: u64,
    unknown_markers: HashSet<String>,
    /// Markers ever confirmed; not cleared when bindings are discarded
    confirmed_markers: HashSet<String>,
}

/// Location node position for a projected offset: x east, y up, -z north
fn poi_position(projected: &ProjectedOffset) -> Vector3<f64> {
    Vector3::new(
        projected.horizontal.x,
        projected.vertical,
        -projected.horizontal.y,
    )
}

impl<S: SceneGraph, F: LabelFactory> OverlaySession<S, F> {
    pub fn new(anchors: Vec<LocationAnchor>, settings: SessionSettings, scene: S, labels: F) -> Self {
        Self {
            anchors,
            settings,
            scene,
            labels,
            bindings: SlotMap::with_key(),
            binding_index: HashMap::new(),
            active: None,
            generation: 0,
            frame_index: 0,
            unknown_markers: HashSet::new(),
            confirmed_markers: HashSet::new(),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn anchors(&self) -> &[LocationAnchor] {
        &self.anchors
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Host access to the scene, e.g. to create label renderables
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn label_factory(&self) -> &F {
        &self.labels
    }

    pub fn label_factory_mut(&mut self) -> &mut F {
        &mut self.labels
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Tracking
        } else {
            SessionState::NoActiveAnchor
        }
    }

    pub fn active_key(&self) -> Option<BindingKey> {
        self.active
    }

    pub fn active_binding(&self) -> Option<&AnchorBinding<S::NodeId>> {
        self.active.and_then(|key| self.bindings.get(key))
    }

    /// Binding for a marker identifier, if one exists
    pub fn binding_for(&self, identifier: &str) -> Option<&AnchorBinding<S::NodeId>> {
        self.binding_index
            .get(identifier)
            .and_then(|key| self.bindings.get(*key))
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Generation of the most recently created binding
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn find_anchor(&self, identifier: &str) -> Option<&LocationAnchor> {
        self.anchors
            .iter()
            .find(|anchor| anchor.identifier == identifier)
    }

    /// Bind a confirmed marker to its anchor, replacing any existing binding
    ///
    /// Requests one label per point of interest from the label factory.
    pub fn on_marker_confirmed(&mut self, identifier: &str) -> SessionResult<BindingKey> {
        let anchor = self
            .find_anchor(identifier)
            .cloned()
            .ok_or_else(|| SessionError::UnknownAnchor {
                identifier: identifier.to_string(),
            })?;

        self.discard_bindings();
        self.generation += 1;
        let generation = self.generation;

        let marker_node = self.scene.create_node(NodeKind::Marker);
        let anchor_node = self.scene.create_node(NodeKind::Anchor);

        let mut pending_labels = HashMap::with_capacity(anchor.points_of_interest.len());
        for (index, poi) in anchor.points_of_interest.iter().enumerate() {
            let ticket = LabelTicket::new(generation, index as u32);
            pending_labels.insert(ticket, poi.clone());
            self.labels.request_label(LabelRequest {
                ticket,
                text: poi.name.clone(),
            });
        }

        info!(
            "Bound marker '{}' to anchor at {:.7}, {:.7} (bearing {:.1} deg, {} points of interest, generation {})",
            anchor.identifier,
            anchor.location.coordinate.latitude,
            anchor.location.coordinate.longitude,
            anchor.bearing_degrees,
            anchor.points_of_interest.len(),
            generation
        );

        let identifier = anchor.identifier.clone();
        self.confirmed_markers.insert(identifier.clone());
        let key = self.bindings.insert(AnchorBinding {
            anchor,
            generation,
            marker_node,
            anchor_node,
            orientation: BearingEstimator::new(
                self.settings.measurement_uncertainty,
                self.settings.unwrap_bearing,
            ),
            pois: Vec::new(),
            pending_labels,
        });
        self.binding_index.insert(identifier, key);
        self.active = Some(key);

        Ok(key)
    }

    /// Drop every binding's bearing estimate; the next tracked frame reseeds it
    pub fn on_session_paused(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.orientation.reset();
        }
        info!(
            "Session paused, cleared orientation of {} binding(s)",
            self.bindings.len()
        );
    }

    /// Attach a finished label renderable to its point of interest
    ///
    /// Rejected tickets hand their label node back by removing it from the
    /// scene, whether they come from a discarded binding or were already used.
    pub fn on_label_ready(&mut self, ticket: LabelTicket, label_node: S::NodeId) -> SessionResult<()> {
        if ticket.generation != self.generation {
            warn!(
                "Dropping label for ticket {:?}, current generation is {}",
                ticket, self.generation
            );
            self.scene.remove_node(label_node);
            return Err(SessionError::StaleLabelTicket { ticket });
        }

        let Some(binding) = self.active.and_then(|key| self.bindings.get_mut(key)) else {
            warn!("Dropping label for ticket {:?}, no active binding", ticket);
            self.scene.remove_node(label_node);
            return Err(SessionError::StaleLabelTicket { ticket });
        };

        let Some(poi) = binding.pending_labels.remove(&ticket) else {
            warn!("Dropping label for ticket {:?}, not pending", ticket);
            self.scene.remove_node(label_node);
            return Err(SessionError::UnknownLabelTicket { ticket });
        };

        let location = self.scene.create_node(NodeKind::Location);
        let camera_facing = self.scene.create_node(NodeKind::CameraFacing);
        let screen_scale = self.scene.create_node(NodeKind::ScreenScale);
        self.scene.add_child(binding.anchor_node, location);
        self.scene.add_child(location, camera_facing);
        self.scene.add_child(camera_facing, screen_scale);
        self.scene.add_child(screen_scale, label_node);

        let projected = self
            .settings
            .compression
            .project(&binding.anchor.location, &poi.location);
        self.scene.set_position(location, poi_position(&projected));

        debug!(
            "Label ready for '{}' ({:.1} m, shown at {:.1} m)",
            poi.name, projected.true_distance, projected.display_distance
        );

        binding.pois.push(PoiNodes {
            poi,
            ticket,
            location,
            camera_facing,
            screen_scale,
            label: label_node,
        });

        Ok(())
    }

    /// Center and mirror a label once the host has measured its view
    pub fn on_label_measured(
        &mut self,
        ticket: LabelTicket,
        width_px: f64,
        density: f64,
    ) -> SessionResult<LabelLayout> {
        if !(width_px.is_finite() && width_px >= 0.0 && density.is_finite() && density > 0.0) {
            return Err(SessionError::InvalidLabelMetrics { width_px, density });
        }

        let binding = self
            .active
            .and_then(|key| self.bindings.get(key))
            .filter(|binding| binding.generation == ticket.generation)
            .ok_or(SessionError::StaleLabelTicket { ticket })?;

        let label = binding
            .poi_nodes(ticket)
            .map(|nodes| nodes.label)
            .ok_or(SessionError::UnknownLabelTicket { ticket })?;

        let layout = self.settings.screen_scale.label_layout(width_px, density);
        self.scene
            .set_position(label, Vector3::new(layout.offset_x, 0.0, 0.0));
        self.scene.set_scale(label, Vector3::from(layout.scale));

        Ok(layout)
    }

    /// Run one frame: bind, smooth the bearing, then place, scale and turn labels
    pub fn update_frame(&mut self, input: &FrameInput) -> FrameReport {
        self.frame_index += 1;
        let mut raw_bearing = None;

        for marker in &input.markers {
            if !marker.is_tracking() {
                continue;
            }

            let existing = self.binding_index.get(&marker.name).copied();
            let key = match existing {
                Some(key) => key,
                None => {
                    if self.confirmed_markers.contains(&marker.name) {
                        continue;
                    }
                    if self.find_anchor(&marker.name).is_none() {
                        if self.unknown_markers.insert(marker.name.clone()) {
                            warn!("No location anchor configured for marker '{}'", marker.name);
                        }
                        continue;
                    }
                    match self.on_marker_confirmed(&marker.name) {
                        Ok(key) => key,
                        Err(e) => {
                            warn!("{}", e);
                            continue;
                        }
                    }
                }
            };

            if self.active == Some(key) {
                raw_bearing = self.update_orientation(key, &marker.pose);
            }
        }

        let Some(binding) = self.active.and_then(|key| self.bindings.get(key)) else {
            return FrameReport::idle(self.frame_index);
        };

        let camera_position = input.camera.pose.translation.vector;
        let screen_scale = self
            .settings
            .screen_scale
            .screen_scale(&input.camera.optics, &input.surface);
        if screen_scale.is_none() {
            debug!("Degenerate camera optics, skipping screen-scale pass");
        }

        let mut placements = Vec::with_capacity(binding.pois.len());
        for nodes in &binding.pois {
            let projected = self
                .settings
                .compression
                .project(&binding.anchor.location, &nodes.poi.location);
            let position = poi_position(&projected);
            self.scene.set_position(nodes.location, position);

            placements.push(PoiPlacement {
                name: nodes.poi.name.clone(),
                position: [position.x, position.y, position.z],
                scale: None,
                true_distance_m: projected.true_distance,
                display_distance_m: projected.display_distance,
            });
        }

        if let Some(screen_scale) = screen_scale {
            for (nodes, placement) in binding.pois.iter().zip(placements.iter_mut()) {
                let Some(world) = self.scene.world_position(nodes.screen_scale) else {
                    continue;
                };
                let factor = screen_scale.scale_at((world - camera_position).norm());
                self.scene
                    .set_scale(nodes.screen_scale, Vector3::repeat(factor));
                placement.scale = Some(factor);
            }
        }

        for nodes in &binding.pois {
            self.scene.look_at(nodes.camera_facing, &camera_position);
        }

        let report = FrameReport {
            frame_index: self.frame_index,
            state: SessionState::Tracking,
            active_anchor: Some(binding.anchor.identifier.clone()),
            raw_bearing,
            anchor_rotation: binding.orientation.estimate(),
            rotation_uncertainty: binding
                .orientation
                .filter()
                .map(|filter| filter.get_uncertainty()),
            placements,
        };

        debug!(
            "Frame {}: {} label(s), rotation {:?}",
            report.frame_index,
            report.placements.len(),
            report.anchor_rotation
        );

        report
    }

    /// Feed the marker's pose into the bearing filter; returns the raw bearing
    fn update_orientation(&mut self, key: BindingKey, pose: &Isometry3<f64>) -> Option<f64> {
        let binding = self.bindings.get_mut(key)?;

        self.scene
            .set_position(binding.marker_node, pose.translation.vector);
        self.scene.set_rotation(binding.marker_node, pose.rotation);

        let yaw = marker_yaw(&pose.rotation, self.settings.marker_mounting);
        let raw_bearing = yaw + binding.anchor.bearing_radians();
        let estimate = binding.orientation.update(raw_bearing);

        self.scene.set_rotation(
            binding.anchor_node,
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), estimate),
        );

        debug!(
            "Marker '{}' yaw {:.4} rad, bearing {:.4} rad, smoothed {:.4} rad",
            binding.anchor.identifier, yaw, raw_bearing, estimate
        );

        Some(raw_bearing)
    }

    fn discard_bindings(&mut self) {
        for (_, binding) in self.bindings.drain() {
            self.scene.remove_node(binding.anchor_node);
            self.scene.remove_node(binding.marker_node);
            info!(
                "Discarded binding for '{}' ({} label(s), {} pending)",
                binding.anchor.identifier,
                binding.pois.len(),
                binding.pending_labels.len()
            );
        }
        self.binding_index.clear();
        self.active = None;
    }
}

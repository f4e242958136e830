//! Core data types for the projection engine

use serde::{Deserialize, Serialize};

/// Geodetic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Coordinate with altitude above sea level (meters)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinate: Coordinate,
    pub altitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
            altitude,
        }
    }
}

/// Named real-world point shown as a label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub location: Location,
}

impl PointOfInterest {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// Real-world location bound to a physical visual marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationAnchor {
    /// Marker asset name reported by the tracker
    pub identifier: String,
    /// Printed marker width (meters)
    pub physical_width_m: f64,
    /// Where the marker is mounted
    pub location: Location,
    /// Real-world direction the marker faces (degrees from north)
    pub bearing_degrees: f64,
    /// Points shown around this anchor, in display order
    pub points_of_interest: Vec<PointOfInterest>,
}

impl LocationAnchor {
    /// Anchor bearing in radians
    pub fn bearing_radians(&self) -> f64 {
        self.bearing_degrees.to_radians()
    }

    pub fn point_of_interest(&self, name: &str) -> Option<&PointOfInterest> {
        self.points_of_interest.iter().find(|poi| poi.name == name)
    }
}

/// Point in the local tangent plane centered on an anchor (meters)
///
/// `x` grows east-ish and `y` grows north-ish.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalOffset {
    pub x: f64,
    pub y: f64,
}

impl LocalOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin of the local frame
    pub fn zero() -> Self {
        Self::default()
    }
}

//! Anchor bearing estimation from marker poses
//!
//! The tracker reports the marker's full pose every frame. Only its rotation
//! about the world vertical axis matters here: together with the anchor's
//! surveyed bearing it gives the rotation that aligns the local tangent
//! plane with the session's world frame.

use crate::algorithms::geodesy::normalize_angle;
use crate::processing::kalman::ScalarKalmanFilter;
use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// How the physical marker is mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMounting {
    /// Marker on a wall, its plane normal horizontal
    #[default]
    Vertical,
    /// Marker lying flat, its plane normal pointing up
    Horizontal,
}

/// Rotation of the marker about the world vertical axis (radians)
///
/// A vertical marker is first tilted by -90 degrees about its local X axis
/// so that its normal lies in the plane a horizontal marker would have.
/// Yaw is taken from the Y-X-Z Euler decomposition.
pub fn marker_yaw(rotation: &UnitQuaternion<f64>, mounting: MarkerMounting) -> f64 {
    let levelled = match mounting {
        MarkerMounting::Vertical => {
            rotation * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -FRAC_PI_2)
        }
        MarkerMounting::Horizontal => *rotation,
    };

    let matrix = levelled.to_rotation_matrix();
    let m = matrix.matrix();
    m[(0, 2)].atan2(m[(2, 2)])
}

/// Shift `measurement` by whole turns so it lies within half a turn of `reference`
pub fn unwrap_towards(measurement: f64, reference: f64) -> f64 {
    reference + normalize_angle(measurement - reference)
}

/// Smoothed anchor bearing
#[derive(Debug, Clone, PartialEq)]
pub struct BearingEstimator {
    filter: Option<ScalarKalmanFilter>,
    measurement_uncertainty: f64,
    unwrap: bool,
}

impl BearingEstimator {
    pub fn new(measurement_uncertainty: f64, unwrap: bool) -> Self {
        Self {
            filter: None,
            measurement_uncertainty,
            unwrap,
        }
    }

    /// Fuse a raw bearing measurement, seeding the filter if needed
    pub fn update(&mut self, raw_bearing: f64) -> f64 {
        match self.filter.as_mut() {
            Some(filter) => {
                let measurement = if self.unwrap {
                    unwrap_towards(raw_bearing, filter.get_estimate())
                } else {
                    raw_bearing
                };
                filter.update(measurement, self.measurement_uncertainty)
            }
            None => {
                let filter = ScalarKalmanFilter::new(raw_bearing, self.measurement_uncertainty);
                let estimate = filter.get_estimate();
                self.filter = Some(filter);
                estimate
            }
        }
    }

    /// Forget the accumulated estimate; the next measurement reseeds it
    pub fn reset(&mut self) {
        self.filter = None;
    }

    pub fn estimate(&self) -> Option<f64> {
        self.filter.as_ref().map(|filter| filter.get_estimate())
    }

    pub fn filter(&self) -> Option<&ScalarKalmanFilter> {
        self.filter.as_ref()
    }

    pub fn is_seeded(&self) -> bool {
        self.filter.is_some()
    }
}

//! Screen-space scale policy for camera-facing labels
//!
//! Labels are authored at a fixed density of dp per meter at 1 m depth.
//! Scaling a label node linearly with its distance from the camera keeps
//! its on-screen size constant, countering perspective shrink.

use crate::core::LABEL_DP_PER_METER;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

/// Camera image intrinsics reported by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraOptics {
    /// Vertical focal length (pixels)
    pub focal_length_y: f64,
    /// Camera image width (pixels)
    pub image_width: f64,
    /// Camera image height (pixels)
    pub image_height: f64,
}

/// Render surface the camera image is shown on
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderSurface {
    /// Surface width (physical pixels)
    pub width_px: f64,
    /// Surface height (physical pixels)
    pub height_px: f64,
    /// Physical pixels per density-independent pixel
    pub density: f64,
}

impl RenderSurface {
    pub fn width_dp(&self) -> f64 {
        self.width_px / self.density
    }
}

/// Placement of a label within its screen-scale node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLayout {
    /// Label width at 1 m depth (meters)
    pub width_m: f64,
    /// Local x offset that centers the label on its node (meters)
    pub offset_x: f64,
    /// Local scale; x is mirrored so text reads correctly after look-at
    pub scale: [f64; 3],
}

/// Derives per-node scale factors from camera optics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenScalePolicy {
    /// Label texture density (dp per meter at 1 m depth)
    pub label_dp_per_meter: f64,
}

impl Default for ScreenScalePolicy {
    fn default() -> Self {
        Self {
            label_dp_per_meter: LABEL_DP_PER_METER,
        }
    }
}

/// Meters covered by one label point at 1 m depth for a given frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenScale {
    pub meters_per_point_at_1m: f64,
}

impl ScreenScale {
    /// Uniform scale for a node at `distance` meters from the camera
    pub fn scale_at(&self, distance: f64) -> f64 {
        self.meters_per_point_at_1m * distance
    }
}

impl ScreenScalePolicy {
    pub fn new(label_dp_per_meter: f64) -> Self {
        Self { label_dp_per_meter }
    }

    /// Vertical field of view visible on the surface (radians)
    ///
    /// Clamped by the surface/image aspect ratio; never wider than the
    /// camera's native field of view. `None` for degenerate optics.
    pub fn vertical_fov(&self, optics: &CameraOptics, surface: &RenderSurface) -> Option<f64> {
        if optics.focal_length_y <= 0.0
            || optics.image_width <= 0.0
            || optics.image_height <= 0.0
            || surface.width_px <= 0.0
            || surface.height_px <= 0.0
        {
            return None;
        }

        let native_fov = 2.0 * (optics.image_height / (2.0 * optics.focal_length_y)).atan();

        let surface_aspect = surface.width_px / surface.height_px;
        let image_aspect = optics.image_height / optics.image_width;
        let visible_scale = (surface_aspect / image_aspect).min(1.0);

        Some(native_fov * visible_scale)
    }

    /// Horizontal world width visible at 1 m depth (meters)
    pub fn visible_width_at_1m(&self, y_fov: f64) -> f64 {
        // Right triangle with apex angle A at the camera and unit depth
        let a = y_fov * 0.5;
        let b = PI - a - FRAC_PI_2;
        let half_width = a.sin() / b.sin();

        half_width * 2.0
    }

    /// Conversion for the current frame
    pub fn screen_scale(&self, optics: &CameraOptics, surface: &RenderSurface) -> Option<ScreenScale> {
        if surface.density <= 0.0 {
            return None;
        }

        let y_fov = self.vertical_fov(optics, surface)?;
        let visible_width = self.visible_width_at_1m(y_fov);
        let meters_per_point_at_1m = visible_width / surface.width_dp() * self.label_dp_per_meter;

        Some(ScreenScale {
            meters_per_point_at_1m,
        })
    }

    /// Convert a label's measured pixel width to meters at 1 m depth
    pub fn pixels_to_meters(&self, width_px: f64, density: f64) -> f64 {
        width_px / density / self.label_dp_per_meter
    }

    /// Layout for a label once its view has been measured
    pub fn label_layout(&self, width_px: f64, density: f64) -> LabelLayout {
        let width_m = self.pixels_to_meters(width_px, density);

        LabelLayout {
            width_m,
            offset_x: width_m / 2.0,
            scale: [-1.0, 1.0, 1.0],
        }
    }
}

//! Display-distance compression for far-away points
//!
//! Points closer than the near threshold are shown at their true offset.
//! Farther points are pulled in towards the far threshold along their true
//! bearing, and their altitude offset is scaled by the same factor so the
//! elevation angle seen from the anchor is preserved.

use crate::algorithms::geodesy;
use crate::core::{LocalOffset, Location, MAX_SCALED_DISTANCE_M, MIN_SCALED_DISTANCE_M};
use serde::{Deserialize, Serialize};

/// Curve used beyond the near threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionMode {
    /// `min + log10(d - min + 1) * (max - min) / log10(d - min + 1)`.
    /// The log terms cancel, so every far point lands exactly on `max`.
    #[default]
    Literal,
    /// `min + r * L / (1 + L)` with `r = max - min` and `L = ln(1 + (d - min) / r)`.
    /// Slope 1 at `min`, strictly increasing, approaches `max` without reaching it.
    Asymptotic,
}

/// Offset of a point relative to an anchor after compression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedOffset {
    /// Offset in the local tangent plane (meters)
    pub horizontal: LocalOffset,
    /// Altitude difference to the anchor (meters)
    pub vertical: f64,
    /// Uncompressed planar distance (meters)
    pub true_distance: f64,
    /// Planar distance after compression (meters)
    pub display_distance: f64,
}

impl ProjectedOffset {
    /// Factor applied to the true offset (1.0 when uncompressed)
    pub fn squash_factor(&self) -> f64 {
        if self.true_distance > 0.0 {
            self.display_distance / self.true_distance
        } else {
            1.0
        }
    }
}

/// Distance compression parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionPolicy {
    /// Distances up to this value are left untouched (meters)
    pub min_scaled: f64,
    /// Upper bound of compressed distances (meters)
    pub max_scaled: f64,
    pub mode: CompressionMode,
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self {
            min_scaled: MIN_SCALED_DISTANCE_M,
            max_scaled: MAX_SCALED_DISTANCE_M,
            mode: CompressionMode::Literal,
        }
    }
}

impl CompressionPolicy {
    pub fn new(min_scaled: f64, max_scaled: f64, mode: CompressionMode) -> Self {
        Self {
            min_scaled,
            max_scaled,
            mode,
        }
    }

    /// Map a true planar distance to the distance it is displayed at
    pub fn display_distance(&self, distance: f64) -> f64 {
        if distance <= self.min_scaled {
            return distance;
        }

        let range = self.max_scaled - self.min_scaled;
        let excess = distance - self.min_scaled;

        match self.mode {
            CompressionMode::Literal => {
                let log_excess = (excess + 1.0).log10();
                let scale_factor = range / log_excess;
                self.min_scaled + log_excess * scale_factor
            }
            CompressionMode::Asymptotic => {
                let log_excess = (excess / range).ln_1p();
                self.min_scaled + range * log_excess / (1.0 + log_excess)
            }
        }
    }

    /// Compress a horizontal offset and its altitude difference
    pub fn compress(&self, horizontal: LocalOffset, vertical: f64) -> ProjectedOffset {
        let origin = LocalOffset::zero();
        let true_distance = geodesy::distance(&origin, &horizontal);

        if true_distance <= self.min_scaled {
            return ProjectedOffset {
                horizontal,
                vertical,
                true_distance,
                display_distance: true_distance,
            };
        }

        let bearing = geodesy::bearing(&origin, &horizontal);
        let display_distance = self.display_distance(true_distance);
        let squash = display_distance / true_distance;

        ProjectedOffset {
            horizontal: geodesy::destination(&origin, bearing, display_distance),
            vertical: vertical * squash,
            true_distance,
            display_distance,
        }
    }

    /// Project a point of interest into the anchor's local frame
    pub fn project(&self, anchor: &Location, point: &Location) -> ProjectedOffset {
        let horizontal = geodesy::relative_point(&anchor.coordinate, &point.coordinate);
        let vertical = point.altitude - anchor.altitude;

        self.compress(horizontal, vertical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_near_distances_are_unchanged() {
        let policy = CompressionPolicy::default();

        for d in [0.0, 1.0, 99.5, 249.999, 250.0] {
            assert_eq!(policy.display_distance(d), d);
        }
    }

    #[test]
    fn test_literal_formula_collapses_to_far_threshold() {
        // Regression guard: the literal curve is flat beyond the near threshold
        let policy = CompressionPolicy::default();

        for d in [300.0, 1000.0, 10000.0] {
            assert_relative_eq!(policy.display_distance(d), 500.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_asymptotic_curve_is_monotonic_and_bounded() {
        let policy = CompressionPolicy::new(250.0, 500.0, CompressionMode::Asymptotic);

        let mut previous = policy.display_distance(250.0);
        assert_eq!(previous, 250.0);

        for d in [250.5, 260.0, 300.0, 1000.0, 10000.0, 1e6, 1e9] {
            let display = policy.display_distance(d);
            assert!(display > previous, "not increasing at {}", d);
            assert!(display < 500.0);
            assert!(display <= d);
            previous = display;
        }
    }

    #[test]
    fn test_compression_preserves_bearing() {
        let policy = CompressionPolicy::default();
        let offset = LocalOffset::new(1800.0, -420.0);
        let origin = LocalOffset::zero();

        let projected = policy.compress(offset, 100.0);

        assert_relative_eq!(
            geodesy::bearing(&origin, &projected.horizontal),
            geodesy::bearing(&origin, &offset),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            geodesy::distance(&origin, &projected.horizontal),
            500.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_vertical_offset_uses_same_squash_factor() {
        let policy = CompressionPolicy::default();
        let offset = LocalOffset::new(0.0, 2000.0);

        let projected = policy.compress(offset, 400.0);

        assert_relative_eq!(projected.squash_factor(), 0.25, epsilon = 1e-12);
        assert_relative_eq!(projected.vertical, 100.0, epsilon = 1e-9);

        // Elevation angle seen from the anchor is unchanged
        let true_angle = (400.0_f64).atan2(2000.0);
        let shown_angle = projected.vertical.atan2(projected.display_distance);
        assert_relative_eq!(true_angle, shown_angle, epsilon = 1e-12);
    }

    #[test]
    fn test_near_point_keeps_altitude() {
        let policy = CompressionPolicy::default();
        let projected = policy.compress(LocalOffset::new(30.0, 40.0), -3.5);

        assert_eq!(projected.horizontal, LocalOffset::new(30.0, 40.0));
        assert_eq!(projected.vertical, -3.5);
        assert_eq!(projected.squash_factor(), 1.0);
    }

    #[test]
    fn test_project_split_points() {
        let policy = CompressionPolicy::default();
        let anchor = Location::new(43.5035324, 16.5324973, 6.0);

        // Yacht club is roughly 230 m away and stays uncompressed
        let yacht_club = Location::new(43.50146104645278, 16.532175575189505, 7.0);
        let near = policy.project(&anchor, &yacht_club);
        assert!(near.true_distance < 250.0);
        assert_eq!(near.display_distance, near.true_distance);
        assert_relative_eq!(near.vertical, 1.0);

        // Via ferata is roughly 1.9 km away, 414 m higher
        let via_ferata = Location::new(43.5072469523574, 16.554977474388586, 420.0);
        let far = policy.project(&anchor, &via_ferata);
        assert!(far.true_distance > 1500.0);
        assert_relative_eq!(far.display_distance, 500.0, epsilon = 1e-9);
        assert!(far.vertical < 414.0 && far.vertical > 0.0);
    }
}

//! Spherical-earth geodesy and local tangent plane helpers
//!
//! Converts pairs of geodetic coordinates into a bearing/distance in the
//! local plane of the first coordinate, and offers the planar equivalents
//! used once points are already expressed as local offsets:
//! - Haversine great-circle distance
//! - Forward azimuth (initial bearing)
//! - Planar bearing, distance and destination
//!
//! Bearings are radians measured clockwise from the local north (+y) axis.

use crate::core::{Coordinate, LocalOffset, EARTH_RADIUS_M};

/// Great-circle distance between two coordinates (meters)
pub fn great_circle_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Forward azimuth from `a` towards `b` (radians, -π..π)
///
/// Returns 0 when both coordinates coincide.
pub fn initial_bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let y = d_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();

    y.atan2(x)
}

/// Offset of `b` in the local tangent plane centered on `a`
pub fn relative_point(a: &Coordinate, b: &Coordinate) -> LocalOffset {
    let distance = great_circle_distance(a, b);
    let bearing = initial_bearing(a, b);

    LocalOffset::new(distance * bearing.sin(), distance * bearing.cos())
}

/// Planar bearing from `p0` towards `p1` (radians)
pub fn bearing(p0: &LocalOffset, p1: &LocalOffset) -> f64 {
    (p1.x - p0.x).atan2(p1.y - p0.y)
}

/// Planar distance between two local offsets (meters)
pub fn distance(p0: &LocalOffset, p1: &LocalOffset) -> f64 {
    (p0.x - p1.x).hypot(p0.y - p1.y)
}

/// Point at `distance` meters from `origin` along `bearing`
pub fn destination(origin: &LocalOffset, bearing: f64, distance: f64) -> LocalOffset {
    LocalOffset::new(
        origin.x + distance * bearing.sin(),
        origin.y + distance * bearing.cos(),
    )
}

/// Wrap an angle into -π..π
pub fn normalize_angle(angle: f64) -> f64 {
    use std::f64::consts::{PI, TAU};

    (angle + PI).rem_euclid(TAU) - PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn split_anchor() -> Coordinate {
        Coordinate::new(43.5035324, 16.5324973)
    }

    fn sample_pairs() -> Vec<(Coordinate, Coordinate)> {
        vec![
            (split_anchor(), Coordinate::new(43.50410664214121, 16.526312129899896)),
            (split_anchor(), Coordinate::new(43.5072469523574, 16.554977474388586)),
            (split_anchor(), Coordinate::new(43.50146104645278, 16.532175575189505)),
            (Coordinate::new(0.0, 0.0), Coordinate::new(0.01, -0.02)),
            (Coordinate::new(-33.8688, 151.2093), Coordinate::new(-33.8568, 151.2153)),
            (Coordinate::new(64.1466, -21.9426), Coordinate::new(64.1355, -21.8954)),
        ]
    }

    #[test]
    fn test_identical_coordinates_have_zero_distance() {
        let a = split_anchor();
        assert_eq!(great_circle_distance(&a, &a), 0.0);
        assert!(initial_bearing(&a, &a).is_finite());

        let offset = relative_point(&a, &a);
        assert!(offset.x.is_finite() && offset.y.is_finite());
        assert_relative_eq!(distance(&LocalOffset::zero(), &offset), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);

        // 2πR / 360
        let expected = EARTH_RADIUS_M * PI / 180.0;
        assert_relative_eq!(great_circle_distance(&a, &b), expected, epsilon = 1e-6);
        assert_relative_eq!(initial_bearing(&a, &b), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = Coordinate::new(10.0, 10.0);

        let east = initial_bearing(&origin, &Coordinate::new(10.0, 10.001));
        let south = initial_bearing(&origin, &Coordinate::new(9.999, 10.0));
        let west = initial_bearing(&origin, &Coordinate::new(10.0, 9.999));

        assert_relative_eq!(east, FRAC_PI_2, epsilon = 1e-4);
        assert_relative_eq!(south.abs(), PI, epsilon = 1e-9);
        assert_relative_eq!(west, -FRAC_PI_2, epsilon = 1e-4);
    }

    #[test]
    fn test_great_circle_distance_is_symmetric() {
        for (a, b) in sample_pairs() {
            assert_relative_eq!(
                great_circle_distance(&a, &b),
                great_circle_distance(&b, &a),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn test_planar_distance_is_symmetric() {
        let p = LocalOffset::new(-12.5, 40.0);
        let q = LocalOffset::new(300.0, -7.25);
        assert_eq!(distance(&p, &q), distance(&q, &p));
    }

    #[test]
    fn test_relative_point_round_trip() {
        for (a, b) in sample_pairs() {
            let offset = relative_point(&a, &b);
            let origin = LocalOffset::zero();

            assert_relative_eq!(
                distance(&origin, &offset),
                great_circle_distance(&a, &b),
                epsilon = 1e-3
            );
            assert_relative_eq!(
                normalize_angle(bearing(&origin, &offset) - initial_bearing(&a, &b)),
                0.0,
                epsilon = 1e-3
            );
        }
    }

    #[test]
    fn test_split_points_are_local() {
        // The three harbour POIs sit within a few kilometres of the marker
        let anchor = split_anchor();
        let via_ferata = Coordinate::new(43.5072469523574, 16.554977474388586);

        let offset = relative_point(&anchor, &via_ferata);
        assert!(offset.x > 1500.0 && offset.x < 2000.0);
        assert!(offset.y > 300.0 && offset.y < 500.0);
    }

    #[test]
    fn test_destination_inverts_bearing_and_distance() {
        let origin = LocalOffset::new(3.0, -4.0);
        let target = destination(&origin, 0.7, 125.0);

        assert_relative_eq!(distance(&origin, &target), 125.0, epsilon = 1e-9);
        assert_relative_eq!(bearing(&origin, &target), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_angle() {
        assert_relative_eq!(normalize_angle(3.0 * PI).abs(), PI, epsilon = 1e-9);
        assert_relative_eq!(normalize_angle(-3.0 * PI / 2.0), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(0.25), 0.25, epsilon = 1e-12);
        assert_relative_eq!(normalize_angle(-0.25 - 4.0 * PI), -0.25, epsilon = 1e-12);
    }
}

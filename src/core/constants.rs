//! Physical constants and fixed engine parameters

/// Mean Earth radius used by the spherical model (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance up to which offsets are shown unmodified (m)
pub const MIN_SCALED_DISTANCE_M: f64 = 250.0;

/// Distance that compressed offsets never exceed (m)
pub const MAX_SCALED_DISTANCE_M: f64 = 500.0;

/// Label texture density at 1 m depth (dp per meter)
pub const LABEL_DP_PER_METER: f64 = 250.0;

/// Measurement uncertainty fed to the orientation filter (degrees)
pub const BEARING_MEASUREMENT_UNCERTAINTY_DEG: f64 = 1.0;

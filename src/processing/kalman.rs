/// One-dimensional Kalman filter for smoothing a noisy scalar
///
/// Uses an identity process model without process noise, so every update is
/// a weighted running average that trusts the accumulated estimate more as
/// its uncertainty contracts. Used here for the anchor bearing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarKalmanFilter {
    /// Current best estimate
    estimate: f64,
    /// Variance of the estimate, never negative
    uncertainty: f64,
    /// Uncertainty the filter was seeded with
    initial_uncertainty: f64,
    /// Number of updates applied since seeding
    update_count: u64,
}

impl ScalarKalmanFilter {
    /// Seed the filter with a first measurement
    pub fn new(measurement: f64, measurement_uncertainty: f64) -> Self {
        debug_assert!(
            measurement_uncertainty > 0.0,
            "measurement uncertainty must be positive"
        );

        Self {
            estimate: measurement,
            uncertainty: measurement_uncertainty,
            initial_uncertainty: measurement_uncertainty,
            update_count: 0,
        }
    }

    /// Fuse a new measurement into the estimate and return the new estimate
    pub fn update(&mut self, measurement: f64, measurement_uncertainty: f64) -> f64 {
        debug_assert!(
            measurement_uncertainty > 0.0,
            "measurement uncertainty must be positive"
        );

        let gain = self.gain_for(measurement_uncertainty);
        self.estimate += gain * (measurement - self.estimate);
        self.uncertainty *= 1.0 - gain;
        self.update_count = self.update_count.saturating_add(1);

        self.estimate
    }

    /// Kalman gain a measurement with the given uncertainty would receive
    pub fn gain_for(&self, measurement_uncertainty: f64) -> f64 {
        self.uncertainty / (self.uncertainty + measurement_uncertainty)
    }

    /// Get current estimate
    pub fn get_estimate(&self) -> f64 {
        self.estimate
    }

    /// Get current estimate variance
    pub fn get_uncertainty(&self) -> f64 {
        self.uncertainty
    }

    /// Get the variance the filter was seeded with
    pub fn get_initial_uncertainty(&self) -> f64 {
        self.initial_uncertainty
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

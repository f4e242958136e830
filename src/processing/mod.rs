//! Signal processing for tracker measurements

pub mod kalman;
pub mod orientation;

pub use kalman::ScalarKalmanFilter;
pub use orientation::{marker_yaw, unwrap_towards, BearingEstimator, MarkerMounting};

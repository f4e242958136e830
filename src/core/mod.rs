//! Core types and constants for the geo-to-AR projection engine

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;

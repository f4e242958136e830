//! Projection algorithms: geodesy, distance compression and screen scale

pub mod geodesy;
pub mod compression;
pub mod screen_scale;

pub use compression::{CompressionMode, CompressionPolicy, ProjectedOffset};
pub use screen_scale::{CameraOptics, LabelLayout, RenderSurface, ScreenScale, ScreenScalePolicy};

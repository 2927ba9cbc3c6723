//! Ember math - vectors, rays, intervals and bounding boxes.
//!
//! Everything here is plain `Copy` data shared by the renderer and the CLI.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod onb;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;

//! Lumen math - vector re-exports and the geometric primitives shared by
//! the acceleration structures: intervals, rays and bounding boxes.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::{Ray, RAY_EPSILON};

//! Core geometric types.

mod bounds;
mod point;

pub use bounds::Aabb;
pub use point::{GridCoord, Vec3};

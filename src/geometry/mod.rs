//! Ray, axis-aligned bounds, and the primitive shape kinds the BVH indexes.

pub mod bounds;
pub mod ray;
pub mod shapes;

pub use bounds::Bounds3;
pub use ray::Ray;
pub use shapes::{Intersection, Shape, ShapeKind};

//! Acceleration structures: the SAH bounding-volume hierarchy.

pub mod bvh;

pub use bvh::Bvh;

//! The math kernel: vectors, matrices, transforms, spectra, the PCG RNG and
//! Monte Carlo sampling warps. Every other component in this crate builds
//! on this module.

pub mod matrix;
pub mod quaternion;
pub mod rng;
pub mod sampling;
pub mod spectrum;
pub mod transform;
pub mod vector;

pub use matrix::Matrix4;
pub use quaternion::Quaternion;
pub use rng::Pcg32;
pub use spectrum::SampledSpectrum;
pub use transform::{Transform, TransformOp};
pub use vector::{Color, Normal3, Point2, Point3, Vec2, Vec2i, Vec3, Vec4, Vector3};

pub const EPSILON: f64 = 1e-4;
pub const INFINITY: f64 = f64::INFINITY;

#[inline(always)]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

#[inline(always)]
pub fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.clamp(lo, hi)
}

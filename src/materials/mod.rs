//! Materials (BxDFs): the canonical sampling contract every material kind
//! implements, plus Lambertian diffuse, GGX microfacet reflect/refract,
//! subsurface dipole diffusion, random-walk subsurface scattering, and the
//! path-traced Marschner hair BCSDF.
//!
//! Several upstream material headers disagreed on the scattering-function
//! signature — some exposed `bxdf`, others `weight`; some `sample` variants
//! returned a microfacet normal, others didn't. This module picks one
//! canonical signature (the one the integrator actually drives) and every
//! material kind implements it.

pub mod dipole;
pub mod ggx;
pub mod hair;
pub mod lambert;
pub mod sss;

use crate::math::{Color, Vec3};
use rand::RngCore;
use std::sync::Arc;

/// Which side of the surface the ray currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medium {
    Outside,
    Inside,
}

/// The kind of transport a scattering event represents, carried alongside
/// the ray so the integrator knows how to interpret the next bounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Reflect,
    Refract,
    Sss,
    Emit,
    Hair,
    None,
}

#[derive(Debug, Clone, Copy)]
pub struct LightTransport {
    pub kind: TransportKind,
    pub medium: Medium,
}

impl LightTransport {
    pub fn new(kind: TransportKind, medium: Medium) -> Self {
        Self { kind, medium }
    }

    pub fn outside(kind: TransportKind) -> Self {
        Self::new(kind, Medium::Outside)
    }
}

/// The result of importance-sampling a material: an incoming direction in
/// the tangent frame, the microfacet normal used (when applicable; equal to
/// the shading normal for non-microfacet materials), a pdf, and the
/// transport tag for the next bounce.
#[derive(Debug, Clone, Copy)]
pub struct BxdfSample {
    pub wi: Vec3,
    pub mf_normal: Vec3,
    pub pdf: f64,
    pub transport: LightTransport,
}

/// The canonical material contract. All directions are expressed in the
/// surface tangent frame, with `(0, 1, 0)` as the shading normal.
pub trait Bxdf: Send + Sync {
    /// The BxDF value for a given incident/outgoing pair and the microfacet
    /// normal used to reach it (ignored by non-microfacet materials).
    fn evaluate(&self, wi: Vec3, wo: Vec3, mf_normal: Vec3, transport: LightTransport) -> Color;

    /// Importance-samples an incoming direction given the outgoing
    /// direction and incoming transport state.
    fn sample(&self, wo: Vec3, transport: LightTransport, u: (f64, f64, f64)) -> BxdfSample;

    fn transport_type(&self) -> TransportKind;

    fn reflectance(&self) -> Color;

    fn emittance(&self) -> Color {
        Color::zero()
    }

    fn is_emissive(&self) -> bool {
        false
    }

    fn is_specular(&self) -> bool {
        false
    }

    /// Draws one step of a volumetric random walk between the entry point
    /// (implicit: the probe ray's origin) and a surface `dist_to_boundary`
    /// away along `wo_world`. Materials without an interior volume (every
    /// kind but [`sss::Sss`]) never set [`TransportKind::Sss`] on a sample,
    /// so the integrator never calls this for them; the default exits
    /// immediately at the boundary.
    fn sample_volume_event(&self, wo_world: Vec3, dist_to_boundary: f64, rng: &mut dyn RngCore) -> VolumeEvent {
        let _ = (wo_world, dist_to_boundary, rng);
        VolumeEvent::Surface
    }
}

/// The outcome of one step of a subsurface random walk, driven by the
/// integrator between the entry and exit surface intersections.
#[derive(Debug, Clone, Copy)]
pub enum VolumeEvent {
    /// No interaction before the boundary; resume as an ordinary surface ray.
    Surface,
    /// The photon was absorbed; the path terminates here.
    Absorbed,
    /// Scattered at distance `t` along the probe ray; `wi_world` is the new
    /// direction and `throughput` the multiplicative weight to apply.
    Scatter { t: f64, wi_world: Vec3, throughput: Color },
}

pub type MaterialHandle = Arc<dyn Bxdf>;

#[inline]
pub fn chi_plus(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chi_plus_is_zero_at_and_below_zero() {
        assert_eq!(chi_plus(0.0), 0.0);
        assert_eq!(chi_plus(-1.0), 0.0);
        assert_eq!(chi_plus(1.0), 1.0);
    }
}

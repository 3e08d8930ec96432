use super::ggx::Ggx;
use super::{Bxdf, BxdfSample, LightTransport, Medium, TransportKind, VolumeEvent};
use crate::math::sampling::{henyey_greenstein, sample_henyey_greenstein};
use crate::math::{Color, Vec3};
use rand::RngCore;

/// Random-walk subsurface scattering: a GGX surface bounce composed with a
/// volumetric random walk once transport is `Sss`. The walk itself
/// (distance sampling, absorption-vs-scatter decision, Henyey-Greenstein
/// direction) is driven by the integrator via [`Bxdf::sample_volume_event`];
/// this type supplies the per-step building blocks it calls.
#[derive(Debug, Clone, Copy)]
pub struct Sss {
    pub surface: Ggx,
    pub sigma_a: Color,
    pub sigma_s: Color,
    pub sigma: Color,
    pub inv_sigma: Color,
    pub absorption_prob: f64,
    pub g: f64,
}

impl Sss {
    pub fn new(surface: Ggx, sigma_a: Color, sigma_s: Color, g: f64) -> Self {
        let sigma = sigma_a + sigma_s;
        let inv_sigma = sigma.inverse();
        let absorption_prob = sigma_a.hadamard(inv_sigma).average();
        Self {
            surface,
            sigma_a,
            sigma_s,
            sigma,
            inv_sigma,
            absorption_prob,
            g,
        }
    }

    /// Draws a free-flight distance for a uniformly chosen spectral channel,
    /// returning `(channel, distance)`.
    pub fn sample_distance(&self, rng: &mut dyn RngCore) -> (usize, f64) {
        let channel = (rng.next_u32() as usize) % 3;
        let u = rng.next_u32() as f64 / u32::MAX as f64;
        let d = -(1.0 - u).max(1e-12).ln() * self.inv_sigma[channel];
        (channel, d)
    }

    pub fn transmittance(&self, dist: f64) -> Color {
        (self.sigma * -dist.min(1e8)).exp()
    }

    pub fn density(&self, tr: Color, inside: bool) -> Color {
        if inside {
            tr.hadamard(self.sigma)
        } else {
            tr
        }
    }

    pub fn beta(&self, tr: Color, inside: bool) -> Color {
        if inside {
            tr.hadamard(self.sigma_s)
        } else {
            tr
        }
    }

    pub fn pdf(&self, density: Color) -> f64 {
        density.average()
    }

    pub fn phase(&self, cos_theta: f64) -> f64 {
        henyey_greenstein(cos_theta, self.g)
    }

    pub fn sample_phase(&self, wo: Vec3, u1: f64, u2: f64) -> (Vec3, f64) {
        sample_henyey_greenstein(wo, self.g, u1, u2)
    }
}

impl Bxdf for Sss {
    fn evaluate(&self, wi: Vec3, wo: Vec3, mf_normal: Vec3, transport: LightTransport) -> Color {
        self.surface.evaluate(wi, wo, mf_normal, transport)
    }

    fn sample(&self, wo: Vec3, transport: LightTransport, u: (f64, f64, f64)) -> BxdfSample {
        let mut s = self.surface.sample(wo, transport, u);
        if s.transport.kind == TransportKind::Refract {
            s.transport = LightTransport::new(TransportKind::Sss, s.transport.medium);
        }
        s
    }

    fn transport_type(&self) -> TransportKind {
        TransportKind::Sss
    }

    fn reflectance(&self) -> Color {
        self.surface.reflectance
    }

    fn sample_volume_event(&self, wo_world: Vec3, dist_to_boundary: f64, rng: &mut dyn RngCore) -> VolumeEvent {
        let (_channel, d) = self.sample_distance(rng);
        if d >= dist_to_boundary {
            return VolumeEvent::Surface;
        }

        let u = rng.next_u32() as f64 / u32::MAX as f64;
        if u < self.absorption_prob {
            return VolumeEvent::Absorbed;
        }

        let tr = self.transmittance(d);
        let density = self.density(tr, true);
        let pdf = self.pdf(density).max(1e-12);
        let beta = self.beta(tr, true) / (pdf * (1.0 - self.absorption_prob).max(1e-6));

        let u1 = rng.next_u32() as f64 / u32::MAX as f64;
        let u2 = rng.next_u32() as f64 / u32::MAX as f64;
        let (wi_world, _phase_pdf) = self.sample_phase(wo_world, u1, u2);

        VolumeEvent::Scatter {
            t: d,
            wi_world,
            throughput: beta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::ggx::Ggx;

    fn make_sss() -> Sss {
        let surface = Ggx::new(0.3, 1.0, 1.4, true, Color::splat(0.1), Color::splat(0.9));
        Sss::new(surface, Color::splat(0.05), Color::splat(2.0), 0.0)
    }

    #[test]
    fn sample_distance_is_nonnegative() {
        let sss = make_sss();
        let mut rng = crate::math::Pcg32::new(7);
        for _ in 0..100 {
            let (_ch, d) = sss.sample_distance(&mut rng);
            assert!(d >= 0.0);
        }
    }

    #[test]
    fn transmittance_decreases_with_distance() {
        let sss = make_sss();
        let near = sss.transmittance(0.01).average();
        let far = sss.transmittance(10.0).average();
        assert!(near > far);
    }

    #[test]
    fn absorption_prob_is_between_zero_and_one() {
        let sss = make_sss();
        assert!((0.0..=1.0).contains(&sss.absorption_prob));
    }

    #[test]
    fn volume_event_exits_at_surface_when_boundary_is_close() {
        let sss = make_sss();
        let mut rng = crate::math::Pcg32::new(11);
        let event = sss.sample_volume_event(Vec3::unit_y(), 1e-6, &mut rng);
        assert!(matches!(event, VolumeEvent::Surface));
    }

    #[test]
    fn volume_event_scatter_throughput_is_finite_and_nonnegative() {
        let sss = make_sss();
        let mut rng = crate::math::Pcg32::new(13);
        for _ in 0..200 {
            match sss.sample_volume_event(Vec3::unit_y(), 1e6, &mut rng) {
                VolumeEvent::Scatter { t, throughput, .. } => {
                    assert!(t >= 0.0);
                    assert!(throughput.x.is_finite() && throughput.x >= 0.0);
                    assert!(throughput.y.is_finite() && throughput.y >= 0.0);
                    assert!(throughput.z.is_finite() && throughput.z >= 0.0);
                }
                VolumeEvent::Absorbed | VolumeEvent::Surface => {}
            }
        }
    }
}

use super::{Bxdf, BxdfSample, LightTransport, Medium, TransportKind};
use crate::math::sampling::cosine_sample_hemisphere;
use crate::math::{Color, Vec3};

/// Ideal Lambertian diffuse: the cosine factor is folded into the sampler
/// rather than `evaluate`, so `evaluate` is just the flat reflectance.
#[derive(Debug, Clone, Copy)]
pub struct Lambertian {
    pub reflectance: Color,
}

impl Lambertian {
    pub fn new(reflectance: Color) -> Self {
        Self { reflectance }
    }
}

impl Bxdf for Lambertian {
    fn evaluate(&self, _wi: Vec3, _wo: Vec3, _mf_normal: Vec3, _transport: LightTransport) -> Color {
        self.reflectance
    }

    fn sample(&self, _wo: Vec3, _transport: LightTransport, u: (f64, f64, f64)) -> BxdfSample {
        let (wi, _pdf_unused) = cosine_sample_hemisphere(u.0, u.1);
        let pdf = wi.y.abs();
        BxdfSample {
            wi,
            mf_normal: Vec3::unit_y(),
            pdf,
            transport: LightTransport::new(TransportKind::Reflect, Medium::Outside),
        }
    }

    fn transport_type(&self) -> TransportKind {
        TransportKind::Reflect
    }

    fn reflectance(&self) -> Color {
        self.reflectance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampled_direction_stays_in_upper_hemisphere() {
        let lam = Lambertian::new(Color::splat(0.7));
        let sample = lam.sample(Vec3::unit_y(), LightTransport::outside(TransportKind::Reflect), (0.2, 0.6, 0.0));
        assert!(sample.wi.y >= 0.0);
        assert!(sample.pdf > 0.0);
    }

    #[test]
    fn monte_carlo_estimate_converges_to_reflectance() {
        let refl = Color::new(0.6, 0.3, 0.1);
        let lam = Lambertian::new(refl);
        let mut rng = crate::math::Pcg32::new(1234);
        use rand::RngCore;
        let mut sum = Color::zero();
        let n = 20_000;
        for _ in 0..n {
            let u = (
                rng.next_u32() as f64 / u32::MAX as f64,
                rng.next_u32() as f64 / u32::MAX as f64,
                0.0,
            );
            let sample = lam.sample(Vec3::unit_y(), LightTransport::outside(TransportKind::Reflect), u);
            let f = lam.evaluate(sample.wi, Vec3::unit_y(), sample.mf_normal, LightTransport::outside(TransportKind::Reflect));
            sum = sum + f * (sample.wi.y.abs() / sample.pdf);
        }
        let avg = sum / n as f64;
        assert!((avg - refl).length() < 0.05);
    }
}

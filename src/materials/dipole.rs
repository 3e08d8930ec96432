use super::ggx::fresnel_dielectric;
use super::{Bxdf, BxdfSample, LightTransport, Medium, TransportKind};
use crate::math::sampling::{cosine_sample_hemisphere, sample_standard_normal_pair};
use crate::math::{lerp, Color, Vec3};
use std::f64::consts::PI;

const INV_PI: f64 = 1.0 / PI;
const INV_FOUR_PI: f64 = 1.0 / (4.0 * PI);
const INV_EIGHT_PI: f64 = 1.0 / (8.0 * PI);

/// Chiang (2016) reflectance-to-absorption mapping, shared between the
/// dipole and hair BCSDF: solves for the per-channel absorption coefficient
/// that reproduces a desired surface reflectance given an azimuthal
/// roughness `beta_n`.
pub fn chiang_absorption_from_reflectance(reflectance: Color, beta_n: f64) -> Color {
    let bn = beta_n;
    let denom = 5.969 - 0.215 * bn + 2.532 * bn * bn - 10.73 * bn.powi(3) + 5.574 * bn.powi(4)
        + 0.245 * bn.powi(5);
    let map = |r: f64| {
        let t = (r.max(1e-6).ln() / denom).powi(2);
        t.max(1e-5)
    };
    Color::new(map(reflectance.x), map(reflectance.y), map(reflectance.z))
}

/// Fresnel diffuse reflectance for light escaping a denser medium into air,
/// via the Egan & Hilgeman rational polynomial fit used throughout subsurface
/// scattering models.
pub fn fresnel_diffuse_reflectance(eta: f64) -> f64 {
    if eta < 1.0 {
        -0.4399 + 0.7099 / eta - 0.3319 / (eta * eta) + 0.0636 / (eta * eta * eta)
    } else {
        -1.4399 / (eta * eta) + 0.7099 / eta + 0.6681 + 0.0636 * eta
    }
}

/// Classic dipole diffusion approximation for subsurface scattering,
/// evaluated directly (as opposed to `sss::Sss`'s random-walk variant).
#[derive(Debug, Clone, Copy)]
pub struct Dipole {
    pub eta: f64,
    pub sigma_a: Color,
    pub sigma_s: Color,
    pub sigma_tr: Color,
    pub albedo: Color,
    pub beta_n: f64,
}

impl Dipole {
    pub fn new(eta: f64, sigma_a: Color, sigma_s: Color, beta_n: f64) -> Self {
        let sigma_t = sigma_a + sigma_s;
        let albedo = Color::new(
            sigma_s.x / sigma_t.x.max(1e-12),
            sigma_s.y / sigma_t.y.max(1e-12),
            sigma_s.z / sigma_t.z.max(1e-12),
        );
        let sigma_tr = (sigma_a.hadamard(sigma_t) * 3.0).sqrt();
        Self {
            eta,
            sigma_a,
            sigma_s,
            sigma_tr,
            albedo,
            beta_n,
        }
    }

    pub fn from_reflectance(eta: f64, reflectance: Color, sigma_s: Color, beta_n: f64) -> Self {
        let sigma_a = chiang_absorption_from_reflectance(reflectance, beta_n);
        Self::new(eta, sigma_a, sigma_s, beta_n)
    }

    /// The diffuse radiant exitance for a source-to-exit distance `r`,
    /// per spectral channel.
    pub fn rd(&self, r: f64) -> Color {
        let fdr = fresnel_diffuse_reflectance(self.eta);
        let a = (1.0 + fdr) / (1.0 - fdr).max(1e-6);
        let one_chan = |sigma_t: f64, sigma_tr: f64, albedo: f64| -> f64 {
            let zr = 1.0 / sigma_t.max(1e-9);
            let zv = -(1.0 + 4.0 * a / 3.0) * zr;
            let dr = (r * r + zr * zr).sqrt();
            let dv = (r * r + zv * zv).sqrt();
            INV_FOUR_PI
                * albedo
                * (zr * (1.0 + sigma_tr * dr) * (-sigma_tr * dr).exp() / dr.powi(3)
                    - zv * (1.0 + sigma_tr * dv) * (-sigma_tr * dv).exp() / dv.powi(3))
        };
        let sigma_t = self.sigma_a + self.sigma_s;
        Color::new(
            one_chan(sigma_t.x, self.sigma_tr.x, self.albedo.x),
            one_chan(sigma_t.y, self.sigma_tr.y, self.albedo.y),
            one_chan(sigma_t.z, self.sigma_tr.z, self.albedo.z),
        )
        .max(Color::zero())
    }

    fn sd(&self, ft_in: f64, ft_out: f64, rd: Color) -> Color {
        rd * (INV_PI * ft_in * ft_out)
    }

    /// The single-scatter specular term sharing the dipole's Fresnel
    /// terms: a lobe whose width narrows as `beta_n` decreases (smoother
    /// surfaces concentrate single-scatter highlights).
    fn s1(&self, wi: Vec3, wo: Vec3) -> Color {
        let h = (wi + wo).normalized();
        let n = lerp(32.0, 2.0, self.beta_n.clamp(0.0, 1.0));
        Color::splat(INV_EIGHT_PI * h.y.abs().powf(n))
    }
}

impl Bxdf for Dipole {
    fn evaluate(&self, wi: Vec3, wo: Vec3, mf_normal: Vec3, _transport: LightTransport) -> Color {
        if wi.y.abs() < 1e-8 {
            return Color::zero();
        }
        let r = mf_normal.length();
        let cos_i = wi.y.abs().clamp(0.0, 1.0);
        let cos_o = wo.y.abs().clamp(0.0, 1.0);
        let ft_in = 1.0 - fresnel_dielectric(cos_i, 1.0, self.eta);
        let ft_out = 1.0 - fresnel_dielectric(cos_o, 1.0, self.eta);
        let rd = self.rd(r);
        let k = 1.0;
        (self.sd(ft_in, ft_out, rd) + self.s1(wi, wo) * (1.0 - ft_in)) * (k / wi.y.abs())
    }

    /// Samples a cosine-weighted exit direction and a 2D surface
    /// displacement (stored in the `mf_normal` output slot as a
    /// displacement carrier, not a true microfacet normal) drawn from a
    /// standard-normal distribution scaled by the mean free path.
    fn sample(&self, wo: Vec3, _transport: LightTransport, u: (f64, f64, f64)) -> BxdfSample {
        let (wi, _) = cosine_sample_hemisphere(u.0, u.1);
        let mean_free_path = 1.0 / (self.sigma_a + self.sigma_s).average().max(1e-6);
        let (dx, dz) = sample_standard_normal_pair(u.2, (u.0 + u.1 * 0.5).fract());
        let displacement = Vec3::new(dx, 0.0, dz) * mean_free_path;

        let cos_o = wo.y.abs().clamp(0.0, 1.0);
        let ft_in = 1.0 - fresnel_dielectric(cos_o, 1.0, self.eta);
        let rd = self.rd(displacement.length());
        let pdf = (rd.luminance() + (1.0 - ft_in) * self.s1(wi, wo).luminance()).max(1e-6);

        BxdfSample {
            wi,
            mf_normal: displacement,
            pdf,
            transport: LightTransport::new(TransportKind::Sss, Medium::Outside),
        }
    }

    fn transport_type(&self) -> TransportKind {
        TransportKind::Sss
    }

    fn reflectance(&self) -> Color {
        self.albedo
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rd_decreases_with_distance() {
        let dp = Dipole::new(1.3, Color::splat(0.02), Color::splat(2.0), 0.3);
        let near = dp.rd(0.01).luminance();
        let far = dp.rd(1.0).luminance();
        assert!(near > far);
    }

    #[test]
    fn chiang_mapping_is_nonnegative_and_floored() {
        let sigma_a = chiang_absorption_from_reflectance(Color::splat(0.9), 0.3);
        assert!(sigma_a.x >= 1e-5);
    }

    #[test]
    fn fresnel_diffuse_reflectance_is_in_unit_range_for_common_iors() {
        let f = fresnel_diffuse_reflectance(1.3);
        assert!((0.0..1.0).contains(&f));
    }
}

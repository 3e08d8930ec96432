use super::{chi_plus, Bxdf, BxdfSample, LightTransport, Medium, TransportKind};
use crate::math::sampling::cosine_sample_hemisphere;
use crate::math::{Color, Vec3};
use std::f64::consts::PI;

/// Exact dielectric Fresnel reflectance for unpolarized light, given the
/// cosine of the incidence angle (signed: negative means the ray is inside
/// the medium) and the two IORs.
pub fn fresnel_dielectric(cos_theta_i: f64, eta_i: f64, eta_t: f64) -> f64 {
    let mut cos_i = cos_theta_i.clamp(-1.0, 1.0);
    let (eta_i, eta_t, cos_i) = if cos_i < 0.0 {
        cos_i = -cos_i;
        (eta_t, eta_i, cos_i)
    } else {
        (eta_i, eta_t, cos_i)
    };
    let sin_t = (eta_i / eta_t) * (1.0 - cos_i * cos_i).max(0.0).sqrt();
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();
    let r_parl = ((eta_t * cos_i) - (eta_i * cos_t)) / ((eta_t * cos_i) + (eta_i * cos_t));
    let r_perp = ((eta_i * cos_i) - (eta_t * cos_t)) / ((eta_i * cos_i) + (eta_t * cos_t));
    0.5 * (r_parl * r_parl + r_perp * r_perp)
}

/// Isotropic GGX microfacet distribution/reflectance/transmittance model.
#[derive(Debug, Clone, Copy)]
pub struct Ggx {
    pub alpha: f64,
    pub eta_i: f64,
    pub eta_t: f64,
    pub refractive: bool,
    pub reflectance: Color,
    pub transmittance: Color,
}

impl Ggx {
    pub fn new(roughness: f64, eta_i: f64, eta_t: f64, refractive: bool, reflectance: Color, transmittance: Color) -> Self {
        let alpha = (roughness * roughness).max(1e-4);
        Self {
            alpha,
            eta_i,
            eta_t,
            refractive,
            reflectance,
            transmittance,
        }
    }

    fn alpha2(&self) -> f64 {
        self.alpha * self.alpha
    }

    /// GGX normal distribution term `D(m)`, tangent-frame `(0,1,0)` normal.
    pub fn distribution(&self, m: Vec3) -> f64 {
        let cos_theta_m = m.y;
        if cos_theta_m <= 0.0 {
            return 0.0;
        }
        let cos2 = cos_theta_m * cos_theta_m;
        let cos4 = cos2 * cos2;
        let tan2 = (1.0 - cos2) / cos2;
        let alpha2 = self.alpha2();
        let denom = PI * cos4 * (alpha2 + tan2).powi(2);
        chi_plus(cos_theta_m) * alpha2 / denom.max(1e-12)
    }

    fn g1(&self, omega: Vec3, m: Vec3) -> f64 {
        let cos_om = omega.y;
        if cos_om.abs() < 1e-8 {
            return 0.0;
        }
        let chi = chi_plus(omega.dot(m) / cos_om);
        if chi == 0.0 {
            return 0.0;
        }
        let tan2 = (1.0 - cos_om * cos_om).max(0.0) / (cos_om * cos_om);
        2.0 / (1.0 + (1.0 + self.alpha2() * tan2).sqrt())
    }

    pub fn geometry(&self, wi: Vec3, wo: Vec3, m: Vec3) -> f64 {
        self.g1(wi, m) * self.g1(wo, m)
    }
}

impl Bxdf for Ggx {
    fn evaluate(&self, wi: Vec3, wo: Vec3, mf_normal: Vec3, transport: LightTransport) -> Color {
        if wi.y.abs() < 1e-8 {
            return Color::zero();
        }
        if (wi + wo).length() < 1e-8 {
            return Color::splat(1.0);
        }
        let m = mf_normal;
        let g = self.geometry(wi, wo, m);
        if g <= 0.0 {
            return Color::zero();
        }
        let wi_dot_m = wi.dot(m).abs();
        if wi_dot_m < 1e-8 {
            return Color::zero();
        }
        let factor = (wi.y.abs() * m.y.abs() / (wi_dot_m * g)).clamp(0.0, 1.0);
        let base = match transport.kind {
            TransportKind::Refract => self.transmittance,
            _ => self.reflectance,
        };
        base * (factor / wi.y.abs())
    }

    fn sample(&self, wo: Vec3, transport: LightTransport, u: (f64, f64, f64)) -> BxdfSample {
        let theta_m = (self.alpha * u.0.sqrt() / (1.0 - u.0).max(1e-12).sqrt()).atan();
        let phi_m = 2.0 * PI * u.1;
        let m = Vec3::new(
            theta_m.sin() * phi_m.cos(),
            theta_m.cos(),
            theta_m.sin() * phi_m.sin(),
        );

        if !self.refractive {
            let wi = wo - m * (2.0 * wo.dot(m));
            if wi.y < 0.0 {
                let (fallback, pdf) = cosine_sample_hemisphere(u.0, u.1);
                return BxdfSample {
                    wi: fallback,
                    mf_normal: Vec3::unit_y(),
                    pdf,
                    transport: LightTransport::new(TransportKind::Reflect, transport.medium),
                };
            }
            let pdf = (self.distribution(m) * m.y.abs() / (4.0 * wo.dot(m).abs())).max(1e-6);
            return BxdfSample {
                wi,
                mf_normal: m,
                pdf,
                transport: LightTransport::new(TransportKind::Reflect, transport.medium),
            };
        }

        let entering = transport.medium == Medium::Outside;
        let (eta_i, eta_t) = if entering {
            (self.eta_i, self.eta_t)
        } else {
            (self.eta_t, self.eta_i)
        };
        let cos_o = wo.dot(m);
        let fresnel = fresnel_dielectric(cos_o, eta_i, eta_t);

        if u.2 < fresnel {
            let wi = wo - m * (2.0 * cos_o);
            let pdf = (self.distribution(m) * m.y.abs() / (4.0 * wo.dot(m).abs())).max(1e-6) * fresnel;
            return BxdfSample {
                wi,
                mf_normal: m,
                pdf,
                transport: LightTransport::new(TransportKind::Reflect, transport.medium),
            };
        }

        let eta_ratio = eta_i / eta_t;
        match (-wo).refract(m * cos_o.signum(), eta_ratio) {
            Some(wi) => {
                let new_medium = if entering { Medium::Inside } else { Medium::Outside };
                let denom = (wi.dot(m) + wo.dot(m) * eta_ratio).powi(2).max(1e-12);
                let pdf = (self.distribution(m) * m.y.abs() * wi.dot(m).abs() / denom).max(1e-6)
                    * (1.0 - fresnel);
                BxdfSample {
                    wi,
                    mf_normal: m,
                    pdf,
                    transport: LightTransport::new(TransportKind::Refract, new_medium),
                }
            }
            None => {
                // Total internal reflection: stay in the current medium and
                // reflect instead.
                let wi = wo - m * (2.0 * cos_o);
                let pdf = (self.distribution(m) * m.y.abs() / (4.0 * wo.dot(m).abs())).max(1e-6);
                BxdfSample {
                    wi,
                    mf_normal: m,
                    pdf,
                    transport: LightTransport::new(TransportKind::Reflect, transport.medium),
                }
            }
        }
    }

    fn transport_type(&self) -> TransportKind {
        if self.refractive {
            TransportKind::Refract
        } else {
            TransportKind::Reflect
        }
    }

    fn reflectance(&self) -> Color {
        self.reflectance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresnel_at_normal_incidence_matches_schlick_r0() {
        let (eta_i, eta_t) = (1.0, 1.5);
        let f = fresnel_dielectric(1.0, eta_i, eta_t);
        let r0 = ((eta_t - eta_i) / (eta_t + eta_i)).powi(2);
        assert!((f - r0).abs() < 1e-6);
    }

    #[test]
    fn fresnel_beyond_critical_angle_is_total() {
        // Going from dense to rare medium at a grazing angle should hit TIR.
        let f = fresnel_dielectric(0.05, 1.5, 1.0);
        assert!((f - 1.0).abs() < 1e-9);
    }

    #[test]
    fn smooth_reflective_sample_stays_in_upper_hemisphere_on_average() {
        let ggx = Ggx::new(0.5, 1.0, 1.0, false, Color::splat(0.9), Color::zero());
        let mut rng = crate::math::Pcg32::new(99);
        use rand::RngCore;
        let mut up = 0;
        let n = 2000;
        for _ in 0..n {
            let u = (
                rng.next_u32() as f64 / u32::MAX as f64,
                rng.next_u32() as f64 / u32::MAX as f64,
                rng.next_u32() as f64 / u32::MAX as f64,
            );
            let s = ggx.sample(Vec3::unit_y(), LightTransport::outside(TransportKind::Reflect), u);
            if s.wi.y >= 0.0 {
                up += 1;
            }
        }
        assert!(up as f64 / n as f64 > 0.95);
    }
}

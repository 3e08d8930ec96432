use super::dipole::chiang_absorption_from_reflectance;
use super::ggx::fresnel_dielectric;
use super::{Bxdf, BxdfSample, LightTransport, Medium, TransportKind};
use crate::math::sampling::{demux_float, sample_trimmed_logistic, trimmed_logistic_pdf};
use crate::math::{Color, Vec3};
use std::f64::consts::PI;

const N_LOBES: usize = 4;

fn pow20(x: f64) -> f64 {
    let x2 = x * x;
    let x4 = x2 * x2;
    let x8 = x4 * x4;
    let x16 = x8 * x8;
    x16 * x4
}

/// Modified Bessel function of the first kind, order 0, via the
/// Abramowitz & Stegun 9.8.1 polynomial fit (accurate for the moderate
/// argument range the direct longitudinal term needs before the log-space
/// fallback takes over).
fn bessel_i0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 3.75 {
        let t = (x / 3.75).powi(2);
        1.0 + t
            * (3.5156229
                + t * (3.0899424
                    + t * (1.2067492 + t * (0.2659732 + t * (0.0360768 + t * 0.0045813)))))
    } else {
        let t = 3.75 / ax;
        (ax.exp() / ax.sqrt())
            * (0.39894228
                + t * (0.01328592
                    + t * (0.00225319
                        + t * (-0.00157565
                            + t * (0.00916281
                                + t * (-0.02057706
                                    + t * (0.02635537 + t * (-0.01647633 + t * 0.00392377))))))))
    }
}

/// Log-space fallback for `ln(I0(x))` at large `x`, matching the reference
/// approximation `x + 0.5*(-ln(2*pi) + ln(1/x) + 1/(8x))`.
fn log_bessel_i0(x: f64) -> f64 {
    x + 0.5 * (-(2.0 * PI).ln() + (1.0 / x).ln() + 1.0 / (8.0 * x))
}

/// Longitudinal scattering function for deflection given by `sin_i, cos_i,
/// sin_o, cos_o` (elevation of `wi`/tilted `wo`) and variance `v`.
fn longitudinal_m(sin_i: f64, cos_i: f64, sin_o: f64, cos_o: f64, v: f64) -> f64 {
    let cos_term = cos_i * cos_o / v;
    if v < 0.1 || cos_term > 12.0 {
        let log_m = -((2.0 * v).ln() + (1.0 / v).sinh().ln()) - (sin_i * sin_o) / v
            + log_bessel_i0(cos_term);
        log_m.exp()
    } else {
        let inv_v = 1.0 / v;
        (inv_v / (2.0 * inv_v.sinh())) * (-(sin_i * sin_o) / v).exp() * bessel_i0(cos_term)
    }
}

fn specular_cone_angle(theta_o: f64, lobe: usize, alpha: f64) -> f64 {
    match lobe {
        0 => -theta_o + 2.0 * alpha,
        1 => -theta_o - alpha,
        2 => -theta_o - 4.0 * alpha,
        _ => -theta_o,
    }
}

/// Path-traced Marschner-style hair BCSDF: four lobes (R, TT, TRT and a
/// lumped TRRT+ residual), driven by longitudinal roughness `beta_m`,
/// azimuthal roughness `beta_n`, and cuticle tilt `alpha`.
///
/// `h` is the fiber-relative offset of the intersection (`-1` to `1` across
/// the fiber's width) and is precomputed per intersection from the curve's
/// UV, following the upstream per-hit construction pattern.
#[derive(Debug, Clone, Copy)]
pub struct Hair {
    pub eta_i: f64,
    pub eta_t: f64,
    pub beta_m: f64,
    pub beta_n: f64,
    pub alpha: f64,
    pub h: f64,
    pub sigma_a: Color,
    pub v: [f64; N_LOBES],
    pub logistic_scale: f64,
}

impl Hair {
    pub fn new(eta_i: f64, eta_t: f64, beta_m: f64, beta_n: f64, alpha: f64, h: f64, reflectance: Color) -> Self {
        let v0 = (0.726 * beta_m + 0.812 * beta_m * beta_m + 3.7 * pow20(beta_m)).powi(2);
        let v = [v0, v0 / 4.0, 4.0 * v0, 4.0 * v0];
        let sigma_a = chiang_absorption_from_reflectance(reflectance, beta_n);
        let logistic_scale = (PI / 8.0).sqrt()
            * (0.265 * beta_n + 1.194 * beta_n * beta_n + 5.372 * pow20(beta_n) * beta_n * beta_n);
        Self {
            eta_i,
            eta_t,
            beta_m,
            beta_n,
            alpha,
            h,
            sigma_a,
            v,
            logistic_scale,
        }
    }

    fn transmittance(&self, theta_o: f64) -> Color {
        let sin_theta_o = theta_o.sin();
        let cos_theta_o = theta_o.cos().max(1e-6);
        let sin_theta_t = sin_theta_o / self.eta_t;
        let cos_theta_t = (1.0 - sin_theta_t * sin_theta_t).max(0.0).sqrt();
        let modified_eta = (self.eta_t * self.eta_t - sin_theta_o * sin_theta_o).max(0.0).sqrt()
            / cos_theta_o;
        let sin_gamma_t = (self.h / modified_eta).clamp(-1.0, 1.0);
        let cos_gamma_t = (1.0 - sin_gamma_t * sin_gamma_t).max(0.0).sqrt();
        let dist = 2.0 * cos_gamma_t / cos_theta_t.max(1e-6);
        (self.sigma_a * -dist).exp()
    }

    fn attenuation(&self, theta_o: f64) -> [Color; N_LOBES] {
        let gamma_o = self.h.clamp(-1.0, 1.0).asin();
        let cos_theta_d = theta_o.cos() * gamma_o.cos();
        let f = fresnel_dielectric(cos_theta_d, self.eta_i, self.eta_t);
        let t = self.transmittance(theta_o);
        let one_minus_f = 1.0 - f;
        let a0 = Color::splat(f);
        let a1 = t * (one_minus_f * one_minus_f);
        let a2 = t.hadamard(t) * (one_minus_f * one_minus_f * f);
        let t3 = t.hadamard(t).hadamard(t);
        let denom = Color::ones() - t * f;
        let denom = Color::new(
            denom.x.max(1e-4),
            denom.y.max(1e-4),
            denom.z.max(1e-4),
        );
        let a3 = Color::new(
            t3.x * one_minus_f * one_minus_f * f * f / denom.x,
            t3.y * one_minus_f * one_minus_f * f * f / denom.y,
            t3.z * one_minus_f * one_minus_f * f * f / denom.z,
        );
        [a0, a1, a2, a3]
    }

    fn attenuation_prob(attenuation: &[Color; N_LOBES]) -> [f64; N_LOBES] {
        let lum: [f64; N_LOBES] = [
            attenuation[0].luminance().max(0.0),
            attenuation[1].luminance().max(0.0),
            attenuation[2].luminance().max(0.0),
            attenuation[3].luminance().max(0.0),
        ];
        let sum: f64 = lum.iter().sum::<f64>().max(1e-12);
        [lum[0] / sum, lum[1] / sum, lum[2] / sum, lum[3] / sum]
    }

    fn gamma_t(&self, theta_o: f64) -> f64 {
        let sin_theta_o = theta_o.sin();
        let cos_theta_o = theta_o.cos().max(1e-6);
        let modified_eta = (self.eta_t * self.eta_t - sin_theta_o * sin_theta_o).max(0.0).sqrt()
            / cos_theta_o;
        (self.h / modified_eta).clamp(-1.0, 1.0).asin()
    }

    fn net_deflection(&self, lobe: usize, gamma_o: f64, gamma_t: f64) -> f64 {
        2.0 * lobe as f64 * gamma_t - 2.0 * gamma_o + lobe as f64 * PI
    }
}

impl Bxdf for Hair {
    fn evaluate(&self, wi: Vec3, wo: Vec3, _mf_normal: Vec3, _transport: LightTransport) -> Color {
        let sin_theta_i = wi.x.clamp(-1.0, 1.0);
        let cos_theta_i = (1.0 - sin_theta_i * sin_theta_i).max(0.0).sqrt();
        let sin_theta_o = wo.x.clamp(-1.0, 1.0);
        let cos_theta_o = (1.0 - sin_theta_o * sin_theta_o).max(0.0).sqrt();
        let theta_o = sin_theta_o.atan2(cos_theta_o);

        let phi_i = wi.z.atan2(wi.y);
        let phi_o = wo.z.atan2(wo.y);
        let mut phi = phi_i - phi_o;
        while phi > PI {
            phi -= 2.0 * PI;
        }
        while phi < -PI {
            phi += 2.0 * PI;
        }

        let gamma_o = self.h.clamp(-1.0, 1.0).asin();
        let gamma_t = self.gamma_t(theta_o);
        let attenuation = self.attenuation(theta_o);

        let mut result = Color::zero();
        for lobe in 0..N_LOBES {
            let tilt_center = specular_cone_angle(theta_o, lobe, self.alpha);
            let sin_center = tilt_center.sin();
            let cos_center = tilt_center.cos().max(1e-6);
            let m = longitudinal_m(sin_theta_i, cos_theta_i, sin_center, cos_center, self.v[lobe]);
            let phi_center = self.net_deflection(lobe, gamma_o, gamma_t);
            let d = if lobe < 3 {
                trimmed_logistic_pdf(phi - phi_center, self.logistic_scale, -PI, PI)
            } else {
                1.0 / (2.0 * PI)
            };
            result = result + attenuation[lobe] * (m * d);
        }
        result
    }

    fn sample(&self, wo: Vec3, _transport: LightTransport, u: (f64, f64, f64)) -> BxdfSample {
        let sin_theta_o = wo.x.clamp(-1.0, 1.0);
        let cos_theta_o = (1.0 - sin_theta_o * sin_theta_o).max(0.0).sqrt();
        let theta_o = sin_theta_o.atan2(cos_theta_o);
        let phi_o = wo.z.atan2(wo.y);

        let gamma_o = self.h.clamp(-1.0, 1.0).asin();
        let gamma_t = self.gamma_t(theta_o);
        let attenuation = self.attenuation(theta_o);
        let prob = Self::attenuation_prob(&attenuation);

        let (lobe_u, long_u) = demux_float(u.0);
        let mut cdf = 0.0;
        let mut lobe = N_LOBES - 1;
        for (i, &p) in prob.iter().enumerate() {
            cdf += p;
            if lobe_u < cdf {
                lobe = i;
                break;
            }
        }

        let v = self.v[lobe];
        let uxi = if v < 1e-3 {
            1.0
        } else {
            let inv_v = 1.0 / v;
            let arg = inv_v.exp() - 2.0 * long_u * inv_v.sinh();
            if arg <= 0.0 {
                1.0
            } else {
                (v * arg.ln()).clamp(-1.0, 1.0)
            }
        };
        let tilt_center = specular_cone_angle(theta_o, lobe, self.alpha);
        let theta_i = tilt_center + uxi.acos();
        let sin_theta_i = theta_i.sin();
        let cos_theta_i = theta_i.cos().max(0.0);

        let phi_center = self.net_deflection(lobe, gamma_o, gamma_t);
        let phi = if lobe < 3 {
            phi_center + sample_trimmed_logistic(u.1, self.logistic_scale, -PI, PI)
        } else {
            2.0 * PI * u.1 - PI
        };
        let phi_i = phi_o + phi;

        let wi = Vec3::new(sin_theta_i, cos_theta_i * phi_i.cos(), cos_theta_i * phi_i.sin());

        let m_values: [f64; N_LOBES] = std::array::from_fn(|i| {
            let center = specular_cone_angle(theta_o, i, self.alpha);
            longitudinal_m(sin_theta_i, cos_theta_i, center.sin(), center.cos().max(1e-6), self.v[i])
        });
        let d_values: [f64; N_LOBES] = std::array::from_fn(|i| {
            let center = self.net_deflection(i, gamma_o, gamma_t);
            if i < 3 {
                trimmed_logistic_pdf(phi - center, self.logistic_scale, -PI, PI).max(0.0)
            } else {
                1.0 / (2.0 * PI)
            }
        });
        let pdf = (0..N_LOBES)
            .map(|i| m_values[i] * d_values[i] * prob[i])
            .sum::<f64>()
            .max(1e-6);

        BxdfSample {
            wi,
            mf_normal: Vec3::unit_y(),
            pdf,
            transport: LightTransport::new(TransportKind::Hair, Medium::Outside),
        }
    }

    fn transport_type(&self) -> TransportKind {
        TransportKind::Hair
    }

    fn reflectance(&self) -> Color {
        (self.sigma_a * -1.0).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bessel_i0_matches_known_value_at_zero() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn log_bessel_i0_tracks_direct_value_near_the_switchover() {
        let x = 12.5;
        let direct = bessel_i0(x).ln();
        let approx = log_bessel_i0(x);
        assert!((direct - approx).abs() < 0.01);
    }

    #[test]
    fn r_lobe_dominates_for_smooth_low_roughness_hair() {
        let hair = Hair::new(1.0, 1.55, 0.05, 0.05, 0.0, 0.0, Color::splat(0.5));
        let attenuation = hair.attenuation(0.0);
        let prob = Hair::attenuation_prob(&attenuation);
        assert!(prob[0] > prob[1]);
        assert!(prob[0] > prob[2]);
    }

    #[test]
    fn sampled_direction_is_unit_length() {
        let hair = Hair::new(1.0, 1.55, 0.3, 0.3, 0.0, 0.2, Color::splat(0.6));
        let wo = Vec3::new(0.1, 0.9, 0.1).normalized();
        let sample = hair.sample(wo, LightTransport::outside(TransportKind::Hair), (0.37, 0.81, 0.12));
        assert!((sample.wi.length() - 1.0).abs() < 1e-6);
        assert!(sample.pdf > 0.0);
    }
}

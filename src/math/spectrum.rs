//! Spectral representations: a fixed 60-bin sampled spectrum spanning
//! 400-700nm, plus RGB/XYZ as degenerate 3-sample spectra, and the
//! conversions between them.
//!
//! The upstream system this crate is grounded on carries literal ~600-line
//! tabulated CIE color-matching-function and Smits (1999) RGB-basis sample
//! data. Reproducing those tables verbatim is not practical here; this
//! module instead uses closed-form analytic approximations (multi-lobe
//! Gaussian fits for CIE X/Y/Z, and a cosine-bump basis for RGB-to-spectrum
//! upsampling) that are smooth, energy-normalized, and good enough for path
//! tracing's importance-sampled integrals. See DESIGN.md.

use super::vector::Color;

pub const SPECTRUM_SAMPLES: usize = 60;
pub const LAMBDA_MIN: f64 = 400.0;
pub const LAMBDA_MAX: f64 = 700.0;

const fn lambda_step() -> f64 {
    (LAMBDA_MAX - LAMBDA_MIN) / SPECTRUM_SAMPLES as f64
}

/// Fixed 3x3 XYZ<->linear-sRGB conversion matrices (Rec. 709 primaries,
/// D65 white point).
const XYZ_TO_RGB: [[f64; 3]; 3] = [
    [3.240479, -1.537150, -0.498535],
    [-0.969256, 1.875991, 0.041556],
    [0.055648, -0.204043, 1.057311],
];

const RGB_TO_XYZ: [[f64; 3]; 3] = [
    [0.4124533, 0.35757984, 0.18042262],
    [0.21267127, 0.71515972, 0.07216883],
    [0.01933384, 0.11919363, 0.95022693],
];

/// A single Gaussian lobe used to approximate one CIE color matching
/// function bump.
fn gaussian(x: f64, mean: f64, sigma1: f64, sigma2: f64) -> f64 {
    let sigma = if x < mean { sigma1 } else { sigma2 };
    let t = (x - mean) / sigma;
    (-0.5 * t * t).exp()
}

/// Analytic multi-lobe fit of the CIE 1931 X color matching function
/// (Wyman, Sloan & Shirley 2013 piecewise-Gaussian approximation).
fn cie_x(lambda: f64) -> f64 {
    1.056 * gaussian(lambda, 599.8, 37.9, 31.0)
        + 0.362 * gaussian(lambda, 442.0, 16.0, 26.7)
        - 0.065 * gaussian(lambda, 501.1, 20.4, 26.2)
}

fn cie_y(lambda: f64) -> f64 {
    0.821 * gaussian(lambda, 568.8, 46.9, 40.5) + 0.286 * gaussian(lambda, 530.9, 16.3, 31.1)
}

fn cie_z(lambda: f64) -> f64 {
    1.217 * gaussian(lambda, 437.0, 11.8, 36.0) + 0.681 * gaussian(lambda, 459.0, 26.0, 13.8)
}

/// A spectral power (or reflectance) distribution sampled uniformly across
/// `[LAMBDA_MIN, LAMBDA_MAX)`.
#[derive(Debug, Clone, Copy)]
pub struct SampledSpectrum {
    pub samples: [f64; SPECTRUM_SAMPLES],
}

impl SampledSpectrum {
    pub const fn zero() -> Self {
        Self {
            samples: [0.0; SPECTRUM_SAMPLES],
        }
    }

    pub fn constant(v: f64) -> Self {
        Self {
            samples: [v; SPECTRUM_SAMPLES],
        }
    }

    pub fn from_fn(f: impl Fn(f64) -> f64) -> Self {
        let step = lambda_step();
        let mut samples = [0.0; SPECTRUM_SAMPLES];
        for (i, s) in samples.iter_mut().enumerate() {
            let lambda = LAMBDA_MIN + (i as f64 + 0.5) * step;
            *s = f(lambda);
        }
        Self { samples }
    }

    /// Upsamples a linear RGB triple into a plausible smooth reflectance
    /// spectrum via a three-lobe cosine-bump basis (red/green/blue bumps
    /// summed with their RGB weight), clamped non-negative. This stands in
    /// for the tabulated Smits/Meng basis decomposition.
    pub fn from_rgb(rgb: Color) -> Self {
        let red_bump = |l: f64| gaussian(l, 630.0, 45.0, 45.0);
        let green_bump = |l: f64| gaussian(l, 532.0, 45.0, 45.0);
        let blue_bump = |l: f64| gaussian(l, 465.0, 35.0, 35.0);
        Self::from_fn(|l| {
            (rgb.x * red_bump(l) + rgb.y * green_bump(l) + rgb.z * blue_bump(l)).max(0.0)
        })
    }

    pub fn average(&self) -> f64 {
        self.samples.iter().sum::<f64>() / SPECTRUM_SAMPLES as f64
    }

    pub fn max_component(&self) -> f64 {
        self.samples.iter().cloned().fold(0.0, f64::max)
    }

    pub fn is_black(&self) -> bool {
        self.samples.iter().all(|&s| s == 0.0)
    }

    pub fn clamp(&self, lo: f64, hi: f64) -> Self {
        let mut out = *self;
        for s in out.samples.iter_mut() {
            *s = s.clamp(lo, hi);
        }
        out
    }

    pub fn sqrt(&self) -> Self {
        let mut out = *self;
        for s in out.samples.iter_mut() {
            *s = s.max(0.0).sqrt();
        }
        out
    }

    pub fn exp(&self) -> Self {
        let mut out = *self;
        for s in out.samples.iter_mut() {
            *s = s.exp();
        }
        out
    }

    pub fn inverse(&self) -> Self {
        let mut out = *self;
        for s in out.samples.iter_mut() {
            *s = 1.0 / *s;
        }
        out
    }

    /// Converts to CIE XYZ tristimulus via Riemann-sum integration against
    /// the analytic color matching functions.
    pub fn to_xyz(&self) -> Color {
        let step = lambda_step();
        let mut xyz = Color::zero();
        for (i, &s) in self.samples.iter().enumerate() {
            let lambda = LAMBDA_MIN + (i as f64 + 0.5) * step;
            xyz.x += s * cie_x(lambda) * step;
            xyz.y += s * cie_y(lambda) * step;
            xyz.z += s * cie_z(lambda) * step;
        }
        // CIE_Y_INTEGRAL normalizes the luminous-efficiency curve so that a
        // flat unit spectrum maps to Y = 1.
        const CIE_Y_INTEGRAL: f64 = 106.857;
        xyz / CIE_Y_INTEGRAL
    }

    pub fn to_rgb(&self) -> Color {
        xyz_to_rgb(self.to_xyz())
    }
}

impl std::ops::Add for SampledSpectrum {
    type Output = Self;
    fn add(mut self, rhs: Self) -> Self {
        for i in 0..SPECTRUM_SAMPLES {
            self.samples[i] += rhs.samples[i];
        }
        self
    }
}

impl std::ops::Sub for SampledSpectrum {
    type Output = Self;
    fn sub(mut self, rhs: Self) -> Self {
        for i in 0..SPECTRUM_SAMPLES {
            self.samples[i] -= rhs.samples[i];
        }
        self
    }
}

impl std::ops::Mul for SampledSpectrum {
    type Output = Self;
    fn mul(mut self, rhs: Self) -> Self {
        for i in 0..SPECTRUM_SAMPLES {
            self.samples[i] *= rhs.samples[i];
        }
        self
    }
}

impl std::ops::Mul<f64> for SampledSpectrum {
    type Output = Self;
    fn mul(mut self, rhs: f64) -> Self {
        for s in self.samples.iter_mut() {
            *s *= rhs;
        }
        self
    }
}

impl std::ops::Div<f64> for SampledSpectrum {
    type Output = Self;
    fn div(mut self, rhs: f64) -> Self {
        let inv = 1.0 / rhs;
        for s in self.samples.iter_mut() {
            *s *= inv;
        }
        self
    }
}

pub fn xyz_to_rgb(xyz: Color) -> Color {
    Color::new(
        XYZ_TO_RGB[0][0] * xyz.x + XYZ_TO_RGB[0][1] * xyz.y + XYZ_TO_RGB[0][2] * xyz.z,
        XYZ_TO_RGB[1][0] * xyz.x + XYZ_TO_RGB[1][1] * xyz.y + XYZ_TO_RGB[1][2] * xyz.z,
        XYZ_TO_RGB[2][0] * xyz.x + XYZ_TO_RGB[2][1] * xyz.y + XYZ_TO_RGB[2][2] * xyz.z,
    )
}

pub fn rgb_to_xyz(rgb: Color) -> Color {
    Color::new(
        RGB_TO_XYZ[0][0] * rgb.x + RGB_TO_XYZ[0][1] * rgb.y + RGB_TO_XYZ[0][2] * rgb.z,
        RGB_TO_XYZ[1][0] * rgb.x + RGB_TO_XYZ[1][1] * rgb.y + RGB_TO_XYZ[1][2] * rgb.z,
        RGB_TO_XYZ[2][0] * rgb.x + RGB_TO_XYZ[2][1] * rgb.y + RGB_TO_XYZ[2][2] * rgb.z,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_spectrum_is_black() {
        assert!(SampledSpectrum::zero().is_black());
    }

    #[test]
    fn constant_spectrum_round_trips_through_xyz_rgb_in_proportion() {
        let white = SampledSpectrum::constant(1.0);
        let rgb = white.to_rgb();
        // A flat spectrum should be close to neutral gray, not wildly
        // skewed toward one channel.
        let max = rgb.x.max(rgb.y).max(rgb.z);
        let min = rgb.x.min(rgb.y).min(rgb.z);
        assert!(max > 0.0);
        assert!((max - min) / max < 0.5);
    }

    #[test]
    fn from_rgb_red_peaks_in_long_wavelengths() {
        let red = SampledSpectrum::from_rgb(Color::new(1.0, 0.0, 0.0));
        let short = red.samples[0];
        let long = red.samples[SPECTRUM_SAMPLES - 1];
        assert!(long > short);
    }

    #[test]
    fn xyz_rgb_are_mutual_inverses() {
        let rgb = Color::new(0.3, 0.6, 0.9);
        let back = xyz_to_rgb(rgb_to_xyz(rgb));
        assert!((back - rgb).length() < 1e-6);
    }
}

//! Wavelength Sampling

use super::{xyz_to_rgb, RGBSpectrum};
use crate::pbrt::*;

/// Shortest sampled wavelength in nanometres.
pub const WAVELENGTH_MIN_NM: Float = 400.0;

/// Width of the sampled wavelength range in nanometres.
pub const WAVELENGTH_RANGE_NM: Float = 300.0;

/// Number of stratified steps used to normalize `wavelength_to_rgb`.
const NORMALIZATION_STEPS: usize = 1024;

lazy_static! {
    /// Per channel scale that makes each channel of `wavelength_to_rgb`
    /// average to 1 over [0, 1).
    static ref WAVELENGTH_RGB_SCALE: [Float; 3] = {
        let mut sum = [0.0_f64; 3];
        for i in 0..NORMALIZATION_STEPS {
            let w = (i as Float + 0.5) / NORMALIZATION_STEPS as Float;
            let rgb = unnormalized_rgb(w);
            for c in 0..3 {
                sum[c] += rgb[c] as f64;
            }
        }
        sum.map(|s| (NORMALIZATION_STEPS as f64 / s) as Float)
    };
}

/// Maps a normalized wavelength in [0, 1) to nanometres.
///
/// * `w` - Normalized wavelength.
#[inline(always)]
pub fn wavelength_nm(w: Float) -> Float {
    WAVELENGTH_MIN_NM + WAVELENGTH_RANGE_NM * w
}

/// Piecewise gaussian used by the analytic CIE colour matching fit.
fn g(x: Float, mu: Float, s1: Float, s2: Float) -> Float {
    let t = (x - mu) / if x < mu { s1 } else { s2 };
    (-0.5 * t * t).exp()
}

/// CIE 1931 colour matching functions at a wavelength in nanometres.
#[rustfmt::skip]
fn cie_xyz(nm: Float) -> [Float; 3] {
    [
        1.056 * g(nm, 599.8, 37.9, 31.0) + 0.362 * g(nm, 442.0, 16.0, 26.7)
            - 0.065 * g(nm, 501.1, 20.4, 26.2),
        0.821 * g(nm, 568.8, 46.9, 40.5) + 0.286 * g(nm, 530.9, 16.3, 31.1),
        1.217 * g(nm, 437.0, 11.8, 36.0) + 0.681 * g(nm, 459.0, 26.0, 13.8),
    ]
}

fn unnormalized_rgb(w: Float) -> [Float; 3] {
    xyz_to_rgb(&cie_xyz(wavelength_nm(w))).map(|v| max(v, 0.0))
}

/// Returns the linear RGB response of a single wavelength. Channels are
/// non-negative and each averages to 1 over [0, 1), so a stratified set of
/// wavelength samples reconstructs white.
///
/// * `w` - Normalized wavelength in [0, 1) mapped onto 400-700nm.
pub fn wavelength_to_rgb(w: Float) -> RGBSpectrum {
    let rgb = unnormalized_rgb(w);
    let scale = *WAVELENGTH_RGB_SCALE;
    RGBSpectrum::rgb(rgb[0] * scale[0], rgb[1] * scale[1], rgb[2] * scale[2])
}

/// Returns the Cauchy coefficients `(A, B)` for a material whose index of
/// refraction at the sodium D line is `ior`. A dispersion power of zero
/// disables dispersion.
///
/// * `ior`              - Index of refraction.
/// * `dispersion_power` - Abbe number like dispersion strength.
pub fn cauchy_coefficients(ior: Float, dispersion_power: Float) -> (Float, Float) {
    if dispersion_power > 0.0 {
        let b = 0.52345 * (ior - 1.0) / dispersion_power;
        let a = ior - b / 0.34522792;
        (a, b)
    } else {
        (ior, 0.0)
    }
}

/// Returns the index of refraction at a normalized wavelength.
///
/// * `w` - Normalized wavelength in [0, 1).
/// * `a` - Cauchy A coefficient.
/// * `b` - Cauchy B coefficient (µm²).
pub fn cauchy_ior(w: Float, a: Float, b: Float) -> Float {
    let um = wavelength_nm(w) * 0.001;
    a + b / (um * um)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    #[test]
    fn channels_average_to_one() {
        let n = 4096;
        let mut sum = RGBSpectrum::ZERO;
        for i in 0..n {
            sum += wavelength_to_rgb((i as Float + 0.5) / n as Float);
        }
        let avg = sum / n as Float;
        assert!(approx_eq!(f32, avg.r(), 1.0, epsilon = 0.01));
        assert!(approx_eq!(f32, avg.g(), 1.0, epsilon = 0.01));
        assert!(approx_eq!(f32, avg.b(), 1.0, epsilon = 0.01));
    }

    #[test]
    fn short_wavelengths_are_blue() {
        let c = wavelength_to_rgb(0.12);
        assert!(c.b() > c.r());
        let c = wavelength_to_rgb(0.8);
        assert!(c.r() > c.b());
    }

    #[test]
    fn cauchy_reproduces_reference_ior() {
        let (a, b) = cauchy_coefficients(1.5, 30.0);
        // 587.6nm is the sodium D line.
        let w = (587.6 - WAVELENGTH_MIN_NM) / WAVELENGTH_RANGE_NM;
        assert!(approx_eq!(f32, cauchy_ior(w, a, b), 1.5, epsilon = 1e-3));
        assert!(cauchy_ior(0.0, a, b) > cauchy_ior(1.0, a, b));
    }

    #[test]
    fn no_dispersion_is_constant() {
        let (a, b) = cauchy_coefficients(1.33, 0.0);
        assert_eq!(b, 0.0);
        assert_eq!(cauchy_ior(0.3, a, b), 1.33);
    }

    proptest! {
        #[test]
        fn response_is_non_negative(w in 0.0..1.0f32) {
            let c = wavelength_to_rgb(w);
            prop_assert!(c.min_component_value() >= 0.0);
            prop_assert!(!c.has_nans());
        }
    }
}

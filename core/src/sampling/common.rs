//! Common sampling functions.

use crate::geometry::*;
use crate::pbrt::*;

/// Sample a direction on the hemisphere around `n` using cosine-weighted
/// sampling. `(u, v, n)` must be an orthonormal frame.
///
/// * `n`  - Hemisphere axis.
/// * `u`  - First tangent.
/// * `v`  - Second tangent.
/// * `s1` - First sample in [0, 1).
/// * `s2` - Second sample in [0, 1).
pub fn cosine_sample_hemisphere(
    n: &Vector3f,
    u: &Vector3f,
    v: &Vector3f,
    s1: Float,
    s2: Float,
) -> Vector3f {
    let phi = TWO_PI * s2;
    (*u * phi.cos() + *v * phi.sin()) * (1.0 - s1).sqrt() + *n * s1.sqrt()
}

/// Returns the PDF for cosine-weighted sampling a direction from a hemisphere.
///
/// * `cos_theta` - Cosine term of incident radiance.
#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

/// Uniformly sample a direction from a sphere.
///
/// * `s1` - First sample in [0, 1).
/// * `s2` - Second sample in [0, 1).
pub fn uniform_sample_sphere(s1: Float, s2: Float) -> Vector3f {
    let z = 1.0 - 2.0 * s1;
    let r = max(0.0, 1.0 - z * z).sqrt();
    let phi = TWO_PI * s2;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniformly sample a direction from a cone of directions about `d`.
/// `(u, v, d)` must be an orthonormal frame.
///
/// * `d`             - Cone axis.
/// * `u`             - First tangent.
/// * `v`             - Second tangent.
/// * `cos_theta_max` - Cosine of the cone half angle.
/// * `s1`            - First sample in [0, 1).
/// * `s2`            - Second sample in [0, 1).
pub fn uniform_sample_cone(
    d: &Vector3f,
    u: &Vector3f,
    v: &Vector3f,
    cos_theta_max: Float,
    s1: Float,
    s2: Float,
) -> Vector3f {
    let cos_theta = 1.0 - (1.0 - cos_theta_max) * s2;
    let sin_theta = max(0.0, 1.0 - cos_theta * cos_theta).sqrt();
    let phi = TWO_PI * s1;
    (*u * phi.cos() + *v * phi.sin()) * sin_theta + *d * cos_theta
}

/// Sample a point on a unit disk by mapping concentric squares of the unit
/// square to concentric circles.
///
/// * `s1` - First sample in [0, 1).
/// * `s2` - Second sample in [0, 1).
pub fn concentric_sample_disk(s1: Float, s2: Float) -> (Float, Float) {
    // Map uniform random numbers to [-1,1]^2.
    let (ox, oy) = (2.0 * s1 - 1.0, 2.0 * s2 - 1.0);

    // Handle degeneracy at the origin.
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }

    let (r, theta) = if abs(ox) > abs(oy) {
        (ox, PI_OVER_FOUR * (oy / ox))
    } else {
        (oy, PI_OVER_TWO - PI_OVER_FOUR * (ox / oy))
    };
    (r * theta.cos(), r * theta.sin())
}

/// Weight samples using the power heuristic with a configurable exponent.
/// The weights of both strategies for the same pair of densities always sum
/// to one.
///
/// * `f_pdf`    - Density of the strategy being weighted.
/// * `g_pdf`    - Density of the other strategy.
/// * `exponent` - Heuristic exponent. 2 is the classic power heuristic.
#[inline]
pub fn power_heuristic(f_pdf: Float, g_pdf: Float, exponent: Float) -> Float {
    let (f, g) = if exponent == 2.0 {
        (f_pdf * f_pdf, g_pdf * g_pdf)
    } else {
        (f_pdf.powf(exponent), g_pdf.powf(exponent))
    };
    if f + g > 0.0 {
        f / (f + g)
    } else {
        0.0
    }
}

/// Photon density estimation kernel (Silverman's second order kernel)
/// normalized over a disk.
///
/// * `r_photon_sq`     - Squared distance from the query point to the photon.
/// * `inv_r_gather_sq` - Inverse squared gather radius.
#[inline]
pub fn kernel(r_photon_sq: Float, inv_r_gather_sq: Float) -> Float {
    let s = 1.0 - r_photon_sq * inv_r_gather_sq;
    3.0 * inv_r_gather_sq * INV_PI * s * s
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    #[test]
    fn cosine_hemisphere_stays_above_surface() {
        let n = Vector3f::new(0.0, 0.0, 1.0);
        let (u, v) = n.coordinate_system();
        for i in 0..16 {
            for j in 0..16 {
                let d = cosine_sample_hemisphere(
                    &n,
                    &u,
                    &v,
                    (i as Float + 0.5) / 16.0,
                    (j as Float + 0.5) / 16.0,
                );
                assert!(d.z > 0.0);
                assert!(approx_eq!(f32, d.length(), 1.0, epsilon = 1e-5));
            }
        }
    }

    #[test]
    fn cone_respects_angle() {
        let d = Vector3f::new(1.0, 0.0, 0.0);
        let (u, v) = d.coordinate_system();
        let w = uniform_sample_cone(&d, &u, &v, 0.9, 0.3, 0.99);
        assert!(w.dot(&d) >= 0.9 - 1e-5);
    }

    #[test]
    fn kernel_integrates_to_one() {
        // Integrate over the disk with a midpoint rule in polar coordinates.
        let r = 0.5;
        let inv_r2 = 1.0 / (r * r);
        let steps = 2000;
        let dr = r / steps as Float;
        let mut sum = 0.0;
        for i in 0..steps {
            let x = (i as Float + 0.5) * dr;
            sum += kernel(x * x, inv_r2) * TWO_PI * x * dr;
        }
        assert!(approx_eq!(f32, sum, 1.0, epsilon = 1e-3));
    }

    #[test]
    fn disk_samples_inside_unit_disk() {
        let (x, y) = concentric_sample_disk(0.5, 0.5);
        assert_eq!((x, y), (0.0, 0.0));
        let (x, y) = concentric_sample_disk(0.99, 0.2);
        assert!(x * x + y * y <= 1.0);
    }

    proptest! {
        #[test]
        fn mis_weights_sum_to_one(l in 1e-3..1e3f32, m in 1e-3..1e3f32) {
            let w = power_heuristic(l, m, 2.0) + power_heuristic(m, l, 2.0);
            prop_assert!((w - 1.0).abs() < 1e-5);
        }

        #[test]
        fn mis_weights_sum_to_one_any_exponent(l in 1e-2..1e2f32, m in 1e-2..1e2f32, e in 1.0..4.0f32) {
            let w = power_heuristic(l, m, e) + power_heuristic(m, l, e);
            prop_assert!((w - 1.0).abs() < 1e-4);
        }

        #[test]
        fn sphere_samples_are_unit(s1 in 0.0..1.0f32, s2 in 0.0..1.0f32) {
            prop_assert!((uniform_sample_sphere(s1, s2).length() - 1.0).abs() < 1e-5);
        }
    }
}

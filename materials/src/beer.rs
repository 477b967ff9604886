//! Beer-Lambert Absorption

use core::geometry::*;
use core::pbrt::*;
use core::render::*;
use core::spectrum::*;
use core::volume::*;

/// A homogeneous absorbing medium inside a closed surface.
#[derive(Copy, Clone, Debug)]
pub struct BeerVolume {
    /// Absorption coefficient per unit length.
    sigma_a: Spectrum,
}

impl BeerVolume {
    /// Returns a medium that leaves `color` of the light after travelling
    /// `distance` through it.
    ///
    /// * `color`    - Transmitted color after `distance`.
    /// * `distance` - Reference distance.
    pub fn new(color: Spectrum, distance: Float) -> Self {
        let distance = if distance > 0.0 { distance } else { 1.0 };
        let mut sigma_a = Spectrum::ZERO;
        for c in 0..RGB_SAMPLES {
            sigma_a[c] = -max(color[c], 1e-30).ln() / distance;
        }
        Self { sigma_a }
    }
}

impl VolumeHandler for BeerVolume {
    /// Returns `exp(-σ·t)` over the segment. Unbounded segments are left
    /// unattenuated.
    ///
    /// * `state` - Render state.
    /// * `ray`   - The ray segment inside the medium.
    fn transmittance(&self, _state: &RenderState, ray: &Ray) -> Spectrum {
        if !ray.t_max.is_finite() || ray.t_max <= ray.t_min {
            return Spectrum::ONE;
        }
        let dist = ray.t_max - max(ray.t_min, 0.0);
        (self.sigma_a * -dist).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn reference_distance_gives_color() {
        let vol = BeerVolume::new(Spectrum::rgb(0.5, 0.25, 1.0), 2.0);
        let state = RenderState::new(0, 0);
        let ray = Ray::segment(Point3f::zero(), Vector3f::new(1.0, 0.0, 0.0), 0.0, 2.0);
        let t = vol.transmittance(&state, &ray);
        assert!(approx_eq!(f32, t.r(), 0.5, epsilon = 1e-5));
        assert!(approx_eq!(f32, t.g(), 0.25, epsilon = 1e-5));
        assert!(approx_eq!(f32, t.b(), 1.0, epsilon = 1e-5));

        let ray = Ray::segment(Point3f::zero(), Vector3f::new(1.0, 0.0, 0.0), 0.0, 4.0);
        assert!(approx_eq!(f32, vol.transmittance(&state, &ray).r(), 0.25, epsilon = 1e-5));
    }

    #[test]
    fn unbounded_segment_is_clear() {
        let vol = BeerVolume::new(Spectrum::new(0.1), 1.0);
        let state = RenderState::new(0, 0);
        let ray = Ray::new(Point3f::zero(), Vector3f::new(1.0, 0.0, 0.0));
        assert_eq!(vol.transmittance(&state, &ray), Spectrum::ONE);
    }
}

//! Point Light Source

use core::geometry::*;
use core::interaction::*;
use core::light::*;
use core::pbrt::*;
use core::sampling::*;
use core::spectrum::*;

/// Implements an isotropic point light source that emits the same amount of
/// light in all directions.
#[derive(Copy, Clone, Debug)]
pub struct PointLight {
    /// Position.
    pub from: Point3f,

    /// Intensity.
    pub color: Spectrum,
}

impl PointLight {
    /// Returns a new `PointLight`.
    ///
    /// * `from`  - Position.
    /// * `color` - Light color.
    /// * `power` - Scale applied to `color`.
    pub fn new(from: Point3f, color: Spectrum, power: Float) -> Self {
        Self {
            from,
            color: color * power,
        }
    }
}

impl Light for PointLight {
    /// Returns a photon leaving the light in a uniformly sampled direction.
    ///
    /// * `s1` - First direction sample.
    /// * `s2` - Second direction sample.
    fn emit_photon(&self, s1: Float, s2: Float, _s3: Float, _s4: Float) -> EmittedPhoton {
        EmittedPhoton {
            ray: Ray::new(self.from, uniform_sample_sphere(s1, s2)),
            color: self.color,
            ipdf: FOUR_PI,
        }
    }

    /// Returns the intensity falling off with the squared distance and the
    /// shadow ray towards the light.
    ///
    /// * `sp` - The shading point.
    fn illuminate(&self, sp: &SurfacePoint) -> Option<(Spectrum, Ray)> {
        let ldir = self.from - sp.p;
        let dist_sq = ldir.length_squared();
        if dist_sq == 0.0 {
            return None;
        }

        let dist = dist_sq.sqrt();
        let ray = Ray::segment(sp.p, ldir / dist, 0.0, dist);
        Some((self.color / dist_sq, ray))
    }

    /// Return the total emitted power.
    fn total_energy(&self) -> Spectrum {
        self.color * FOUR_PI
    }

    fn is_delta(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use core::rng::*;
    use materials::*;
    use std::sync::Arc;

    fn point_at(p: Point3f) -> SurfacePoint {
        let n = Vector3f::new(0.0, 0.0, 1.0);
        let geometry = SurfaceGeometry {
            p,
            ng: n,
            n,
            dpdu: Vector3f::new(1.0, 0.0, 0.0),
            dpdv: Vector3f::new(0.0, 1.0, 0.0),
            u: 0.0,
            v: 0.0,
        };
        SurfacePoint::new(geometry, Arc::new(MatteMaterial::new(Spectrum::new(0.5))), 0)
    }

    #[test]
    fn inverse_square_falloff() {
        let light = PointLight::new(Point3f::new(0.0, 0.0, 2.0), Spectrum::new(1.0), 8.0);
        let (col, ray) = light.illuminate(&point_at(Point3f::zero())).unwrap();
        assert_eq!(col, Spectrum::new(2.0));
        assert!(approx_eq!(f32, ray.t_max, 2.0));
        assert_eq!(ray.d, Vector3f::new(0.0, 0.0, 1.0));
        assert!(light.is_delta());
    }

    #[test]
    fn coincident_point_receives_nothing() {
        let light = PointLight::new(Point3f::zero(), Spectrum::new(1.0), 1.0);
        assert!(light.illuminate(&point_at(Point3f::zero())).is_none());
    }

    #[test]
    fn energy_matches_photon_flux() {
        let light = PointLight::new(Point3f::zero(), Spectrum::rgb(1.0, 0.5, 0.25), 2.0);
        let photon = light.emit_photon(0.3, 0.6, 0.0, 0.0);
        assert_eq!(photon.color * photon.ipdf, light.total_energy());
    }

    #[test]
    fn photons_start_at_light() {
        let from = Point3f::new(1.0, 2.0, 3.0);
        let light = PointLight::new(from, Spectrum::new(1.0), 1.0);
        let mut rng = RNG::new(13);
        for _ in 0..128 {
            let photon = light.emit_photon(rng.uniform_float(), rng.uniform_float(), 0.5, 0.5);
            assert_eq!(photon.ray.o, from);
            assert!((photon.ray.d.length() - 1.0).abs() < 1e-4);
        }
    }
}

//! Directional Light Source

use core::geometry::*;
use core::interaction::*;
use core::light::*;
use core::pbrt::*;
use core::sampling::*;
use core::spectrum::*;

/// A light arriving from a single direction at every point of the scene,
/// such as the sun.
#[derive(Copy, Clone, Debug)]
pub struct DirectionalLight {
    /// Unit direction pointing towards the light.
    pub direction: Vector3f,

    /// Radiance.
    pub color: Spectrum,

    /// Center of the sphere enclosing the scene.
    world_center: Point3f,

    /// Radius of the sphere enclosing the scene.
    world_radius: Float,

    /// Tangent frame of the emission disk.
    du: Vector3f,
    dv: Vector3f,
}

impl DirectionalLight {
    /// Returns a new `DirectionalLight`.
    ///
    /// * `direction`    - Direction pointing towards the light.
    /// * `color`        - Light color.
    /// * `power`        - Scale applied to `color`.
    /// * `world_sphere` - Center and radius of a sphere enclosing the scene.
    pub fn new(
        direction: Vector3f,
        color: Spectrum,
        power: Float,
        world_sphere: (Point3f, Float),
    ) -> Self {
        let direction = direction.normalize();
        let (du, dv) = direction.coordinate_system();
        Self {
            direction,
            color: color * power,
            world_center: world_sphere.0,
            world_radius: world_sphere.1,
            du,
            dv,
        }
    }

    /// Area of the disk photons are emitted from.
    fn disk_area(&self) -> Float {
        PI * self.world_radius * self.world_radius
    }
}

impl Light for DirectionalLight {
    /// Emits a photon from a disk facing the scene just outside the world
    /// sphere.
    ///
    /// * `s1` - First disk sample.
    /// * `s2` - Second disk sample.
    fn emit_photon(&self, s1: Float, s2: Float, _s3: Float, _s4: Float) -> EmittedPhoton {
        let (x, y) = concentric_sample_disk(s1, s2);
        let o = self.world_center
            + (self.du * x + self.dv * y) * self.world_radius
            + self.direction * self.world_radius;
        EmittedPhoton {
            ray: Ray::new(o, -self.direction),
            color: self.color,
            ipdf: self.disk_area(),
        }
    }

    /// Returns the light color and a shadow ray long enough to leave the
    /// scene.
    ///
    /// * `sp` - The shading point.
    fn illuminate(&self, sp: &SurfacePoint) -> Option<(Spectrum, Ray)> {
        let ray = Ray::segment(sp.p, self.direction, 0.0, 2.0 * self.world_radius);
        Some((self.color, ray))
    }

    fn total_energy(&self) -> Spectrum {
        self.color * self.disk_area()
    }

    fn is_delta(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::rng::*;
    use float_cmp::approx_eq;

    fn sun() -> DirectionalLight {
        DirectionalLight::new(
            Vector3f::new(0.0, 0.0, 2.0),
            Spectrum::new(1.0),
            3.0,
            (Point3f::new(1.0, 1.0, 1.0), 2.0),
        )
    }

    #[test]
    fn energy_covers_world_disk() {
        let light = sun();
        assert_eq!(light.direction, Vector3f::new(0.0, 0.0, 1.0));
        assert!(approx_eq!(f32, light.total_energy().g(), 3.0 * PI * 4.0, epsilon = 1e-4));
        assert!(light.is_delta());
    }

    #[test]
    fn photons_enter_world_sphere() {
        let light = sun();
        let center = Point3f::new(1.0, 1.0, 1.0);
        let mut rng = RNG::new(17);
        for _ in 0..128 {
            let photon = light.emit_photon(rng.uniform_float(), rng.uniform_float(), 0.0, 0.0);
            assert_eq!(photon.ray.d, Vector3f::new(0.0, 0.0, -1.0));
            assert!((photon.ray.o.z - 3.0).abs() < 1e-4);
            let offset = Point3f::new(photon.ray.o.x, photon.ray.o.y, 1.0).distance(&center);
            assert!(offset <= 2.0 + 1e-4);
        }
    }
}

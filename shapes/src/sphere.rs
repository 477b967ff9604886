//! Spheres

use core::geometry::*;
use core::interaction::*;
use core::pbrt::*;
use core::primitive::*;

/// A sphere in world space.
#[derive(Copy, Clone, Debug)]
pub struct Sphere {
    /// Center.
    pub center: Point3f,

    /// Radius of sphere.
    pub radius: Float,
}

impl Sphere {
    /// Create a new sphere.
    ///
    /// * `center` - Center.
    /// * `radius` - Radius of sphere.
    pub fn new(center: Point3f, radius: Float) -> Self {
        Self { center, radius }
    }
}

impl Shape for Sphere {
    /// Returns the bounding box of the sphere.
    fn bounds(&self) -> Bounds3f {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        bounds3(self.center - r, self.center + r)
    }

    /// Returns the closest hit within the ray extent.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<Float> {
        let oc = ray.o - self.center;
        let a = ray.d.length_squared();
        let b = 2.0 * oc.dot(&ray.d);
        let c = oc.length_squared() - self.radius * self.radius;

        let discrim = b * b - 4.0 * a * c;
        if discrim < 0.0 || a == 0.0 {
            return None;
        }
        let root = discrim.sqrt();

        // Numerically stable form of the quadratic roots.
        let q = if b < 0.0 { -0.5 * (b - root) } else { -0.5 * (b + root) };
        let (mut t0, mut t1) = (q / a, if q != 0.0 { c / q } else { q / a });
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        if t0 > ray.t_min && t0 < ray.t_max {
            Some(t0)
        } else if t1 > ray.t_min && t1 < ray.t_max {
            Some(t1)
        } else {
            None
        }
    }

    /// Returns the differential geometry at a hit.
    ///
    /// * `ray` - The ray.
    /// * `t`   - Hit distance.
    fn surface_point(&self, ray: &Ray, t: Float) -> SurfaceGeometry {
        let p = ray.at(t);
        let n = (p - self.center).normalize();

        let phi = {
            let phi = n.y.atan2(n.x);
            if phi < 0.0 {
                phi + TWO_PI
            } else {
                phi
            }
        };
        let theta = clamp(n.z, -1.0, 1.0).acos();
        let (sin_phi, cos_phi) = phi.sin_cos();

        let dpdu = Vector3f::new(-TWO_PI * n.y, TWO_PI * n.x, 0.0) * self.radius;
        let dpdv = Vector3f::new(n.z * cos_phi, n.z * sin_phi, -theta.sin()) * (PI * self.radius);

        SurfaceGeometry {
            p,
            ng: n,
            n,
            dpdu,
            dpdv,
            u: phi * INV_TWO_PI,
            v: theta * INV_PI,
        }
    }
}

//! Area Light Source

use core::geometry::*;
use core::interaction::*;
use core::light::*;
use core::pbrt::*;
use core::primitive::*;
use core::sampling::*;
use core::spectrum::*;
use shapes::Quad;

/// A one-sided parallelogram emitting uniformly on the side its normal
/// `edge1 × edge2` faces.
#[derive(Copy, Clone, Debug)]
pub struct AreaLight {
    /// The emitting surface.
    pub quad: Quad,

    /// Radiance.
    pub color: Spectrum,

    /// Number of light samples per shading point.
    samples: usize,

    /// Area of the surface.
    area: Float,

    /// Tangent frame around the normal.
    du: Vector3f,
    dv: Vector3f,
}

impl AreaLight {
    /// Returns a new `AreaLight`.
    ///
    /// * `corner`  - Corner.
    /// * `edge1`   - First edge.
    /// * `edge2`   - Second edge.
    /// * `color`   - Light color.
    /// * `power`   - Scale applied to `color`.
    /// * `samples` - Number of light samples per shading point.
    pub fn new(
        corner: Point3f,
        edge1: Vector3f,
        edge2: Vector3f,
        color: Spectrum,
        power: Float,
        samples: usize,
    ) -> Self {
        let quad = Quad::new(corner, edge1, edge2);
        let (du, dv) = quad.normal.coordinate_system();
        let area = quad.area();
        debug!("Area light with area {area} and {samples} samples");
        Self {
            quad,
            color: color * power,
            samples: max(samples, 1),
            area,
            du,
            dv,
        }
    }

    /// Converts an area density at a light point seen from distance
    /// `sqrt(dist_sq)` under `cos_angle` to solid angle.
    fn solid_angle_pdf(&self, dist_sq: Float, cos_angle: Float) -> Float {
        dist_sq / (self.area * cos_angle)
    }
}

impl Light for AreaLight {
    /// Emits a photon from a uniform point on the surface in a cosine
    /// distributed direction.
    ///
    /// * `s1` - First direction sample.
    /// * `s2` - Second direction sample.
    /// * `s3` - First position sample.
    /// * `s4` - Second position sample.
    fn emit_photon(&self, s1: Float, s2: Float, s3: Float, s4: Float) -> EmittedPhoton {
        let o = self.quad.point_at(s3, s4);
        let d = cosine_sample_hemisphere(&self.quad.normal, &self.du, &self.dv, s1, s2);
        EmittedPhoton {
            ray: Ray::new(o, d),
            color: self.color,
            ipdf: self.area * PI,
        }
    }

    /// Samples a point uniformly over the surface.
    ///
    /// * `sp` - The shading point.
    /// * `s1` - First position sample.
    /// * `s2` - Second position sample.
    fn illum_sample(&self, sp: &SurfacePoint, s1: Float, s2: Float) -> Option<LightSample> {
        let p = self.quad.point_at(s1, s2);
        let ldir = p - sp.p;
        let dist_sq = ldir.length_squared();
        if dist_sq == 0.0 {
            return None;
        }

        let dist = dist_sq.sqrt();
        let ldir = ldir / dist;
        let cos_angle = -ldir.dot(&self.quad.normal);
        if cos_angle <= 0.0 {
            return None;
        }

        Some(LightSample {
            col: self.color,
            pdf: self.solid_angle_pdf(dist_sq, cos_angle),
            ray: Ray::segment(sp.p, ldir, 0.0, dist),
        })
    }

    /// Intersects the front side of the surface.
    ///
    /// * `ray` - The ray. The direction must be normalized.
    fn intersect(&self, ray: &Ray) -> Option<(Float, Spectrum, Float)> {
        let cos_angle = -ray.d.dot(&self.quad.normal);
        if cos_angle <= 0.0 {
            return None;
        }

        let t = self.quad.intersect(ray)?;
        let ipdf = 1.0 / self.solid_angle_pdf(t * t, cos_angle);
        Some((t, self.color, ipdf))
    }

    /// Returns the solid angle density of sampling `light_p` from `p`.
    ///
    /// * `p`       - Shading position.
    /// * `light_p` - Position on the light.
    /// * `light_n` - Light normal at `light_p`.
    fn illum_pdf(&self, p: &Point3f, light_p: &Point3f, light_n: &Vector3f) -> Float {
        let ldir = *light_p - *p;
        let dist_sq = ldir.length_squared();
        if dist_sq == 0.0 {
            return 0.0;
        }
        let cos_angle = abs(ldir.dot(light_n)) / dist_sq.sqrt();
        if cos_angle <= 0.0 {
            0.0
        } else {
            self.solid_angle_pdf(dist_sq, cos_angle)
        }
    }

    fn total_energy(&self) -> Spectrum {
        self.color * (self.area * PI)
    }

    fn is_delta(&self) -> bool {
        false
    }

    fn can_intersect(&self) -> bool {
        true
    }

    fn n_samples(&self) -> usize {
        self.samples
    }
}

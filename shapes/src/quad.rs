//! Quads

use core::geometry::*;
use core::interaction::*;
use core::pbrt::*;
use core::primitive::*;

/// A parallelogram spanned by two edges from a corner. Its normal is
/// `edge1 × edge2`, normalized.
#[derive(Copy, Clone, Debug)]
pub struct Quad {
    /// Corner.
    pub corner: Point3f,

    /// First edge.
    pub edge1: Vector3f,

    /// Second edge.
    pub edge2: Vector3f,

    /// Unit normal.
    pub normal: Vector3f,

    /// `edge1 × edge2`.
    cross: Vector3f,

    /// `1 / |edge1 × edge2|²`.
    inv_cross_len_sq: Float,
}

impl Quad {
    /// Create a new quad.
    ///
    /// * `corner` - Corner.
    /// * `edge1`  - First edge.
    /// * `edge2`  - Second edge.
    pub fn new(corner: Point3f, edge1: Vector3f, edge2: Vector3f) -> Self {
        let cross = edge1.cross(&edge2);
        let len_sq = cross.length_squared();
        Self {
            corner,
            edge1,
            edge2,
            normal: cross.normalize(),
            cross,
            inv_cross_len_sq: if len_sq > 0.0 { 1.0 / len_sq } else { 0.0 },
        }
    }

    /// Returns the area of the quad.
    pub fn area(&self) -> Float {
        self.cross.length()
    }

    /// Returns the point at parametric coordinates `(u, v)`.
    ///
    /// * `u` - Coordinate along `edge1`.
    /// * `v` - Coordinate along `edge2`.
    pub fn point_at(&self, u: Float, v: Float) -> Point3f {
        self.corner + self.edge1 * u + self.edge2 * v
    }

    /// Returns the parametric coordinates of a point in the quad's plane.
    fn uv(&self, p: &Point3f) -> (Float, Float) {
        let w = *p - self.corner;
        let u = w.cross(&self.edge2).dot(&self.cross) * self.inv_cross_len_sq;
        let v = self.edge1.cross(&w).dot(&self.cross) * self.inv_cross_len_sq;
        (u, v)
    }
}

impl Shape for Quad {
    /// Returns the bounding box of the quad.
    fn bounds(&self) -> Bounds3f {
        bounds3(self.corner, self.corner + self.edge1)
            .union(&(self.corner + self.edge2))
            .union(&(self.corner + self.edge1 + self.edge2))
    }

    /// Returns the closest hit within the ray extent.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<Float> {
        let denom = ray.d.dot(&self.normal);
        if abs(denom) < 1e-12 {
            return None;
        }

        let t = (self.corner - ray.o).dot(&self.normal) / denom;
        if !(t > ray.t_min && t < ray.t_max) {
            return None;
        }

        let (u, v) = self.uv(&ray.at(t));
        if (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v) {
            Some(t)
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
        let (u, v) = self.uv(&p);
        SurfaceGeometry {
            p,
            ng: self.normal,
            n: self.normal,
            dpdu: self.edge1,
            dpdv: self.edge2,
            u,
            v,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::rng::*;
    use float_cmp::approx_eq;

    fn floor() -> Quad {
        Quad::new(
            Point3f::new(-1.0, -1.0, 0.0),
            Vector3f::new(2.0, 0.0, 0.0),
            Vector3f::new(0.0, 2.0, 0.0),
        )
    }

    #[test]
    fn normal_and_area() {
        let q = floor();
        assert_eq!(q.normal, Vector3f::new(0.0, 0.0, 1.0));
        assert!(approx_eq!(f32, q.area(), 4.0));
        let b = q.bounds();
        assert_eq!(b.p_min, Point3f::new(-1.0, -1.0, 0.0));
        assert_eq!(b.p_max, Point3f::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn hits_from_either_side() {
        let q = floor();
        let down = Ray::new(Point3f::new(0.5, 0.5, 2.0), Vector3f::new(0.0, 0.0, -1.0));
        assert!(approx_eq!(f32, q.intersect(&down).unwrap(), 2.0));
        let up = Ray::new(Point3f::new(0.5, 0.5, -3.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(approx_eq!(f32, q.intersect(&up).unwrap(), 3.0));
        let parallel = Ray::new(Point3f::new(0.0, 0.0, 1.0), Vector3f::new(1.0, 0.0, 0.0));
        assert!(q.intersect(&parallel).is_none());
        let outside = Ray::new(Point3f::new(1.5, 0.0, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        assert!(q.intersect(&outside).is_none());
    }

    #[test]
    fn uv_round_trip() {
        let q = Quad::new(
            Point3f::new(1.0, 2.0, 3.0),
            Vector3f::new(0.5, 1.0, 0.0),
            Vector3f::new(0.0, 0.3, 2.0),
        );
        let mut rng = RNG::new(5);
        for _ in 0..256 {
            let u = lerp(rng.uniform_float(), 0.01, 0.99);
            let v = lerp(rng.uniform_float(), 0.01, 0.99);
            let p = q.point_at(u, v);
            let ray = Ray::new(p + q.normal * 2.0, -q.normal);
            let t = q.intersect(&ray).unwrap();
            let g = q.surface_point(&ray, t);
            assert!((g.u - u).abs() < 1e-3 && (g.v - v).abs() < 1e-3, "u {u}, v {v}");
        }
    }
}

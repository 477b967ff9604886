//! Primitive

use crate::geometry::*;
use crate::interaction::*;
use crate::material::*;
use crate::pbrt::*;
use std::sync::Arc;

/// Atomic reference counted `Shape`.
pub type ArcShape = Arc<dyn Shape>;

/// Shape trait provides common behavior for geometric shapes.
pub trait Shape: Send + Sync {
    /// Returns the bounding box of the shape.
    fn bounds(&self) -> Bounds3f;

    /// Returns the parametric distance of the closest hit within
    /// `(ray.t_min, ray.t_max)`.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<Float>;

    /// Returns the differential geometry at a hit found by `intersect()`.
    ///
    /// * `ray` - The ray.
    /// * `t`   - Hit distance.
    fn surface_point(&self, ray: &Ray, t: Float) -> SurfaceGeometry;
}

/// A shape with a material attached.
#[derive(Clone)]
pub struct Primitive {
    /// The shape.
    pub shape: ArcShape,

    /// The material.
    pub material: ArcMaterial,
}

impl Primitive {
    /// Returns a new `Primitive`.
    ///
    /// * `shape`    - The shape.
    /// * `material` - The material.
    pub fn new(shape: ArcShape, material: ArcMaterial) -> Self {
        Self { shape, material }
    }

    /// Returns the surface point at a hit.
    ///
    /// * `ray` - The ray.
    /// * `t`   - Hit distance.
    /// * `id`  - Index of the primitive.
    pub fn surface_point(&self, ray: &Ray, t: Float, id: usize) -> SurfacePoint {
        SurfacePoint::new(
            self.shape.surface_point(ray, t),
            Arc::clone(&self.material),
            id,
        )
    }
}

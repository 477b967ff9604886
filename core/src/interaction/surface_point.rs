//! Surface Point

use crate::geometry::*;
use crate::material::*;
use crate::pbrt::*;
use std::fmt;

/// Differential geometry of a shape at a hit point, before a material is
/// attached.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceGeometry {
    /// Hit position.
    pub p: Point3f,

    /// Geometric normal.
    pub ng: Vector3f,

    /// Shading normal.
    pub n: Vector3f,

    /// Parametric partial derivative ∂p/∂u.
    pub dpdu: Vector3f,

    /// Parametric partial derivative ∂p/∂v.
    pub dpdv: Vector3f,

    /// Surface parameter u.
    pub u: Float,

    /// Surface parameter v.
    pub v: Float,
}

/// SurfacePoint is the result of an intersection query. It lives only for
/// the shading computation that requested it.
#[derive(Clone)]
pub struct SurfacePoint {
    /// Hit position.
    pub p: Point3f,

    /// Geometric normal.
    pub ng: Vector3f,

    /// Shading normal.
    pub n: Vector3f,

    /// First tangent of the shading frame.
    pub nu: Vector3f,

    /// Second tangent of the shading frame.
    pub nv: Vector3f,

    /// Parametric partial derivative ∂p/∂u.
    pub dpdu: Vector3f,

    /// Parametric partial derivative ∂p/∂v.
    pub dpdv: Vector3f,

    /// Surface parameter u.
    pub u: Float,

    /// Surface parameter v.
    pub v: Float,

    /// Material at the hit point.
    pub material: ArcMaterial,

    /// Index of the hit primitive in the accelerator.
    pub primitive_id: usize,
}

impl SurfacePoint {
    /// Create a new surface point. The shading frame is completed from the
    /// shading normal.
    ///
    /// * `geometry`     - Differential geometry of the hit.
    /// * `material`     - Material at the hit point.
    /// * `primitive_id` - Index of the hit primitive.
    pub fn new(geometry: SurfaceGeometry, material: ArcMaterial, primitive_id: usize) -> Self {
        let (nu, nv) = geometry.n.coordinate_system();
        Self {
            p: geometry.p,
            ng: geometry.ng,
            n: geometry.n,
            nu,
            nv,
            dpdu: geometry.dpdu,
            dpdv: geometry.dpdv,
            u: geometry.u,
            v: geometry.v,
            material,
            primitive_id,
        }
    }
}

impl fmt::Debug for SurfacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SurfacePoint")
            .field("p", &self.p)
            .field("ng", &self.ng)
            .field("n", &self.n)
            .field("primitive_id", &self.primitive_id)
            .finish()
    }
}

//! Accelerator

use crate::geometry::*;
use crate::interaction::*;
use crate::pbrt::*;
use crate::render::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Atomic reference counted `Accelerator`.
pub type ArcAccelerator = Arc<dyn Accelerator>;

/// Spatial index over the scene primitives. Only its query contract is used
/// by the integrators.
pub trait Accelerator: Send + Sync {
    /// Returns the bounding box of all primitives.
    fn bounds(&self) -> Bounds3f;

    /// Returns the closest hit within `(ray.t_min, ray.t_max)` and its
    /// distance.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<(SurfacePoint, Float)>;

    /// Returns whether anything blocks the ray segment and the index of the
    /// occluding primitive.
    ///
    /// * `ray`  - The shadow ray.
    /// * `bias` - Hits closer than this are ignored.
    fn is_shadowed(&self, ray: &Ray, bias: Float) -> (bool, Option<usize>);

    /// Like `is_shadowed()` but shadow rays pass through transparent
    /// materials, accumulating their filter color. More than `max_depth`
    /// transparent layers count as occluded.
    ///
    /// * `state`     - Render state.
    /// * `ray`       - The shadow ray.
    /// * `max_depth` - Maximum number of transparent layers.
    /// * `bias`      - Hits closer than this are ignored.
    fn is_shadowed_transparent(
        &self,
        state: &RenderState,
        ray: &Ray,
        max_depth: usize,
        bias: Float,
    ) -> (bool, Spectrum, Option<usize>);
}

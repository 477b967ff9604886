//! Primitive List

use core::accelerator::*;
use core::geometry::*;
use core::interaction::*;
use core::pbrt::*;
use core::primitive::*;
use core::render::*;
use core::spectrum::*;

/// Padding added to primitive bounds so that flat shapes are never culled
/// by rounding in the slab test.
const BOUNDS_PADDING: Float = 1e-4;

/// A linear accelerator. Every query tests all primitives whose bounding
/// box the ray crosses. Adequate for scenes with a handful of primitives.
#[derive(Clone)]
pub struct PrimitiveList {
    /// The primitives. A primitive's id is its index.
    primitives: Vec<Primitive>,

    /// Bounding box of each primitive.
    prim_bounds: Vec<Bounds3f>,

    /// Bounding box of all primitives.
    bounds: Bounds3f,
}

impl PrimitiveList {
    /// Create a new `PrimitiveList`.
    ///
    /// * `primitives` - The primitives.
    pub fn new(primitives: Vec<Primitive>) -> Self {
        let prim_bounds: Vec<Bounds3f> = primitives
            .iter()
            .map(|p| p.shape.bounds().expand(BOUNDS_PADDING))
            .collect();
        let bounds = prim_bounds
            .iter()
            .fold(empty_bounds3(), |b: Bounds3f, pb| b.union(pb));
        debug!("Created primitive list with {} primitives", primitives.len());
        Self {
            primitives,
            prim_bounds,
            bounds,
        }
    }

    /// Returns the primitives.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Returns the index and distance of the closest hit within
    /// `(t_min, t_max)`.
    fn closest_hit(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<(usize, Float)> {
        let mut r = Ray::segment(ray.o, ray.d, t_min, t_max);
        let mut closest = None;
        for (i, prim) in self.primitives.iter().enumerate() {
            if self.prim_bounds[i].cross(&r, r.t_max).is_none() {
                continue;
            }
            if let Some(t) = prim.shape.intersect(&r) {
                r.t_max = t;
                closest = Some((i, t));
            }
        }
        closest
    }
}

impl Accelerator for PrimitiveList {
    /// Returns the bounding box of all primitives.
    fn bounds(&self) -> Bounds3f {
        self.bounds
    }

    /// Returns the closest hit and its distance.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, ray: &Ray) -> Option<(SurfacePoint, Float)> {
        self.closest_hit(ray, ray.t_min, ray.t_max)
            .map(|(i, t)| (self.primitives[i].surface_point(ray, t, i), t))
    }

    /// Returns whether anything blocks the ray segment.
    ///
    /// * `ray`  - The shadow ray.
    /// * `bias` - Hits closer than this are ignored.
    fn is_shadowed(&self, ray: &Ray, bias: Float) -> (bool, Option<usize>) {
        let r = Ray::segment(ray.o, ray.d, max(ray.t_min, bias), ray.t_max);
        for (i, prim) in self.primitives.iter().enumerate() {
            if self.prim_bounds[i].cross(&r, r.t_max).is_none() {
                continue;
            }
            if prim.shape.intersect(&r).is_some() {
                return (true, Some(i));
            }
        }
        (false, None)
    }

    /// Walks the shadow ray through transparent occluders, multiplying their
    /// filter colors.
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
    ) -> (bool, Spectrum, Option<usize>) {
        let mut filter = Spectrum::ONE;
        let mut t_min = max(ray.t_min, bias);
        let mut depth = 0;
        let wo = -ray.d;

        while let Some((i, t)) = self.closest_hit(ray, t_min, ray.t_max) {
            let prim = &self.primitives[i];
            if !prim.material.is_transparent() || depth >= max_depth {
                return (true, filter, Some(i));
            }

            let sp = prim.surface_point(ray, t, i);
            let data = sp.material.initialize_at_point(state, &sp);
            filter *= sp.material.transparency(state, &sp, &data, &wo);
            depth += 1;
            t_min = t + bias;
        }

        (false, filter, None)
    }
}

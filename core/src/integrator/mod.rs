//! Integrator

use crate::error::*;
use crate::geometry::*;
use crate::parallel::*;
use crate::pbrt::*;
use crate::render::*;
use crate::scene::*;
use crate::spectrum::*;

/// Surface integrator interface. `preprocess()` runs once before any call
/// to `integrate()`; afterwards the integrator is shared read-only by all
/// render threads.
pub trait SurfaceIntegrator: Send + Sync {
    /// Returns the integrator name.
    fn name(&self) -> &'static str;

    /// Returns the scene.
    fn scene(&self) -> &Scene;

    /// Prepares the integrator, e.g. by shooting photons.
    ///
    /// * `control` - Progress counter and cancellation flag.
    fn preprocess(&mut self, control: &RenderControl) -> Result<()>;

    /// Returns the radiance and alpha arriving along a ray. Recursion
    /// increments `state.ray_level` and restores it before returning.
    ///
    /// * `state`            - Render state of the calling thread.
    /// * `ray`              - The ray.
    /// * `additional_depth` - Extra recursion depth granted by materials
    ///                        along the path.
    /// * `layers`           - Optional debug layers.
    fn integrate(
        &self,
        state: &mut RenderState,
        ray: &Ray,
        additional_depth: usize,
        layers: Option<&mut ColorLayers>,
    ) -> (Spectrum, Float);
}

//! Volumes

use crate::geometry::*;
use crate::render::*;
use crate::spectrum::*;
use std::sync::Arc;

/// A participating medium bounded by a surface. Continuation rays that
/// enter the surface are attenuated by it.
pub trait VolumeHandler: Send + Sync {
    /// Returns the transmittance along the ray segment `[t_min, t_max]`.
    ///
    /// * `state` - Render state.
    /// * `ray`   - The ray segment inside the medium.
    fn transmittance(&self, state: &RenderState, ray: &Ray) -> Spectrum;
}

/// Scene wide volume integrator applied to eye rays.
pub trait VolumeIntegrator: Send + Sync {
    /// Returns the transmittance along the ray segment `[t_min, t_max]`.
    ///
    /// * `state` - Render state.
    /// * `ray`   - The ray segment.
    fn transmittance(&self, state: &RenderState, ray: &Ray) -> Spectrum;
}

/// Atomic reference counted `VolumeIntegrator`.
pub type ArcVolumeIntegrator = Arc<dyn VolumeIntegrator>;

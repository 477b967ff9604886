//! Light

use crate::geometry::*;
use crate::interaction::*;
use crate::pbrt::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Atomic reference counted `Light`.
pub type ArcLight = Arc<dyn Light>;

/// Return value for `Light::illum_sample()`.
#[derive(Copy, Clone, Debug)]
pub struct LightSample {
    /// Radiance arriving at the shading point.
    pub col: Spectrum,

    /// Solid angle density of the sampled direction.
    pub pdf: Float,

    /// Shadow ray from the shading point towards the sampled point. `t_max`
    /// is the distance to the light.
    pub ray: Ray,
}

/// Return value for `Light::emit_photon()`.
#[derive(Copy, Clone, Debug)]
pub struct EmittedPhoton {
    /// Photon ray leaving the light.
    pub ray: Ray,

    /// Photon color.
    pub color: Spectrum,

    /// Inverse of the emission density.
    pub ipdf: Float,
}

/// Light trait provides the capabilities consumed by the integrators.
pub trait Light: Send + Sync {
    /// Emits a photon from four samples in [0, 1).
    ///
    /// * `s1` - First sample.
    /// * `s2` - Second sample.
    /// * `s3` - Third sample.
    /// * `s4` - Fourth sample.
    fn emit_photon(&self, s1: Float, s2: Float, s3: Float, s4: Float) -> EmittedPhoton;

    /// Returns the light color arriving at a point and the shadow ray to
    /// test. Only delta lights implement this.
    ///
    /// * `sp` - The shading point.
    fn illuminate(&self, _sp: &SurfacePoint) -> Option<(Spectrum, Ray)> {
        None
    }

    /// Samples a point on the light as seen from a shading point. Only area
    /// lights implement this.
    ///
    /// * `sp` - The shading point.
    /// * `s1` - First sample.
    /// * `s2` - Second sample.
    fn illum_sample(&self, _sp: &SurfacePoint, _s1: Float, _s2: Float) -> Option<LightSample> {
        None
    }

    /// Intersects a ray with the light. Returns the hit distance, the
    /// radiance and the inverse solid angle density of sampling that
    /// direction with `illum_sample()`.
    ///
    /// * `ray` - The ray.
    fn intersect(&self, _ray: &Ray) -> Option<(Float, Spectrum, Float)> {
        None
    }

    /// Returns the solid angle density of sampling `light_p` from `p`.
    ///
    /// * `p`       - Shading position.
    /// * `light_p` - Position on the light.
    /// * `light_n` - Light normal at `light_p`.
    fn illum_pdf(&self, _p: &Point3f, _light_p: &Point3f, _light_n: &Vector3f) -> Float {
        0.0
    }

    /// Returns the total emitted power.
    fn total_energy(&self) -> Spectrum;

    /// Returns true for lights with a single illumination direction.
    fn is_delta(&self) -> bool;

    /// Returns true if rays can hit the light.
    fn can_intersect(&self) -> bool {
        false
    }

    /// Number of light samples per shading point.
    fn n_samples(&self) -> usize {
        1
    }

    /// Returns true if the light casts shadows.
    fn casts_shadows(&self) -> bool {
        true
    }

    /// Returns true if the light takes part in caustic photon shooting.
    fn shoots_caustic_photons(&self) -> bool {
        true
    }

    /// Returns true if the light takes part in diffuse photon shooting.
    fn shoots_diffuse_photons(&self) -> bool {
        true
    }

    /// Returns true if the light only emits photons and is skipped for
    /// direct lighting.
    fn photon_only(&self) -> bool {
        false
    }
}

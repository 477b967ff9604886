//! Matte Material

use core::geometry::*;
use core::interaction::*;
use core::material::*;
use core::pbrt::*;
use core::render::*;
use core::sampling::*;
use core::spectrum::*;

/// Implements purely diffuse surfaces, optionally emitting light.
#[derive(Copy, Clone, Debug)]
pub struct MatteMaterial {
    /// Diffuse reflectance.
    color: Spectrum,

    /// Emitted radiance.
    emission: Spectrum,

    /// Lobes active everywhere on the surface.
    flags: BsdfFlags,
}

impl MatteMaterial {
    /// Create a new `MatteMaterial`.
    ///
    /// * `color` - Diffuse reflectance.
    pub fn new(color: Spectrum) -> Self {
        Self {
            color,
            emission: Spectrum::ZERO,
            flags: BsdfFlags::DIFFUSE | BsdfFlags::REFLECT,
        }
    }

    /// Makes the surface emit light.
    ///
    /// * `emission` - Emitted radiance.
    pub fn with_emission(mut self, emission: Spectrum) -> Self {
        self.emission = emission;
        if emission.is_black() {
            self.flags.remove(BsdfFlags::EMIT);
        } else {
            self.flags.insert(BsdfFlags::EMIT);
        }
        self
    }
}

impl Material for MatteMaterial {
    fn initialize_at_point(&self, _state: &RenderState, _sp: &SurfacePoint) -> MaterialData {
        MaterialData::new(self.flags)
    }

    /// Returns the Lambertian BSDF when both directions lie on the same
    /// side of the surface.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    /// * `wi`    - Incident direction.
    /// * `flags` - Lobes to evaluate.
    fn eval(
        &self,
        _state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
        wi: &Vector3f,
        flags: BsdfFlags,
    ) -> Spectrum {
        if !flags.contains(BsdfFlags::DIFFUSE) || sp.ng.dot(wo) * sp.ng.dot(wi) <= 0.0 {
            return Spectrum::ZERO;
        }
        self.color * INV_PI
    }

    /// Samples a cosine distributed direction on the side of `wo`.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    /// * `s`     - The sample.
    fn sample(
        &self,
        _state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
        s: &mut BsdfSample,
    ) -> (Vector3f, Spectrum, Float) {
        if !s.flags.contains(BsdfFlags::DIFFUSE) {
            s.pdf = 0.0;
            return (*wo, Spectrum::ZERO, 0.0);
        }

        let n = face_forward(&sp.ng, &sp.n, wo);
        let wi = cosine_sample_hemisphere(&n, &sp.nu, &sp.nv, s.s1, s.s2);
        let cos_theta = abs(wi.dot(&n));
        s.pdf = cosine_hemisphere_pdf(cos_theta);
        s.sampled_flags = BsdfFlags::DIFFUSE | BsdfFlags::REFLECT;
        if s.pdf <= PDF_EPSILON {
            return (wi, Spectrum::ZERO, 0.0);
        }
        (wi, self.color * INV_PI, cos_theta / s.pdf)
    }

    fn pdf(
        &self,
        _state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
        wi: &Vector3f,
        flags: BsdfFlags,
    ) -> Float {
        if !flags.contains(BsdfFlags::DIFFUSE) || sp.ng.dot(wo) * sp.ng.dot(wi) <= 0.0 {
            return 0.0;
        }
        let n = face_forward(&sp.ng, &sp.n, wo);
        cosine_hemisphere_pdf(abs(wi.dot(&n)))
    }

    /// Returns the emitted radiance.
    fn emit(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        _data: &MaterialData,
        _wo: &Vector3f,
    ) -> Spectrum {
        self.emission
    }
}

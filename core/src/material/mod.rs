//! Material

use crate::geometry::*;
use crate::interaction::*;
use crate::low_discrepancy::*;
use crate::pbrt::*;
use crate::render::*;
use crate::sampling::*;
use crate::spectrum::*;
use crate::volume::*;
use std::any::Any;
use std::sync::Arc;

mod bsdf_flags;
mod samples;

// Re-export
pub use bsdf_flags::*;
pub use samples::*;

/// Atomic reference counted `Material`.
pub type ArcMaterial = Arc<dyn Material>;

/// Per shading point state produced by `Material::initialize_at_point()`.
pub struct MaterialData {
    /// Lobes active at the point.
    pub bsdf_flags: BsdfFlags,

    /// Material specific scratch values.
    pub scratch: Box<dyn Any + Send + Sync>,
}

impl MaterialData {
    /// Returns `MaterialData` without scratch values.
    ///
    /// * `bsdf_flags` - Lobes active at the point.
    pub fn new(bsdf_flags: BsdfFlags) -> Self {
        Self {
            bsdf_flags,
            scratch: Box::new(()),
        }
    }

    /// Returns `MaterialData` carrying scratch values.
    ///
    /// * `bsdf_flags` - Lobes active at the point.
    /// * `scratch`    - Scratch values.
    pub fn with_scratch<T: Any + Send + Sync>(bsdf_flags: BsdfFlags, scratch: T) -> Self {
        Self {
            bsdf_flags,
            scratch: Box::new(scratch),
        }
    }

    /// Returns the scratch values if they have type `T`.
    pub fn scratch<T: Any>(&self) -> Option<&T> {
        self.scratch.downcast_ref::<T>()
    }
}

/// Material trait provides the scattering capabilities consumed by the
/// integrators. Directions always point away from the surface.
pub trait Material: Send + Sync {
    /// Prepares the material for shading at a surface point and returns the
    /// active lobes.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    fn initialize_at_point(&self, state: &RenderState, sp: &SurfacePoint) -> MaterialData;

    /// Evaluates the BSDF for a pair of directions restricted to `flags`.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    /// * `wi`    - Incident direction.
    /// * `flags` - Lobes to evaluate.
    fn eval(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        wi: &Vector3f,
        flags: BsdfFlags,
    ) -> Spectrum;

    /// Importance samples an incident direction. Returns the direction, the
    /// BSDF value and the sample weight `|cos| / pdf`. `s.pdf` and
    /// `s.sampled_flags` are filled in; a pdf of zero means no sample.
    ///
    /// * `state` - Render state. Supplies the wavelength for dispersion.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    /// * `s`     - The sample.
    fn sample(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        s: &mut BsdfSample,
    ) -> (Vector3f, Spectrum, Float);

    /// Samples the reflected and the transmitted lobe together. The default
    /// takes a single sample and files it under the lobe it came from.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    /// * `s`     - The sample.
    fn sample_reflect_transmit(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        s: &mut BsdfSample,
    ) -> SplitSample {
        let (dir, color, weight) = self.sample(state, sp, data, wo, s);
        let mut split = SplitSample::default();
        if s.pdf > PDF_EPSILON {
            let scattered = ScatteredDirection { dir, color, weight };
            if s.sampled_flags.contains(BsdfFlags::TRANSMIT) {
                split.transmit = Some(scattered);
            } else {
                split.reflect = Some(scattered);
            }
        }
        split
    }

    /// Returns the solid angle density of sampling `wi` restricted to `flags`.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    /// * `wi`    - Incident direction.
    /// * `flags` - Lobes to consider.
    fn pdf(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        wi: &Vector3f,
        flags: BsdfFlags,
    ) -> Float;

    /// Bounces a photon. Returns the new direction, with `s.color` holding
    /// the new photon color, or `None` when the photon is absorbed.
    ///
    /// The default samples the BSDF and plays Russian roulette on the ratio
    /// of the largest color component after and before the bounce.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wi`    - Direction the photon came from.
    /// * `s`     - The photon sample.
    fn scatter_photon(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wi: &Vector3f,
        s: &mut PhotonSample,
    ) -> Option<Vector3f> {
        let (wo, scol, w) = self.sample(state, sp, data, wi, &mut s.sample);
        if s.sample.pdf <= PDF_EPSILON {
            return None;
        }

        let cnew = s.lcol * s.transmittance * scol * w;
        let old_max = s.lcol.max_component_value();
        if old_max <= 0.0 {
            return None;
        }
        let prob = min(1.0, cnew.max_component_value() / old_max);
        if prob > 0.0 && s.s3 <= prob {
            s.color = cnew / prob;
            Some(wo)
        } else {
            None
        }
    }

    /// Enumerates the perfectly specular directions at the point.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    fn specular(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        _data: &MaterialData,
        _wo: &Vector3f,
    ) -> SpecularDirections {
        SpecularDirections::default()
    }

    /// Returns the volume behind the surface on the given side.
    ///
    /// * `inside` - True for the side opposite the geometric normal.
    fn volume_handler(&self, _inside: bool) -> Option<&dyn VolumeHandler> {
        None
    }

    /// Returns true if shadow rays may pass through the material.
    fn is_transparent(&self) -> bool {
        false
    }

    /// Returns the filter color applied to shadow rays passing through.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Direction of the shadow ray origin.
    fn transparency(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        _data: &MaterialData,
        _wo: &Vector3f,
    ) -> Spectrum {
        Spectrum::ZERO
    }

    /// Returns the coverage used for alpha output.
    fn alpha(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        _data: &MaterialData,
        _wo: &Vector3f,
    ) -> Float {
        1.0
    }

    /// Returns the emitted radiance towards `wo`.
    fn emit(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        _data: &MaterialData,
        _wo: &Vector3f,
    ) -> Spectrum {
        Spectrum::ZERO
    }

    /// Estimates the hemispherical reflectivity of the lobes in `flags` by
    /// sampling 16 stratified outgoing directions.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `flags` - Lobes to include. Must contain `REFLECT` or `TRANSMIT`.
    fn reflectivity(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        flags: BsdfFlags,
    ) -> Spectrum {
        if !(flags & (BsdfFlags::REFLECT | BsdfFlags::TRANSMIT)).matches(data.bsdf_flags) {
            return Spectrum::ZERO;
        }

        let mut total = Spectrum::ZERO;
        for i in 0..16_u64 {
            let s1 = 0.03125 + 0.0625 * (i & 3) as Float;
            let s2 = 0.03125 + 0.0625 * (i >> 2) as Float;
            let wo = cosine_sample_hemisphere(&sp.n, &sp.nu, &sp.nv, s1, s2);
            let mut s = BsdfSample::new(radical_inverse(2, i + 1), radical_inverse(3, i + 1), flags);
            let (_wi, col, w) = self.sample(state, sp, data, &wo, &mut s);
            if s.pdf > PDF_EPSILON {
                total += col * w;
            }
        }
        total * 0.0625
    }

    /// Returns true if the cosine term should be skipped for direct light.
    fn is_flat(&self) -> bool {
        false
    }

    /// Extra recursion depth this material grants beyond the integrator's.
    fn additional_depth(&self) -> usize {
        0
    }

    /// Returns the refraction origin offset and whether it scales with ray
    /// depth. `None` means use the integrator settings.
    fn transparent_bias(&self) -> Option<(Float, bool)> {
        None
    }

    /// Returns false for materials that ignore shadows.
    fn receives_shadows(&self) -> bool {
        true
    }
}

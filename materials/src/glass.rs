//! Glass Material

use super::BeerVolume;
use core::geometry::*;
use core::interaction::*;
use core::material::*;
use core::pbrt::*;
use core::render::*;
use core::spectrum::*;
use core::volume::*;

/// A smooth dielectric that reflects and refracts according to Fresnel's
/// equations, with optional chromatic dispersion and absorption.
#[derive(Copy, Clone, Debug)]
pub struct GlassMaterial {
    /// Index of refraction at the sodium D line.
    ior: Float,

    /// Color applied to refracted light.
    filter_color: Spectrum,

    /// Color applied to reflected light.
    mirror_color: Spectrum,

    /// Cauchy coefficients `(A, B)`. `B` is zero without dispersion.
    cauchy: (Float, Float),

    /// Lets shadow rays through, tinted by the filter color.
    fake_shadows: bool,

    /// Absorbing medium inside the surface.
    absorption: Option<BeerVolume>,

    /// Refraction origin offset and whether it scales with ray depth.
    transparent_bias: Option<(Float, bool)>,
}

impl GlassMaterial {
    /// Create a new clear `GlassMaterial`.
    ///
    /// * `ior` - Index of refraction.
    pub fn new(ior: Float) -> Self {
        Self {
            ior,
            filter_color: Spectrum::ONE,
            mirror_color: Spectrum::ONE,
            cauchy: (ior, 0.0),
            fake_shadows: false,
            absorption: None,
            transparent_bias: None,
        }
    }

    /// Sets the color applied to refracted light.
    ///
    /// * `filter_color` - The color.
    pub fn with_filter_color(mut self, filter_color: Spectrum) -> Self {
        self.filter_color = filter_color;
        self
    }

    /// Sets the color applied to reflected light.
    ///
    /// * `mirror_color` - The color.
    pub fn with_mirror_color(mut self, mirror_color: Spectrum) -> Self {
        self.mirror_color = mirror_color;
        self
    }

    /// Enables chromatic dispersion.
    ///
    /// * `dispersion_power` - Dispersion strength. Zero disables it.
    pub fn with_dispersion(mut self, dispersion_power: Float) -> Self {
        self.cauchy = cauchy_coefficients(self.ior, dispersion_power);
        debug!(
            "Glass dispersion A={} B={} for ior {}",
            self.cauchy.0, self.cauchy.1, self.ior
        );
        self
    }

    /// Lets shadow rays pass through the glass.
    ///
    /// * `fake_shadows` - True to enable.
    pub fn with_fake_shadows(mut self, fake_shadows: bool) -> Self {
        self.fake_shadows = fake_shadows;
        self
    }

    /// Fills the inside with an absorbing medium.
    ///
    /// * `color`    - Transmitted color after `distance`.
    /// * `distance` - Reference distance.
    pub fn with_absorption(mut self, color: Spectrum, distance: Float) -> Self {
        self.absorption = Some(BeerVolume::new(color, distance));
        self
    }

    /// Offsets refracted ray origins along their direction.
    ///
    /// * `factor`          - Offset distance.
    /// * `scale_with_depth` - Multiply the offset by the ray depth.
    pub fn with_transparent_bias(mut self, factor: Float, scale_with_depth: bool) -> Self {
        self.transparent_bias = Some((factor, scale_with_depth));
        self
    }

    /// Returns true if the index of refraction varies with wavelength.
    pub fn is_dispersive(&self) -> bool {
        self.cauchy.1 > 0.0
    }

    /// Returns the index of refraction for the current path. A path that
    /// already committed to a wavelength, or that is splitting one off now,
    /// sees the Cauchy index.
    ///
    /// * `state`     - Render state.
    /// * `splitting` - True if this bounce picks the wavelength.
    fn current_ior(&self, state: &RenderState, splitting: bool) -> Float {
        if self.is_dispersive() && (splitting || !state.chromatic) {
            cauchy_ior(state.wavelength, self.cauchy.0, self.cauchy.1)
        } else {
            self.ior
        }
    }

    fn lobes(&self) -> BsdfFlags {
        let mut flags = BsdfFlags::SPECULAR | BsdfFlags::REFLECT | BsdfFlags::TRANSMIT;
        if self.is_dispersive() {
            flags |= BsdfFlags::DISPERSIVE;
        }
        if self.fake_shadows {
            flags |= BsdfFlags::FILTER;
        }
        if self.absorption.is_some() {
            flags |= BsdfFlags::VOLUMETRIC;
        }
        flags
    }
}

impl Material for GlassMaterial {
    fn initialize_at_point(&self, _state: &RenderState, _sp: &SurfacePoint) -> MaterialData {
        MaterialData::new(self.lobes())
    }

    fn eval(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        _data: &MaterialData,
        _wo: &Vector3f,
        _wi: &Vector3f,
        _flags: BsdfFlags,
    ) -> Spectrum {
        Spectrum::ZERO
    }

    /// Chooses between reflection and refraction. With `SPECULAR` requested
    /// the choice is random with probability `0.01 + 0.99·Kr` for
    /// reflection. A request for `DISPERSIVE` without `SPECULAR` refracts
    /// deterministically at the wavelength in `state`.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    /// * `s`     - The sample.
    fn sample(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
        s: &mut BsdfSample,
    ) -> (Vector3f, Spectrum, Float) {
        s.pdf = 0.0;
        let splitting = self.is_dispersive() && state.chromatic && s.flags.contains(BsdfFlags::DISPERSIVE);
        let specular = s.flags.contains(BsdfFlags::SPECULAR);
        if !specular && !splitting {
            return (*wo, Spectrum::ZERO, 0.0);
        }

        let n = face_forward(&sp.ng, &sp.n, wo);
        let ior = self.current_ior(state, splitting);
        let (kr, kt) = fresnel(wo, &n, ior);
        let reflected = wo.reflect(&n);

        let Some(refracted) = wo.refract(&sp.n, ior) else {
            // Total internal reflection.
            if !s.flags.contains(BsdfFlags::REFLECT) {
                return (*wo, Spectrum::ZERO, 0.0);
            }
            s.pdf = 1.0;
            s.sampled_flags = BsdfFlags::SPECULAR | BsdfFlags::REFLECT;
            return (reflected, self.mirror_color, 1.0);
        };

        let transmit_flags = if splitting {
            BsdfFlags::DISPERSIVE | BsdfFlags::TRANSMIT
        } else {
            BsdfFlags::SPECULAR | BsdfFlags::TRANSMIT
        };

        if !specular {
            s.pdf = 1.0;
            s.sampled_flags = transmit_flags;
            return (refracted, self.filter_color * kt, 1.0);
        }

        let allow_r = s.flags.contains(BsdfFlags::REFLECT);
        let allow_t = s.flags.contains(BsdfFlags::TRANSMIT);
        let p_kr = 0.01 + 0.99 * kr;
        let p_kt = 1.0 - p_kr;

        if allow_t && (!allow_r || s.s1 < p_kt) {
            let pdf = if allow_r { p_kt } else { 1.0 };
            s.pdf = pdf;
            s.sampled_flags = transmit_flags;
            (refracted, self.filter_color * (kt / pdf), 1.0)
        } else if allow_r {
            let pdf = if allow_t { p_kr } else { 1.0 };
            s.pdf = pdf;
            s.sampled_flags = BsdfFlags::SPECULAR | BsdfFlags::REFLECT;
            (reflected, self.mirror_color * (kr / pdf), 1.0)
        } else {
            (*wo, Spectrum::ZERO, 0.0)
        }
    }

    fn pdf(
        &self,
        _state: &RenderState,
        _sp: &SurfacePoint,
        _data: &MaterialData,
        _wo: &Vector3f,
        _wi: &Vector3f,
        _flags: BsdfFlags,
    ) -> Float {
        0.0
    }

    /// Enumerates the mirror and the refracted direction. While the path is
    /// still chromatic, dispersive glass leaves refraction to the wavelength
    /// splitting pass.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Per point data.
    /// * `wo`    - Outgoing direction.
    fn specular(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
    ) -> SpecularDirections {
        let n = face_forward(&sp.ng, &sp.n, wo);
        let ior = self.current_ior(state, false);
        let reflected = wo.reflect(&n);

        match wo.refract(&sp.n, ior) {
            Some(refracted) => {
                let (kr, kt) = fresnel(wo, &n, ior);
                let refract = if self.is_dispersive() && state.chromatic {
                    None
                } else {
                    Some((refracted, self.filter_color * kt))
                };
                SpecularDirections {
                    reflect: Some((reflected, self.mirror_color * kr)),
                    refract,
                }
            }
            None => SpecularDirections {
                reflect: Some((reflected, self.mirror_color)),
                refract: None,
            },
        }
    }

    fn volume_handler(&self, inside: bool) -> Option<&dyn VolumeHandler> {
        if inside {
            self.absorption.as_ref().map(|v| v as &dyn VolumeHandler)
        } else {
            None
        }
    }

    fn is_transparent(&self) -> bool {
        self.fake_shadows
    }

    /// Shadow rays keep the Fresnel transmitted share times the filter
    /// color.
    fn transparency(
        &self,
        _state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
    ) -> Spectrum {
        let n = face_forward(&sp.ng, &sp.n, wo);
        let (_kr, kt) = fresnel(wo, &n, self.ior);
        self.filter_color * kt
    }

    fn transparent_bias(&self) -> Option<(Float, bool)> {
        self.transparent_bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use std::sync::Arc;

    fn point_on(material: ArcMaterial) -> SurfacePoint {
        let n = Vector3f::new(0.0, 0.0, 1.0);
        let geometry = SurfaceGeometry {
            p: Point3f::zero(),
            ng: n,
            n,
            dpdu: Vector3f::new(1.0, 0.0, 0.0),
            dpdv: Vector3f::new(0.0, 1.0, 0.0),
            u: 0.0,
            v: 0.0,
        };
        SurfacePoint::new(geometry, material, 0)
    }

    #[test]
    fn normal_incidence_splits_energy() {
        let glass = GlassMaterial::new(1.5);
        let sp = point_on(Arc::new(glass));
        let state = RenderState::new(0, 0);
        let data = glass.initialize_at_point(&state, &sp);
        let wo = Vector3f::new(0.0, 0.0, 1.0);

        let spec = glass.specular(&state, &sp, &data, &wo);
        let (rdir, rcol) = spec.reflect.unwrap();
        let (tdir, tcol) = spec.refract.unwrap();
        assert!(approx_eq!(f32, rdir.z, 1.0, epsilon = 1e-5));
        assert!(approx_eq!(f32, tdir.z, -1.0, epsilon = 1e-5));
        assert!(approx_eq!(f32, rcol.g(), 0.04, epsilon = 1e-4));
        assert!(approx_eq!(f32, tcol.g(), 0.96, epsilon = 1e-4));
    }

    #[test]
    fn total_internal_reflection() {
        let glass = GlassMaterial::new(1.5);
        let sp = point_on(Arc::new(glass));
        let state = RenderState::new(0, 0);
        let data = glass.initialize_at_point(&state, &sp);
        // Leaving the glass at a grazing angle.
        let wo = Vector3f::new(0.9, 0.0, -0.4358899).normalize();
        let spec = glass.specular(&state, &sp, &data, &wo);
        assert!(spec.refract.is_none());
        let (dir, col) = spec.reflect.unwrap();
        assert_eq!(col, Spectrum::ONE);
        assert!(dir.z < 0.0);

        let mut s = BsdfSample::new(0.5, 0.5, BsdfFlags::ALL);
        glass.sample(&state, &sp, &data, &wo, &mut s);
        assert_eq!(s.sampled_flags, BsdfFlags::SPECULAR | BsdfFlags::REFLECT);
    }

    #[test]
    fn sampling_is_unbiased_per_lobe() {
        let glass = GlassMaterial::new(1.5).with_filter_color(Spectrum::rgb(1.0, 0.5, 0.5));
        let sp = point_on(Arc::new(glass));
        let state = RenderState::new(0, 0);
        let data = glass.initialize_at_point(&state, &sp);
        let wo = Vector3f::new(0.0, 0.0, 1.0);

        let mut s = BsdfSample::new(0.0, 0.5, BsdfFlags::ALL);
        let (dir, col, w) = glass.sample(&state, &sp, &data, &wo, &mut s);
        assert!(dir.z < 0.0);
        assert!(s.sampled_flags.contains(BsdfFlags::TRANSMIT));
        // Expected value over both lobes is filter · kt.
        assert!(approx_eq!(f32, (col * w * s.pdf).g(), 0.5 * 0.96, epsilon = 1e-4));

        let mut s = BsdfSample::new(0.999, 0.5, BsdfFlags::ALL);
        let (dir, col, w) = glass.sample(&state, &sp, &data, &wo, &mut s);
        assert!(dir.z > 0.0);
        assert!(approx_eq!(f32, (col * w * s.pdf).g(), 0.04, epsilon = 1e-4));

        let mut s = BsdfSample::new(0.5, 0.5, BsdfFlags::DIFFUSE | BsdfFlags::REFLECT);
        glass.sample(&state, &sp, &data, &wo, &mut s);
        assert_eq!(s.pdf, 0.0);
    }

    #[test]
    fn dispersion_defers_refraction_while_chromatic() {
        let glass = GlassMaterial::new(1.5).with_dispersion(30.0);
        let sp = point_on(Arc::new(glass));
        let mut state = RenderState::new(0, 0);
        let data = glass.initialize_at_point(&state, &sp);
        assert!(data.bsdf_flags.contains(BsdfFlags::DISPERSIVE));
        let wo = Vector3f::new(0.6, 0.0, 0.8);

        let spec = glass.specular(&state, &sp, &data, &wo);
        assert!(spec.reflect.is_some());
        assert!(spec.refract.is_none());

        let flags = BsdfFlags::REFLECT | BsdfFlags::TRANSMIT | BsdfFlags::DISPERSIVE;
        state.wavelength = 0.05;
        let mut s = BsdfSample::new(0.5, 0.5, flags);
        let (blue, _, _) = glass.sample(&state, &sp, &data, &wo, &mut s);
        assert_eq!(s.sampled_flags, BsdfFlags::DISPERSIVE | BsdfFlags::TRANSMIT);
        state.wavelength = 0.95;
        let mut s = BsdfSample::new(0.5, 0.5, flags);
        let (red, _, _) = glass.sample(&state, &sp, &data, &wo, &mut s);
        // Shorter wavelengths bend more towards the normal.
        assert!(abs(blue.x) < abs(red.x));

        state.chromatic = false;
        let spec = glass.specular(&state, &sp, &data, &wo);
        assert!(spec.refract.is_some());
    }

    #[test]
    fn fake_shadows_and_absorption() {
        let glass = GlassMaterial::new(1.5)
            .with_fake_shadows(true)
            .with_absorption(Spectrum::new(0.5), 1.0);
        let sp = point_on(Arc::new(glass));
        let state = RenderState::new(0, 0);
        let data = glass.initialize_at_point(&state, &sp);
        assert!(glass.is_transparent());
        assert!(data.bsdf_flags.contains(BsdfFlags::FILTER | BsdfFlags::VOLUMETRIC));
        assert!(glass.volume_handler(true).is_some());
        assert!(glass.volume_handler(false).is_none());
        assert!(!GlassMaterial::new(1.5).is_transparent());
    }

    #[test]
    fn mirror_color_and_transparent_bias() {
        let glass = GlassMaterial::new(1.5)
            .with_mirror_color(Spectrum::rgb(1.0, 0.5, 0.0))
            .with_transparent_bias(0.01, true);
        let sp = point_on(Arc::new(glass));
        let state = RenderState::new(0, 0);
        let data = glass.initialize_at_point(&state, &sp);
        let wo = Vector3f::new(0.0, 0.0, 1.0);

        let (_, rcol) = glass.specular(&state, &sp, &data, &wo).reflect.unwrap();
        assert!(approx_eq!(f32, rcol.r(), 0.04, epsilon = 1e-4));
        assert!(approx_eq!(f32, rcol.g(), 0.02, epsilon = 1e-4));
        assert_eq!(rcol.b(), 0.0);
        assert_eq!(glass.transparent_bias(), Some((0.01, true)));
        assert_eq!(GlassMaterial::new(1.5).transparent_bias(), None);
    }
}

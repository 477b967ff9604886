//! Glossy Material

use core::geometry::*;
use core::interaction::*;
use core::material::*;
use core::pbrt::*;
use core::render::*;
use core::sampling::*;
use core::spectrum::*;

/// A diffuse base under a normalized Phong lobe around the mirror
/// direction.
#[derive(Copy, Clone, Debug)]
pub struct GlossyMaterial {
    /// Diffuse reflectance.
    diffuse: Spectrum,

    /// Glossy reflectance.
    glossy: Spectrum,

    /// Phong exponent. Larger values give sharper highlights.
    exponent: Float,

    /// Probability of sampling the diffuse lobe when both are requested.
    diffuse_prob: Float,
}

impl GlossyMaterial {
    /// Create a new `GlossyMaterial`.
    ///
    /// * `diffuse`  - Diffuse reflectance.
    /// * `glossy`   - Glossy reflectance.
    /// * `exponent` - Phong exponent.
    pub fn new(diffuse: Spectrum, glossy: Spectrum, exponent: Float) -> Self {
        let d = diffuse.max_component_value();
        let g = glossy.max_component_value();
        let diffuse_prob = if d + g > 0.0 { d / (d + g) } else { 0.5 };
        Self {
            diffuse,
            glossy,
            exponent: max(exponent, 0.0),
            diffuse_prob,
        }
    }

    /// Returns the active lobes.
    fn flags(&self) -> BsdfFlags {
        let mut flags = BsdfFlags::REFLECT;
        if !self.diffuse.is_black() {
            flags |= BsdfFlags::DIFFUSE;
        }
        if !self.glossy.is_black() {
            flags |= BsdfFlags::GLOSSY;
        }
        flags
    }

    /// Returns the probabilities of sampling the diffuse and the glossy lobe
    /// restricted to `flags`.
    fn lobe_probs(&self, flags: BsdfFlags) -> (Float, Float) {
        let use_d = flags.contains(BsdfFlags::DIFFUSE) && !self.diffuse.is_black();
        let use_g = flags.contains(BsdfFlags::GLOSSY) && !self.glossy.is_black();
        match (use_d, use_g) {
            (true, true) => (self.diffuse_prob, 1.0 - self.diffuse_prob),
            (true, false) => (1.0, 0.0),
            (false, true) => (0.0, 1.0),
            (false, false) => (0.0, 0.0),
        }
    }

    /// Value of the normalized Phong lobe.
    fn phong(&self, cos_alpha: Float) -> Float {
        if cos_alpha <= 0.0 {
            0.0
        } else {
            (self.exponent + 2.0) * INV_TWO_PI * cos_alpha.powf(self.exponent)
        }
    }

    /// Density of sampling a direction at angle `alpha` from the lobe axis.
    fn phong_pdf(&self, cos_alpha: Float) -> Float {
        if cos_alpha <= 0.0 {
            0.0
        } else {
            (self.exponent + 1.0) * INV_TWO_PI * cos_alpha.powf(self.exponent)
        }
    }

    fn eval_lobes(&self, n: &Vector3f, wo: &Vector3f, wi: &Vector3f, probs: (Float, Float)) -> Spectrum {
        let mut col = Spectrum::ZERO;
        if probs.0 > 0.0 {
            col += self.diffuse * INV_PI;
        }
        if probs.1 > 0.0 {
            col += self.glossy * self.phong(wo.reflect(n).dot(wi));
        }
        col
    }

    fn pdf_lobes(&self, n: &Vector3f, wo: &Vector3f, wi: &Vector3f, probs: (Float, Float)) -> Float {
        probs.0 * cosine_hemisphere_pdf(abs(wi.dot(n))) + probs.1 * self.phong_pdf(wo.reflect(n).dot(wi))
    }
}

impl Material for GlossyMaterial {
    fn initialize_at_point(&self, _state: &RenderState, _sp: &SurfacePoint) -> MaterialData {
        MaterialData::new(self.flags())
    }

    fn eval(
        &self,
        _state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
        wi: &Vector3f,
        flags: BsdfFlags,
    ) -> Spectrum {
        if sp.ng.dot(wo) * sp.ng.dot(wi) <= 0.0 {
            return Spectrum::ZERO;
        }
        let n = face_forward(&sp.ng, &sp.n, wo);
        self.eval_lobes(&n, wo, wi, self.lobe_probs(flags))
    }

    /// Picks a lobe with `s1`, then samples a direction from it. The
    /// returned color and pdf cover every requested lobe.
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
        s.pdf = 0.0;
        let probs = self.lobe_probs(s.flags);
        if probs.0 + probs.1 <= 0.0 {
            return (*wo, Spectrum::ZERO, 0.0);
        }

        let n = face_forward(&sp.ng, &sp.n, wo);
        let wi = if s.s1 < probs.0 {
            let s1 = s.s1 / probs.0;
            s.sampled_flags = BsdfFlags::DIFFUSE | BsdfFlags::REFLECT;
            cosine_sample_hemisphere(&n, &sp.nu, &sp.nv, s1, s.s2)
        } else {
            let s1 = (s.s1 - probs.0) / probs.1;
            s.sampled_flags = BsdfFlags::GLOSSY | BsdfFlags::REFLECT;
            let axis = wo.reflect(&n);
            let (u, v) = axis.coordinate_system();
            let cos_alpha = min(1.0, s1).powf(1.0 / (self.exponent + 1.0));
            let sin_alpha = max(0.0, 1.0 - cos_alpha * cos_alpha).sqrt();
            let phi = TWO_PI * s.s2;
            (u * phi.cos() + v * phi.sin()) * sin_alpha + axis * cos_alpha
        };

        let cos_theta = wi.dot(&n);
        if cos_theta <= 0.0 {
            return (wi, Spectrum::ZERO, 0.0);
        }

        s.pdf = self.pdf_lobes(&n, wo, &wi, probs);
        if s.pdf <= PDF_EPSILON {
            return (wi, Spectrum::ZERO, 0.0);
        }
        (wi, self.eval_lobes(&n, wo, &wi, probs), cos_theta / s.pdf)
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
        if sp.ng.dot(wo) * sp.ng.dot(wi) <= 0.0 {
            return 0.0;
        }
        let n = face_forward(&sp.ng, &sp.n, wo);
        self.pdf_lobes(&n, wo, wi, self.lobe_probs(flags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::rng::*;
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
    fn lobes_follow_colors() {
        let state = RenderState::new(0, 0);
        let m = GlossyMaterial::new(Spectrum::new(0.5), Spectrum::ZERO, 20.0);
        let sp = point_on(Arc::new(m));
        let flags = m.initialize_at_point(&state, &sp).bsdf_flags;
        assert!(flags.contains(BsdfFlags::DIFFUSE));
        assert!(!flags.contains(BsdfFlags::GLOSSY));

        let m = GlossyMaterial::new(Spectrum::new(0.3), Spectrum::new(0.3), 20.0);
        let flags = m.initialize_at_point(&state, &sp).bsdf_flags;
        assert!(flags.contains(BsdfFlags::DIFFUSE | BsdfFlags::GLOSSY | BsdfFlags::REFLECT));
    }

    #[test]
    fn highlight_peaks_at_mirror_direction() {
        let state = RenderState::new(0, 0);
        let m = GlossyMaterial::new(Spectrum::ZERO, Spectrum::new(0.5), 50.0);
        let sp = point_on(Arc::new(m));
        let data = m.initialize_at_point(&state, &sp);
        let wo = Vector3f::new(0.6, 0.0, 0.8);
        let mirror = Vector3f::new(-0.6, 0.0, 0.8);
        let off = Vector3f::new(0.0, 0.6, 0.8);
        let peak = m.eval(&state, &sp, &data, &wo, &mirror, BsdfFlags::ALL);
        let side = m.eval(&state, &sp, &data, &wo, &off, BsdfFlags::ALL);
        assert!(peak.g() > side.g());
        assert!(approx_eq!(f32, peak.g(), 0.5 * 52.0 * INV_TWO_PI, epsilon = 1e-3));
        assert!(m.eval(&state, &sp, &data, &wo, &mirror, BsdfFlags::DIFFUSE).is_black());
    }

    #[test]
    fn sample_pdf_is_consistent() {
        let state = RenderState::new(0, 0);
        let m = GlossyMaterial::new(Spectrum::new(0.4), Spectrum::new(0.4), 10.0);
        let sp = point_on(Arc::new(m));
        let data = m.initialize_at_point(&state, &sp);
        let wo = Vector3f::new(0.0, 0.6, 0.8);
        let mut rng = RNG::new(23);
        for _ in 0..128 {
            let mut s = BsdfSample::new(rng.uniform_float(), rng.uniform_float(), BsdfFlags::ALL);
            let (wi, col, w) = m.sample(&state, &sp, &data, &wo, &mut s);
            if s.pdf > PDF_EPSILON {
                let pdf = m.pdf(&state, &sp, &data, &wo, &wi, BsdfFlags::ALL);
                assert!((pdf - s.pdf).abs() <= 1e-3 * s.pdf.max(1.0));
                assert!(w > 0.0);
                assert!(!col.has_nans());
            }
        }
    }
}

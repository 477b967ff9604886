//! Mirror Material

use core::geometry::*;
use core::interaction::*;
use core::material::*;
use core::pbrt::*;
use core::render::*;
use core::spectrum::*;

/// A perfect specular reflector.
#[derive(Copy, Clone, Debug)]
pub struct MirrorMaterial {
    /// Reflected color.
    color: Spectrum,
}

impl MirrorMaterial {
    /// Create a new `MirrorMaterial`.
    ///
    /// * `color` - Reflected color.
    pub fn new(color: Spectrum) -> Self {
        Self { color }
    }

    fn reflect_dir(sp: &SurfacePoint, wo: &Vector3f) -> Vector3f {
        let n = face_forward(&sp.ng, &sp.n, wo);
        wo.reflect(&n)
    }
}

impl Material for MirrorMaterial {
    fn initialize_at_point(&self, _state: &RenderState, _sp: &SurfacePoint) -> MaterialData {
        MaterialData::new(BsdfFlags::SPECULAR | BsdfFlags::REFLECT)
    }

    /// A delta distribution evaluates to zero for any pair of directions.
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

    /// Returns the mirror direction when specular lobes are requested.
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
        if !s.flags.contains(BsdfFlags::SPECULAR | BsdfFlags::REFLECT) {
            s.pdf = 0.0;
            return (*wo, Spectrum::ZERO, 0.0);
        }
        s.pdf = 1.0;
        s.sampled_flags = BsdfFlags::SPECULAR | BsdfFlags::REFLECT;
        (Self::reflect_dir(sp, wo), self.color, 1.0)
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

    fn specular(
        &self,
        _state: &RenderState,
        sp: &SurfacePoint,
        _data: &MaterialData,
        wo: &Vector3f,
    ) -> SpecularDirections {
        SpecularDirections {
            reflect: Some((Self::reflect_dir(sp, wo), self.color)),
            refract: None,
        }
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
    fn reflects_about_normal() {
        let mirror = MirrorMaterial::new(Spectrum::new(0.9));
        let sp = point_on(Arc::new(mirror));
        let state = RenderState::new(0, 0);
        let data = mirror.initialize_at_point(&state, &sp);
        let wo = Vector3f::new(0.6, 0.0, 0.8);

        let spec = mirror.specular(&state, &sp, &data, &wo);
        let (dir, col) = spec.reflect.unwrap();
        assert!(approx_eq!(f32, dir.x, -0.6, epsilon = 1e-5));
        assert!(approx_eq!(f32, dir.z, 0.8, epsilon = 1e-5));
        assert_eq!(col, Spectrum::new(0.9));
        assert!(spec.refract.is_none());

        // From below the surface the mirror faces the other way.
        let spec = mirror.specular(&state, &sp, &data, &Vector3f::new(0.6, 0.0, -0.8));
        assert!(spec.reflect.unwrap().0.z < 0.0);
    }

    #[test]
    fn diffuse_only_sample_fails() {
        let mirror = MirrorMaterial::new(Spectrum::new(0.9));
        let sp = point_on(Arc::new(mirror));
        let state = RenderState::new(0, 0);
        let data = mirror.initialize_at_point(&state, &sp);
        let mut s = BsdfSample::new(0.5, 0.5, BsdfFlags::DIFFUSE | BsdfFlags::REFLECT);
        mirror.sample(&state, &sp, &data, &Vector3f::new(0.0, 0.0, 1.0), &mut s);
        assert_eq!(s.pdf, 0.0);
        assert!(mirror.reflectivity(&state, &sp, &data, BsdfFlags::DIFFUSE | BsdfFlags::REFLECT).is_black());
    }
}

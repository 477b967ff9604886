//! Scene

use crate::accelerator::*;
use crate::geometry::*;
use crate::interaction::*;
use crate::light::*;
use crate::pbrt::*;
use crate::render::*;
use crate::spectrum::*;
use crate::volume::*;
use std::sync::Arc;

/// Self intersection offsets for shadow and continuation rays.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BiasOptions {
    /// Minimum distance for shadow rays.
    pub shadow_bias: Float,

    /// Scale `shadow_bias` with the distance of the origin from the world
    /// origin.
    pub shadow_bias_auto: bool,

    /// Minimum distance for continuation rays.
    pub ray_min_dist: Float,

    /// Scale `ray_min_dist` with the distance of the origin from the world
    /// origin.
    pub ray_min_dist_auto: bool,
}

impl Default for BiasOptions {
    fn default() -> Self {
        Self {
            shadow_bias: 0.0005,
            shadow_bias_auto: true,
            ray_min_dist: 0.00005,
            ray_min_dist_auto: true,
        }
    }
}

/// Scene.
#[derive(Clone)]
pub struct Scene {
    /// Spatial index of all primitives.
    pub accelerator: ArcAccelerator,

    /// All light sources in the scene.
    pub lights: Vec<ArcLight>,

    /// Optional volume integrator applied to eye rays.
    pub volume_integrator: Option<ArcVolumeIntegrator>,

    /// The bounding box of the scene geometry.
    pub world_bound: Bounds3f,

    /// Self intersection offsets.
    pub bias: BiasOptions,
}

impl Scene {
    /// Creates a new `Scene`.
    ///
    /// * `accelerator` - Spatial index of all primitives.
    /// * `lights`      - All light sources in the scene.
    pub fn new(accelerator: ArcAccelerator, lights: Vec<ArcLight>) -> Self {
        Self {
            world_bound: accelerator.bounds(),
            accelerator,
            lights,
            volume_integrator: None,
            bias: BiasOptions::default(),
        }
    }

    /// Returns the scene with a volume integrator.
    ///
    /// * `volume_integrator` - The volume integrator.
    pub fn with_volume_integrator(mut self, volume_integrator: ArcVolumeIntegrator) -> Self {
        self.volume_integrator = Some(volume_integrator);
        self
    }

    /// Returns the scene with different bias options.
    ///
    /// * `bias` - Self intersection offsets.
    pub fn with_bias(mut self, bias: BiasOptions) -> Self {
        self.bias = bias;
        self
    }

    /// Returns the lights that contribute direct lighting.
    pub fn direct_lights(&self) -> Vec<ArcLight> {
        self.lights
            .iter()
            .filter(|l| !l.photon_only())
            .map(Arc::clone)
            .collect()
    }

    /// Returns the center and radius of the world bounding sphere.
    pub fn world_sphere(&self) -> (Point3f, Float) {
        self.world_bound.bounding_sphere()
    }

    /// Returns the shadow ray bias for a shading position.
    ///
    /// * `p` - Shading position.
    pub fn shadow_bias(&self, p: &Point3f) -> Float {
        auto_bias(self.bias.shadow_bias, self.bias.shadow_bias_auto, p)
    }

    /// Returns the minimum distance for continuation rays leaving `p`.
    ///
    /// * `p` - Ray origin.
    pub fn ray_min_dist(&self, p: &Point3f) -> Float {
        auto_bias(self.bias.ray_min_dist, self.bias.ray_min_dist_auto, p)
    }

    /// Traces the ray into the scene and returns the closest hit.
    ///
    /// * `ray` - The ray to trace.
    pub fn intersect(&self, ray: &Ray) -> Option<(SurfacePoint, Float)> {
        self.accelerator.intersect(ray)
    }

    /// Returns true if the shadow ray is blocked.
    ///
    /// * `ray`  - The shadow ray.
    /// * `bias` - Hits closer than this are ignored.
    pub fn is_shadowed(&self, ray: &Ray, bias: Float) -> bool {
        self.accelerator.is_shadowed(ray, bias).0
    }

    /// Returns whether the shadow ray is blocked and the accumulated filter
    /// color of transparent occluders.
    ///
    /// * `state`     - Render state.
    /// * `ray`       - The shadow ray.
    /// * `max_depth` - Maximum number of transparent layers.
    /// * `bias`      - Hits closer than this are ignored.
    pub fn is_shadowed_transparent(
        &self,
        state: &RenderState,
        ray: &Ray,
        max_depth: usize,
        bias: Float,
    ) -> (bool, Spectrum) {
        let (shadowed, filter, _) = self
            .accelerator
            .is_shadowed_transparent(state, ray, max_depth, bias);
        (shadowed, filter)
    }

    /// Returns the volume integrator transmittance along a ray, or white.
    ///
    /// * `state` - Render state.
    /// * `ray`   - The ray segment.
    pub fn volume_transmittance(&self, state: &RenderState, ray: &Ray) -> Spectrum {
        self.volume_integrator
            .as_ref()
            .map_or(Spectrum::ONE, |vi| vi.transmittance(state, ray))
    }
}

/// Scales a bias with the distance of `p` from the world origin when `auto`
/// is set, so that it stays above the float precision of the position.
///
/// * `bias` - Base bias.
/// * `auto` - Scale with position.
/// * `p`    - Position.
pub fn auto_bias(bias: Float, auto: bool, p: &Point3f) -> Float {
    if auto {
        bias * max(1.0, Vector3f::from(*p).length())
    } else {
        bias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    /// An empty unit box.
    struct Nothing;

    impl Accelerator for Nothing {
        fn bounds(&self) -> Bounds3f {
            bounds3(Point3f::new(-1.0, -1.0, -1.0), Point3f::new(1.0, 1.0, 1.0))
        }

        fn intersect(&self, _ray: &Ray) -> Option<(SurfacePoint, Float)> {
            None
        }

        fn is_shadowed(&self, _ray: &Ray, _bias: Float) -> (bool, Option<usize>) {
            (false, None)
        }

        fn is_shadowed_transparent(
            &self,
            _state: &RenderState,
            _ray: &Ray,
            _max_depth: usize,
            _bias: Float,
        ) -> (bool, Spectrum, Option<usize>) {
            (false, Spectrum::ONE, None)
        }
    }

    /// Halves the light per unit of ray length.
    struct Fog;

    impl VolumeIntegrator for Fog {
        fn transmittance(&self, _state: &RenderState, ray: &Ray) -> Spectrum {
            Spectrum::new(0.5_f32.powf(ray.t_max - ray.t_min))
        }
    }

    #[test]
    fn auto_bias_grows_with_distance() {
        let near = Point3f::new(0.1, 0.2, 0.0);
        let far = Point3f::new(0.0, 300.0, 400.0);
        assert_eq!(auto_bias(0.001, true, &near), 0.001);
        assert!(approx_eq!(f32, auto_bias(0.001, true, &far), 0.5, epsilon = 1e-5));
        assert_eq!(auto_bias(0.001, false, &far), 0.001);
    }

    #[test]
    fn bias_options_and_volume() {
        let state = RenderState::new(0, 0);
        let ray = Ray::segment(Point3f::ZERO, Vector3f::new(1.0, 0.0, 0.0), 0.0, 2.0);
        let far = Point3f::new(0.0, 0.0, 10.0);

        let scene = Scene::new(Arc::new(Nothing), vec![]);
        assert_eq!(scene.volume_transmittance(&state, &ray), Spectrum::ONE);
        assert!(approx_eq!(f32, scene.shadow_bias(&far), 0.005, epsilon = 1e-6));
        assert!(approx_eq!(f32, scene.world_sphere().1, Float::sqrt(3.0), epsilon = 1e-5));

        let bias = BiasOptions {
            shadow_bias: 0.01,
            shadow_bias_auto: false,
            ..BiasOptions::default()
        };
        let scene = Scene::new(Arc::new(Nothing), vec![])
            .with_bias(bias)
            .with_volume_integrator(Arc::new(Fog));
        assert_eq!(scene.shadow_bias(&far), 0.01);
        assert!(approx_eq!(f32, scene.ray_min_dist(&far), 0.0005, epsilon = 1e-6));
        assert!(approx_eq!(f32, scene.volume_transmittance(&state, &ray).g(), 0.25, epsilon = 1e-6));
        assert!(scene.intersect(&ray).is_none());
        assert!(!scene.is_shadowed(&ray, 0.0));
    }
}

//! Direct Lighting Integrator

use crate::monte_carlo::*;
use core::error::*;
use core::geometry::*;
use core::integrator::*;
use core::material::*;
use core::parallel::*;
use core::pbrt::*;
use core::photon::*;
use core::render::*;
use core::scene::*;
use core::spectrum::*;
use std::sync::Arc;

/// Implements the direct lighting integrator. Indirect light is limited to
/// caustic photons and recursion into glossy, specular and dispersive
/// lobes.
pub struct DirectLightIntegrator {
    /// Common data for Monte Carlo integrators.
    pub data: MonteCarloData,

    /// Processing mode used by the last `preprocess()`.
    processing: PhotonMapProcessing,
}

impl DirectLightIntegrator {
    /// Create a new `DirectLightIntegrator`.
    ///
    /// * `scene`   - The scene.
    /// * `options` - Monte Carlo settings.
    pub fn new(scene: Arc<Scene>, options: MonteCarloOptions) -> Self {
        let processing = options.photon_maps_processing;
        Self {
            data: MonteCarloData::new(scene, options),
            processing,
        }
    }

    /// Returns the caustic map.
    pub fn caustic_map(&self) -> &PhotonMap {
        &self.data.caustic_map
    }

    /// Returns the processing mode used by the last `preprocess()`.
    pub fn processing(&self) -> PhotonMapProcessing {
        self.processing
    }
}

impl MonteCarloIntegrator for DirectLightIntegrator {
    /// Returns the common data.
    fn get_data(&self) -> &MonteCarloData {
        &self.data
    }
}

impl SurfaceIntegrator for DirectLightIntegrator {
    fn name(&self) -> &'static str {
        "DirectLight"
    }

    fn scene(&self) -> &Scene {
        &self.data.scene
    }

    /// Shoots caustic photons when caustics are enabled.
    ///
    /// * `control` - Progress counter and cancellation flag.
    fn preprocess(&mut self, control: &RenderControl) -> Result<()> {
        if !self.data.options.use_caustics {
            return Ok(());
        }
        match self.data.prepare_caustic_map(control) {
            Ok(mode) => {
                self.processing = mode;
                Ok(())
            }
            Err(e) => {
                self.data.caustic_map.clear();
                Err(e)
            }
        }
    }

    /// Returns the incident radiance and alpha along a ray.
    ///
    /// * `state`            - Render state.
    /// * `ray`              - The ray.
    /// * `additional_depth` - Extra recursion depth.
    /// * `layers`           - Optional debug layers.
    fn integrate(
        &self,
        state: &mut RenderState,
        ray: &Ray,
        additional_depth: usize,
        mut layers: Option<&mut ColorLayers>,
    ) -> (Spectrum, Float) {
        let scene = &self.data.scene;

        // Find closest ray intersection or return background radiance.
        let Some((sp, t)) = scene.intersect(ray) else {
            return (Spectrum::ZERO, self.miss_alpha());
        };

        let old_include_lights = state.include_lights;
        if state.ray_level == 0 {
            state.chromatic = true;
            state.include_lights = true;
        }

        let top_level = state.ray_level == 0;
        let wo = -ray.d;
        let material = Arc::clone(&sp.material);
        let data = material.initialize_at_point(state, &sp);
        let bsdfs = data.bsdf_flags;
        let additional_depth = max(additional_depth, material.additional_depth());

        let mut col = Spectrum::ZERO;
        if bsdfs.contains(BsdfFlags::EMIT) {
            col += record_set(&mut layers, LayerKind::Emit, material.emit(state, &sp, &data, &wo), top_level);
        }

        if bsdfs.contains(BsdfFlags::DIFFUSE) {
            col += self.estimate_all_direct_light(state, &sp, &data, &wo, &mut layers);
            if self.data.options.use_caustics {
                col += self.caustic_photons(state, &sp, &data, &wo, &mut layers);
            }
        }

        let (rcol, ralpha) = self.recursive_raytrace(state, &sp, &data, &wo, additional_depth, &mut layers);
        col += rcol;
        let alpha = self.hit_alpha(state, &sp, &data, &wo, ralpha);

        state.include_lights = old_include_lights;
        let transmittance = scene.volume_transmittance(state, &Ray::segment(ray.o, ray.d, ray.t_min, t));
        (col * transmittance, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photon_shooting::*;
    use crate::test_scenes::*;
    use float_cmp::approx_eq;

    fn no_caustics() -> MonteCarloOptions {
        MonteCarloOptions {
            use_caustics: false,
            n_threads: 1,
            n_threads_photons: 1,
            ..MonteCarloOptions::default()
        }
    }

    /// Radiance leaving a Lambertian point centered under a square light
    /// of side `2a` at height `h`.
    fn analytic_radiance(albedo: Float, radiance: Float, a: Float, h: Float) -> Float {
        let x = a / h;
        let s = (1.0 + x * x).sqrt();
        let form_factor = (x / s * (x / s).atan()) / PI;
        albedo * radiance * 4.0 * form_factor
    }

    #[test]
    fn area_light_matches_analytic_direct_lighting() {
        let integrator = DirectLightIntegrator::new(lit_plane(0.8, 1.0), no_caustics());
        let ray = Ray::new(Point3f::new(0.0, 0.0, 0.5), Vector3f::new(0.0, 0.0, -1.0));

        let mut layers = ColorLayers::new(&[LayerKind::Caustics, LayerKind::DiffuseIndirect]);
        let n = 64;
        let mut sum = Spectrum::ZERO;
        let mut state = RenderState::new(0, 0);
        for i in 0..n {
            state.begin_sample(0, PixelSamplingData::new(i, 0, n));
            let (col, alpha) = integrator.integrate(&mut state, &ray, 0, Some(&mut layers));
            assert_eq!(alpha, 1.0);
            sum += col;
        }
        let estimate = sum.g() / n as Float;

        let expected = analytic_radiance(0.8, 1.0, 0.5, 1.0);
        assert!(
            approx_eq!(f32, estimate, expected, epsilon = 0.03 * expected),
            "estimate {estimate}, expected {expected}"
        );
        assert_eq!(layers.get(LayerKind::Caustics), Some(Spectrum::ZERO));
        assert_eq!(layers.get(LayerKind::DiffuseIndirect), Some(Spectrum::ZERO));
        assert!(integrator.caustic_map().photon_count() == 0);
    }

    #[test]
    fn shadowed_point_is_dark() {
        let integrator = DirectLightIntegrator::new(cornell_box(), no_caustics());

        // Floor next to where the matte sphere touches it.
        let ray = Ray::new(Point3f::new(0.7, 0.4, 0.05), Vector3f::new(0.0, 0.0, -1.0));
        let mut state = RenderState::new(0, 0);
        let (under, _) = integrator.integrate(&mut state, &ray, 0, None);

        let ray = Ray::new(Point3f::new(-0.8, -0.8, 0.1), Vector3f::new(0.0, 0.0, -1.0));
        let (open, _) = integrator.integrate(&mut state, &ray, 0, None);
        assert!(under.g() < open.g());
    }

    #[test]
    fn caustics_reach_the_floor() {
        let options = MonteCarloOptions {
            caustic_photons: 20000,
            caustic_radius: 0.2,
            n_threads: 2,
            n_threads_photons: 2,
            ..MonteCarloOptions::default()
        };
        let mut integrator = DirectLightIntegrator::new(cornell_box(), options);
        integrator.preprocess(&RenderControl::new()).unwrap();
        assert!(integrator.caustic_map().is_built());
        assert!(integrator.caustic_map().photon_count() > 0);
        assert_eq!(integrator.processing(), PhotonMapProcessing::GenerateOnly);
        assert_eq!(integrator.data.caustic_state, PhotonMapState::Ready);

        let pixels = render_pixels(&integrator, 4, 4, 1);
        assert!(pixels.iter().all(|c| !c.has_nans()));
        assert!(pixels.iter().any(|c| !c.is_black()));
    }

    #[test]
    fn caustic_load_falls_back() {
        let base = std::env::temp_dir().join(format!("photon-test-direct-{}", std::process::id()));
        let options = MonteCarloOptions {
            caustic_photons: 2000,
            n_threads_photons: 2,
            photon_maps_processing: PhotonMapProcessing::Load,
            photon_map_base_path: Some(base.clone()),
            ..MonteCarloOptions::default()
        };
        let mut integrator = DirectLightIntegrator::new(cornell_box(), options);
        integrator.preprocess(&RenderControl::new()).unwrap();
        assert_eq!(integrator.processing(), PhotonMapProcessing::GenerateAndSave);
        assert!(integrator.caustic_map().is_built());
        assert!(integrator.caustic_map().photon_count() > 0);

        if let Some(path) = photon_map_path(Some(&base), CAUSTIC_MAP_SUFFIX) {
            let _ = std::fs::remove_file(path);
        }
    }

    #[test]
    fn cancelled_caustics_are_discarded() {
        let options = MonteCarloOptions {
            caustic_photons: 2000,
            n_threads_photons: 2,
            ..MonteCarloOptions::default()
        };
        let mut integrator = DirectLightIntegrator::new(cornell_box(), options);
        let control = RenderControl::new();
        control.cancel();
        assert!(matches!(integrator.preprocess(&control), Err(PhotonError::Cancelled)));
        assert!(!integrator.caustic_map().is_built());
        assert_eq!(integrator.caustic_map().photon_count(), 0);
    }

    #[test]
    fn recursion_restores_ray_level() {
        let integrator = DirectLightIntegrator::new(cornell_box(), no_caustics());

        // Through the glass sphere.
        let ray = Ray::new(Point3f::new(-0.4, -0.9, 0.35), Vector3f::new(0.0, 1.0, 0.0));
        let mut state = RenderState::new(0, 0);
        let mut layers = ColorLayers::new(&[LayerKind::Transmission]);
        let (col, _) = integrator.integrate(&mut state, &ray, 0, Some(&mut layers));
        assert_eq!(state.ray_level, 0);
        assert!(!col.has_nans());
        assert!(layers.get(LayerKind::Transmission).is_some_and(|c| !c.is_black()));
    }

    #[test]
    fn light_choice_ignores_earlier_samples() {
        let integrator = DirectLightIntegrator::new(two_light_box(), no_caustics());
        let ray = Ray::new(Point3f::new(0.0, -0.5, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        let (sp, _) = integrator.scene().intersect(&ray).unwrap();
        let wo = -ray.d;
        let one_light = |state: &mut RenderState| -> Vec<Spectrum> {
            state.begin_sample(0, PixelSamplingData::new(0, 7, 1));
            let data = sp.material.initialize_at_point(state, &sp);
            (0..4)
                .map(|i| integrator.estimate_one_direct_light(state, &sp, &data, &wo, 7 + i))
                .collect()
        };

        let fresh = one_light(&mut RenderState::new(0, 0));

        // A worker that already rendered other samples.
        let mut worker = RenderState::new(1, 1);
        for n in 0..3 {
            worker.begin_sample(5, PixelSamplingData::new(n, 20, 3));
            let data = sp.material.initialize_at_point(&worker, &sp);
            integrator.estimate_one_direct_light(&mut worker, &sp, &data, &wo, n);
        }
        assert_eq!(one_light(&mut worker), fresh);
        assert!(fresh.iter().any(|c| !c.is_black()));
    }
}

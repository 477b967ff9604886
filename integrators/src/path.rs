//! Path Tracing Integrator

use crate::monte_carlo::*;
use core::error::*;
use core::geometry::*;
use core::integrator::*;
use core::interaction::*;
use core::low_discrepancy::*;
use core::material::*;
use core::parallel::*;
use core::pbrt::*;
use core::photon::*;
use core::render::*;
use core::scene::*;
use core::spectrum::*;
use std::sync::Arc;

/// How the path tracer handles caustics.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CausticMode {
    /// No caustics.
    None,

    /// Emission seen by paths after a specular, glossy or filtering bounce.
    Path,

    /// Caustic photon map lookups at diffuse surfaces.
    Photon,

    /// Both paths and photons.
    Both,
}

impl CausticMode {
    /// Returns true if a caustic photon map is needed.
    pub fn uses_photons(&self) -> bool {
        matches!(self, Self::Photon | Self::Both)
    }

    /// Returns true if paths pick up emission after non-diffuse bounces.
    pub fn traces_paths(&self) -> bool {
        matches!(self, Self::Path | Self::Both)
    }
}

/// Path tracing settings.
#[derive(Clone, Debug)]
pub struct PathOptions {
    /// Caustic handling.
    pub caustic_mode: CausticMode,

    /// Paths started at each shading point.
    pub path_samples: usize,

    /// Maximum number of path vertices after the shading point.
    pub bounces: usize,

    /// Russian roulette starts after this many bounces.
    pub russian_roulette_min_bounces: usize,

    /// Start paths from every lobe and skip the recursive raytrace.
    pub no_recursive: bool,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            caustic_mode: CausticMode::Path,
            path_samples: 32,
            bounces: 3,
            russian_roulette_min_bounces: 0,
            no_recursive: false,
        }
    }
}

/// Implements a path tracer. Every path vertex gets direct light from one
/// selected light.
pub struct PathIntegrator {
    /// Common data for Monte Carlo integrators.
    pub data: MonteCarloData,

    /// Path settings.
    pub options: PathOptions,

    /// Processing mode used by the last `preprocess()`.
    processing: PhotonMapProcessing,
}

impl PathIntegrator {
    /// Create a new `PathIntegrator`. Caustic photons are enabled by the
    /// caustic mode.
    ///
    /// * `scene`      - The scene.
    /// * `mc_options` - Monte Carlo settings.
    /// * `options`    - Path settings.
    pub fn new(scene: Arc<Scene>, mut mc_options: MonteCarloOptions, options: PathOptions) -> Self {
        mc_options.use_caustics = options.caustic_mode.uses_photons();
        let processing = mc_options.photon_maps_processing;
        Self {
            data: MonteCarloData::new(scene, mc_options),
            options,
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

    /// Averages paths started at a surface point.
    ///
    /// * `state`      - Render state.
    /// * `sp`         - Surface point.
    /// * `data`       - Material data at `sp`.
    /// * `wo`         - Outgoing direction.
    /// * `path_flags` - Lobes the first bounce may sample.
    fn trace_paths(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        path_flags: BsdfFlags,
    ) -> Spectrum {
        let scene = &self.data.scene;
        let path_samples = self.options.path_samples;
        let division = state.ray_division;
        let pixel = state.pixel_sampling;
        let was_chromatic = state.chromatic;
        let old_include_lights = state.include_lights;
        let n_samples = max(1, division.divided_samples(path_samples));

        let mut path_col = Spectrum::ZERO;
        for i in 0..n_samples {
            let offs = (path_samples as u64) * pixel.number + pixel.offset + i as u64;
            state.chromatic = was_chromatic;
            if was_chromatic {
                state.wavelength = ri_s(offs as u32, 0);
            }

            // The shading point is initialized. Sample its lobes directly.
            let (s1, s2) = decorrelate(
                &division,
                ri_vdc(offs as u32, 0),
                low_discrepancy_sampling(2, offs),
            );
            let mut s = BsdfSample::new(s1, s2, path_flags);
            let (dir, scol, w) = sp.material.sample(state, sp, data, wo, &mut s);
            let throughput = scol * w;
            if s.pdf <= PDF_EPSILON || throughput.is_black() {
                continue;
            }
            state.include_lights = false;

            let ray = Ray::with_min_dist(sp.p, dir, scene.ray_min_dist(&sp.p));
            let Some((hit, _)) = scene.intersect(&ray) else {
                continue;
            };
            path_col += self.follow_path(state, hit, &ray, throughput, offs);
        }

        state.chromatic = was_chromatic;
        state.include_lights = old_include_lights;
        path_col / n_samples as Float
    }

    /// Follows one path from its first hit. Returns the light gathered at
    /// the path vertices.
    ///
    /// * `state`      - Render state.
    /// * `hit`        - First hit.
    /// * `ray`        - Ray that found `hit`.
    /// * `throughput` - Weight of the first bounce.
    /// * `offs`       - Sample index of the path.
    fn follow_path(
        &self,
        state: &mut RenderState,
        mut hit: SurfacePoint,
        ray: &Ray,
        mut throughput: Spectrum,
        offs: u64,
    ) -> Spectrum {
        let scene = &self.data.scene;
        let PathOptions {
            caustic_mode,
            bounces,
            russian_roulette_min_bounces,
            ..
        } = self.options;
        let division = state.ray_division;

        let mut hit_data = hit.material.initialize_at_point(state, &hit);
        let mut pwo = -ray.d;
        let mut col = self.estimate_one_direct_light(state, &hit, &hit_data, &pwo, offs) * throughput;

        for depth in 1..bounces {
            let d4 = 4 * depth;
            let (s1, s2) = decorrelate(
                &division,
                low_discrepancy_sampling(d4 + 3, offs),
                low_discrepancy_sampling(d4 + 4, offs),
            );
            let mut s = BsdfSample::new(s1, s2, BsdfFlags::ALL);
            let (dir, scol, w) = hit.material.sample(state, &hit, &hit_data, &pwo, &mut s);
            let scol = scol * w;
            if s.pdf <= PDF_EPSILON || scol.is_black() {
                break;
            }
            throughput *= scol;

            let caustic = caustic_mode.traces_paths()
                && s.sampled_flags.intersects(BsdfFlags::SPECULAR | BsdfFlags::GLOSSY | BsdfFlags::FILTER);
            state.include_lights = caustic;

            let ray = Ray::with_min_dist(hit.p, dir, scene.ray_min_dist(&hit.p));
            let Some((next, t)) = scene.intersect(&ray) else {
                break;
            };
            hit = next;
            hit_data = hit.material.initialize_at_point(state, &hit);
            pwo = -ray.d;
            let bsdfs = hit_data.bsdf_flags;

            let mut lcol = if bsdfs.contains(BsdfFlags::DIFFUSE) {
                self.estimate_one_direct_light(state, &hit, &hit_data, &pwo, offs)
            } else {
                Spectrum::ZERO
            };

            if bsdfs.contains(BsdfFlags::VOLUMETRIC) {
                if let Some(volume) = hit.material.volume_handler(hit.n.dot(&pwo) < 0.0) {
                    throughput *= volume.transmittance(state, &Ray::segment(ray.o, ray.d, ray.t_min, t));
                }
            }

            if depth > russian_roulette_min_bounces {
                let probability = throughput.max_component_value();
                if probability <= 0.0 || probability < low_discrepancy_sampling(d4 + 5, offs) {
                    break;
                }
                throughput = throughput / probability.min(1.0);
            }

            if caustic && bsdfs.contains(BsdfFlags::EMIT) {
                lcol += hit.material.emit(state, &hit, &hit_data, &pwo);
            }
            col += lcol * throughput;
        }
        col
    }
}

impl MonteCarloIntegrator for PathIntegrator {
    /// Returns the common data.
    fn get_data(&self) -> &MonteCarloData {
        &self.data
    }
}

impl SurfaceIntegrator for PathIntegrator {
    fn name(&self) -> &'static str {
        "PathTracer"
    }

    fn scene(&self) -> &Scene {
        &self.data.scene
    }

    /// Shoots caustic photons when the caustic mode needs them.
    ///
    /// * `control` - Progress counter and cancellation flag.
    fn preprocess(&mut self, control: &RenderControl) -> Result<()> {
        let PathOptions {
            caustic_mode,
            path_samples,
            bounces,
            russian_roulette_min_bounces,
            ..
        } = self.options;
        info!(
            "Path tracing: {} paths, {} bounces, roulette after {}, caustics {:?}",
            path_samples, bounces, russian_roulette_min_bounces, caustic_mode
        );
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

        let mut path_flags = if self.options.no_recursive {
            BsdfFlags::ALL
        } else {
            BsdfFlags::DIFFUSE
        };
        if bsdfs.intersects(path_flags) {
            path_flags |= BsdfFlags::DIFFUSE | BsdfFlags::REFLECT | BsdfFlags::TRANSMIT;
            let indirect = self.trace_paths(state, &sp, &data, &wo, path_flags);
            col += record_set(&mut layers, LayerKind::DiffuseIndirect, indirect, top_level);
        }

        let mut alpha_inner = 1.0;
        if !self.options.no_recursive {
            let (rcol, ralpha) = self.recursive_raytrace(state, &sp, &data, &wo, additional_depth, &mut layers);
            col += rcol;
            alpha_inner = ralpha;
        }
        let alpha = self.hit_alpha(state, &sp, &data, &wo, alpha_inner);

        state.include_lights = old_include_lights;
        let transmittance = scene.volume_transmittance(state, &Ray::segment(ray.o, ray.d, ray.t_min, t));
        (col * transmittance, alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct_lighting::*;
    use crate::test_scenes::*;
    use float_cmp::approx_eq;

    fn mc_options() -> MonteCarloOptions {
        MonteCarloOptions {
            n_threads: 1,
            n_threads_photons: 2,
            caustic_photons: 4000,
            caustic_radius: 0.2,
            ..MonteCarloOptions::default()
        }
    }

    fn path_options(caustic_mode: CausticMode) -> PathOptions {
        PathOptions {
            caustic_mode,
            path_samples: 8,
            ..PathOptions::default()
        }
    }

    /// Averages `integrate()` over `n` pixel samples of one ray.
    fn average(integrator: &dyn SurfaceIntegrator, ray: &Ray, n: u64) -> Spectrum {
        let mut state = RenderState::new(0, 0);
        let mut sum = Spectrum::ZERO;
        for i in 0..n {
            state.begin_sample(0, PixelSamplingData::new(i, 0, n));
            sum += integrator.integrate(&mut state, ray, 0, None).0;
        }
        sum / n as Float
    }

    #[test]
    fn caustic_modes() {
        assert!(!CausticMode::None.uses_photons() && !CausticMode::None.traces_paths());
        assert!(CausticMode::Path.traces_paths() && !CausticMode::Path.uses_photons());
        assert!(CausticMode::Photon.uses_photons() && !CausticMode::Photon.traces_paths());
        assert!(CausticMode::Both.uses_photons() && CausticMode::Both.traces_paths());

        let integrator = PathIntegrator::new(cornell_box(), mc_options(), path_options(CausticMode::Path));
        assert!(!integrator.data.options.use_caustics);
        assert_eq!(integrator.name(), "PathTracer");
        let integrator = PathIntegrator::new(cornell_box(), mc_options(), path_options(CausticMode::Both));
        assert!(integrator.data.options.use_caustics);
    }

    #[test]
    fn open_plane_matches_direct_lighting() {
        // Paths leaving the floor escape, so only direct light remains.
        let mc = MonteCarloOptions {
            use_caustics: false,
            ..mc_options()
        };
        let path = PathIntegrator::new(lit_plane(0.8, 1.0), mc.clone(), path_options(CausticMode::None));
        let direct = DirectLightIntegrator::new(lit_plane(0.8, 1.0), mc);
        let ray = Ray::new(Point3f::new(0.2, 0.1, 0.5), Vector3f::new(0.0, 0.0, -1.0));

        let p = average(&path, &ray, 32);
        let d = average(&direct, &ray, 32);
        assert!(d.g() > 0.0);
        assert!(approx_eq!(f32, p.g(), d.g(), epsilon = 1e-3 * d.g()), "path {p}, direct {d}");
    }

    #[test]
    fn walls_add_indirect_light() {
        let mc = MonteCarloOptions {
            use_caustics: false,
            ..mc_options()
        };
        let path = PathIntegrator::new(cornell_box(), mc.clone(), path_options(CausticMode::None));
        let direct = DirectLightIntegrator::new(cornell_box(), mc);
        let ray = Ray::new(Point3f::new(0.0, -0.5, 1.0), Vector3f::new(0.0, 0.0, -1.0));

        let p = average(&path, &ray, 8);
        let d = average(&direct, &ray, 8);
        assert!(!p.has_nans());
        assert!(p.g() > d.g(), "path {p}, direct {d}");
        // Red wall bounce.
        assert!(p.r() - d.r() > p.b() - d.b());
    }

    #[test]
    fn indirect_layer_is_recorded() {
        let path = PathIntegrator::new(cornell_box(), mc_options(), path_options(CausticMode::None));
        let ray = Ray::new(Point3f::new(0.0, -0.5, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        let mut layers = ColorLayers::new(&[LayerKind::DiffuseIndirect, LayerKind::DiffuseDirect]);
        let mut state = RenderState::new(0, 0);
        state.begin_sample(0, PixelSamplingData::new(0, 0, 1));
        let (col, alpha) = path.integrate(&mut state, &ray, 0, Some(&mut layers));
        assert_eq!(alpha, 1.0);
        assert!(layers.get(LayerKind::DiffuseIndirect).is_some_and(|c| !c.is_black()));
        assert!(layers.get(LayerKind::DiffuseDirect).is_some_and(|c| c.g() < col.g()));
        assert!(state.include_lights);
        assert!(state.chromatic);
    }

    #[test]
    fn photon_caustics_need_a_map() {
        let mut path = PathIntegrator::new(cornell_box(), mc_options(), path_options(CausticMode::Photon));
        path.preprocess(&RenderControl::new()).unwrap();
        assert!(path.caustic_map().is_built());
        assert!(path.caustic_map().photon_count() > 0);
        assert_eq!(path.processing(), PhotonMapProcessing::GenerateOnly);

        let mut path = PathIntegrator::new(cornell_box(), mc_options(), path_options(CausticMode::Path));
        path.preprocess(&RenderControl::new()).unwrap();
        assert_eq!(path.caustic_map().photon_count(), 0);
    }

    #[test]
    fn roulette_keeps_renders_repeatable() {
        let options = PathOptions {
            bounces: 6,
            russian_roulette_min_bounces: 1,
            ..path_options(CausticMode::Path)
        };
        let path = PathIntegrator::new(two_light_box(), mc_options(), options);
        let a = render_pixels(&path, 4, 3, 2);
        let b = render_pixels(&path, 4, 3, 2);
        assert_eq!(a, b);
        assert!(a.iter().all(|c| !c.has_nans() && c.min_component_value() >= 0.0));
    }

    #[test]
    fn without_recursion_paths_start_everywhere() {
        let options = PathOptions {
            no_recursive: true,
            ..path_options(CausticMode::None)
        };
        let path = PathIntegrator::new(cornell_box(), mc_options(), options);

        // Glass sphere from the side. Only paths carry light through it.
        let ray = Ray::new(Point3f::new(-0.4, -0.9, 0.35), Vector3f::new(0.0, 1.0, 0.0));
        let c = average(&path, &ray, 4);
        assert!(!c.has_nans());
        assert!(!c.is_black());
    }
}

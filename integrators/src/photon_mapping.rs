//! Photon Mapping Integrator

use crate::monte_carlo::*;
use crate::photon_shooting::*;
use core::error::*;
use core::geometry::*;
use core::integrator::*;
use core::interaction::*;
use core::light::*;
use core::material::*;
use core::parallel::*;
use core::pbrt::*;
use core::photon::*;
use core::render::*;
use core::scene::*;
use core::spectrum::*;
use std::path::Path;
use std::sync::Arc;
use std::thread;

/// A diffuse map with fewer photons than this is unusable.
const MIN_DIFFUSE_PHOTONS: usize = 50;

/// Settings of the diffuse photon map and final gathering.
#[derive(Clone, Debug)]
pub struct PhotonOptions {
    /// Shoot diffuse photons.
    pub use_diffuse: bool,

    /// Number of diffuse photons to shoot.
    pub diffuse_photons: usize,

    /// Maximum number of diffuse photons per lookup.
    pub search: usize,

    /// Diffuse lookup radius.
    pub diffuse_radius: Float,

    /// Maximum number of bounces of a photon path.
    pub bounces: usize,

    /// Use final gathering instead of direct diffuse map lookups.
    pub final_gather: bool,

    /// Final gather rays per shading point.
    pub fg_samples: usize,

    /// Maximum bounces of a final gather path.
    pub fg_bounces: usize,

    /// Path length below which final gather paths use direct lighting.
    /// Defaults to `diffuse_radius`.
    pub fg_min_path_len: Option<Float>,

    /// Show the photon map instead of rendering.
    pub show_map: bool,

    /// Radiance points closer than this fraction of `diffuse_radius` to a
    /// kept point are dropped.
    pub radiance_thin_fraction: Float,

    /// Probability of recording a radiance point at a diffuse photon.
    pub radiance_probability: Float,
}

impl Default for PhotonOptions {
    fn default() -> Self {
        Self {
            use_diffuse: true,
            diffuse_photons: 100000,
            search: 50,
            diffuse_radius: 0.1,
            bounces: 5,
            final_gather: true,
            fg_samples: 32,
            fg_bounces: 2,
            fg_min_path_len: None,
            show_map: false,
            radiance_thin_fraction: 0.01,
            radiance_probability: 0.125,
        }
    }
}

/// Photon mapping with final gathering. Caustics come from a caustic map,
/// indirect diffuse light from a diffuse map or from final gather paths
/// ending in a pre-gathered radiance map.
pub struct PhotonIntegrator {
    /// Common data for Monte Carlo integrators.
    pub(crate) data: MonteCarloData,

    /// Photon settings.
    pub(crate) options: PhotonOptions,

    /// Diffuse photons.
    pub(crate) diffuse_map: PhotonMap,

    /// Life cycle of `diffuse_map`.
    pub(crate) diffuse_state: PhotonMapState,

    /// Pre-gathered radiance photons.
    pub(crate) radiance_map: PhotonMap,

    /// Life cycle of `radiance_map`.
    pub(crate) radiance_state: PhotonMapState,

    /// False once diffuse photons turned out unusable.
    pub(crate) diffuse_enabled: bool,

    /// Processing mode used by the last `preprocess()`.
    processing: PhotonMapProcessing,
}

impl PhotonIntegrator {
    /// Create a new `PhotonIntegrator`. The caustic depth follows
    /// `options.bounces`.
    ///
    /// * `scene`      - The scene.
    /// * `mc_options` - Monte Carlo settings.
    /// * `options`    - Photon settings.
    pub fn new(scene: Arc<Scene>, mut mc_options: MonteCarloOptions, options: PhotonOptions) -> Self {
        mc_options.caustic_depth = options.bounces;
        let processing = mc_options.photon_maps_processing;
        Self {
            data: MonteCarloData::new(scene, mc_options),
            diffuse_enabled: options.use_diffuse,
            options,
            diffuse_map: PhotonMap::new("diffuse"),
            diffuse_state: PhotonMapState::Idle,
            radiance_map: PhotonMap::new("fg_radiance"),
            radiance_state: PhotonMapState::Idle,
            processing,
        }
    }

    /// Returns the caustic map.
    pub fn caustic_map(&self) -> &PhotonMap {
        &self.data.caustic_map
    }

    /// Returns the diffuse map.
    pub fn diffuse_map(&self) -> &PhotonMap {
        &self.diffuse_map
    }

    /// Returns the radiance map.
    pub fn radiance_map(&self) -> &PhotonMap {
        &self.radiance_map
    }

    /// Returns the states of the caustic, diffuse and radiance maps.
    pub fn map_states(&self) -> (PhotonMapState, PhotonMapState, PhotonMapState) {
        (self.data.caustic_state, self.diffuse_state, self.radiance_state)
    }

    /// Returns the processing mode used by the last `preprocess()`, after
    /// any fallback.
    pub fn processing(&self) -> PhotonMapProcessing {
        self.processing
    }

    /// Returns true if diffuse photons are in use.
    pub fn diffuse_enabled(&self) -> bool {
        self.diffuse_enabled
    }

    /// Squared radius of radiance map lookups.
    pub(crate) fn radiance_lookup_dist_sq(&self) -> Float {
        4.0 * self.options.diffuse_radius * self.options.diffuse_radius
    }

    /// Path length below which final gather paths use direct lighting.
    pub(crate) fn gather_dist(&self) -> Float {
        self.options.fg_min_path_len.unwrap_or(self.options.diffuse_radius)
    }

    fn uses_radiance_map(&self) -> bool {
        self.diffuse_enabled && self.options.final_gather
    }

    /// Loads every map in use. Stops at the first failure.
    ///
    /// * `base` - Base path of the map files.
    fn load_maps(&mut self, base: Option<&Path>) -> Result<()> {
        if self.data.options.use_caustics {
            let path = photon_map_path(base, CAUSTIC_MAP_SUFFIX);
            load_map(&mut self.data.caustic_map, &mut self.data.caustic_state, path.as_deref())?;
        }
        if self.diffuse_enabled {
            let path = photon_map_path(base, DIFFUSE_MAP_SUFFIX);
            load_map(&mut self.diffuse_map, &mut self.diffuse_state, path.as_deref())?;
        }
        if self.uses_radiance_map() {
            let path = photon_map_path(base, RADIANCE_MAP_SUFFIX);
            load_map(&mut self.radiance_map, &mut self.radiance_state, path.as_deref())?;
        }
        Ok(())
    }

    /// Prepares the maps of the previous render for reuse. Returns false if
    /// a map in use is empty.
    fn reuse_maps(&mut self) -> bool {
        let mut maps = Vec::new();
        if self.data.options.use_caustics {
            maps.push((&mut self.data.caustic_map, &mut self.data.caustic_state));
        }
        if self.diffuse_enabled {
            maps.push((&mut self.diffuse_map, &mut self.diffuse_state));
        }
        if self.diffuse_enabled && self.options.final_gather {
            maps.push((&mut self.radiance_map, &mut self.radiance_state));
        }

        for (map, state) in maps.iter_mut() {
            set_map_state(map, state, PhotonMapState::Reusing);
            if map.photon_count() == 0 {
                warn!("{} photon map is empty and cannot be reused", map.name());
                return false;
            }
        }
        for (map, _) in maps.iter_mut() {
            if !map.is_built() {
                map.build();
            }
        }
        true
    }

    /// Shoots and builds every map in use.
    ///
    /// * `control` - Progress counter and cancellation flag.
    fn generate_maps(&mut self, control: &RenderControl) -> Result<()> {
        let Self {
            data,
            options,
            diffuse_map,
            diffuse_state,
            radiance_map,
            radiance_state,
            diffuse_enabled,
            ..
        } = self;
        let MonteCarloData {
            scene,
            options: mc_options,
            caustic_map,
            caustic_state,
            ..
        } = data;

        diffuse_map.clear();
        radiance_map.clear();
        let mut radiance_points = Vec::new();

        if *diffuse_enabled {
            set_map_state(diffuse_map, diffuse_state, PhotonMapState::Generating);
            let lights: Vec<ArcLight> = scene
                .lights
                .iter()
                .filter(|l| l.shoots_diffuse_photons())
                .map(Arc::clone)
                .collect();

            match PhotonLights::new(lights) {
                None => {
                    warn!("No lights shoot diffuse photons. Diffuse photons are disabled.");
                    *diffuse_enabled = false;
                }
                Some(lights) => {
                    let settings = ShootSettings {
                        kind: PhotonKind::Diffuse,
                        n_photons: options.diffuse_photons,
                        n_threads: mc_options.n_threads_photons,
                        max_bounces: options.bounces,
                        radiance_probability: options.final_gather.then_some(options.radiance_probability),
                    };
                    radiance_points = shoot_photons(scene, &lights, &settings, control, diffuse_map)?;

                    let count = diffuse_map.photon_count();
                    if count < MIN_DIFFUSE_PHOTONS {
                        let e = PhotonError::TooFewPhotons {
                            map: diffuse_map.name().to_owned(),
                            count,
                        };
                        error!("{e}. Diffuse photons are disabled.");
                        *diffuse_enabled = false;
                        diffuse_map.clear();
                        radiance_points.clear();
                    }
                }
            }
        }

        // Build the diffuse index while caustic photons are shot.
        let build_diffuse = *diffuse_enabled;
        let caustic_result = thread::scope(|scope| {
            let builder = if build_diffuse {
                let map = &mut *diffuse_map;
                Some(scope.spawn(move || {
                    info!("Building diffuse photon map with {} photons", map.photon_count());
                    map.build();
                }))
            } else {
                None
            };

            let result = if mc_options.use_caustics {
                generate_caustic_map(
                    scene,
                    mc_options,
                    mc_options.caustic_depth,
                    caustic_map,
                    caustic_state,
                    control,
                )
            } else {
                Ok(())
            };

            if let Some(builder) = builder {
                if let Err(panic) = builder.join() {
                    std::panic::resume_unwind(panic);
                }
            }
            result
        });
        caustic_result?;

        if !build_diffuse {
            return Ok(());
        }
        set_map_state(diffuse_map, diffuse_state, PhotonMapState::Built);

        if options.final_gather {
            set_map_state(radiance_map, radiance_state, PhotonMapState::Generating);
            let points = thin_radiance_points(radiance_points, options.radiance_thin_fraction * options.diffuse_radius);
            let photons = pre_gather_radiance(
                &points,
                diffuse_map,
                options.search,
                options.diffuse_radius,
                mc_options.n_threads_photons,
                control,
            )?;
            radiance_map.append_batch(photons, diffuse_map.path_count());
            info!("Building radiance photon map with {} photons", radiance_map.photon_count());
            radiance_map.build();
            set_map_state(radiance_map, radiance_state, PhotonMapState::Built);
        }
        Ok(())
    }

    /// Saves every map in use.
    ///
    /// * `base` - Base path of the map files.
    fn save_maps(&mut self, base: Option<&Path>) {
        if self.data.options.use_caustics {
            let path = photon_map_path(base, CAUSTIC_MAP_SUFFIX);
            save_map(&self.data.caustic_map, &mut self.data.caustic_state, path.as_deref());
        }
        if self.diffuse_enabled {
            let path = photon_map_path(base, DIFFUSE_MAP_SUFFIX);
            save_map(&self.diffuse_map, &mut self.diffuse_state, path.as_deref());
        }
        if self.uses_radiance_map() {
            let path = photon_map_path(base, RADIANCE_MAP_SUFFIX);
            save_map(&self.radiance_map, &mut self.radiance_state, path.as_deref());
        }
    }

    /// Discards all maps after a failed preprocess.
    fn clear_maps(&mut self) {
        for (map, state) in [
            (&mut self.data.caustic_map, &mut self.data.caustic_state),
            (&mut self.diffuse_map, &mut self.diffuse_state),
            (&mut self.radiance_map, &mut self.radiance_state),
        ] {
            map.clear();
            set_map_state(map, state, PhotonMapState::Idle);
        }
    }

    /// Marks every map that was prepared as ready for rendering.
    fn set_ready(&mut self) {
        for (map, state) in [
            (&self.data.caustic_map, &mut self.data.caustic_state),
            (&self.diffuse_map, &mut self.diffuse_state),
            (&self.radiance_map, &mut self.radiance_state),
        ] {
            if map.is_built() {
                set_map_state(map, state, PhotonMapState::Ready);
            }
        }
    }

    /// Nearest radiance photon color around a surface point.
    ///
    /// * `p` - Position.
    /// * `n` - Normal facing the viewer.
    pub(crate) fn lookup_radiance(&self, p: &Point3f, n: &Vector3f) -> Spectrum {
        self.radiance_map
            .find_nearest(p, n, self.radiance_lookup_dist_sq())
            .map_or(Spectrum::ZERO, |photon| photon.color)
    }
}

impl MonteCarloIntegrator for PhotonIntegrator {
    /// Returns the common data.
    fn get_data(&self) -> &MonteCarloData {
        &self.data
    }
}

impl SurfaceIntegrator for PhotonIntegrator {
    fn name(&self) -> &'static str {
        "PhotonMap"
    }

    fn scene(&self) -> &Scene {
        &self.data.scene
    }

    /// Obtains the caustic, diffuse and radiance maps.
    ///
    /// * `control` - Progress counter and cancellation flag.
    fn preprocess(&mut self, control: &RenderControl) -> Result<()> {
        self.diffuse_enabled = self.options.use_diffuse;
        let base = self.data.options.photon_map_base_path.clone();
        let mut mode = self.data.options.photon_maps_processing;

        if mode == PhotonMapProcessing::Load {
            match self.load_maps(base.as_deref()) {
                Ok(()) => {
                    self.set_ready();
                    self.processing = mode;
                    return Ok(());
                }
                Err(e) => {
                    warn!("{e}. Generating the photon maps instead and saving them.");
                    mode = PhotonMapProcessing::GenerateAndSave;
                }
            }
        }

        if mode == PhotonMapProcessing::Reuse {
            if self.reuse_maps() {
                self.set_ready();
                self.processing = mode;
                return Ok(());
            }
            warn!("Photon maps cannot be reused. Generating them instead.");
            mode = PhotonMapProcessing::GenerateOnly;
        }

        if let Err(e) = self.generate_maps(control) {
            self.clear_maps();
            return Err(e);
        }
        if mode == PhotonMapProcessing::GenerateAndSave {
            self.save_maps(base.as_deref());
        }
        self.set_ready();
        self.processing = mode;
        Ok(())
    }

    /// Returns the radiance and alpha along a ray.
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
        let n = face_forward(&sp.ng, &sp.n, &wo);

        let mut col = Spectrum::ZERO;
        if bsdfs.contains(BsdfFlags::EMIT) {
            col += record_set(&mut layers, LayerKind::Emit, material.emit(state, &sp, &data, &wo), top_level);
        }
        state.include_lights = false;

        if self.diffuse_enabled && self.options.final_gather {
            if self.options.show_map {
                col += self.lookup_radiance(&sp.p, &n);
            } else {
                if top_level && layers.as_ref().is_some_and(|l| l.enabled(LayerKind::Radiance)) {
                    record_set(&mut layers, LayerKind::Radiance, self.lookup_radiance(&sp.p, &n), top_level);
                }
                if bsdfs.contains(BsdfFlags::DIFFUSE) {
                    col += self.estimate_all_direct_light(state, &sp, &data, &wo, &mut layers);
                    let fg = self.clamp_indirect(self.final_gathering(state, &sp, &data, &wo));
                    col += record_set(&mut layers, LayerKind::DiffuseIndirect, fg, top_level);
                }
            }
        } else if self.diffuse_enabled && self.options.show_map {
            let radius_sq = self.options.diffuse_radius * self.options.diffuse_radius;
            if let Some(photon) = self.diffuse_map.find_nearest(&sp.p, &n, radius_sq) {
                col += photon.color;
            }
        } else if bsdfs.contains(BsdfFlags::DIFFUSE) {
            col += self.estimate_all_direct_light(state, &sp, &data, &wo, &mut layers);
            if self.diffuse_enabled {
                let indirect = self.clamp_indirect(self.estimate_diffuse_photons(state, &sp, &data, &wo));
                col += record_set(&mut layers, LayerKind::DiffuseIndirect, indirect, top_level);
            }
        }

        if self.data.options.use_caustics && bsdfs.contains(BsdfFlags::DIFFUSE) {
            col += self.caustic_photons(state, &sp, &data, &wo, &mut layers);
        }

        let (rcol, ralpha) = self.recursive_raytrace(state, &sp, &data, &wo, additional_depth, &mut layers);
        col += rcol;
        let alpha = self.hit_alpha(state, &sp, &data, &wo, ralpha);

        state.include_lights = old_include_lights;
        let transmittance = scene.volume_transmittance(state, &Ray::segment(ray.o, ray.d, ray.t_min, t));
        (col * transmittance, alpha)
    }
}

impl PhotonIntegrator {
    /// Density estimate of the diffuse map at a surface point.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Material data at `sp`.
    /// * `wo`    - Outgoing direction.
    fn estimate_diffuse_photons(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
    ) -> Spectrum {
        let radius_sq = self.options.diffuse_radius * self.options.diffuse_radius;
        let (found, radius_sq) = self.diffuse_map.gather(&sp.p, self.options.search, radius_sq);
        if found.is_empty() || radius_sq <= 0.0 {
            return Spectrum::ZERO;
        }

        let mut sum = Spectrum::ZERO;
        for f in found.iter() {
            let surf_col = sp.material.eval(state, sp, data, wo, &f.photon.dir, BsdfFlags::DIFFUSE);
            sum += surf_col * f.photon.color;
        }
        sum * (self.diffuse_map.inv_path_count() / (radius_sq * PI))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_scenes::*;
    use float_cmp::approx_eq;

    fn small_options() -> (MonteCarloOptions, PhotonOptions) {
        let mc = MonteCarloOptions {
            caustic_photons: 4000,
            caustic_radius: 0.2,
            n_threads: 2,
            n_threads_photons: 2,
            ..MonteCarloOptions::default()
        };
        let photon = PhotonOptions {
            diffuse_photons: 4000,
            diffuse_radius: 0.3,
            fg_samples: 4,
            ..PhotonOptions::default()
        };
        (mc, photon)
    }

    fn unique_base(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("photon-test-{}-{}", tag, std::process::id()))
    }

    fn remove_maps(base: &Path) {
        for suffix in [CAUSTIC_MAP_SUFFIX, DIFFUSE_MAP_SUFFIX, RADIANCE_MAP_SUFFIX] {
            if let Some(path) = photon_map_path(Some(base), suffix) {
                let _ = std::fs::remove_file(path);
            }
        }
    }

    #[test]
    fn defaults() {
        let options = PhotonOptions::default();
        assert_eq!(options.diffuse_photons, 100000);
        assert_eq!(options.fg_samples, 32);
        assert!(approx_eq!(f32, options.radiance_probability, 0.125));

        let integrator = PhotonIntegrator::new(cornell_box(), MonteCarloOptions::default(), options);
        assert_eq!(integrator.gather_dist(), 0.1);
        assert_eq!(integrator.data.options.caustic_depth, 5);
        assert_eq!(integrator.name(), "PhotonMap");
    }

    #[test]
    fn generates_all_maps() {
        let (mc, photon) = small_options();
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        integrator.preprocess(&RenderControl::new()).unwrap();

        assert!(integrator.diffuse_enabled());
        assert!(integrator.diffuse_map().is_built());
        assert!(integrator.diffuse_map().photon_count() >= MIN_DIFFUSE_PHOTONS);
        assert_eq!(integrator.diffuse_map().path_count(), 4000);
        assert!(integrator.caustic_map().is_built());
        assert!(integrator.caustic_map().photon_count() > 0);
        assert!(integrator.radiance_map().is_built());
        assert!(integrator.radiance_map().photon_count() > 0);
        assert_eq!(
            integrator.map_states(),
            (PhotonMapState::Ready, PhotonMapState::Ready, PhotonMapState::Ready)
        );
    }

    #[test]
    fn renders_are_deterministic() {
        let render = || {
            let (mc, photon) = small_options();
            let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
            integrator.preprocess(&RenderControl::new()).unwrap();
            render_pixels(&integrator, 4, 4, 2)
        };
        let a = render();
        let b = render();
        assert_eq!(a, b);
        assert!(a.iter().all(|c| !c.has_nans()));
        assert!(a.iter().any(|c| !c.is_black()));
    }

    #[test]
    fn three_thread_preprocess_repeats() {
        let preprocess = || {
            let (mut mc, photon) = small_options();
            mc.n_threads_photons = 3;
            let mut integrator = PhotonIntegrator::new(two_light_box(), mc, photon);
            integrator.preprocess(&RenderControl::new()).unwrap();
            integrator
        };
        let a = preprocess();
        let b = preprocess();
        assert!(a.diffuse_map().photon_count() > 0);
        assert_eq!(a.diffuse_map().photons(), b.diffuse_map().photons());
        assert_eq!(a.caustic_map().photons(), b.caustic_map().photons());
        assert_eq!(a.radiance_map().photons(), b.radiance_map().photons());

        // Final gather paths pick one of the two lights per vertex.
        assert_eq!(render_pixels(&a, 3, 3, 2), render_pixels(&b, 3, 3, 2));
    }

    #[test]
    fn output_is_never_negative() {
        let (mc, photon) = small_options();
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        integrator.preprocess(&RenderControl::new()).unwrap();
        for c in render_pixels(&integrator, 6, 6, 1) {
            assert!(c.r() >= 0.0 && c.g() >= 0.0 && c.b() >= 0.0);
        }
    }

    #[test]
    fn cancellation_discards_maps() {
        let (mc, photon) = small_options();
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        let control = RenderControl::new();
        control.cancel();

        assert!(matches!(integrator.preprocess(&control), Err(PhotonError::Cancelled)));
        assert!(!integrator.diffuse_map().is_built());
        assert!(!integrator.caustic_map().is_built());
        assert_eq!(integrator.diffuse_map().photon_count(), 0);
        assert_eq!(integrator.map_states().1, PhotonMapState::Idle);
    }

    #[test]
    fn failed_load_falls_back_to_generate_and_save() {
        let base = unique_base("fallback");
        let (mut mc, photon) = small_options();
        mc.photon_maps_processing = PhotonMapProcessing::Load;
        mc.photon_map_base_path = Some(base.clone());

        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        integrator.preprocess(&RenderControl::new()).unwrap();
        assert_eq!(integrator.processing(), PhotonMapProcessing::GenerateAndSave);
        assert!(integrator.caustic_map().is_built());
        assert!(integrator.caustic_map().photon_count() > 0);

        let saved = photon_map_path(Some(&base), CAUSTIC_MAP_SUFFIX).unwrap();
        assert!(saved.exists());
        remove_maps(&base);
    }

    #[test]
    fn saved_maps_load_back() {
        let base = unique_base("roundtrip");
        let (mut mc, photon) = small_options();
        mc.photon_maps_processing = PhotonMapProcessing::GenerateAndSave;
        mc.photon_map_base_path = Some(base.clone());
        let mut saver = PhotonIntegrator::new(cornell_box(), mc.clone(), photon.clone());
        saver.preprocess(&RenderControl::new()).unwrap();

        mc.photon_maps_processing = PhotonMapProcessing::Load;
        let mut loader = PhotonIntegrator::new(cornell_box(), mc, photon);
        loader.preprocess(&RenderControl::new()).unwrap();
        assert_eq!(loader.processing(), PhotonMapProcessing::Load);
        assert_eq!(loader.diffuse_map().photons(), saver.diffuse_map().photons());
        assert_eq!(loader.diffuse_map().path_count(), saver.diffuse_map().path_count());
        assert_eq!(loader.caustic_map().photon_count(), saver.caustic_map().photon_count());
        assert_eq!(loader.radiance_map().photon_count(), saver.radiance_map().photon_count());
        assert!(loader.radiance_map().is_built());

        assert_eq!(render_pixels(&loader, 3, 3, 1), render_pixels(&saver, 3, 3, 1));
        remove_maps(&base);
    }

    #[test]
    fn reuse_keeps_maps() {
        let (mut mc, photon) = small_options();
        mc.photon_maps_processing = PhotonMapProcessing::Reuse;
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);

        // Nothing to reuse on the first render.
        integrator.preprocess(&RenderControl::new()).unwrap();
        assert_eq!(integrator.processing(), PhotonMapProcessing::GenerateOnly);
        let photons = integrator.diffuse_map().photons().to_vec();

        integrator.preprocess(&RenderControl::new()).unwrap();
        assert_eq!(integrator.processing(), PhotonMapProcessing::Reuse);
        assert_eq!(integrator.diffuse_map().photons(), photons.as_slice());
    }

    #[test]
    fn too_few_diffuse_photons_disable_diffuse() {
        let (mc, mut photon) = small_options();
        photon.diffuse_photons = 4;
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        integrator.preprocess(&RenderControl::new()).unwrap();
        assert!(!integrator.diffuse_enabled());
        assert_eq!(integrator.diffuse_map().photon_count(), 0);
        assert!(integrator.caustic_map().is_built());
    }

    #[test]
    fn without_final_gather_uses_diffuse_map() {
        let (mc, mut photon) = small_options();
        photon.final_gather = false;
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        integrator.preprocess(&RenderControl::new()).unwrap();
        assert_eq!(integrator.radiance_map().photon_count(), 0);
        assert!(render_pixels(&integrator, 3, 3, 1).iter().any(|c| !c.is_black()));
    }

    #[test]
    fn layers_record_top_level_components() {
        let (mc, photon) = small_options();
        let mut integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        integrator.preprocess(&RenderControl::new()).unwrap();

        // Straight at the back wall.
        let ray = Ray::new(Point3f::new(0.0, -0.9, 1.0), Vector3f::new(0.0, 1.0, 0.0));
        let mut layers = ColorLayers::new(&[LayerKind::DiffuseDirect, LayerKind::Shadow, LayerKind::Glossy]);
        let mut state = RenderState::new(0, 0);
        let (col, alpha) = integrator.integrate(&mut state, &ray, 0, Some(&mut layers));
        assert!(!col.is_black());
        assert_eq!(alpha, 1.0);
        assert!(layers.get(LayerKind::DiffuseDirect).is_some_and(|c| !c.is_black()));
        assert!(layers.get(LayerKind::Shadow).is_some_and(|c| c.g() > 0.0 && c.g() <= 1.0));
        assert_eq!(layers.get(LayerKind::Glossy), Some(Spectrum::ZERO));
        assert_eq!(state.ray_level, 0);
    }

    #[test]
    fn miss_alpha_follows_background() {
        let (mut mc, photon) = small_options();
        mc.transparent_background = true;
        let integrator = PhotonIntegrator::new(cornell_box(), mc, photon);
        let ray = Ray::new(Point3f::new(0.0, -0.9, 1.0), Vector3f::new(0.0, -1.0, 0.0));
        let mut state = RenderState::new(0, 0);
        let (col, alpha) = integrator.integrate(&mut state, &ray, 0, None);
        assert!(col.is_black());
        assert_eq!(alpha, 0.0);
    }
}

//! Monte Carlo Integrator

use crate::photon_shooting::*;
use core::error::*;
use core::geometry::*;
use core::integrator::*;
use core::interaction::*;
use core::light::*;
use core::low_discrepancy::*;
use core::material::*;
use core::parallel::*;
use core::pbrt::*;
use core::photon::*;
use core::render::*;
use core::sampling::*;
use core::scene::*;
use core::spectrum::*;
use std::path::PathBuf;
use std::sync::Arc;

/// Scrambles the Halton offset of each light so that lights sharing a pixel
/// do not share samples.
const LIGHT_OFFSET_DELTA: u64 = 4567;

/// Glossy and specular recursion stops at this ray level whatever the
/// configured depth.
pub const MAX_SPECULAR_RAY_LEVEL: usize = 20;

/// Lobes sampled by the material half of multiple importance sampling.
const MIS_FLAGS: BsdfFlags = BsdfFlags::GLOSSY
    .union(BsdfFlags::DIFFUSE)
    .union(BsdfFlags::DISPERSIVE)
    .union(BsdfFlags::REFLECT)
    .union(BsdfFlags::TRANSMIT);

/// Settings shared by the Monte Carlo surface integrators.
#[derive(Clone, Debug)]
pub struct MonteCarloOptions {
    /// Maximum ray recursion depth.
    pub r_depth: usize,

    /// Maximum number of transparent layers a shadow ray passes.
    pub s_depth: usize,

    /// Let shadow rays pass through transparent materials.
    pub transparent_shadows: bool,

    /// Refraction origin offset along the refracted direction.
    pub transparent_bias_factor: Float,

    /// Scale `transparent_bias_factor` with the ray level.
    pub transparent_bias_multiply_ray_depth: bool,

    /// Multiplies the sample count of every area light.
    pub light_sample_multiplier: Float,

    /// Exponent of the MIS power heuristic.
    pub power_heuristic_exponent: Float,

    /// Add caustic photons to diffuse surfaces.
    pub use_caustics: bool,

    /// Number of caustic photons to shoot.
    pub caustic_photons: usize,

    /// Maximum number of caustic photons per lookup.
    pub caustic_search: usize,

    /// Caustic lookup radius.
    pub caustic_radius: Float,

    /// Maximum number of bounces of a caustic photon path.
    pub caustic_depth: usize,

    /// Proportional clamp of indirect light. 0 disables it.
    pub clamp_indirect: Float,

    /// Render threads.
    pub n_threads: usize,

    /// Photon shooting threads.
    pub n_threads_photons: usize,

    /// Misses are transparent.
    pub transparent_background: bool,

    /// How photon maps are obtained.
    pub photon_maps_processing: PhotonMapProcessing,

    /// Base path of saved photon maps. File suffixes are appended.
    pub photon_map_base_path: Option<PathBuf>,

    /// Initial number of glossy branches.
    pub glossy_samples: usize,

    /// Initial number of wavelength branches at dispersive surfaces.
    pub dispersive_samples: usize,
}

impl Default for MonteCarloOptions {
    fn default() -> Self {
        let n_threads = num_cpus::get();
        Self {
            r_depth: 5,
            s_depth: 5,
            transparent_shadows: false,
            transparent_bias_factor: 0.0,
            transparent_bias_multiply_ray_depth: false,
            light_sample_multiplier: 1.0,
            power_heuristic_exponent: 2.0,
            use_caustics: true,
            caustic_photons: 500000,
            caustic_search: 50,
            caustic_radius: 0.01,
            caustic_depth: 5,
            clamp_indirect: 0.0,
            n_threads,
            n_threads_photons: n_threads,
            transparent_background: false,
            photon_maps_processing: PhotonMapProcessing::GenerateOnly,
            photon_map_base_path: None,
            glossy_samples: 4,
            dispersive_samples: 4,
        }
    }
}

/// Common data for Monte Carlo integrators.
pub struct MonteCarloData {
    /// The scene.
    pub scene: Arc<Scene>,

    /// Settings.
    pub options: MonteCarloOptions,

    /// Lights used for direct lighting.
    pub lights: Vec<ArcLight>,

    /// Caustic photons.
    pub caustic_map: PhotonMap,

    /// Life cycle of `caustic_map`.
    pub caustic_state: PhotonMapState,
}

impl MonteCarloData {
    /// Create a new `MonteCarloData`.
    ///
    /// * `scene`   - The scene.
    /// * `options` - Settings.
    pub fn new(scene: Arc<Scene>, options: MonteCarloOptions) -> Self {
        let lights = scene.direct_lights();
        Self {
            scene,
            options,
            lights,
            caustic_map: PhotonMap::new("caustic"),
            caustic_state: PhotonMapState::Idle,
        }
    }

    /// Obtains the caustic map the way `photon_maps_processing` asks and
    /// returns the mode that was actually used.
    ///
    /// * `control` - Progress counter and cancellation flag.
    pub fn prepare_caustic_map(&mut self, control: &RenderControl) -> Result<PhotonMapProcessing> {
        let mut mode = self.options.photon_maps_processing;
        let map_path = photon_map_path(self.options.photon_map_base_path.as_deref(), CAUSTIC_MAP_SUFFIX);

        if mode == PhotonMapProcessing::Load {
            match load_map(&mut self.caustic_map, &mut self.caustic_state, map_path.as_deref()) {
                Ok(()) => {
                    set_map_state(&self.caustic_map, &mut self.caustic_state, PhotonMapState::Ready);
                    return Ok(mode);
                }
                Err(e) => {
                    warn!("{e}. Generating the caustic photon map instead and saving it.");
                    mode = PhotonMapProcessing::GenerateAndSave;
                }
            }
        }

        if mode == PhotonMapProcessing::Reuse {
            set_map_state(&self.caustic_map, &mut self.caustic_state, PhotonMapState::Reusing);
            if self.caustic_map.photon_count() == 0 {
                warn!("Caustic photon map is empty and cannot be reused. Generating it instead.");
                mode = PhotonMapProcessing::GenerateOnly;
            } else {
                if !self.caustic_map.is_built() {
                    self.caustic_map.build();
                }
                set_map_state(&self.caustic_map, &mut self.caustic_state, PhotonMapState::Ready);
                return Ok(mode);
            }
        }

        generate_caustic_map(
            &self.scene,
            &self.options,
            self.options.caustic_depth,
            &mut self.caustic_map,
            &mut self.caustic_state,
            control,
        )?;

        if mode == PhotonMapProcessing::GenerateAndSave {
            save_map(&self.caustic_map, &mut self.caustic_state, map_path.as_deref());
        }
        set_map_state(&self.caustic_map, &mut self.caustic_state, PhotonMapState::Ready);
        Ok(mode)
    }
}

/// Shoots the caustic photons of `scene` into `map` and builds it. A
/// cancelled or failed shoot leaves the map cleared.
///
/// * `scene`       - The scene.
/// * `options`     - Settings.
/// * `max_bounces` - Depth budget of a caustic path.
/// * `map`         - The caustic map.
/// * `map_state`   - Life cycle of `map`.
/// * `control`     - Progress counter and cancellation flag.
pub fn generate_caustic_map(
    scene: &Scene,
    options: &MonteCarloOptions,
    max_bounces: usize,
    map: &mut PhotonMap,
    map_state: &mut PhotonMapState,
    control: &RenderControl,
) -> Result<()> {
    set_map_state(map, map_state, PhotonMapState::Generating);
    map.clear();

    let lights: Vec<ArcLight> = scene
        .lights
        .iter()
        .filter(|l| l.shoots_caustic_photons())
        .map(Arc::clone)
        .collect();

    match PhotonLights::new(lights) {
        None => warn!("No lights shoot caustic photons. Caustic photon map is left empty."),
        Some(lights) => {
            let settings = ShootSettings {
                kind: PhotonKind::Caustic,
                n_photons: options.caustic_photons,
                n_threads: options.n_threads_photons,
                max_bounces,
                radiance_probability: None,
            };
            if let Err(e) = shoot_photons(scene, &lights, &settings, control, map) {
                map.clear();
                set_map_state(map, map_state, PhotonMapState::Idle);
                return Err(e);
            }
        }
    }

    info!("Building caustic photon map with {} photons", map.photon_count());
    map.build();
    set_map_state(map, map_state, PhotonMapState::Built);
    Ok(())
}

/// Implements lighting shared by the Monte Carlo surface integrators:
/// direct lighting with multiple importance sampling, caustic photon
/// lookups and recursion into glossy, specular and dispersive lobes.
pub trait MonteCarloIntegrator: SurfaceIntegrator {
    /// Returns the common data.
    fn get_data(&self) -> &MonteCarloData;

    /// Sums the direct lighting of every light. The fraction of unshadowed
    /// light samples goes to the shadow layer.
    ///
    /// * `state`  - Render state.
    /// * `sp`     - Surface point.
    /// * `data`   - Material data at `sp`.
    /// * `wo`     - Outgoing direction.
    /// * `layers` - Optional debug layers.
    fn estimate_all_direct_light(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        layers: &mut Option<&mut ColorLayers>,
    ) -> Spectrum {
        let lights = &self.get_data().lights;
        let mut col = Spectrum::ZERO;
        let mut unshadowed = 0.0;
        for (loffs, light) in lights.iter().enumerate() {
            let (c, u) = self.do_light_estimation(state, light, sp, data, wo, loffs as u64);
            col += c;
            unshadowed += u;
        }

        let top_level = state.ray_level == 0;
        if !lights.is_empty() {
            record_set(layers, LayerKind::Shadow, Spectrum::new(unshadowed / lights.len() as Float), top_level);
        }
        record_add(layers, LayerKind::DiffuseDirect, col, top_level)
    }

    /// Estimates direct lighting from one light picked with a Halton stream
    /// and scales it by the number of lights.
    ///
    /// * `state`       - Render state.
    /// * `sp`          - Surface point.
    /// * `data`        - Material data at `sp`.
    /// * `wo`          - Outgoing direction.
    /// * `base_offset` - Offset of the light selection stream.
    fn estimate_one_direct_light(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        base_offset: u64,
    ) -> Spectrum {
        let lights = &self.get_data().lights;
        let n = lights.len();
        if n == 0 {
            return Spectrum::ZERO;
        }

        let mut hal2 = Halton::new(2, base_offset + state.correlative_sample_number);
        let lnum = min((hal2.get_next() * n as Float) as usize, n - 1);
        state.correlative_sample_number += 1;

        let (col, _) = self.do_light_estimation(state, &lights[lnum], sp, data, wo, lnum as u64);
        col * n as Float
    }

    /// Estimates direct lighting from a single light. Returns the radiance
    /// and the fraction of light samples that were not shadowed.
    ///
    /// * `state` - Render state.
    /// * `light` - The light.
    /// * `sp`    - Surface point.
    /// * `data`  - Material data at `sp`.
    /// * `wo`    - Outgoing direction.
    /// * `loffs` - Index of the light, used to decorrelate samples.
    fn do_light_estimation(
        &self,
        state: &mut RenderState,
        light: &ArcLight,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        loffs: u64,
    ) -> (Spectrum, Float) {
        let options = &self.get_data().options;
        let cast_shadows = light.casts_shadows() && sp.material.receives_shadows();
        if light.is_delta() {
            return self.dirac_light(state, light, sp, data, wo, cast_shadows);
        }

        let l_offs = loffs * LIGHT_OFFSET_DELTA;
        let requested = (light.n_samples() as Float * options.light_sample_multiplier).ceil() as usize;
        let n = max(1, state.ray_division.divided_samples(requested));
        let offs = n as u64 * state.pixel_sampling.number + state.pixel_sampling.offset + l_offs;

        let mut hal2 = Halton::new(2, offs);
        let mut hal3 = Halton::new(3, offs);
        let (light_col, unshadowed) =
            self.area_light_sample_light(state, light, sp, data, wo, cast_shadows, n, &mut hal2, &mut hal3);

        // Replay the same stream for the material half.
        hal2.set_start(offs);
        hal3.set_start(offs);
        let material_col =
            self.area_light_sample_material(state, light, sp, data, wo, cast_shadows, n, &mut hal2, &mut hal3);

        (light_col + material_col, unshadowed)
    }

    /// Lighting from a delta light. Returns the radiance and 1 if the light
    /// is visible, 0 otherwise.
    ///
    /// * `state`        - Render state.
    /// * `light`        - The light.
    /// * `sp`           - Surface point.
    /// * `data`         - Material data at `sp`.
    /// * `wo`           - Outgoing direction.
    /// * `cast_shadows` - Test for occluders.
    fn dirac_light(
        &self,
        state: &mut RenderState,
        light: &ArcLight,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        cast_shadows: bool,
    ) -> (Spectrum, Float) {
        let Some((lcol, mut light_ray)) = light.illuminate(sp) else {
            return (Spectrum::ZERO, 0.0);
        };
        light_ray.t_min = self.get_data().scene.shadow_bias(&sp.p);

        let Some(lcol) = self.unshadowed_light(state, &light_ray, lcol, cast_shadows) else {
            return (Spectrum::ZERO, 0.0);
        };

        let material = &sp.material;
        let cos = if material.is_flat() {
            1.0
        } else {
            abs(sp.n.dot(&light_ray.d))
        };
        let surf_col = material.eval(state, sp, data, wo, &light_ray.d, BsdfFlags::ALL);
        let transmittance = self.get_data().scene.volume_transmittance(state, &light_ray);
        (surf_col * lcol * transmittance * cos, 1.0)
    }

    /// Returns the light color reaching the shadow ray origin, filtered by
    /// transparent occluders when transparent shadows are on, or `None` if
    /// the ray is blocked.
    ///
    /// * `state`        - Render state.
    /// * `light_ray`    - The shadow ray.
    /// * `lcol`         - Light color.
    /// * `cast_shadows` - Test for occluders.
    fn unshadowed_light(
        &self,
        state: &RenderState,
        light_ray: &Ray,
        lcol: Spectrum,
        cast_shadows: bool,
    ) -> Option<Spectrum> {
        if !cast_shadows {
            return Some(lcol);
        }

        let MonteCarloData { scene, options, .. } = self.get_data();
        let bias = light_ray.t_min;
        if options.transparent_shadows {
            let (shadowed, filter) = scene.is_shadowed_transparent(state, light_ray, options.s_depth, bias);
            (!shadowed).then(|| lcol * filter)
        } else {
            (!scene.is_shadowed(light_ray, bias)).then_some(lcol)
        }
    }

    /// Light sampling half of MIS for an area light. Returns the radiance
    /// and the fraction of unshadowed samples.
    ///
    /// * `state`        - Render state.
    /// * `light`        - The light.
    /// * `sp`           - Surface point.
    /// * `data`         - Material data at `sp`.
    /// * `wo`           - Outgoing direction.
    /// * `cast_shadows` - Test for occluders.
    /// * `n`            - Number of samples.
    /// * `hal2`         - First sample stream.
    /// * `hal3`         - Second sample stream.
    #[allow(clippy::too_many_arguments)]
    fn area_light_sample_light(
        &self,
        state: &mut RenderState,
        light: &ArcLight,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        cast_shadows: bool,
        n: usize,
        hal2: &mut Halton,
        hal3: &mut Halton,
    ) -> (Spectrum, Float) {
        let MonteCarloData { scene, options, .. } = self.get_data();
        let material = &sp.material;
        let bias = scene.shadow_bias(&sp.p);
        let mut col = Spectrum::ZERO;
        let mut unshadowed = 0;

        for _ in 0..n {
            let (s1, s2) = (hal2.get_next(), hal3.get_next());
            let Some(ls) = light.illum_sample(sp, s1, s2) else {
                continue;
            };
            if ls.pdf <= PDF_EPSILON {
                continue;
            }

            let mut light_ray = ls.ray;
            light_ray.t_min = bias;
            let Some(lcol) = self.unshadowed_light(state, &light_ray, ls.col, cast_shadows) else {
                continue;
            };
            unshadowed += 1;

            let lcol = lcol * scene.volume_transmittance(state, &light_ray);
            let surf_col = material.eval(state, sp, data, wo, &light_ray.d, BsdfFlags::ALL);
            let cos = if material.is_flat() {
                1.0
            } else {
                abs(sp.n.dot(&light_ray.d))
            };

            let mut w = 1.0;
            if light.can_intersect() {
                let m_pdf = material.pdf(state, sp, data, wo, &light_ray.d, MIS_FLAGS);
                if m_pdf > PDF_EPSILON {
                    w = power_heuristic(ls.pdf, m_pdf, options.power_heuristic_exponent);
                }
            }
            col += surf_col * lcol * (cos * w / ls.pdf);
        }

        let inv_n = 1.0 / n as Float;
        (col * inv_n, unshadowed as Float * inv_n)
    }

    /// Material sampling half of MIS for an area light that can be hit by
    /// rays.
    ///
    /// * `state`        - Render state.
    /// * `light`        - The light.
    /// * `sp`           - Surface point.
    /// * `data`         - Material data at `sp`.
    /// * `wo`           - Outgoing direction.
    /// * `cast_shadows` - Test for occluders.
    /// * `n`            - Number of samples.
    /// * `hal2`         - First sample stream.
    /// * `hal3`         - Second sample stream.
    #[allow(clippy::too_many_arguments)]
    fn area_light_sample_material(
        &self,
        state: &mut RenderState,
        light: &ArcLight,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        cast_shadows: bool,
        n: usize,
        hal2: &mut Halton,
        hal3: &mut Halton,
    ) -> Spectrum {
        if !light.can_intersect() {
            return Spectrum::ZERO;
        }

        let MonteCarloData { scene, options, .. } = self.get_data();
        let material = &sp.material;
        let t_min = scene.ray_min_dist(&sp.p);
        let bias = scene.shadow_bias(&sp.p);
        let mut col = Spectrum::ZERO;

        for _ in 0..n {
            let mut s = BsdfSample::new(hal2.get_next(), hal3.get_next(), MIS_FLAGS);
            let (wi, surf_col, w_sample) = material.sample(state, sp, data, wo, &mut s);
            if s.pdf <= PDF_EPSILON {
                continue;
            }

            let ray = Ray::with_min_dist(sp.p, wi, t_min);
            let Some((t, lcol, ipdf)) = light.intersect(&ray) else {
                continue;
            };
            if ipdf <= PDF_EPSILON {
                continue;
            }

            let shadow_ray = Ray::segment(sp.p, wi, bias, t);
            let Some(lcol) = self.unshadowed_light(state, &shadow_ray, lcol, cast_shadows) else {
                continue;
            };

            let lcol = lcol * scene.volume_transmittance(state, &shadow_ray);
            let l_pdf = 1.0 / ipdf;
            let w = power_heuristic(s.pdf, l_pdf, options.power_heuristic_exponent);
            col += surf_col * lcol * (w * w_sample);
        }

        col / n as Float
    }

    /// Density estimate of the caustic map at a surface point.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point.
    /// * `data`  - Material data at `sp`.
    /// * `wo`    - Outgoing direction.
    fn estimate_caustic_photons(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
    ) -> Spectrum {
        let MonteCarloData {
            caustic_map, options, ..
        } = self.get_data();
        if !caustic_map.is_built() {
            return Spectrum::ZERO;
        }

        let radius_sq = options.caustic_radius * options.caustic_radius;
        let (found, radius_sq) = caustic_map.gather(&sp.p, options.caustic_search, radius_sq);
        if found.is_empty() {
            return Spectrum::ZERO;
        }

        let inv_radius_sq = 1.0 / radius_sq;
        let mut sum = Spectrum::ZERO;
        for f in found.iter() {
            let surf_col = sp.material.eval(state, sp, data, wo, &f.photon.dir, BsdfFlags::ALL);
            sum += surf_col * f.photon.color * kernel(f.dist_sq, inv_radius_sq);
        }
        sum * caustic_map.inv_path_count()
    }

    /// Caustic contribution clamped by `clamp_indirect` and recorded in the
    /// caustics layer.
    ///
    /// * `state`  - Render state.
    /// * `sp`     - Surface point.
    /// * `data`   - Material data at `sp`.
    /// * `wo`     - Outgoing direction.
    /// * `layers` - Optional debug layers.
    fn caustic_photons(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        layers: &mut Option<&mut ColorLayers>,
    ) -> Spectrum {
        let col = self.clamp_indirect(self.estimate_caustic_photons(state, sp, data, wo));
        record_add(layers, LayerKind::Caustics, col, state.ray_level == 0)
    }

    /// Applies `clamp_indirect` when it is enabled.
    ///
    /// * `col` - Indirect light.
    fn clamp_indirect(&self, col: Spectrum) -> Spectrum {
        let clamp = self.get_data().options.clamp_indirect;
        if clamp > 0.0 {
            col.clamp_proportional(clamp)
        } else {
            col
        }
    }

    /// Traces a continuation ray one level deeper.
    ///
    /// * `state`            - Render state.
    /// * `ray`              - The continuation ray.
    /// * `additional_depth` - Extra recursion depth.
    fn trace_deeper(&self, state: &mut RenderState, ray: &Ray, additional_depth: usize) -> (Spectrum, Float) {
        state.ray_level += 1;
        let result = self.integrate(state, ray, additional_depth, None);
        state.ray_level -= 1;
        result
    }

    /// Transmittance of the medium behind the surface along a continuation
    /// ray, up to the next hit.
    ///
    /// * `state` - Render state.
    /// * `sp`    - Surface point the ray leaves.
    /// * `data`  - Material data at `sp`.
    /// * `ray`   - The continuation ray.
    fn continuation_transmittance(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        ray: &Ray,
    ) -> Spectrum {
        if !data.bsdf_flags.contains(BsdfFlags::VOLUMETRIC) {
            return Spectrum::ONE;
        }
        let Some(volume) = sp.material.volume_handler(sp.ng.dot(&ray.d) < 0.0) else {
            return Spectrum::ONE;
        };
        match self.get_data().scene.intersect(ray) {
            Some((_, t)) => volume.transmittance(state, &Ray::segment(ray.o, ray.d, ray.t_min, t)),
            None => Spectrum::ONE,
        }
    }

    /// Recurses into the dispersive, glossy and specular lobes at a surface
    /// point. Returns the radiance and the averaged alpha of the branches.
    ///
    /// * `state`            - Render state.
    /// * `sp`               - Surface point.
    /// * `data`             - Material data at `sp`.
    /// * `wo`               - Outgoing direction.
    /// * `additional_depth` - Extra recursion depth.
    /// * `layers`           - Optional debug layers.
    fn recursive_raytrace(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        additional_depth: usize,
        layers: &mut Option<&mut ColorLayers>,
    ) -> (Spectrum, Float) {
        let options = &self.get_data().options;
        if state.ray_level > options.r_depth + additional_depth {
            return (Spectrum::ZERO, 1.0);
        }

        let flags = data.bsdf_flags;
        let top_level = state.ray_level == 0;
        let mut col = Spectrum::ZERO;
        let mut alpha = 0.0;
        let mut branches = 0;

        if flags.contains(BsdfFlags::DISPERSIVE) && state.chromatic {
            let (c, a) = self.dispersive(state, sp, data, wo, additional_depth);
            col += record_add(layers, LayerKind::Transmission, c, top_level);
            alpha += a;
            branches += 1;
        }

        if state.ray_level < MAX_SPECULAR_RAY_LEVEL
            && flags.intersects(BsdfFlags::GLOSSY | BsdfFlags::SPECULAR | BsdfFlags::FILTER)
        {
            if flags.contains(BsdfFlags::GLOSSY) {
                let (c, a) = self.glossy(state, sp, data, wo, additional_depth);
                col += record_add(layers, LayerKind::Glossy, c, top_level);
                alpha += a;
                branches += 1;
            }

            if flags.intersects(BsdfFlags::SPECULAR | BsdfFlags::FILTER) {
                let spec = sp.material.specular(state, sp, data, wo);
                if let Some((dir, reflect_col)) = spec.reflect {
                    let (c, a) = self.specular_reflect(state, sp, data, &dir, reflect_col, additional_depth);
                    col += record_add(layers, LayerKind::Glossy, c, top_level);
                    alpha += a;
                    branches += 1;
                }
                if let Some((dir, refract_col)) = spec.refract {
                    let (c, a) = self.specular_refract(state, sp, data, &dir, refract_col, additional_depth);
                    col += record_add(layers, LayerKind::Transmission, c, top_level);
                    alpha += a;
                    branches += 1;
                }
            }
        }

        let alpha = if branches > 0 { alpha / branches as Float } else { 1.0 };
        (col, alpha)
    }

    /// Splits the path over stratified wavelengths.
    ///
    /// * `state`            - Render state.
    /// * `sp`               - Surface point.
    /// * `data`             - Material data at `sp`.
    /// * `wo`               - Outgoing direction.
    /// * `additional_depth` - Extra recursion depth.
    fn dispersive(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        additional_depth: usize,
    ) -> (Spectrum, Float) {
        let MonteCarloData { scene, options, .. } = self.get_data();
        let old_division = state.ray_division;
        let old_wavelength = state.wavelength;
        let pixel = state.pixel_sampling;

        let samples = max(1, old_division.divided_samples(options.dispersive_samples));
        let division = old_division.division * samples;
        let mut branch = (division * old_division.offset) as u64;
        let ss1 = ri_s((pixel.number + pixel.offset) as u32, 0);

        let mut col = Spectrum::ZERO;
        let mut alpha = 0.0;
        for ns in 0..samples {
            let mut wavelength = (ns as Float + ss1) / samples as Float;
            if old_division.division > 1 {
                wavelength = add_mod1(wavelength, old_division.decorrelation_1);
            }
            state.ray_division = branch_division(state.ray_level, division, branch, pixel.offset);
            branch += 1;

            state.wavelength = wavelength;
            let mut s = BsdfSample::new(
                0.5,
                0.5,
                BsdfFlags::REFLECT | BsdfFlags::TRANSMIT | BsdfFlags::DISPERSIVE,
            );
            let (wi, mcol, w) = sp.material.sample(state, sp, data, wo, &mut s);
            if s.pdf > PDF_EPSILON && s.sampled_flags.contains(BsdfFlags::DISPERSIVE) {
                state.chromatic = false;
                let ray = Ray::with_min_dist(sp.p, wi, scene.ray_min_dist(&sp.p));
                let (c, a) = self.trace_deeper(state, &ray, additional_depth);
                let c = c * self.continuation_transmittance(state, sp, data, &ray);
                col += c * mcol * wavelength_to_rgb(wavelength) * w;
                alpha += a;
                state.chromatic = true;
            }
        }

        state.ray_division = old_division;
        state.wavelength = old_wavelength;
        let inv_samples = 1.0 / samples as Float;
        (col * inv_samples, alpha * inv_samples)
    }

    /// Samples the glossy lobes. Materials with glossy transmission get a
    /// reflected and a transmitted branch per sample.
    ///
    /// * `state`            - Render state.
    /// * `sp`               - Surface point.
    /// * `data`             - Material data at `sp`.
    /// * `wo`               - Outgoing direction.
    /// * `additional_depth` - Extra recursion depth.
    fn glossy(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        additional_depth: usize,
    ) -> (Spectrum, Float) {
        let MonteCarloData { scene, options, .. } = self.get_data();
        let old_division = state.ray_division;
        let pixel = state.pixel_sampling;
        let flags = data.bsdf_flags;

        let samples = max(1, old_division.divided_samples(options.glossy_samples));
        let division = old_division.division * samples;
        let mut branch = (division * old_division.offset) as u64;
        let offs = samples as u64 * pixel.number + pixel.offset;
        let mut hal2 = Halton::new(2, offs);
        let mut hal3 = Halton::new(3, offs);
        let t_min = scene.ray_min_dist(&sp.p);

        let mut col = Spectrum::ZERO;
        let mut alpha = 0.0;
        let mut traced = 0;
        for _ in 0..samples {
            state.ray_division = branch_division(state.ray_level, division, branch, pixel.offset);
            branch += 1;

            let (mut s1, mut s2) = (hal2.get_next(), hal3.get_next());
            if old_division.division > 1 {
                s1 = add_mod1(s1, old_division.decorrelation_1);
                s2 = add_mod1(s2, old_division.decorrelation_2);
            }

            if flags.contains(BsdfFlags::TRANSMIT) {
                let mut s = BsdfSample::new(s1, s2, BsdfFlags::GLOSSY | BsdfFlags::ALL_GLOSSY);
                let split = sp.material.sample_reflect_transmit(state, sp, data, wo, &mut s);
                for scattered in [split.reflect, split.transmit].into_iter().flatten() {
                    let ray = Ray::with_min_dist(sp.p, scattered.dir, t_min);
                    let (c, a) = self.trace_deeper(state, &ray, additional_depth);
                    let c = c * self.continuation_transmittance(state, sp, data, &ray);
                    col += c * scattered.color * scattered.weight;
                    alpha += a;
                    traced += 1;
                }
            } else {
                let mut s = BsdfSample::new(s1, s2, BsdfFlags::GLOSSY | BsdfFlags::REFLECT);
                let (wi, mcol, w) = sp.material.sample(state, sp, data, wo, &mut s);
                if s.pdf > PDF_EPSILON {
                    let ray = Ray::with_min_dist(sp.p, wi, t_min);
                    let (c, a) = self.trace_deeper(state, &ray, additional_depth);
                    col += c * mcol * w;
                    alpha += a;
                    traced += 1;
                }
            }
        }

        state.ray_division = old_division;
        let alpha = if traced > 0 { alpha / traced as Float } else { 1.0 };
        (col / samples as Float, alpha)
    }

    /// Follows the perfect mirror direction.
    ///
    /// * `state`            - Render state.
    /// * `sp`               - Surface point.
    /// * `data`             - Material data at `sp`.
    /// * `dir`              - Reflected direction.
    /// * `color`            - Reflected color.
    /// * `additional_depth` - Extra recursion depth.
    fn specular_reflect(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        dir: &Vector3f,
        color: Spectrum,
        additional_depth: usize,
    ) -> (Spectrum, Float) {
        let ray = Ray::with_min_dist(sp.p, *dir, self.get_data().scene.ray_min_dist(&sp.p));
        let (c, a) = self.trace_deeper(state, &ray, additional_depth);
        (c * self.continuation_transmittance(state, sp, data, &ray) * color, a)
    }

    /// Follows the refracted direction. The origin moves along the ray by
    /// the transparent bias.
    ///
    /// * `state`            - Render state.
    /// * `sp`               - Surface point.
    /// * `data`             - Material data at `sp`.
    /// * `dir`              - Refracted direction.
    /// * `color`            - Transmitted color.
    /// * `additional_depth` - Extra recursion depth.
    fn specular_refract(
        &self,
        state: &mut RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        dir: &Vector3f,
        color: Spectrum,
        additional_depth: usize,
    ) -> (Spectrum, Float) {
        let MonteCarloData { scene, options, .. } = self.get_data();
        let (bias, by_depth) = sp.material.transparent_bias().unwrap_or((
            options.transparent_bias_factor,
            options.transparent_bias_multiply_ray_depth,
        ));

        let mut origin = sp.p;
        if bias > 0.0 {
            let offset = if by_depth {
                bias * state.ray_level as Float
            } else {
                bias
            };
            origin = origin + *dir * offset;
        }

        let ray = Ray::with_min_dist(origin, *dir, scene.ray_min_dist(&origin));
        let (c, a) = self.trace_deeper(state, &ray, additional_depth);
        (c * self.continuation_transmittance(state, sp, data, &ray) * color, a)
    }

    /// Alpha of a hit under the current background setting.
    ///
    /// * `state`       - Render state.
    /// * `sp`          - Surface point.
    /// * `data`        - Material data at `sp`.
    /// * `wo`          - Outgoing direction.
    /// * `inner_alpha` - Alpha returned by the recursion.
    fn hit_alpha(
        &self,
        state: &RenderState,
        sp: &SurfacePoint,
        data: &MaterialData,
        wo: &Vector3f,
        inner_alpha: Float,
    ) -> Float {
        if self.get_data().options.transparent_background {
            let m_alpha = sp.material.alpha(state, sp, data, wo);
            m_alpha + (1.0 - m_alpha) * inner_alpha
        } else {
            1.0
        }
    }

    /// Alpha of a ray that leaves the scene.
    fn miss_alpha(&self) -> Float {
        if self.get_data().options.transparent_background {
            0.0
        } else {
            1.0
        }
    }
}

/// Shifts a sample pair by the decorrelation of a divided ray.
///
/// * `division` - Stratification context.
/// * `s1`       - First sample.
/// * `s2`       - Second sample.
pub(crate) fn decorrelate(division: &RayDivision, s1: Float, s2: Float) -> (Float, Float) {
    if division.division > 1 {
        (
            add_mod1(s1, division.decorrelation_1),
            add_mod1(s2, division.decorrelation_2),
        )
    } else {
        (s1, s2)
    }
}

/// Returns the stratification context of one branch of a split ray.
///
/// * `ray_level`    - Recursion level of the splitting surface.
/// * `division`     - Total number of branches.
/// * `branch`       - Index of this branch.
/// * `pixel_offset` - Pixel-derived sample offset.
fn branch_division(ray_level: usize, division: usize, branch: u64, pixel_offset: u64) -> RayDivision {
    RayDivision {
        division,
        offset: branch as usize,
        decorrelation_1: low_discrepancy_sampling(2 * ray_level + 1, branch + pixel_offset),
        decorrelation_2: low_discrepancy_sampling(2 * ray_level + 2, branch + pixel_offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = MonteCarloOptions::default();
        assert_eq!(options.r_depth, 5);
        assert_eq!(options.caustic_search, 50);
        assert_eq!(options.photon_maps_processing, PhotonMapProcessing::GenerateOnly);
        assert!(options.n_threads >= 1);
        assert_eq!(options.n_threads_photons, options.n_threads);
    }

    #[test]
    fn branches_are_decorrelated() {
        let a = branch_division(0, 4, 0, 17);
        let b = branch_division(0, 4, 1, 17);
        assert_eq!(a.division, 4);
        assert_eq!(b.offset, 1);
        assert!(a.decorrelation_1 != b.decorrelation_1);
        assert!((0.0..1.0).contains(&a.decorrelation_2));
    }

    #[test]
    fn mis_flags_exclude_specular() {
        assert!(!MIS_FLAGS.contains(BsdfFlags::SPECULAR));
        assert!(MIS_FLAGS.contains(BsdfFlags::DIFFUSE | BsdfFlags::GLOSSY));
    }
}

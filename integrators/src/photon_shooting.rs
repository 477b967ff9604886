//! Photon Shooting

use core::error::*;
use core::geometry::*;
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
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

/// File suffix of the saved diffuse photon map.
pub const DIFFUSE_MAP_SUFFIX: &str = "_diffuse.photonmap";

/// File suffix of the saved caustic photon map.
pub const CAUSTIC_MAP_SUFFIX: &str = "_caustic.photonmap";

/// File suffix of the saved radiance photon map.
pub const RADIANCE_MAP_SUFFIX: &str = "_fg_radiance.photonmap";

/// Radiance points pre-gathered per work item.
const PRE_GATHER_CHUNK: usize = 32;

/// Which photons a shooting pass stores.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhotonKind {
    /// Photons at diffuse or glossy hits of paths that went through a
    /// specular, glossy or dispersive bounce.
    Caustic,

    /// Photons at diffuse hits of all other paths.
    Diffuse,
}

impl PhotonKind {
    /// Lobes a photon may scatter into.
    fn scatter_flags(&self) -> BsdfFlags {
        match self {
            Self::Caustic => {
                BsdfFlags::ALL_SPECULAR | BsdfFlags::GLOSSY | BsdfFlags::FILTER | BsdfFlags::DISPERSIVE
            }
            Self::Diffuse => BsdfFlags::ALL,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Caustic => "Caustic photons",
            Self::Diffuse => "Diffuse photons",
        }
    }
}

/// Parameters of one shooting pass.
#[derive(Copy, Clone, Debug)]
pub struct ShootSettings {
    /// Photons to store.
    pub kind: PhotonKind,

    /// Requested number of photon paths.
    pub n_photons: usize,

    /// Worker threads.
    pub n_threads: usize,

    /// Maximum number of bounces per path.
    pub max_bounces: usize,

    /// Probability of recording a radiance point at a stored diffuse photon.
    /// `None` records none.
    pub radiance_probability: Option<Float>,
}

impl ShootSettings {
    /// Returns the number of worker threads and the total number of paths.
    /// The total is a multiple of the thread count, with at least one path
    /// per thread.
    pub fn partition(&self) -> (usize, usize) {
        let n_threads = max(1, self.n_threads);
        let per_thread = max(1, self.n_photons.div_ceil(n_threads));
        (n_threads, per_thread * n_threads)
    }
}

/// Lights taking part in a shooting pass, selected in proportion to their
/// total energy.
pub struct PhotonLights {
    lights: Vec<ArcLight>,
    distribution: Distribution1D,
}

impl PhotonLights {
    /// Returns the light selection distribution, or `None` without lights.
    ///
    /// * `lights` - The lights.
    pub fn new(lights: Vec<ArcLight>) -> Option<Self> {
        if lights.is_empty() {
            return None;
        }
        let energies = lights.iter().map(|l| l.total_energy().energy()).collect();
        Some(Self {
            lights,
            distribution: Distribution1D::new(energies),
        })
    }

    /// Returns the number of lights.
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    /// Returns true if there are no lights.
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Picks a light with `sl` and emits a photon from it. The color is
    /// divided by both the light selection and the emission density.
    ///
    /// * `sl`         - Light selection sample.
    /// * `s1`..`s4`   - Emission samples.
    fn emit(&self, sl: Float, s1: Float, s2: Float, s3: Float, s4: Float) -> Result<Option<EmittedPhoton>> {
        let (index, light_num_pdf, _) = self.distribution.sample_discrete(sl);
        if index >= self.lights.len() {
            return Err(PhotonError::LightSelection {
                sample: sl,
                index,
                lights: self.lights.len(),
            });
        }
        if light_num_pdf <= 0.0 {
            return Ok(None);
        }

        let mut emitted = self.lights[index].emit_photon(s1, s2, s3, s4);
        emitted.color = emitted.color * (emitted.ipdf / light_num_pdf);
        Ok(Some(emitted))
    }
}

/// Photons and radiance points produced by one worker.
#[derive(Default)]
struct WorkerBatch {
    photons: Vec<Photon>,
    radiance_points: Vec<RadianceData>,
    paths: u64,
}

/// Shoots photons from `lights` into `map`. The map is not built. Returns
/// the radiance points recorded along the way.
///
/// Each worker traces a disjoint range of sample indices. Batches are
/// appended in worker order so that results do not depend on scheduling.
///
/// * `scene`    - The scene.
/// * `lights`   - Lights taking part.
/// * `settings` - Pass parameters.
/// * `control`  - Progress counter and cancellation flag.
/// * `map`      - Receives the photons.
pub fn shoot_photons(
    scene: &Scene,
    lights: &PhotonLights,
    settings: &ShootSettings,
    control: &RenderControl,
    map: &mut PhotonMap,
) -> Result<Vec<RadianceData>> {
    let (n_threads, n_photons) = settings.partition();
    info!(
        "Shooting {} {} with {} threads from {} lights",
        n_photons,
        settings.kind.tag().to_lowercase(),
        n_threads,
        lights.len()
    );
    for light in lights.lights.iter() {
        debug!(
            "Light energy {:?}, caustic photons: {}, diffuse photons: {}",
            light.total_energy(),
            light.shoots_caustic_photons(),
            light.shoots_diffuse_photons()
        );
    }

    map.reserve(n_photons);
    let progress = create_progress_bar(n_photons as u64, settings.kind.tag());
    let slots: Mutex<Vec<Option<WorkerBatch>>> = Mutex::new((0..n_threads).map(|_| None).collect());

    thread::scope(|scope| -> Result<()> {
        let handles: Vec<_> = (0..n_threads)
            .map(|thread_id| {
                let slots = &slots;
                let progress = &progress;
                scope.spawn(move || -> Result<()> {
                    let batch = shoot_worker(scene, lights, settings, n_photons, thread_id, control, progress)?;
                    control.add_progress(batch.paths as usize);
                    let mut slots = slots.lock().unwrap_or_else(|e| e.into_inner());
                    slots[thread_id] = Some(batch);
                    Ok(())
                })
            })
            .collect();

        let mut result = Ok(());
        for handle in handles {
            match handle.join() {
                Ok(r) => {
                    if result.is_ok() {
                        result = r;
                    }
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        result
    })?;
    progress.finish_and_clear();

    let mut radiance_points = Vec::new();
    let slots = slots.into_inner().unwrap_or_else(|e| e.into_inner());
    for batch in slots.into_iter().flatten() {
        map.append_batch(batch.photons, batch.paths);
        radiance_points.extend(batch.radiance_points);
    }
    info!(
        "Stored {} {} from {} paths",
        map.photon_count(),
        settings.kind.tag().to_lowercase(),
        map.path_count()
    );
    Ok(radiance_points)
}

/// Traces the photon paths of one worker.
///
/// * `scene`     - The scene.
/// * `lights`    - Lights taking part.
/// * `settings`  - Pass parameters.
/// * `n_photons` - Total number of paths over all workers.
/// * `thread_id` - Index of the worker.
/// * `control`   - Progress counter and cancellation flag.
/// * `progress`  - Progress bar.
fn shoot_worker(
    scene: &Scene,
    lights: &PhotonLights,
    settings: &ShootSettings,
    n_photons: usize,
    thread_id: usize,
    control: &RenderControl,
    progress: &ProgressBar,
) -> Result<WorkerBatch> {
    let (n_threads, _) = settings.partition();
    let per_thread = n_photons / n_threads;
    let step = max(1, n_photons / 128);
    let inv_n = 1.0 / n_photons as Float;
    let mut state = RenderState::new(thread_id, thread_id as u64);
    let mut batch = WorkerBatch::default();
    let mut reported = 0;

    for local in 0..per_thread {
        if local % step == 0 {
            if control.is_cancelled() {
                return Err(PhotonError::Cancelled);
            }
            if local > 0 {
                progress.inc(step as u64);
                reported += step;
            }
        }

        let index = (thread_id * per_thread + local) as u64;
        batch.paths += 1;
        trace_photon(scene, lights, settings, index, inv_n, &mut state, &mut batch)?;
    }
    progress.inc((per_thread - reported) as u64);
    Ok(batch)
}

/// Traces one photon path and stores its photons in `batch`.
///
/// * `scene`    - The scene.
/// * `lights`   - Lights taking part.
/// * `settings` - Pass parameters.
/// * `index`    - Sample index of the path.
/// * `inv_n`    - 1 / total number of paths.
/// * `state`    - Render state of the worker.
/// * `batch`    - Receives photons and radiance points.
fn trace_photon(
    scene: &Scene,
    lights: &PhotonLights,
    settings: &ShootSettings,
    index: u64,
    inv_n: Float,
    state: &mut RenderState,
    batch: &mut WorkerBatch,
) -> Result<()> {
    let wavelength = ri_s(index as u32, 0);
    let s1 = ri_vdc(index as u32, 0);
    let s2 = low_discrepancy_sampling(2, index);
    let s3 = low_discrepancy_sampling(3, index);
    let s4 = low_discrepancy_sampling(4, index);
    let sl = index as Float * inv_n;

    let Some(emitted) = lights.emit(sl, s1, s2, s3, s4)? else {
        return Ok(());
    };
    let mut pcol = emitted.color;
    if pcol.has_nans() {
        warn!("NaN photon color from light sample {index}, skipping photon");
        return Ok(());
    }
    if pcol.is_black() {
        return Ok(());
    }

    state.chromatic = true;
    state.wavelength = wavelength;

    let mut ray = Ray::with_min_dist(emitted.ray.o, emitted.ray.d, scene.ray_min_dist(&emitted.ray.o));
    let mut prev: Option<(ArcMaterial, Vector3f)> = None;
    let mut caustic_photon = false;
    let mut direct_photon = true;
    let flags = settings.kind.scatter_flags();

    for n_bounces in 0.. {
        let Some((sp, t)) = scene.intersect(&ray) else {
            break;
        };

        // Medium between the previous hit and this one.
        let mut transmittance = Spectrum::ONE;
        if let Some((material, ng)) = prev.as_ref() {
            if let Some(volume) = material.volume_handler(ng.dot(&ray.d) < 0.0) {
                transmittance = volume.transmittance(state, &Ray::segment(ray.o, ray.d, 0.0, t));
            }
        }

        let wi = -ray.d;
        let material = Arc::clone(&sp.material);
        let data = material.initialize_at_point(state, &sp);
        let bsdfs = data.bsdf_flags;

        match settings.kind {
            PhotonKind::Caustic => {
                if caustic_photon && bsdfs.intersects(BsdfFlags::DIFFUSE | BsdfFlags::GLOSSY) {
                    batch.photons.push(Photon::new(wi, sp.p, pcol));
                }
            }
            PhotonKind::Diffuse => {
                if bsdfs.contains(BsdfFlags::DIFFUSE) && !caustic_photon {
                    batch.photons.push(Photon::new(wi, sp.p, pcol));
                    if let Some(probability) = settings.radiance_probability {
                        if state.rng.uniform_float() < probability {
                            batch.radiance_points.push(radiance_point(state, &sp, &data, &wi));
                        }
                    }
                }
            }
        }

        if n_bounces == settings.max_bounces {
            break;
        }

        let d5 = 3 * n_bounces + 5;
        let mut s = PhotonSample::new(
            low_discrepancy_sampling(d5, index),
            low_discrepancy_sampling(d5 + 1, index),
            low_discrepancy_sampling(d5 + 2, index),
            flags,
            pcol,
            transmittance,
        );
        let Some(wo) = material.scatter_photon(state, &sp, &data, &wi, &mut s) else {
            break;
        };
        pcol = s.color;

        let sampled = s.sample.sampled_flags;
        caustic_photon = (sampled.intersects(BsdfFlags::GLOSSY | BsdfFlags::SPECULAR | BsdfFlags::DISPERSIVE)
            && direct_photon)
            || (sampled.intersects(
                BsdfFlags::GLOSSY | BsdfFlags::SPECULAR | BsdfFlags::FILTER | BsdfFlags::DISPERSIVE,
            ) && caustic_photon);
        direct_photon = sampled.contains(BsdfFlags::FILTER) && direct_photon;

        if settings.kind == PhotonKind::Caustic && !(caustic_photon || direct_photon) {
            break;
        }

        if state.chromatic && sampled.contains(BsdfFlags::DISPERSIVE) {
            state.chromatic = false;
            pcol *= wavelength_to_rgb(wavelength);
        }

        if pcol.has_nans() {
            warn!("NaN photon color after bounce {n_bounces} of path {index}, dropping path");
            break;
        }

        ray = Ray::with_min_dist(sp.p, wo, scene.ray_min_dist(&sp.p));
        prev = bsdfs
            .contains(BsdfFlags::VOLUMETRIC)
            .then(|| (material, sp.ng));
    }
    Ok(())
}

/// Records a radiance point at a diffuse photon hit.
///
/// * `state` - Render state.
/// * `sp`    - Surface point.
/// * `data`  - Material data at `sp`.
/// * `wi`    - Direction the photon came from.
fn radiance_point(state: &RenderState, sp: &SurfacePoint, data: &MaterialData, wi: &Vector3f) -> RadianceData {
    let normal = face_forward(&sp.ng, &sp.n, wi);
    let lobes = BsdfFlags::DIFFUSE | BsdfFlags::GLOSSY;
    let refl = sp.material.reflectivity(state, sp, data, lobes | BsdfFlags::REFLECT);
    let transm = sp.material.reflectivity(state, sp, data, lobes | BsdfFlags::TRANSMIT);
    RadianceData::new(sp.p, normal, refl, transm)
}

/// Marks radiance points closer than `min_dist` to an earlier kept point
/// facing the same side as unused, and returns the kept points.
///
/// * `points`   - Radiance points.
/// * `min_dist` - Minimum distance between kept points.
pub fn thin_radiance_points(mut points: Vec<RadianceData>, min_dist: Float) -> Vec<RadianceData> {
    let positions: Vec<Point3f> = points.iter().map(|p| p.pos).collect();
    let tree = KdTree::new(&positions);
    let min_dist_sq = min_dist * min_dist;

    for i in 0..points.len() {
        if !points[i].use_point {
            continue;
        }
        let (pos, normal) = (points[i].pos, points[i].normal);
        let mut redundant = Vec::new();
        tree.lookup(&pos, min_dist_sq, |j, _dist_sq, _max_dist_sq| {
            if j != i && normal.dot(&points[j].normal) > 0.0 {
                redundant.push(j);
            }
        });
        for j in redundant {
            points[j].use_point = false;
        }
    }

    let before = points.len();
    points.retain(|p| p.use_point);
    debug!("Thinned radiance points from {} to {}", before, points.len());
    points
}

/// Estimates the radiance leaving each point from the diffuse map and
/// returns one radiance photon per point, in input order.
///
/// * `points`      - Radiance points.
/// * `diffuse_map` - The built diffuse map.
/// * `search`      - Maximum photons per lookup.
/// * `radius`      - Lookup radius.
/// * `n_threads`   - Worker threads.
/// * `control`     - Progress counter and cancellation flag.
pub fn pre_gather_radiance(
    points: &[RadianceData],
    diffuse_map: &PhotonMap,
    search: usize,
    radius: Float,
    n_threads: usize,
    control: &RenderControl,
) -> Result<Vec<Photon>> {
    info!("Pre-gathering radiance at {} points", points.len());
    let n_threads = max(1, n_threads);
    let n_chunks = points.len().div_ceil(PRE_GATHER_CHUNK);
    let progress = create_progress_bar(points.len() as u64, "Pre-gathering radiance");
    let mut radiance: Vec<Photon> = Vec::with_capacity(points.len());

    thread::scope(|scope| {
        let (tx_collector, rx_collector) = crossbeam_channel::bounded::<(usize, Vec<Photon>)>(n_threads);
        let (tx_worker, rx_worker) = crossbeam_channel::bounded::<usize>(n_threads);

        // Spawn collector thread.
        let radiance = &mut radiance;
        let progress = &progress;
        scope.spawn(move || {
            let mut chunks: Vec<Option<Vec<Photon>>> = (0..n_chunks).map(|_| None).collect();
            for (chunk, photons) in rx_collector.iter() {
                progress.inc(photons.len() as u64);
                chunks[chunk] = Some(photons);
            }
            radiance.extend(chunks.into_iter().flatten().flatten());
        });

        // Spawn worker threads.
        for _ in 0..n_threads {
            let rx_worker = rx_worker.clone();
            let tx_collector = tx_collector.clone();
            scope.spawn(move || {
                for chunk in rx_worker.iter() {
                    if control.is_cancelled() {
                        continue;
                    }
                    let start = chunk * PRE_GATHER_CHUNK;
                    let end = min(start + PRE_GATHER_CHUNK, points.len());
                    let photons = points[start..end]
                        .iter()
                        .map(|p| radiance_photon(p, diffuse_map, search, radius))
                        .collect();
                    if tx_collector.send((chunk, photons)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(rx_worker); // Drop extra since we've cloned one for each worker.
        drop(tx_collector);

        // Send work.
        for chunk in 0..n_chunks {
            if tx_worker.send(chunk).is_err() {
                break;
            }
        }
    });
    progress.finish_and_clear();

    if control.is_cancelled() {
        return Err(PhotonError::Cancelled);
    }
    Ok(radiance)
}

/// Radiance leaving a radiance point, from a diffuse map lookup.
///
/// * `point`       - The radiance point.
/// * `diffuse_map` - The built diffuse map.
/// * `search`      - Maximum photons per lookup.
/// * `radius`      - Lookup radius.
fn radiance_photon(point: &RadianceData, diffuse_map: &PhotonMap, search: usize, radius: Float) -> Photon {
    let (found, radius_sq) = diffuse_map.gather(&point.pos, search, radius * radius);
    let mut sum = Spectrum::ZERO;
    if !found.is_empty() && radius_sq > 0.0 {
        let mut reflected = Spectrum::ZERO;
        let mut transmitted = Spectrum::ZERO;
        for f in found.iter() {
            if point.normal.dot(&f.photon.dir) > 0.0 {
                reflected += f.photon.color;
            } else {
                transmitted += f.photon.color;
            }
        }
        let scale = diffuse_map.inv_path_count() / (PI * radius_sq);
        sum = (reflected * point.refl + transmitted * point.transm) * scale;
    }
    Photon::new(point.normal, point.pos, sum)
}

/// Returns the file of a saved map, if a base path is configured.
///
/// * `base`   - Base path.
/// * `suffix` - Map file suffix.
pub fn photon_map_path(base: Option<&Path>, suffix: &str) -> Option<PathBuf> {
    base.map(|base| {
        let mut path = base.as_os_str().to_owned();
        path.push(suffix);
        PathBuf::from(path)
    })
}

/// Moves a map to a new life cycle state.
///
/// * `map`       - The map.
/// * `map_state` - Current state.
/// * `new_state` - New state.
pub fn set_map_state(map: &PhotonMap, map_state: &mut PhotonMapState, new_state: PhotonMapState) {
    debug!("{} photon map: {} -> {}", map.name(), map_state, new_state);
    *map_state = new_state;
}

/// Loads and builds a map.
///
/// * `map`       - The map.
/// * `map_state` - Life cycle of `map`.
/// * `path`      - File to load.
pub fn load_map(map: &mut PhotonMap, map_state: &mut PhotonMapState, path: Option<&Path>) -> Result<()> {
    set_map_state(map, map_state, PhotonMapState::Loading);
    let Some(path) = path else {
        set_map_state(map, map_state, PhotonMapState::Idle);
        return Err(PhotonError::io(
            "",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no photon map path configured"),
        ));
    };

    info!("Loading {} photon map from {}", map.name(), path.display());
    if let Err(e) = map.load(path) {
        map.clear();
        set_map_state(map, map_state, PhotonMapState::Idle);
        return Err(e);
    }
    map.build();
    set_map_state(map, map_state, PhotonMapState::Built);
    Ok(())
}

/// Saves a map. Failures are logged and do not stop rendering.
///
/// * `map`       - The map.
/// * `map_state` - Life cycle of `map`.
/// * `path`      - Destination file.
pub fn save_map(map: &PhotonMap, map_state: &mut PhotonMapState, path: Option<&Path>) {
    let Some(path) = path else {
        warn!("No photon map path configured, {} photon map not saved", map.name());
        return;
    };

    set_map_state(map, map_state, PhotonMapState::Saving);
    info!("Saving {} photon map to {}", map.name(), path.display());
    if let Err(e) = map.save(path) {
        error!("Saving {} photon map failed: {e}", map.name());
    }
}

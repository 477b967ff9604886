//! Image Rendering

use crate::camera::*;
use core::integrator::*;
use core::low_discrepancy::*;
use core::parallel::*;
use core::pbrt::*;
use core::render::*;
use core::spectrum::*;
use std::thread;

/// Image resolution and sampling settings.
#[derive(Copy, Clone, Debug)]
pub struct ImageSettings {
    /// Image width.
    pub width: usize,

    /// Image height.
    pub height: usize,

    /// Samples per pixel.
    pub spp: u64,

    /// Worker threads.
    pub n_threads: usize,
}

/// Renders the image one row per work item and returns the pixels in row
/// major order starting at the top left.
///
/// * `integrator` - The surface integrator.
/// * `camera`     - The camera.
/// * `settings`   - Image settings.
pub fn render_image(integrator: &dyn SurfaceIntegrator, camera: &PinholeCamera, settings: ImageSettings) -> Vec<Spectrum> {
    let ImageSettings {
        width,
        height,
        spp,
        n_threads,
    } = settings;
    let n_threads = max(1, n_threads);
    let spp = max(1, spp);

    info!("Rendering {}x{} pixels at {} spp with {}", width, height, spp, integrator.name());
    let progress = create_progress_bar(height as u64, "Rendering");
    let mut rows: Vec<Vec<Spectrum>> = vec![vec![]; height];

    thread::scope(|scope| {
        let (tx_collector, rx_collector) = crossbeam_channel::bounded::<(usize, Vec<Spectrum>)>(n_threads);
        let (tx_worker, rx_worker) = crossbeam_channel::bounded::<usize>(n_threads);

        // Spawn collector thread.
        let rows = &mut rows;
        let progress = &progress;
        scope.spawn(move || {
            for (y, row) in rx_collector.iter() {
                rows[y] = row;
                progress.inc(1);
            }
        });

        // Spawn worker threads.
        for thread_id in 0..n_threads {
            let rx_worker = rx_worker.clone();
            let tx_collector = tx_collector.clone();
            scope.spawn(move || {
                let mut state = RenderState::new(thread_id, thread_id as u64);
                for y in rx_worker.iter() {
                    let row = render_row(integrator, camera, &mut state, y, width, spp);
                    if tx_collector.send((y, row)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(rx_worker); // Drop extra since we've cloned one for each worker.
        drop(tx_collector);

        // Send work.
        for y in 0..height {
            if tx_worker.send(y).is_err() {
                break;
            }
        }
    });
    progress.finish_and_clear();

    rows.into_iter().flatten().collect()
}

/// Renders one row of pixels.
///
/// * `integrator` - The surface integrator.
/// * `camera`     - The camera.
/// * `state`      - Render state of the worker.
/// * `y`          - Row index.
/// * `width`      - Image width.
/// * `spp`        - Samples per pixel.
fn render_row(
    integrator: &dyn SurfaceIntegrator,
    camera: &PinholeCamera,
    state: &mut RenderState,
    y: usize,
    width: usize,
    spp: u64,
) -> Vec<Spectrum> {
    (0..width)
        .map(|x| {
            let pixel = (y * width + x) as u64;
            let offset = pixel * spp;
            let mut col = Spectrum::ZERO;
            for s in 0..spp {
                state.begin_sample(pixel, PixelSamplingData::new(s, offset, spp));

                // Stratified sub-pixel position.
                let n = (offset + s) as u32;
                let dx = ri_vdc(n, 0);
                let dy = ri_s(n, 0);
                let ray = camera.generate_ray(x as Float + dx, y as Float + dy);

                let (c, _alpha) = integrator.integrate(state, &ray, 0, None);
                if !c.has_nans() {
                    col += c;
                }
            }
            col / spp as Float
        })
        .collect()
}

#[macro_use]
extern crate log;

mod camera;
mod cornell;
mod options;
mod render;

use camera::*;
use clap::Parser;
use core::geometry::*;
use core::image_io::*;
use core::integrator::*;
use core::parallel::*;
use integrators::*;
use options::*;
use render::*;
use std::sync::Arc;

fn main() {
    // Initialize `env_logger`.
    env_logger::init();

    let options = Options::parse();
    if let Err(e) = run(&options) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), String> {
    let scene = Arc::new(cornell::cornell_box());
    let n_threads = options.threads();

    let mc_options = MonteCarloOptions {
        caustic_photons: options.caustic_photons,
        n_threads,
        n_threads_photons: n_threads,
        photon_maps_processing: options.photon_maps.into(),
        photon_map_base_path: options.photon_map_path.clone(),
        ..MonteCarloOptions::default()
    };

    let mut integrator: Box<dyn SurfaceIntegrator> = match options.integrator {
        IntegratorArg::Photon => {
            let photon_options = PhotonOptions {
                diffuse_photons: options.photons,
                final_gather: !options.no_final_gather,
                ..PhotonOptions::default()
            };
            Box::new(PhotonIntegrator::new(scene, mc_options, photon_options))
        }
        IntegratorArg::Direct => Box::new(DirectLightIntegrator::new(scene, mc_options)),
        IntegratorArg::Path => {
            let path_options = PathOptions {
                caustic_mode: options.caustics.into(),
                path_samples: options.path_samples,
                bounces: options.bounces,
                ..PathOptions::default()
            };
            Box::new(PathIntegrator::new(scene, mc_options, path_options))
        }
    };

    let control = RenderControl::new();
    integrator
        .preprocess(&control)
        .map_err(|e| format!("{} preprocessing failed: {e}", integrator.name()))?;

    let camera = PinholeCamera::new(
        cornell::EYE,
        cornell::TARGET,
        Vector3f::new(0.0, 0.0, 1.0),
        cornell::FOV,
        options.width,
        options.height,
    );
    let settings = ImageSettings {
        width: options.width,
        height: options.height,
        spp: options.spp,
        n_threads,
    };
    let pixels = render_image(integrator.as_ref(), &camera, settings);

    write_pfm(&options.output, options.width, options.height, &pixels)
        .map_err(|e| format!("Unable to write '{}': {e}", options.output.display()))
}

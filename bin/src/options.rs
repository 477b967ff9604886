//! Command line options

use clap::{Parser, ValueEnum};
use core::photon::*;
use integrators::CausticMode;
use std::path::PathBuf;

/// Photon map handling selected on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhotonMapsArg {
    /// Shoot photons for every render.
    GenerateOnly,

    /// Shoot photons and save the maps.
    GenerateAndSave,

    /// Load maps saved by an earlier render.
    Load,

    /// Keep the maps of the previous render.
    Reuse,
}

impl From<PhotonMapsArg> for PhotonMapProcessing {
    fn from(arg: PhotonMapsArg) -> Self {
        match arg {
            PhotonMapsArg::GenerateOnly => PhotonMapProcessing::GenerateOnly,
            PhotonMapsArg::GenerateAndSave => PhotonMapProcessing::GenerateAndSave,
            PhotonMapsArg::Load => PhotonMapProcessing::Load,
            PhotonMapsArg::Reuse => PhotonMapProcessing::Reuse,
        }
    }
}

/// Surface integrator selected on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum IntegratorArg {
    /// Photon mapping with final gathering.
    Photon,

    /// Direct lighting with caustic photons.
    Direct,

    /// Path tracing.
    Path,
}

/// Caustic handling of the path tracer selected on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CausticsArg {
    /// No caustics.
    None,

    /// Caustics from paths only.
    Path,

    /// Caustics from the caustic photon map only.
    Photon,

    /// Paths and photons.
    Both,
}

impl From<CausticsArg> for CausticMode {
    fn from(arg: CausticsArg) -> Self {
        match arg {
            CausticsArg::None => CausticMode::None,
            CausticsArg::Path => CausticMode::Path,
            CausticsArg::Photon => CausticMode::Photon,
            CausticsArg::Both => CausticMode::Both,
        }
    }
}

/// Renderer options.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Path to the image file.
    #[arg(
        long = "output",
        short = 'o',
        value_name = "FILE",
        default_value = "photon-render.pfm",
        help = "Write the final image to the given PFM file."
    )]
    pub output: PathBuf,

    /// Image width.
    #[arg(long, value_name = "NUM", default_value_t = 256)]
    pub width: usize,

    /// Image height.
    #[arg(long, value_name = "NUM", default_value_t = 256)]
    pub height: usize,

    /// Samples per pixel.
    #[arg(long, value_name = "NUM", default_value_t = 16)]
    pub spp: u64,

    /// Number of threads to use for photon shooting and rendering.
    #[arg(
        long = "threads",
        short = 't',
        value_name = "NUM",
        help = "Use specified number of threads. Defaults to the number of logical CPUs."
    )]
    n_threads: Option<usize>,

    /// Number of diffuse photons.
    #[arg(long, value_name = "NUM", default_value_t = 100000)]
    pub photons: usize,

    /// Number of caustic photons.
    #[arg(long, value_name = "NUM", default_value_t = 500000)]
    pub caustic_photons: usize,

    /// Disable final gathering.
    #[arg(long)]
    pub no_final_gather: bool,

    /// Photon map handling.
    #[arg(long, value_enum, default_value_t = PhotonMapsArg::GenerateOnly)]
    pub photon_maps: PhotonMapsArg,

    /// Base path of saved photon maps.
    #[arg(long, value_name = "PATH")]
    pub photon_map_path: Option<PathBuf>,

    /// Surface integrator.
    #[arg(long, value_enum, default_value_t = IntegratorArg::Photon)]
    pub integrator: IntegratorArg,

    /// Paths per shading point of the path tracer.
    #[arg(long, value_name = "NUM", default_value_t = 32)]
    pub path_samples: usize,

    /// Maximum path length of the path tracer.
    #[arg(long, value_name = "NUM", default_value_t = 3)]
    pub bounces: usize,

    /// Caustic handling of the path tracer.
    #[arg(long, value_enum, default_value_t = CausticsArg::Path)]
    pub caustics: CausticsArg,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            None => max_threads,
            Some(0) => {
                warn!("Invalid threads");
                1
            }
            Some(n) if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            Some(n) => n,
        }
    }
}

//! Core

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

// Re-export.
#[macro_use]
pub mod geometry;

pub mod accelerator;
pub mod error;
pub mod image_io;
pub mod integrator;
pub mod interaction;
pub mod light;
pub mod low_discrepancy;
pub mod material;
pub mod parallel;
pub mod pbrt;
pub mod photon;
pub mod primitive;
pub mod render;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod spectrum;
pub mod volume;

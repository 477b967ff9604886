//! Photon Mapping

mod kd_tree;
mod photon;
mod photon_map;
mod processing;

// Re-export
pub use kd_tree::*;
pub use photon::*;
pub use photon_map::*;
pub use processing::*;

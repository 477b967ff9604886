//! Integrators

#[macro_use]
extern crate log;

mod direct_lighting;
mod final_gather;
mod monte_carlo;
mod path;
mod photon_mapping;
mod photon_shooting;

#[cfg(test)]
mod test_scenes;

// Re-export.
pub use direct_lighting::*;
pub use monte_carlo::*;
pub use path::*;
pub use photon_mapping::*;
pub use photon_shooting::*;

//! Lights

#[macro_use]
extern crate log;

mod area;
mod directional;
mod point;

// Re-export.
pub use area::*;
pub use directional::*;
pub use point::*;

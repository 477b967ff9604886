//! Interactions

mod surface_point;

// Re-export
pub use surface_point::*;

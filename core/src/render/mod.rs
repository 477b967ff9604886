//! Render State

mod color_layers;
mod ray_division;
mod render_state;

// Re-export
pub use color_layers::*;
pub use ray_division::*;
pub use render_state::*;

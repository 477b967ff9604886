//! Parallel

mod progress;
mod render_control;

// Re-export
pub use progress::*;
pub use render_control::*;

//! Materials

#[macro_use]
extern crate log;

mod beer;
mod glass;
mod glossy;
mod matte;
mod mirror;

// Re-export
pub use beer::*;
pub use glass::*;
pub use glossy::*;
pub use matte::*;
pub use mirror::*;

//! Spectrum

mod common;
mod rgb_spectrum;
mod wavelength;

// Re-export
pub use common::*;
pub use rgb_spectrum::*;
pub use wavelength::*;

/// Rendering uses `RGBSpectrum` throughout.
pub type Spectrum = RGBSpectrum;

//! Render State

use super::*;
use crate::pbrt::*;
use crate::rng::*;

/// Mutable state owned by a single render thread and threaded explicitly
/// through every call of the integrator.
#[derive(Clone, Debug)]
pub struct RenderState {
    /// Index of the thread owning the state.
    pub thread_id: usize,

    /// Recursion level of the current ray. 0 for camera rays.
    pub ray_level: usize,

    /// True while a dispersive bounce may still pick a wavelength.
    pub chromatic: bool,

    /// Normalized wavelength in [0, 1) once `chromatic` is false.
    pub wavelength: Float,

    /// True if emission seen directly should be added.
    pub include_lights: bool,

    /// Stratification context of the current ray.
    pub ray_division: RayDivision,

    /// Sample indices of the current pixel sample.
    pub pixel_sampling: PixelSamplingData,

    /// Pseudo random generator.
    pub rng: RNG,

    /// Counter driving the Halton stream for single light selection. Reset
    /// for every pixel sample.
    pub correlative_sample_number: u64,

    /// Index of the pixel being rendered.
    pub pixel_number: u64,
}

impl RenderState {
    /// Returns a fresh state for a thread.
    ///
    /// * `thread_id` - Index of the thread.
    /// * `seed`      - Sequence for the thread's random generator.
    pub fn new(thread_id: usize, seed: u64) -> Self {
        Self {
            thread_id,
            ray_level: 0,
            chromatic: true,
            wavelength: 0.0,
            include_lights: false,
            ray_division: RayDivision::default(),
            pixel_sampling: PixelSamplingData::default(),
            rng: RNG::new(seed),
            correlative_sample_number: 0,
            pixel_number: 0,
        }
    }

    /// Resets the per camera ray values before a new pixel sample.
    ///
    /// * `pixel_number`   - Index of the pixel.
    /// * `pixel_sampling` - Sample indices of the pixel sample.
    pub fn begin_sample(&mut self, pixel_number: u64, pixel_sampling: PixelSamplingData) {
        self.ray_level = 0;
        self.chromatic = true;
        self.wavelength = 0.0;
        self.include_lights = true;
        self.ray_division = RayDivision::default();
        self.correlative_sample_number = 0;
        self.pixel_number = pixel_number;
        self.pixel_sampling = pixel_sampling;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_sample_resets_per_sample_values() {
        let mut state = RenderState::new(2, 2);
        state.begin_sample(3, PixelSamplingData::new(1, 12, 4));
        state.ray_level = 2;
        state.chromatic = false;
        state.wavelength = 0.4;
        state.include_lights = false;
        state.correlative_sample_number = 9;
        state.ray_division.division = 4;

        state.begin_sample(4, PixelSamplingData::new(0, 16, 4));
        assert_eq!(state.ray_level, 0);
        assert!(state.chromatic);
        assert_eq!(state.wavelength, 0.0);
        assert!(state.include_lights);
        assert_eq!(state.correlative_sample_number, 0);
        assert_eq!(state.ray_division, RayDivision::default());
        assert_eq!(state.pixel_number, 4);
        assert_eq!(state.pixel_sampling, PixelSamplingData::new(0, 16, 4));
        assert_eq!(state.thread_id, 2);
    }
}

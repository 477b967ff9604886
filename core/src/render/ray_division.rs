//! Ray Division

use crate::pbrt::*;

/// Stratification context carried through recursive calls. Nested
/// stratified samples use it to stay independent across ray tree branches.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayDivision {
    /// Number of branches the current ray was split into. Always at least 1.
    pub division: usize,

    /// Index of the current branch.
    pub offset: usize,

    /// First decorrelation value in [0, 1).
    pub decorrelation_1: Float,

    /// Second decorrelation value in [0, 1).
    pub decorrelation_2: Float,
}

impl Default for RayDivision {
    fn default() -> Self {
        Self {
            division: 1,
            offset: 0,
            decorrelation_1: 0.0,
            decorrelation_2: 0.0,
        }
    }
}

impl RayDivision {
    /// Returns the number of samples to take in this branch when `initial`
    /// samples would be taken by an undivided ray. Never less than one.
    ///
    /// * `initial` - Sample count for an undivided ray.
    pub fn divided_samples(&self, initial: usize) -> usize {
        if self.division > 1 {
            max(1, initial / self.division)
        } else {
            initial
        }
    }
}

/// Per pixel sample indices used to seed the low discrepancy sequences so
/// that every thread reproduces the same samples.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PixelSamplingData {
    /// Index of the sample within the pixel.
    pub number: u64,

    /// Offset derived from the pixel.
    pub offset: u64,

    /// Samples taken per pixel.
    pub samples_per_pixel: u64,
}

impl PixelSamplingData {
    /// Returns a new `PixelSamplingData`.
    ///
    /// * `number`            - Index of the sample within the pixel.
    /// * `offset`            - Offset derived from the pixel.
    /// * `samples_per_pixel` - Samples taken per pixel.
    pub fn new(number: u64, offset: u64, samples_per_pixel: u64) -> Self {
        Self {
            number,
            offset,
            samples_per_pixel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divided_samples_never_zero() {
        let mut rd = RayDivision::default();
        assert_eq!(rd.divided_samples(8), 8);
        rd.division = 4;
        assert_eq!(rd.divided_samples(8), 2);
        rd.division = 16;
        assert_eq!(rd.divided_samples(8), 1);
    }
}

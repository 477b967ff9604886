//! RGB Spectrum

use crate::pbrt::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Sub};

/// Number of samples in an `RGBSpectrum`.
pub const RGB_SAMPLES: usize = 3;

/// A linear RGB colour used as the carrier of radiance, throughput and
/// photon power.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RGBSpectrum {
    /// Red, green and blue coefficients.
    c: [Float; RGB_SAMPLES],
}

impl RGBSpectrum {
    /// Spectrum with all values set to 0.
    pub const ZERO: Self = Self { c: [0.0; RGB_SAMPLES] };

    /// Spectrum with all values set to 1.
    pub const ONE: Self = Self { c: [1.0; RGB_SAMPLES] };

    /// Create a new `RGBSpectrum` with the same value in every channel.
    ///
    /// * `v` - Constant value.
    pub fn new(v: Float) -> Self {
        Self { c: [v; RGB_SAMPLES] }
    }

    /// Create a new `RGBSpectrum` from individual channel values.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub fn rgb(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Red channel.
    pub fn r(&self) -> Float {
        self.c[0]
    }

    /// Green channel.
    pub fn g(&self) -> Float {
        self.c[1]
    }

    /// Blue channel.
    pub fn b(&self) -> Float {
        self.c[2]
    }

    /// Returns the channel values.
    pub fn samples(&self) -> &[Float; RGB_SAMPLES] {
        &self.c
    }

    /// Returns true if all channels are zero.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|&v| v == 0.0)
    }

    /// Returns true if any channel is NaN.
    pub fn has_nans(&self) -> bool {
        self.c.iter().any(|v| v.is_nan())
    }

    /// Returns the average of the three channels.
    pub fn energy(&self) -> Float {
        (self.c[0] + self.c[1] + self.c[2]) / 3.0
    }

    /// Returns the luminance (y-coefficient of XYZ colour).
    pub fn y(&self) -> Float {
        0.212671 * self.c[0] + 0.715160 * self.c[1] + 0.072169 * self.c[2]
    }

    /// Returns the largest channel value.
    pub fn max_component_value(&self) -> Float {
        max(self.c[0], max(self.c[1], self.c[2]))
    }

    /// Returns the smallest channel value.
    pub fn min_component_value(&self) -> Float {
        min(self.c[0], min(self.c[1], self.c[2]))
    }

    /// Scales all channels by the same factor so that the largest one does
    /// not exceed `max_value`. Hue is preserved and energy never increases.
    ///
    /// * `max_value` - Upper bound for the largest channel.
    pub fn clamp_proportional(&self, max_value: Float) -> Self {
        let m = self.max_component_value();
        if m > max_value && m > 0.0 {
            *self * (max_value / m)
        } else {
            *self
        }
    }

    /// Clamps every channel to `[low, high]`.
    ///
    /// * `low`  - Lower bound.
    /// * `high` - Upper bound.
    pub fn clamp(&self, low: Float, high: Float) -> Self {
        Self {
            c: self.c.map(|v| clamp(v, low, high)),
        }
    }

    /// Sets channel values `v` to `e^v`.
    pub fn exp(&self) -> Self {
        Self {
            c: self.c.map(|v| v.exp()),
        }
    }
}

impl Default for RGBSpectrum {
    /// Return a black `RGBSpectrum`.
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<Float> for RGBSpectrum {
    /// Create a grey `RGBSpectrum`.
    ///
    /// * `v` - Constant value.
    fn from(v: Float) -> Self {
        Self::new(v)
    }
}

impl From<[Float; 3]> for RGBSpectrum {
    /// Create a new `RGBSpectrum` from RGB coefficients.
    ///
    /// * `rgb` - RGB colour value.
    fn from(rgb: [Float; 3]) -> Self {
        Self { c: rgb }
    }
}

impl Add for RGBSpectrum {
    type Output = Self;

    /// Adds the corresponding channel values.
    ///
    /// * `other` - The other `RGBSpectrum`.
    fn add(self, other: Self) -> Self::Output {
        Self {
            c: [
                self.c[0] + other.c[0],
                self.c[1] + other.c[1],
                self.c[2] + other.c[2],
            ],
        }
    }
}

impl AddAssign for RGBSpectrum {
    /// Adds the corresponding channel values in place.
    ///
    /// * `other` - The other `RGBSpectrum`.
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for RGBSpectrum {
    type Output = Self;

    /// Subtracts the corresponding channel values.
    ///
    /// * `other` - The other `RGBSpectrum`.
    fn sub(self, other: Self) -> Self::Output {
        Self {
            c: [
                self.c[0] - other.c[0],
                self.c[1] - other.c[1],
                self.c[2] - other.c[2],
            ],
        }
    }
}

impl Mul for RGBSpectrum {
    type Output = Self;

    /// Multiplies the corresponding channel values.
    ///
    /// * `other` - The other `RGBSpectrum`.
    fn mul(self, other: Self) -> Self::Output {
        Self {
            c: [
                self.c[0] * other.c[0],
                self.c[1] * other.c[1],
                self.c[2] * other.c[2],
            ],
        }
    }
}

impl MulAssign for RGBSpectrum {
    /// Multiplies the corresponding channel values in place.
    ///
    /// * `other` - The other `RGBSpectrum`.
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Mul<Float> for RGBSpectrum {
    type Output = Self;

    /// Scales the channel values with a constant factor.
    ///
    /// * `f` - Scaling factor.
    fn mul(self, f: Float) -> Self::Output {
        Self {
            c: self.c.map(|v| v * f),
        }
    }
}

impl Mul<RGBSpectrum> for Float {
    type Output = RGBSpectrum;

    /// Scales the channel values with a constant factor.
    ///
    /// * `s` - The spectrum.
    fn mul(self, s: RGBSpectrum) -> Self::Output {
        s * self
    }
}

impl MulAssign<Float> for RGBSpectrum {
    /// Scales the channel values with a constant factor in place.
    ///
    /// * `f` - Scaling factor.
    fn mul_assign(&mut self, f: Float) {
        *self = *self * f;
    }
}

impl Div<Float> for RGBSpectrum {
    type Output = Self;

    /// Divides the channel values by a constant.
    ///
    /// * `f` - The divisor.
    fn div(self, f: Float) -> Self::Output {
        debug_assert!(f != 0.0);
        self * (1.0 / f)
    }
}

impl DivAssign<Float> for RGBSpectrum {
    /// Divides the channel values by a constant in place.
    ///
    /// * `f` - The divisor.
    fn div_assign(&mut self, f: Float) {
        *self = *self / f;
    }
}

impl Index<usize> for RGBSpectrum {
    type Output = Float;

    /// Returns a channel value.
    ///
    /// * `i` - Channel index.
    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl IndexMut<usize> for RGBSpectrum {
    /// Returns a mutable channel value.
    ///
    /// * `i` - Channel index.
    fn index_mut(&mut self, i: usize) -> &mut Self::Output {
        &mut self.c[i]
    }
}

impl fmt::Display for RGBSpectrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.c[0], self.c[1], self.c[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    prop_compose! {
        fn spectrum()(r in 0.0..10.0f32, g in 0.0..10.0f32, b in 0.0..10.0f32) -> RGBSpectrum {
            RGBSpectrum::rgb(r, g, b)
        }
    }

    #[test]
    fn black_and_nans() {
        assert!(RGBSpectrum::ZERO.is_black());
        assert!(!RGBSpectrum::rgb(0.0, 0.1, 0.0).is_black());
        assert!(RGBSpectrum::rgb(0.0, Float::NAN, 0.0).has_nans());
    }

    #[test]
    fn clamp_proportional_preserves_hue() {
        let c = RGBSpectrum::rgb(4.0, 2.0, 1.0).clamp_proportional(2.0);
        assert!(approx_eq!(f32, c.r(), 2.0));
        assert!(approx_eq!(f32, c.g(), 1.0));
        assert!(approx_eq!(f32, c.b(), 0.5));
    }

    prop_range!(clamp_limit, f32, 0.01..20.0f32);

    proptest! {
        #[test]
        fn clamp_proportional_never_increases_energy(s in spectrum(), m in clamp_limit()) {
            let c = s.clamp_proportional(m);
            prop_assert!(c.energy() <= s.energy() + 1e-5);
            prop_assert!(c.max_component_value() <= m.max(s.max_component_value()) + 1e-5);
            prop_assert!(c.min_component_value() >= 0.0);
        }
    }
}

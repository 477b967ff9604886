//! Low Discrepancy Sequences

use crate::pbrt::*;
use crate::rng::*;

/// Number of prime bases available to `radical_inverse`.
pub const PRIME_TABLE_SIZE: usize = 64;

/// Prime bases for the radical inverse of each dimension.
#[rustfmt::skip]
pub const PRIMES: [u64; PRIME_TABLE_SIZE] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53,
    59, 61, 67, 71, 73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131,
    137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223,
    227, 229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311,
];

/// 2^-32
const INV_TWO_POW_32: f64 = hexf64!("0x1.0p-32");

/// Returns the radical inverse of `a` in the prime base of dimension
/// `base_index`.
///
/// * `base_index` - Dimension. Selects the prime base.
/// * `a`          - Index into the sequence.
pub fn radical_inverse(base_index: usize, a: u64) -> Float {
    assert!(base_index < PRIME_TABLE_SIZE, "radical inverse base index out of range");

    let base = PRIMES[base_index];
    let inv_base = 1.0 / base as f64;
    let mut inv_base_n = 1.0;
    let mut reversed_digits = 0_u64;
    let mut a = a;
    while a > 0 {
        let next = a / base;
        let digit = a - next * base;
        reversed_digits = reversed_digits * base + digit;
        inv_base_n *= inv_base;
        a = next;
    }

    min(
        (reversed_digits as f64 * inv_base_n) as Float,
        ONE_MINUS_EPSILON,
    )
}

/// Returns the van der Corput sequence value for `bits`, scrambled with `r`.
///
/// * `bits` - Index into the sequence.
/// * `r`    - Scramble mask.
#[inline]
pub fn ri_vdc(bits: u32, r: u32) -> Float {
    let bits = bits.reverse_bits() ^ r;
    min((bits as f64 * INV_TWO_POW_32) as Float, ONE_MINUS_EPSILON)
}

/// Returns the second dimension of the Sobol sequence for `i`, scrambled
/// with `r`.
///
/// * `i` - Index into the sequence.
/// * `r` - Scramble mask.
#[inline]
pub fn ri_s(i: u32, r: u32) -> Float {
    let mut i = i;
    let mut r = r;
    let mut v = 1_u32 << 31;
    while i != 0 {
        if i & 1 == 1 {
            r ^= v;
        }
        i >>= 1;
        v ^= v >> 1;
    }
    min((r as f64 * INV_TWO_POW_32) as Float, ONE_MINUS_EPSILON)
}

/// Returns a sample in [0, 1) for a dimension and an index. The result is a
/// pure function of its inputs so every thread can reconstruct any sample.
/// Dimensions beyond the prime table fall back to a PCG stream seeded from
/// the dimension and index.
///
/// * `dim` - Dimension.
/// * `n`   - Index into the sequence.
pub fn low_discrepancy_sampling(dim: usize, n: u64) -> Float {
    if dim < PRIME_TABLE_SIZE {
        radical_inverse(dim, n)
    } else {
        let mut rng = RNG::new(((dim as u64) << 32) ^ n);
        rng.uniform_float()
    }
}

/// A restartable Halton sequence cursor in a single base. Values are
/// generated incrementally, so `get_next()` after `set_start(i)` yields the
/// radical inverse of `i + 1`.
#[derive(Copy, Clone, Debug)]
pub struct Halton {
    /// The base.
    base: u64,

    /// 1 / base.
    inv_base: f64,

    /// Current value.
    value: f64,
}

impl Halton {
    /// Create a new `Halton` cursor.
    ///
    /// * `base`  - The base. Should be a prime.
    /// * `start` - Starting index.
    pub fn new(base: u64, start: u64) -> Self {
        debug_assert!(base >= 2);
        let mut h = Self {
            base,
            inv_base: 1.0 / base as f64,
            value: 0.0,
        };
        h.set_start(start);
        h
    }

    /// Rewinds or fast-forwards the cursor so that the next value is the one
    /// following index `i`.
    ///
    /// * `i` - Index.
    pub fn set_start(&mut self, i: u64) {
        let mut i = i;
        let mut factor = self.inv_base;
        self.value = 0.0;
        while i > 0 {
            self.value += (i % self.base) as f64 * factor;
            i /= self.base;
            factor *= self.inv_base;
        }
    }

    /// Advances the cursor and returns the new value in [0, 1).
    pub fn get_next(&mut self) -> Float {
        let r = 1.0 - self.value - 1e-10;
        if self.inv_base < r {
            self.value += self.inv_base;
        } else {
            let mut h = self.inv_base;
            let mut hh;
            loop {
                hh = h;
                h *= self.inv_base;
                if h < r {
                    break;
                }
            }
            self.value += hh + h - 1.0;
        }
        clamp(self.value as Float, 0.0, ONE_MINUS_EPSILON)
    }
}

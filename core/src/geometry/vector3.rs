//! 3-D Vectors

use super::common::*;
use super::Point3;
use crate::pbrt::*;
use num_traits::{Num, Zero};
use std::ops::{
    Add, AddAssign, Div, DivAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign,
};

/// A 3-D vector containing numeric values. Surface normals are also
/// represented as vectors.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vector3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D vector containing `Float` values.
pub type Vector3f = Vector3<Float>;

impl Vector3f {
    /// Zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };
}

/// Creates a new 3-D vector.
///
/// * `x` - X-coordinate.
/// * `y` - Y-coordinate.
/// * `z` - Z-coordinate.
pub fn vector3<T>(x: T, y: T, z: T) -> Vector3<T> {
    Vector3 { x, y, z }
}

impl<T: Num> Vector3<T> {
    /// Creates a new 3-D vector.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Creates a new 3-D zero vector.
    pub fn zero() -> Self
    where
        T: Zero,
    {
        Self::new(T::zero(), T::zero(), T::zero())
    }

    /// Returns true if either coordinate is NaN.
    pub fn has_nans(&self) -> bool
    where
        T: num_traits::Float,
    {
        self.x.is_nan() || self.y.is_nan() || self.z.is_nan()
    }

    /// Returns the square of the vector's length.
    pub fn length_squared(&self) -> T
    where
        T: Copy,
    {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns the vector's length.
    pub fn length(&self) -> T
    where
        T: num_traits::Float,
    {
        self.length_squared().sqrt()
    }

    /// Returns the unit vector. A zero-length vector is returned unchanged.
    pub fn normalize(&self) -> Self
    where
        T: num_traits::Float,
    {
        let len = self.length();
        if len > T::zero() {
            *self / len
        } else {
            *self
        }
    }

    /// Returns a new vector containing absolute values of the components.
    pub fn abs(&self) -> Self
    where
        T: Neg<Output = T> + PartialOrd + Copy,
    {
        Self::new(abs(self.x), abs(self.y), abs(self.z))
    }

    /// Returns the cross product with another vector.
    ///
    /// * `other` - The other vector.
    pub fn cross(&self, other: &Self) -> Self
    where
        T: Copy,
    {
        Self::new(
            (self.y * other.z) - (self.z * other.y),
            (self.z * other.x) - (self.x * other.z),
            (self.x * other.y) - (self.y * other.x),
        )
    }
}

impl Vector3f {
    /// Mirrors the vector about the normal `n`. Both are expected to point
    /// away from the surface, and so is the result.
    ///
    /// * `n` - The normal.
    pub fn reflect(&self, n: &Vector3f) -> Vector3f {
        let cos_n = self.dot(n);
        *n * (2.0 * cos_n) - *self
    }

    /// Returns the refracted direction for a vector pointing away from the
    /// surface, or `None` under total internal reflection.
    ///
    /// * `n`   - The shading normal.
    /// * `ior` - Index of refraction of the material behind `n`.
    pub fn refract(&self, n: &Vector3f, ior: Float) -> Option<Vector3f> {
        let mut normal = *n;
        let mut eta = ior;
        let mut cos_v_n = self.dot(n);
        if cos_v_n < 0.0 {
            normal = -*n;
            cos_v_n = -cos_v_n;
        } else {
            eta = 1.0 / ior;
        }
        let k = 1.0 - eta * eta * (1.0 - cos_v_n * cos_v_n);
        if k <= 0.0 {
            None
        } else {
            Some((-*self * eta + normal * (eta * cos_v_n - k.sqrt())).normalize())
        }
    }

    /// Returns an orthonormal basis `(u, v)` completing this unit vector.
    pub fn coordinate_system(&self) -> (Vector3f, Vector3f) {
        if self.x == 0.0 && self.y == 0.0 {
            let u = if self.z < 0.0 {
                Vector3f::new(-1.0, 0.0, 0.0)
            } else {
                Vector3f::new(1.0, 0.0, 0.0)
            };
            (u, Vector3f::new(0.0, 1.0, 0.0))
        } else {
            let inv_len = 1.0 / (self.x * self.x + self.y * self.y).sqrt();
            let u = Vector3f::new(self.y * inv_len, -self.x * inv_len, 0.0);
            let v = self.cross(&u);
            (u, v)
        }
    }
}

/// Returns the shading normal `n` flipped to lie on the same side of the
/// geometric normal `ng` as the direction `v`.
///
/// * `ng` - Geometric normal.
/// * `n`  - Shading normal.
/// * `v`  - Direction pointing away from the surface.
pub fn face_forward(ng: &Vector3f, n: &Vector3f, v: &Vector3f) -> Vector3f {
    if ng.dot(v) < 0.0 {
        -*n
    } else {
        *n
    }
}

/// Returns the dielectric Fresnel reflectance and transmittance `(kr, kt)`
/// for direction `i` pointing away from the surface.
///
/// * `i`   - Direction.
/// * `n`   - Normal.
/// * `ior` - Index of refraction.
pub fn fresnel(i: &Vector3f, n: &Vector3f, ior: Float) -> (Float, Float) {
    let normal = if i.dot(n) < 0.0 { -*n } else { *n };
    let c = i.dot(&normal);
    let g = ior * ior + c * c - 1.0;
    let g = if g <= 0.0 { 0.0 } else { g.sqrt() };
    let a = c * (g + c) - 1.0;
    let b = c * (g - c) + 1.0;
    let kr = ((0.5 * (g - c) * (g - c)) / ((g + c) * (g + c))) * (1.0 + (a * a) / (b * b));
    let kt = if kr < 1.0 { 1.0 - kr } else { 0.0 };
    (kr, kt)
}

impl<T: Num + Neg<Output = T> + PartialOrd + Copy> Dot<Vector3<T>> for Vector3<T> {
    type Output = T;

    /// Returns the dot product with another vector.
    ///
    /// * `other` -  The other vector.
    fn dot(&self, other: &Vector3<T>) -> T {
        self.x * other.x + self.y * other.y + self.z * other.z
    }
}

impl<T: Num> Add for Vector3<T> {
    type Output = Self;

    /// Adds the given vector and returns the result.
    ///
    /// * `other` -  The vector to add.
    fn add(self, other: Self) -> Self::Output {
        Self::Output::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl<T: Num + Copy> AddAssign for Vector3<T> {
    /// Performs the `+=` operation.
    ///
    /// * `other` -  The vector to add.
    fn add_assign(&mut self, other: Self) {
        *self = Self::new(self.x + other.x, self.y + other.y, self.z + other.z);
    }
}

impl<T: Num> Sub for Vector3<T> {
    type Output = Self;

    /// Subtracts the given vector and returns the result.
    ///
    /// * `other` -  The vector to subtract.
    fn sub(self, other: Self) -> Self::Output {
        Self::Output::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl<T: Num + Copy> SubAssign for Vector3<T> {
    /// Performs the `-=` operation.
    ///
    /// * `other` -  The vector to subtract.
    fn sub_assign(&mut self, other: Self) {
        *self = Self::new(self.x - other.x, self.y - other.y, self.z - other.z);
    }
}

impl<T: Num + Copy> Mul<T> for Vector3<T> {
    type Output = Vector3<T>;

    /// Scale the vector.
    ///
    /// * `f` -  The scaling factor.
    fn mul(self, f: T) -> Self::Output {
        Self::Output::new(f * self.x, f * self.y, f * self.z)
    }
}

macro_rules! premul {
    ($t: ty) => {
        impl Mul<Vector3<$t>> for $t {
            type Output = Vector3<$t>;
            /// Scale the vector.
            ///
            /// * `v` -  The vector.
            fn mul(self, v: Vector3<$t>) -> Vector3<$t> {
                Vector3::<$t>::new(self * v.x, self * v.y, self * v.z)
            }
        }
    };
}

premul!(f32);
premul!(f64);

impl<T: Num + Copy> MulAssign<T> for Vector3<T> {
    /// Scale and assign the result to the vector.
    ///
    /// * `f` -  The scaling factor.
    fn mul_assign(&mut self, f: T) {
        *self = Self::new(f * self.x, f * self.y, f * self.z);
    }
}

impl<T: Num + Copy> Div<T> for Vector3<T> {
    type Output = Self;

    /// Scale the vector by 1/f.
    ///
    /// * `f` -  The scaling factor.
    fn div(self, f: T) -> Self::Output {
        debug_assert!(!f.is_zero());

        let inv = T::one() / f;
        Self::Output::new(inv * self.x, inv * self.y, inv * self.z)
    }
}

impl<T: Num + Copy> DivAssign<T> for Vector3<T> {
    /// Scale the vector by 1/f and assign the result to the vector.
    ///
    /// * `f` -  The scaling factor.
    fn div_assign(&mut self, f: T) {
        debug_assert!(!f.is_zero());

        let inv = T::one() / f;
        *self = Self::new(inv * self.x, inv * self.y, inv * self.z);
    }
}

impl<T: Num + Neg<Output = T>> Neg for Vector3<T> {
    type Output = Vector3<T>;

    /// Flip the vector's direction (scale by -1).
    fn neg(self) -> Self::Output {
        Self::Output::new(-self.x, -self.y, -self.z)
    }
}

impl<T> Index<Axis> for Vector3<T> {
    type Output = T;

    /// Index the vector by an axis to get the immutable coordinate axis value.
    ///
    /// * `axis` -  A 3-D coordinate axis.
    fn index(&self, axis: Axis) -> &Self::Output {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
        }
    }
}

impl<T> IndexMut<Axis> for Vector3<T> {
    /// Index the vector by an axis to get a mutable coordinate axis value.
    ///
    /// * `axis` -  A 3-D coordinate axis.
    fn index_mut(&mut self, axis: Axis) -> &mut Self::Output {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
        }
    }
}

impl<T> From<Point3<T>> for Vector3<T> {
    /// Convert a 3-D point to a 3-D vector.
    ///
    /// * `p` -  3-D point.
    fn from(p: Point3<T>) -> Self {
        Self { x: p.x, y: p.y, z: p.z }
    }
}

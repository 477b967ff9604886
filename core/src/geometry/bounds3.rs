//! 3-D Axis Aligned Bounding Boxes.

use super::{point3, Point3, Point3f, Ray, Union, Vector3};
use crate::pbrt::*;
use num_traits::bounds::Bounded;
use num_traits::Num;

/// 3-D Axis Aligned Bounding Box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3<T: Num> {
    /// Minimum bounds.
    pub p_min: Point3<T>,

    /// Maximum bounds.
    pub p_max: Point3<T>,
}

/// 3-D bounding box containing `Float` points.
pub type Bounds3f = Bounds3<Float>;

/// Creates a new 3-D bounding box from 2 points. The minimum and maximum bounds
/// are used for each coordinate axis.
///
/// * `p1` - First point.
/// * `p2` - Second point.
pub fn bounds3<T: Num + PartialOrd + Copy>(p1: Point3<T>, p2: Point3<T>) -> Bounds3<T> {
    Bounds3 {
        p_min: p1.min(&p2),
        p_max: p1.max(&p2),
    }
}

/// Returns a 3-D bounding box where minimum and maximum bounds are maximum and
/// minimum values respectively of the type's limits, so it can be grown from
/// nothing iteratively.
pub fn empty_bounds3<T: Num + Bounded + PartialOrd + Copy>() -> Bounds3<T> {
    Bounds3 {
        p_min: point3(T::max_value(), T::max_value(), T::max_value()),
        p_max: point3(T::min_value(), T::min_value(), T::min_value()),
    }
}

impl<T: Num + PartialOrd + Copy> From<Point3<T>> for Bounds3<T> {
    /// Use a 3-D point as minimum and maximum 3-D bounds.
    ///
    /// * `p` - 3-D point.
    fn from(p: Point3<T>) -> Self {
        Bounds3 { p_min: p, p_max: p }
    }
}

impl<T: Num + Copy> Bounds3<T> {
    /// Returns true if any component of `p_max` is less than `p_min`.
    pub fn is_empty(&self) -> bool
    where
        T: PartialOrd,
    {
        self.p_max.x < self.p_min.x || self.p_max.y < self.p_min.y || self.p_max.z < self.p_min.z
    }

    /// Returns the vector along the box diagonal from the minimum point to
    /// the maximum point.
    pub fn diagonal(&self) -> Vector3<T> {
        self.p_max - self.p_min
    }

    /// Returns the axis along which the box is longest.
    pub fn maximum_extent(&self) -> Axis
    where
        T: PartialOrd,
    {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            Axis::X
        } else if d.y > d.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Returns true if a point is inside the bounding box.
    ///
    /// * `p` - The point.
    pub fn contains(&self, p: &Point3<T>) -> bool
    where
        T: PartialOrd,
    {
        (p.x >= self.p_min.x && p.x <= self.p_max.x)
            && (p.y >= self.p_min.y && p.y <= self.p_max.y)
            && (p.z >= self.p_min.z && p.z <= self.p_max.z)
    }

    /// Pad the bounding box by a constant amount in all dimensions.
    ///
    /// * `delta` - Padding amount.
    pub fn expand(&self, delta: T) -> Bounds3<T> {
        let d = Vector3::new(delta, delta, delta);
        Bounds3 {
            p_min: self.p_min - d,
            p_max: self.p_max + d,
        }
    }
}

impl Bounds3f {
    /// Returns the center of the box.
    pub fn center(&self) -> Point3f {
        lerp(0.5, self.p_min, self.p_max)
    }

    /// Returns the center and radius of a sphere enclosing the box.
    pub fn bounding_sphere(&self) -> (Point3f, Float) {
        let center = self.center();
        let radius = if self.is_empty() {
            0.0
        } else {
            center.distance(&self.p_max)
        };
        (center, radius)
    }

    /// Slab test of a ray against the box. Returns the parametric entry and
    /// exit distances `(enter, leave)` when the ray crosses the box closer
    /// than `t_max`. The entry distance is negative when the origin lies
    /// inside the box.
    ///
    /// Axes along which the ray direction is zero are never divided by. The
    /// ray is parallel to those slabs, so it crosses the box only when the
    /// origin already lies between them.
    ///
    /// * `ray`   - The ray.
    /// * `t_max` - Maximum parametric distance.
    pub fn cross(&self, ray: &Ray, t_max: Float) -> Option<(Float, Float)> {
        let p = ray.o - self.p_min;
        let extent = self.diagonal();

        let mut l_min = -INFINITY;
        let mut l_max = INFINITY;

        for axis in Axis::ALL {
            let d = ray.d[axis];
            let (o, e) = (p[axis], extent[axis]);
            if d == 0.0 {
                if o < 0.0 || o > e {
                    return None;
                }
                continue;
            }

            let inv_d = 1.0 / d;
            let (near, far) = if inv_d > 0.0 {
                (-o * inv_d, (e - o) * inv_d)
            } else {
                ((e - o) * inv_d, -o * inv_d)
            };
            l_min = max(near, l_min);
            l_max = min(far, l_max);

            if l_min > l_max || l_max < 0.0 || l_min > t_max {
                return None;
            }
        }

        Some((l_min, l_max))
    }
}

impl<T: Num + PartialOrd + Copy> Union<Point3<T>> for Bounds3<T> {
    /// Return a bounding box containing the itself and a point.
    ///
    /// * `other` - The point.
    fn union(&self, other: &Point3<T>) -> Self {
        Bounds3 {
            p_min: self.p_min.min(other),
            p_max: self.p_max.max(other),
        }
    }
}

impl<T: Num + PartialOrd + Copy> Union<Bounds3<T>> for Bounds3<T> {
    /// Return a bounding box containing both bounding boxes.
    ///
    /// * `other` - The other bounding box.
    fn union(&self, other: &Bounds3<T>) -> Self {
        Bounds3 {
            p_min: self.p_min.min(&other.p_min),
            p_max: self.p_max.max(&other.p_max),
        }
    }
}

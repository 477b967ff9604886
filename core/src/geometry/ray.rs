//! Rays

use super::{Point3f, Vector3f};
use crate::pbrt::*;

/// A ray with a parametric validity interval `[t_min, t_max]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction.
    pub d: Vector3f,

    /// Minimum extent of the ray. Used to skip self-intersections close to
    /// the origin.
    pub t_min: Float,

    /// Maximum extent of the ray.
    pub t_max: Float,

    /// Time value.
    pub time: Float,
}

impl Ray {
    /// Returns an unbounded ray.
    ///
    /// * `o` - Origin.
    /// * `d` - Direction.
    pub fn new(o: Point3f, d: Vector3f) -> Self {
        Self {
            o,
            d,
            t_min: 0.0,
            t_max: INFINITY,
            time: 0.0,
        }
    }

    /// Returns an unbounded ray that ignores hits closer than `t_min`.
    ///
    /// * `o`     - Origin.
    /// * `d`     - Direction.
    /// * `t_min` - Minimum extent of the ray.
    pub fn with_min_dist(o: Point3f, d: Vector3f, t_min: Float) -> Self {
        Self {
            t_min,
            ..Self::new(o, d)
        }
    }

    /// Returns a ray segment between `t_min` and `t_max`.
    ///
    /// * `o`     - Origin.
    /// * `d`     - Direction.
    /// * `t_min` - Minimum extent of the ray.
    /// * `t_max` - Maximum extent of the ray.
    pub fn segment(o: Point3f, d: Vector3f, t_min: Float, t_max: Float) -> Self {
        Self {
            t_min,
            t_max,
            ..Self::new(o, d)
        }
    }

    /// Returns true if either coordinate is NaN.
    pub fn has_nans(&self) -> bool {
        self.o.has_nans() || self.d.has_nans() || self.t_max.is_nan()
    }

    /// Get position along the ray at given parameter.
    ///
    /// * `t` - Parameter to evaluate.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}

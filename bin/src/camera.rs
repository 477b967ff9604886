//! Pinhole Camera

use core::geometry::*;
use core::pbrt::*;

/// A pinhole camera mapping raster coordinates to rays through the eye.
#[derive(Copy, Clone, Debug)]
pub struct PinholeCamera {
    /// Position of the eye.
    eye: Point3f,

    /// Viewing direction.
    forward: Vector3f,

    /// Image plane x-axis at unit distance, scaled by the half width.
    right: Vector3f,

    /// Image plane y-axis at unit distance, scaled by the half height.
    up: Vector3f,

    /// Resolution.
    width: Float,
    height: Float,
}

impl PinholeCamera {
    /// Create a new pinhole camera.
    ///
    /// * `eye`    - Position of the eye.
    /// * `target` - Point looked at.
    /// * `up`     - Approximate up direction.
    /// * `fov`    - Vertical field-of-view angle in degrees.
    /// * `width`  - Image width.
    /// * `height` - Image height.
    pub fn new(eye: Point3f, target: Point3f, up: Vector3f, fov: Float, width: usize, height: usize) -> Self {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let up = right.cross(&forward);
        let tan_half = (fov.to_radians() * 0.5).tan();
        let aspect = width as Float / height as Float;
        Self {
            eye,
            forward,
            right: right * (tan_half * aspect),
            up: up * tan_half,
            width: width as Float,
            height: height as Float,
        }
    }

    /// Returns the ray through a raster position.
    ///
    /// * `x` - Raster x-coordinate, growing to the right.
    /// * `y` - Raster y-coordinate, growing downwards.
    pub fn generate_ray(&self, x: Float, y: Float) -> Ray {
        let sx = 2.0 * x / self.width - 1.0;
        let sy = 1.0 - 2.0 * y / self.height;
        let d = self.forward + self.right * sx + self.up * sy;
        Ray::new(self.eye, d.normalize())
    }
}

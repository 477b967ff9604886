//! Photons

use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;

/// A photon deposited on a surface.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Photon {
    /// Position.
    pub pos: Point3f,

    /// Direction pointing back towards where the photon came from. Radiance
    /// photons store the surface normal here.
    pub dir: Vector3f,

    /// Carried power.
    pub color: Spectrum,
}

impl Photon {
    /// Returns a new `Photon`.
    ///
    /// * `dir`   - Incoming direction, pointing away from the surface.
    /// * `pos`   - Position.
    /// * `color` - Carried power.
    pub fn new(dir: Vector3f, pos: Point3f, color: Spectrum) -> Self {
        Self { pos, dir, color }
    }
}

/// A photon returned by `PhotonMap::gather()`.
#[derive(Copy, Clone, Debug)]
pub struct FoundPhoton<'a> {
    /// The photon.
    pub photon: &'a Photon,

    /// Squared distance from the query point.
    pub dist_sq: Float,
}

/// A surface point recorded while shooting diffuse photons. Radiance is
/// pre-gathered at these points for final gathering.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RadianceData {
    /// Position.
    pub pos: Point3f,

    /// Normal facing the incoming photon.
    pub normal: Vector3f,

    /// Reflected hemispherical reflectivity.
    pub refl: Spectrum,

    /// Transmitted hemispherical reflectivity.
    pub transm: Spectrum,

    /// False once the point was thinned out.
    pub use_point: bool,
}

impl RadianceData {
    /// Returns a new radiance point.
    ///
    /// * `pos`    - Position.
    /// * `normal` - Normal facing the incoming photon.
    /// * `refl`   - Reflected reflectivity.
    /// * `transm` - Transmitted reflectivity.
    pub fn new(pos: Point3f, normal: Vector3f, refl: Spectrum, transm: Spectrum) -> Self {
        Self {
            pos,
            normal,
            refl,
            transm,
            use_point: true,
        }
    }
}

//! BSDF and Photon Samples

use super::BsdfFlags;
use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;

/// Input and output of `Material::sample()`.
#[derive(Copy, Clone, Debug)]
pub struct BsdfSample {
    /// First sample in [0, 1).
    pub s1: Float,

    /// Second sample in [0, 1).
    pub s2: Float,

    /// Lobes the caller allows the material to sample.
    pub flags: BsdfFlags,

    /// Lobe(s) the material actually sampled.
    pub sampled_flags: BsdfFlags,

    /// Solid angle density of the sampled direction.
    pub pdf: Float,
}

impl BsdfSample {
    /// Returns a new `BsdfSample`.
    ///
    /// * `s1`    - First sample in [0, 1).
    /// * `s2`    - Second sample in [0, 1).
    /// * `flags` - Lobes that may be sampled.
    pub fn new(s1: Float, s2: Float, flags: BsdfFlags) -> Self {
        Self {
            s1,
            s2,
            flags,
            sampled_flags: BsdfFlags::NONE,
            pdf: 0.0,
        }
    }
}

/// A photon bounce request for `Material::scatter_photon()`.
#[derive(Copy, Clone, Debug)]
pub struct PhotonSample {
    /// The BSDF sample. `s1` and `s2` choose the direction.
    pub sample: BsdfSample,

    /// Russian roulette sample in [0, 1).
    pub s3: Float,

    /// Photon color arriving at the surface.
    pub lcol: Spectrum,

    /// Transmittance of the medium the photon travelled through.
    pub transmittance: Spectrum,

    /// Photon color after a successful bounce.
    pub color: Spectrum,
}

impl PhotonSample {
    /// Returns a new `PhotonSample`.
    ///
    /// * `s1`            - First direction sample.
    /// * `s2`            - Second direction sample.
    /// * `s3`            - Russian roulette sample.
    /// * `flags`         - Lobes that may be sampled.
    /// * `lcol`          - Incoming photon color.
    /// * `transmittance` - Medium transmittance along the incoming segment.
    pub fn new(
        s1: Float,
        s2: Float,
        s3: Float,
        flags: BsdfFlags,
        lcol: Spectrum,
        transmittance: Spectrum,
    ) -> Self {
        Self {
            sample: BsdfSample::new(s1, s2, flags),
            s3,
            lcol,
            transmittance,
            color: Spectrum::ZERO,
        }
    }
}

/// A sampled direction together with the BSDF value and the sample weight
/// (cosine over pdf).
#[derive(Copy, Clone, Debug)]
pub struct ScatteredDirection {
    /// Direction pointing away from the surface.
    pub dir: Vector3f,

    /// BSDF value.
    pub color: Spectrum,

    /// Sample weight.
    pub weight: Float,
}

/// Result of sampling the reflected and the transmitted lobe at once.
#[derive(Copy, Clone, Debug, Default)]
pub struct SplitSample {
    pub reflect: Option<ScatteredDirection>,
    pub transmit: Option<ScatteredDirection>,
}

/// Perfectly specular directions enumerated by a material, each with the
/// color it carries.
#[derive(Copy, Clone, Debug, Default)]
pub struct SpecularDirections {
    /// Mirror reflection.
    pub reflect: Option<(Vector3f, Spectrum)>,

    /// Refraction.
    pub refract: Option<(Vector3f, Spectrum)>,
}

impl SpecularDirections {
    /// Returns true if neither direction exists.
    pub fn is_empty(&self) -> bool {
        self.reflect.is_none() && self.refract.is_none()
    }
}

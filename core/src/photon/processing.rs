//! Photon Map Processing

use std::fmt;

/// How the photon maps are obtained before rendering.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PhotonMapProcessing {
    /// Shoot photons.
    #[default]
    GenerateOnly,

    /// Shoot photons and save the maps.
    GenerateAndSave,

    /// Load the maps from files.
    Load,

    /// Keep the maps from the previous render.
    Reuse,
}

/// Life cycle of a single photon map.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PhotonMapState {
    #[default]
    Idle,
    Loading,
    Reusing,
    Generating,
    Built,
    Saving,
    Ready,
}

impl fmt::Display for PhotonMapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Reusing => "reusing",
            Self::Generating => "generating",
            Self::Built => "built",
            Self::Saving => "saving",
            Self::Ready => "ready",
        };
        write!(f, "{}", s)
    }
}

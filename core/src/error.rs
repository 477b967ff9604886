//! Errors

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of photon map preprocessing and persistence.
#[derive(Error, Debug)]
pub enum PhotonError {
    #[error("photon map I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{path}' is not a valid photon map: {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("light selection sample {sample} mapped to index {index} of {lights} lights")]
    LightSelection {
        sample: f32,
        index: usize,
        lights: usize,
    },

    #[error("photon shooting was cancelled")]
    Cancelled,

    #[error("{map} photon map holds only {count} photons")]
    TooFewPhotons { map: String, count: usize },

    #[error("photon map has not been built")]
    NotBuilt,
}

/// Result type for photon map operations.
pub type Result<T> = std::result::Result<T, PhotonError>;

impl PhotonError {
    /// Wraps an I/O error with the file it concerns.
    ///
    /// * `path`   - The file.
    /// * `source` - The I/O error.
    pub fn io<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

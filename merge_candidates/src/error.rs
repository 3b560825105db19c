//! Error type shared by generation, serialization and dataset loading.
//!
//! Every variant is fatal for a run; nothing in the crate retries.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no skeletons supplied")]
    EmptySkeletons,

    #[error("maximum distance must be positive and finite, got {0}")]
    InvalidDistance(f64),

    #[error("resolution components must be positive and finite, got ({z}, {y}, {x})")]
    InvalidResolution { z: f64, y: f64, x: f64 },

    #[error("skeleton label {label} is outside the label mapping (length {mapping_len})")]
    LabelOutOfRange { label: u64, mapping_len: usize },

    #[error("skeleton label {0} appears more than once")]
    DuplicateLabel(u64),

    #[error("value {0} does not fit in a signed 64 bit record field")]
    ValueOverflow(u64),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt candidate file '{path}': {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

impl Error {

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }

    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Corrupt { path: path.into(), reason: reason.into() }
    }
}

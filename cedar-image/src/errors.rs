use cedar_hal::HalError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CedarError {
    #[error("{} is not a valid directory", .0.display())]
    InvalidRoot(PathBuf),

    #[error("Image file {} not found", .0.display())]
    ImageNotFound(PathBuf),

    #[error("Source file {} not found", .0.display())]
    MissingSource(PathBuf),

    #[error("Expected at least 2 partitions, found {found}")]
    TooFewPartitions { found: usize },

    #[error("Invalid hostname {0:?}: {1}")]
    InvalidHostname(String, &'static str),

    #[error("Preflight failed: {0}")]
    Preflight(String),

    #[error(transparent)]
    Hal(#[from] HalError),
}

// ABOUTME: Error types with structured exit codes for CLI
// ABOUTME: Separates caller-facing publish failures from transport and I/O errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A remote match blocks a publish that was not allowed to overwrite.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// A remote object that was required to exist is missing.
    #[error("Does not exist: {0}")]
    DoesNotExist(String),

    #[error("Setup error: {0}")]
    Setup(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status} on {endpoint}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Invalid metadata in {}: {message}", path.display())]
    Metadata { path: PathBuf, message: String },

    #[error("Image {0} was not collected at render time")]
    UnresolvedImage(String),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Setup(_) => 2,
            Error::Network(_) => 3,
            Error::Api { .. } => 4,
            Error::Parse(_) => 5,
            Error::Filesystem(_) => 6,
            Error::Metadata { .. } => 7,
            Error::AlreadyExists(_) => 8,
            Error::DoesNotExist(_) => 9,
            Error::Upload(_) => 10,
            Error::UnresolvedImage(_) => 11,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

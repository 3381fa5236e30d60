//! Generation errors
//!
//! Every failure on the way to an artifact ends up here. None of them is
//! fatal: the orchestrator records the error in place of the artifact and
//! moves on to the next stage.

use serde::Serialize;
use thiserror::Error;

/// Failure to produce one artifact
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Network or connection failure
    #[error("request failed: {0}")]
    Transport(String),

    /// Authentication, quota, or malformed/empty provider response
    #[error("provider error: {0}")]
    Provider(String),

    /// Image bytes could not be decoded
    #[error("image decode failed: {0}")]
    Decode(String),
}

impl GenerationError {
    /// Short machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Transport(_) => "transport",
            GenerationError::Provider(_) => "provider",
            GenerationError::Decode(_) => "decode",
        }
    }

    /// Human-readable message for display
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GenerationError::Provider(format!("malformed response: {}", e))
        } else {
            GenerationError::Transport(e.to_string())
        }
    }
}

impl From<image::ImageError> for GenerationError {
    fn from(e: image::ImageError) -> Self {
        GenerationError::Decode(e.to_string())
    }
}

/// Serialized form shown to the presentation shell
#[derive(Debug, Clone, Serialize)]
pub struct ErrorView {
    pub kind: &'static str,
    pub message: String,
}

impl From<&GenerationError> for ErrorView {
    fn from(e: &GenerationError) -> Self {
        Self {
            kind: e.kind(),
            message: e.message(),
        }
    }
}

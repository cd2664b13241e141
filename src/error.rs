//! Error types for the voicemorph crate.

use std::fmt;

/// Errors that can occur during voice transformation.
#[derive(Debug, Clone, PartialEq)]
pub enum MorphError {
    /// Invalid audio format or file contents.
    InvalidFormat(String),
    /// Invalid transformation parameters.
    InvalidParams(String),
    /// I/O error.
    IoError(String),
    /// Input too short for the given parameters.
    InputTooShort { provided: usize, minimum: usize },
    /// A required input (waveform, pitch contour) is missing or empty.
    MissingInput(String),
}

impl fmt::Display for MorphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorphError::InvalidFormat(msg) => write!(f, "invalid format: {}", msg),
            MorphError::InvalidParams(msg) => write!(f, "invalid parameters: {}", msg),
            MorphError::IoError(msg) => write!(f, "I/O error: {}", msg),
            MorphError::InputTooShort { provided, minimum } => {
                write!(
                    f,
                    "input too short: {} samples provided, {} required",
                    provided, minimum
                )
            }
            MorphError::MissingInput(msg) => write!(f, "missing input: {}", msg),
        }
    }
}

impl std::error::Error for MorphError {}

impl From<std::io::Error> for MorphError {
    fn from(err: std::io::Error) -> Self {
        MorphError::IoError(err.to_string())
    }
}

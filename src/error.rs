//! Error type for conversion runs.
//!
//! Every variant is terminal for the run it occurs in: nothing is retried and
//! nothing resumes mid-pipeline. Each variant carries enough context to name
//! the offending spec, format, or target.

use std::fmt;
use std::io;

use crate::registry::Capability;

/// Error raised by the conversion engine.
#[derive(Debug)]
pub enum ConvertError {
    /// Requested input spec is not registered.
    InvalidSpec(String),
    /// Requested output format is not registered.
    InvalidFormat(String),
    /// No configuration matches the resolved or explicit target.
    ConfigNotFound(String),
    /// Conversion was requested for an unregistered format tag.
    UnknownFormat { capability: Capability, tag: String },
    /// Field data arrived before any record had begun.
    NoRecord { spec: String, line: usize },
    /// Target table is missing, unreadable, or malformed.
    Config(String),
    /// I/O error on an input or output stream.
    Io(io::Error),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::InvalidSpec(spec) => {
                write!(f, "Invalid input format (spec): {}", spec)
            }
            ConvertError::InvalidFormat(format) => {
                write!(f, "Invalid output format: {}", format)
            }
            ConvertError::ConfigNotFound(target) => {
                write!(f, "Config not found for target: {}", target)
            }
            ConvertError::UnknownFormat { capability, tag } => {
                write!(f, "Unknown {} format: {}", capability, tag)
            }
            ConvertError::NoRecord { spec, line } => {
                write!(f, "No record in progress ({} input, line {})", spec, line)
            }
            ConvertError::Config(msg) => write!(f, "Config error: {}", msg),
            ConvertError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ConvertError {
    fn from(err: io::Error) -> Self {
        ConvertError::Io(err)
    }
}

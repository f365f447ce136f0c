//! Error types for the Galaxy3D pass system
//!
//! This module defines the error types used throughout the pass system,
//! including hierarchy edits, attachment resolution and backend binding.

use std::fmt;

/// Result type for Galaxy3D pass system operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D pass system errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (resource binding commit, etc.)
    BackendError(String),

    /// Invalid or stale pass key, unknown template, bad descriptor
    InvalidPass(String),

    /// Illegal hierarchy edit (duplicate name, leaf parent, cycle)
    InvalidHierarchy(String),

    /// An attachment binding could not be resolved
    AttachmentResolution(String),

    /// Initialization failed (engine, pass system, subsystems)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::InvalidPass(msg) => write!(f, "Invalid pass: {}", msg),
            Error::InvalidHierarchy(msg) => write!(f, "Invalid hierarchy: {}", msg),
            Error::AttachmentResolution(msg) => write!(f, "Attachment resolution failed: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;

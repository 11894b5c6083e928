//! Error types for progconf.

use std::path::PathBuf;

/// Result type alias for progconf operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when resolving, accessing or watching a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A path could not be split into root, program and file components.
    #[error("Could not decompose path '{}' into root/program/file", .0.display())]
    DecompositionError(PathBuf),

    /// A handle was requested with an empty root, program or file component.
    #[error("Invalid configuration handle: {0}")]
    InvalidHandle(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// No configuration was found in any location of the search path.
    #[error("No configuration available for {program}/{file}")]
    ResolutionError {
        /// Program name that was looked up
        program: String,
        /// Configuration file name that was looked up
        file: String,
    },

    /// Change notifications could not be set up, or the backend reported a failure.
    #[error("File watching error: {0}")]
    SubscriptionError(String),
}

impl ConfigError {
    /// Returns true if this error means the backing file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

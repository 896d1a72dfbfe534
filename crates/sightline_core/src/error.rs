//! # Culling Error Types
//!
//! Configuration errors are fatal to initialization. Registration errors
//! are recoverable: the call is a logged no-op. Cancellation is the
//! expected teardown path.

use std::path::PathBuf;

use thiserror::Error;

use crate::registry::ObjectId;

/// Errors that prevent the culling pipeline from starting.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No player anchor was supplied and none could be found by tag.
    #[error("no player anchor: none supplied and no scene object tagged `{tag}`")]
    MissingPlayerAnchor {
        /// The tag that was searched for.
        tag: String,
    },

    /// No camera was supplied.
    #[error("no camera supplied")]
    MissingCamera,

    /// No scene was supplied.
    #[error("no scene supplied")]
    MissingScene,

    /// A configuration value is out of range.
    #[error("invalid configuration: {field} {reason}")]
    InvalidValue {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The batch worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

/// Errors returned when an object cannot join the registry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    /// The scene object has no visual component.
    #[error("object has no visual component")]
    MissingVisual,

    /// The visual is not a descendant of the managed hierarchy.
    #[error("visual is not part of the managed hierarchy")]
    OutsideScope,

    /// The visual is already tracked under another id.
    #[error("visual is already registered as {0}")]
    AlreadyRegistered(ObjectId),

    /// The visual reported a NaN or infinite position or bounds.
    #[error("visual reported non-finite bounds")]
    InvalidBounds,
}

/// Errors that end a tick's evaluation without applying anything.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationError {
    /// Shutdown was requested while batches were still pending.
    #[error("evaluation cancelled")]
    Cancelled,
}

/// Result type for configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for registration.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

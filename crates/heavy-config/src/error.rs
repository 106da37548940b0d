//! Error types for configuration operations.

use heavy_core::{ContextError, PatchError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, saving or lowering a patch file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Unknown object kind
    #[error("object '{id}': unknown kind '{kind}'")]
    UnknownObjectKind {
        /// Id of the object entry.
        id: String,
        /// The unrecognised kind.
        kind: String,
    },

    /// Missing or malformed object argument
    #[error("object '{id}': bad argument '{arg}': {reason}")]
    BadArgument {
        /// Id of the object entry.
        id: String,
        /// Name of the argument.
        arg: String,
        /// Description of why the argument is invalid.
        reason: String,
    },

    /// Two object entries share an id
    #[error("duplicate object id: {0}")]
    DuplicateObject(String),

    /// A connection names an object id that was never declared
    #[error("unknown object id: {0}")]
    UnknownObject(String),

    /// The lowered patch failed validation
    #[error("invalid patch: {0}")]
    Patch(#[from] PatchError),

    /// The context could not be created
    #[error("invalid context: {0}")]
    Context(#[from] ContextError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create a bad argument error.
    pub fn bad_argument(id: &str, arg: &str, reason: impl Into<String>) -> Self {
        ConfigError::BadArgument {
            id: id.to_owned(),
            arg: arg.to_owned(),
            reason: reason.into(),
        }
    }
}

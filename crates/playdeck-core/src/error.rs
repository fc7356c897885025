//! Error types for Playdeck core operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Playdeck core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Playlist not found on disk or in the cache.
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    /// Playlist already exists.
    #[error("Playlist already exists: {0}")]
    PlaylistAlreadyExists(String),

    /// Invalid playlist name.
    #[error("Invalid playlist name '{name}': {reason}")]
    InvalidPlaylistName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The name is reserved for the live mix.
    #[error("Name is reserved for the live mix: {0}")]
    ReservedName(String),

    /// Playlist file was written by a newer version of the format.
    #[error("Playlist file declares format version {found}, but only versions up to {supported} are supported")]
    VersionTooNew {
        /// Version declared by the file.
        found: u32,
        /// Highest version this implementation can read.
        supported: u32,
    },

    /// A seed string could not be decoded.
    #[error("Invalid seed string: {0}")]
    InvalidSeed(String),

    /// File system operation failed.
    #[error("File system error at {path}: {message}")]
    FileSystem {
        /// Path where the error occurred.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

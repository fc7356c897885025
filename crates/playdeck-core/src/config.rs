//! Store configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default number of playlists kept in the in-memory cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Configuration for a [`crate::store::PlaylistStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the playlist files.
    #[serde(default = "default_playlist_dir")]
    pub playlist_dir: PathBuf,

    /// Most-recently-used cache capacity.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_playlist_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("playdeck")
        .join("playlists")
}

const fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            playlist_dir: default_playlist_dir(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the playlist directory.
    #[must_use]
    pub fn with_playlist_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.playlist_dir = dir.into();
        self
    }

    /// Set the cache capacity (clamped to at least 1).
    #[must_use]
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        assert_eq!(StoreConfig::default().cache_capacity, 16);
    }

    #[test]
    fn test_builder() {
        let config = StoreConfig::new()
            .with_playlist_dir("/tmp/playlists")
            .with_cache_capacity(0);
        assert_eq!(config.playlist_dir, PathBuf::from("/tmp/playlists"));
        assert_eq!(config.cache_capacity, 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: StoreConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }
}

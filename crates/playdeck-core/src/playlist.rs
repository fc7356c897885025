//! Playlists, per-playlist metadata, and name validation.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::FORMAT_VERSION;
use crate::resource::PlaylistItem;

/// Maximum length of a playlist name.
pub const MAX_NAME_LENGTH: usize = 64;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^[A-Za-z0-9_-]+$").unwrap()
});

/// An ordered, mutable sequence of playlist items with a title.
///
/// Insertion order is significant and preserved across save/load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Display title (independent of the on-disk name).
    pub title: String,
    items: Vec<PlaylistItem>,
}

impl Playlist {
    /// Create an empty playlist.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    /// Create a playlist from existing items.
    pub fn with_items(title: impl Into<String>, items: Vec<PlaylistItem>) -> Self {
        Self {
            title: title.into(),
            items,
        }
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the playlist has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// All items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[PlaylistItem] {
        &self.items
    }

    /// The item at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PlaylistItem> {
        self.items.get(index)
    }

    /// Append a single item.
    pub fn push(&mut self, item: PlaylistItem) {
        self.items.push(item);
    }

    /// Append several items, preserving their order.
    pub fn extend(&mut self, items: impl IntoIterator<Item = PlaylistItem>) {
        self.items.extend(items);
    }

    /// Remove the item at `index`, shifting later items down.
    pub fn remove(&mut self, index: usize) -> Option<PlaylistItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The header record describing this playlist.
    #[must_use]
    pub fn meta(&self) -> PlaylistMeta {
        PlaylistMeta {
            title: self.title.clone(),
            count: self.items.len(),
            version: FORMAT_VERSION,
        }
    }
}

/// Per-playlist header record: title, item count, format version.
///
/// Rebuilt on every successful write or header-only read and cached in the
/// store's metadata index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistMeta {
    /// Display title.
    pub title: String,
    /// Number of persisted items.
    pub count: usize,
    /// Format version the file was written with.
    pub version: u32,
}

/// A listing entry: on-disk name plus the cached header fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSummary {
    /// On-disk playlist name.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Number of items.
    pub count: usize,
}

/// Validate a playlist name before it reaches the filesystem.
///
/// Names are restricted to word characters, hyphen and underscore, with a
/// maximum length of [`MAX_NAME_LENGTH`].
///
/// # Errors
///
/// Returns an error if the name is empty, too long, or contains characters
/// outside the allowed set.
pub fn validate_playlist_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidPlaylistName {
            name: name.to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(Error::InvalidPlaylistName {
            name: name.to_string(),
            reason: format!("name exceeds {MAX_NAME_LENGTH} characters"),
        });
    }

    if !NAME_PATTERN.is_match(name) {
        return Err(Error::InvalidPlaylistName {
            name: name.to_string(),
            reason: "only letters, digits, hyphen and underscore are allowed".to_string(),
        });
    }

    Ok(())
}

//! Audio resources and playlist items.
//!
//! An [`AudioResource`] is the unit a playlist references: a kind tag, a
//! unique id within that kind, a display title, and optional extra metadata.
//! Resolution of a resource into something playable happens outside this
//! crate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A playable audio resource referenced by playlist entries.
///
/// Equality is by resource identity (`kind` + `id`); the display title and
/// extra metadata do not participate in comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioResource {
    /// Resource kind identifier (e.g. "track", "url", "radio").
    pub kind: String,
    /// Unique identifier within the resource kind.
    pub id: String,
    /// Human-readable display title.
    pub title: String,
    /// Optional extra metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,
}

impl AudioResource {
    /// Create a new resource without extra metadata.
    pub fn new(
        kind: impl Into<String>,
        id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            title: title.into(),
            meta: None,
        }
    }

    /// Attach extra metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: BTreeMap<String, String>) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl PartialEq for AudioResource {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.id == other.id
    }
}

impl Eq for AudioResource {}

/// A single entry of a playlist.
///
/// Immutable once constructed; equality follows the wrapped resource's
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistItem {
    resource: AudioResource,
}

impl PlaylistItem {
    /// Wrap a resource as a playlist entry.
    #[must_use]
    pub const fn new(resource: AudioResource) -> Self {
        Self { resource }
    }

    /// The wrapped resource.
    #[must_use]
    pub const fn resource(&self) -> &AudioResource {
        &self.resource
    }

    /// Display title of the wrapped resource.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.resource.title
    }
}

impl From<AudioResource> for PlaylistItem {
    fn from(resource: AudioResource) -> Self {
        Self::new(resource)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_is_by_identity() {
        let a = AudioResource::new("track", "42", "Some Title");
        let b = AudioResource::new("track", "42", "Renamed Later");
        let c = AudioResource::new("url", "42", "Some Title");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_item_equality_follows_resource() {
        let a = PlaylistItem::new(AudioResource::new("track", "1", "One"));
        let b = PlaylistItem::new(AudioResource::new("track", "1", "Uno"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_meta_skipped_when_absent() {
        let json = serde_json::to_string(&AudioResource::new("track", "7", "Seven"))
            .expect("serialize");
        assert!(!json.contains("meta"));
    }

    #[test]
    fn test_meta_round_trip() {
        let mut meta = BTreeMap::new();
        meta.insert("duration".to_string(), "215".to_string());
        let res = AudioResource::new("track", "7", "Seven").with_meta(meta);

        let json = serde_json::to_string(&res).expect("serialize");
        let back: AudioResource = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.meta, res.meta);
    }
}

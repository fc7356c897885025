//! The versioned on-disk playlist format.
//!
//! Files are UTF-8, line oriented, `key:value` records:
//!
//! ```text
//! version:3
//! meta:{"count":2,"title":"Road Trip"}
//!
//! rsj:{"kind":"track","id":"42","title":"Some Song"}
//! rs:v1:track,41,Another%20Song
//! ```
//!
//! `rsj:` is the current record form; `rs:` is a deprecated single-line form
//! kept for read-only backward compatibility. Files declaring a version newer
//! than [`FORMAT_VERSION`] are refused. Unknown keys and malformed records
//! are logged and skipped, never fatal to the whole read.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::playlist::{Playlist, PlaylistMeta};
use crate::resource::{AudioResource, PlaylistItem};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 3;

/// Payload of the `meta:` header line.
#[derive(Debug, Serialize, Deserialize)]
struct MetaLine {
    count: usize,
    title: String,
}

/// Serialize a playlist into its on-disk text form.
///
/// # Errors
///
/// Returns an error if a record cannot be serialized to JSON.
pub fn serialize(playlist: &Playlist) -> Result<String> {
    let meta = MetaLine {
        count: playlist.len(),
        title: playlist.title.clone(),
    };

    let mut out = String::new();
    out.push_str(&format!("version:{FORMAT_VERSION}\n"));
    out.push_str(&format!("meta:{}\n", serde_json::to_string(&meta)?));
    out.push('\n');

    for item in playlist.items() {
        out.push_str(&format!("rsj:{}\n", serde_json::to_string(item.resource())?));
    }

    Ok(out)
}

/// Parse a full playlist file. Returns the playlist together with the
/// declared format version (0 when the file carries no version header).
///
/// `name` is used as the fallback title when the header is missing.
///
/// # Errors
///
/// Returns [`Error::VersionTooNew`] when the file declares a version newer
/// than [`FORMAT_VERSION`]. Corrupt individual records are skipped.
pub fn parse(name: &str, content: &str) -> Result<(Playlist, u32)> {
    let mut version = 0;
    let mut title = name.to_string();
    let mut declared_count: Option<usize> = None;
    let mut items = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            warn!("Skipping malformed line {} in '{}'", line_no + 1, name);
            continue;
        };

        match key {
            "version" => {
                version = check_version(name, value)?;
            }
            "meta" => match serde_json::from_str::<MetaLine>(value) {
                Ok(meta) => {
                    title = meta.title;
                    declared_count = Some(meta.count);
                }
                Err(e) => warn!("Skipping malformed meta header in '{}': {}", name, e),
            },
            "rsj" => match serde_json::from_str::<AudioResource>(value) {
                Ok(resource) => items.push(PlaylistItem::new(resource)),
                Err(e) => warn!(
                    "Skipping malformed record at line {} in '{}': {}",
                    line_no + 1,
                    name,
                    e
                ),
            },
            "rs" => match parse_legacy_record(value) {
                Some(resource) => items.push(PlaylistItem::new(resource)),
                None => warn!(
                    "Skipping malformed legacy record at line {} in '{}'",
                    line_no + 1,
                    name
                ),
            },
            other => warn!("Ignoring unknown record key '{}' in '{}'", other, name),
        }
    }

    if let Some(count) = declared_count
        && count != items.len()
    {
        debug!(
            "Header of '{}' declares {} items but {} were read",
            name,
            count,
            items.len()
        );
    }

    Ok((Playlist::with_items(title, items), version))
}

/// Parse only the header of a playlist file, without materializing items.
///
/// Used by directory listing to rebuild the metadata index cheaply.
///
/// # Errors
///
/// Returns [`Error::VersionTooNew`] when the file declares a version newer
/// than [`FORMAT_VERSION`].
pub fn parse_header(name: &str, content: &str) -> Result<PlaylistMeta> {
    let mut version = 0;
    let mut title = name.to_string();
    let mut count = 0;

    for line in content.lines() {
        if line.trim().is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match key {
            "version" => version = check_version(name, value)?,
            "meta" => {
                if let Ok(meta) = serde_json::from_str::<MetaLine>(value) {
                    title = meta.title;
                    count = meta.count;
                }
            }
            // Body reached; the header is complete.
            "rsj" | "rs" => break,
            _ => {}
        }
    }

    Ok(PlaylistMeta {
        title,
        count,
        version,
    })
}

/// Parse and gate the `version:` header value.
fn check_version(name: &str, value: &str) -> Result<u32> {
    let Ok(version) = value.trim().parse::<u32>() else {
        warn!("Ignoring malformed version header in '{}'", name);
        return Ok(0);
    };

    if version > FORMAT_VERSION {
        return Err(Error::VersionTooNew {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    Ok(version)
}

/// Decode a deprecated `rs:<tag>:<kind>,<urlencoded-id>,<urlencoded-title>`
/// record into the canonical resource shape. The legacy shape never leaves
/// this parser.
fn parse_legacy_record(value: &str) -> Option<AudioResource> {
    let (_tag, rest) = value.split_once(':')?;
    let mut fields = rest.splitn(3, ',');

    let kind = fields.next()?;
    let id = urlencoding::decode(fields.next()?).ok()?;
    let title = urlencoding::decode(fields.next()?).ok()?;

    Some(AudioResource::new(kind, id, title))
}

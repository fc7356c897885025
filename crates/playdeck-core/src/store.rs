//! Disk-backed, cache-fronted repository of named playlists.
//!
//! The store owns the playlist directory, an LRU cache of fully parsed
//! playlists, a metadata index rebuilt from header-only reads, and the set
//! of names with deferred (dirty) changes. All shared state sits behind one
//! reader/writer lock: cache hits take the read lock, everything touching
//! disk takes the write lock.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::format;
use crate::playlist::{Playlist, PlaylistMeta, PlaylistSummary, validate_playlist_name};

/// Lock-guarded store internals.
#[derive(Default)]
struct StoreState {
    cache: HashMap<String, Playlist>,
    /// Cache recency, most recent at the front. Behind its own mutex so a
    /// cache hit can record the touch while holding only the shared lock.
    /// Bounded by the cache capacity, so linear scans stay cheap.
    recency: Mutex<VecDeque<String>>,
    /// Metadata index, independent of the item cache.
    info: HashMap<String, PlaylistMeta>,
    /// Names with staged changes not yet flushed to disk.
    dirty: HashSet<String>,
    scanned: bool,
    disk_reads: u64,
}

impl StoreState {
    fn recency(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.recency.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn touch(&self, name: &str) {
        let mut recency = self.recency();
        if let Some(pos) = recency.iter().position(|n| n == name) {
            recency.remove(pos);
        }
        recency.push_front(name.to_string());
    }

    fn insert_cached(&mut self, name: &str, playlist: Playlist, capacity: usize) {
        self.cache.insert(name.to_string(), playlist);
        self.touch(name);
        // Borrow only the recency field so the cache stays mutable.
        let mut recency = self.recency.lock().unwrap_or_else(PoisonError::into_inner);
        while self.cache.len() > capacity {
            let Some(evicted) = recency.pop_back() else {
                break;
            };
            self.cache.remove(&evicted);
            debug!("Evicted '{}' from playlist cache", evicted);
        }
    }

    fn remove_cached(&mut self, name: &str) {
        self.cache.remove(name);
        let mut recency = self.recency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = recency.iter().position(|n| n == name) {
            recency.remove(pos);
        }
    }
}

/// Repository of named playlists backed by one file per playlist.
pub struct PlaylistStore {
    dir: PathBuf,
    capacity: usize,
    state: RwLock<StoreState>,
}

impl PlaylistStore {
    /// Create a store over the configured playlist directory, creating the
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let dir = config.playlist_dir.clone();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| Error::FileSystem {
                path: dir.clone(),
                message: e.to_string(),
            })?;
        }

        info!("Playlist store opened at {}", dir.display());
        Ok(Self {
            dir,
            capacity: config.cache_capacity.max(1),
            state: RwLock::new(StoreState::default()),
        })
    }

    /// The directory holding the playlist files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a playlist, serving from the cache when possible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlaylistNotFound`] if no such playlist exists, or a
    /// parse/IO error from the disk path.
    pub fn read(&self, name: &str) -> Result<Playlist> {
        validate_playlist_name(name)?;

        {
            // Hits never leave the shared lock; the recency touch goes
            // through the list's own mutex.
            let state = self.read_state();
            if let Some(playlist) = state.cache.get(name) {
                let playlist = playlist.clone();
                state.touch(name);
                debug!("Cache hit for playlist '{}'", name);
                return Ok(playlist);
            }
        }

        let mut state = self.write_state();
        // std locks have no atomic upgrade, so another thread may have
        // populated the cache between the release and the re-acquire.
        if let Some(playlist) = state.cache.get(name) {
            let playlist = playlist.clone();
            state.touch(name);
            return Ok(playlist);
        }

        self.read_from_disk(name, &mut state)
    }

    /// Write a playlist to disk and refresh the cache and metadata index.
    ///
    /// The destination file is written in place; there is no temp-file
    /// rename step.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the file cannot be
    /// written.
    pub fn write(&self, name: &str, playlist: &Playlist) -> Result<()> {
        validate_playlist_name(name)?;
        let text = format::serialize(playlist)?;

        let mut state = self.write_state();
        let path = self.path_for(name);
        fs::write(&path, text).map_err(|e| Error::FileSystem {
            path,
            message: e.to_string(),
        })?;

        state.info.insert(name.to_string(), playlist.meta());
        state.insert_cached(name, playlist.clone(), self.capacity);
        state.dirty.remove(name);

        info!("Wrote playlist '{}' ({} items)", name, playlist.len());
        Ok(())
    }

    /// Update the cached copy of a playlist and mark it dirty, deferring
    /// the disk write to [`Self::flush`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    pub fn stage(&self, name: &str, playlist: Playlist) -> Result<()> {
        validate_playlist_name(name)?;

        let mut state = self.write_state();
        state.info.insert(name.to_string(), playlist.meta());
        state.insert_cached(name, playlist, self.capacity);
        state.dirty.insert(name.to_string());
        Ok(())
    }

    /// Flag a name for the next [`Self::flush`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid.
    pub fn mark_dirty(&self, name: &str) -> Result<()> {
        validate_playlist_name(name)?;
        self.write_state().dirty.insert(name.to_string());
        Ok(())
    }

    /// Write every dirty playlist that is still cache-resident. Returns the
    /// number of playlists written. Intended for shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first serialization or IO error encountered.
    pub fn flush(&self) -> Result<usize> {
        let mut state = self.write_state();
        let names: Vec<String> = state.dirty.iter().cloned().collect();
        let mut written = 0;

        for name in names {
            let Some(playlist) = state.cache.get(&name).cloned() else {
                // Evicted since it was staged; nothing left to write.
                state.dirty.remove(&name);
                continue;
            };

            let text = format::serialize(&playlist)?;
            let path = self.path_for(&name);
            fs::write(&path, text).map_err(|e| Error::FileSystem {
                path,
                message: e.to_string(),
            })?;

            state.info.insert(name.clone(), playlist.meta());
            state.dirty.remove(&name);
            written += 1;
        }

        if written > 0 {
            info!("Flushed {} dirty playlist(s)", written);
        }
        Ok(written)
    }

    /// Delete a playlist from the cache, the metadata index and disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PlaylistNotFound`] if the playlist is unknown, or an
    /// IO error if the backing file cannot be removed.
    pub fn delete(&self, name: &str) -> Result<()> {
        validate_playlist_name(name)?;

        let mut state = self.write_state();
        let path = self.path_for(name);
        let known = state.info.remove(name).is_some();
        state.remove_cached(name);
        state.dirty.remove(name);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| Error::FileSystem {
                path,
                message: e.to_string(),
            })?;
        } else if !known {
            return Err(Error::PlaylistNotFound(name.to_string()));
        }

        info!("Deleted playlist '{}'", name);
        Ok(())
    }

    /// Whether a playlist exists, checking the metadata index before the
    /// filesystem. Invalid names never reach the filesystem.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        if validate_playlist_name(name).is_err() {
            return false;
        }
        if self.read_state().info.contains_key(name) {
            return true;
        }
        self.path_for(name).is_file()
    }

    /// List playlists as `(name, title, count)` summaries, optionally
    /// filtered by a glob-style pattern (`*` and `?`).
    ///
    /// The first listing rescans the directory with header-only reads to
    /// rebuild the metadata index; later calls serve from the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be scanned or the pattern
    /// is malformed.
    pub fn list(&self, pattern: Option<&str>) -> Result<Vec<PlaylistSummary>> {
        self.ensure_scanned()?;
        let filter = pattern.map(glob_to_regex).transpose()?;

        let state = self.read_state();
        let mut entries: Vec<PlaylistSummary> = state
            .info
            .iter()
            .filter(|(name, _)| filter.as_ref().is_none_or(|re| re.is_match(name)))
            .map(|(name, meta)| PlaylistSummary {
                name: name.clone(),
                title: meta.title.clone(),
                count: meta.count,
            })
            .collect();
        drop(state);

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Drop the cache entry for one name so the next read hits disk. The
    /// metadata index is left untouched.
    pub fn force_reload(&self, name: &str) {
        self.write_state().remove_cached(name);
    }

    /// Number of disk reads performed so far (test instrumentation).
    #[must_use]
    pub fn disk_reads(&self) -> u64 {
        self.read_state().disk_reads
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Disk path of a cache miss; caller holds the write lock.
    fn read_from_disk(
        &self,
        name: &str,
        state: &mut RwLockWriteGuard<'_, StoreState>,
    ) -> Result<Playlist> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(Error::PlaylistNotFound(name.to_string()));
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::FileSystem {
            path,
            message: e.to_string(),
        })?;
        state.disk_reads += 1;

        let (playlist, version) = format::parse(name, &content)?;

        state.info.insert(
            name.to_string(),
            PlaylistMeta {
                title: playlist.title.clone(),
                count: playlist.len(),
                version,
            },
        );
        state.insert_cached(name, playlist.clone(), self.capacity);

        debug!("Loaded playlist '{}' from disk", name);
        Ok(playlist)
    }

    /// Rebuild the metadata index from the directory if it has not been
    /// scanned yet.
    fn ensure_scanned(&self) -> Result<()> {
        if self.read_state().scanned {
            return Ok(());
        }

        let mut state = self.write_state();
        if state.scanned {
            return Ok(());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| Error::FileSystem {
            path: self.dir.clone(),
            message: e.to_string(),
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| Error::FileSystem {
                path: self.dir.clone(),
                message: e.to_string(),
            })?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if validate_playlist_name(name).is_err() {
                debug!("Ignoring non-playlist file '{}'", path.display());
                continue;
            }
            // In-memory entries are at least as fresh as the files.
            if state.info.contains_key(name) {
                continue;
            }

            match fs::read_to_string(&path) {
                Ok(content) => {
                    state.disk_reads += 1;
                    match format::parse_header(name, &content) {
                        Ok(meta) => {
                            state.info.insert(name.to_string(), meta);
                        }
                        Err(e) => warn!("Skipping unreadable playlist '{}': {}", name, e),
                    }
                }
                Err(e) => warn!("Skipping unreadable playlist '{}': {}", name, e),
            }
        }

        state.scanned = true;
        debug!("Scanned playlist directory, {} playlist(s)", state.info.len());
        Ok(())
    }
}

/// Translate a glob-style pattern (`*`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|_| Error::InvalidPlaylistName {
        name: pattern.to_string(),
        reason: "invalid listing pattern".to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::resource::{AudioResource, PlaylistItem};
    use tempfile::TempDir;

    fn setup_store() -> (PlaylistStore, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let config = StoreConfig::new().with_playlist_dir(temp.path());
        let store = PlaylistStore::new(&config).expect("store");
        (store, temp)
    }

    fn playlist_with(title: &str, count: usize) -> Playlist {
        let items = (0..count)
            .map(|i| {
                PlaylistItem::new(AudioResource::new("track", i.to_string(), format!("T{i}")))
            })
            .collect();
        Playlist::with_items(title, items)
    }

    #[test]
    fn test_round_trip() {
        let (store, _temp) = setup_store();

        for (name, count) in [("empty", 0usize), ("single", 1), ("large", 100)] {
            let playlist = playlist_with(name, count);
            store.write(name, &playlist).expect("write");
            store.force_reload(name);

            let back = store.read(name).expect("read");
            assert_eq!(back, playlist, "{name}");
            assert_eq!(back.len(), count);
        }
    }

    #[test]
    fn test_cached_read_does_not_touch_disk() {
        let (store, _temp) = setup_store();
        store.write("hot", &playlist_with("Hot", 3)).expect("write");

        let before = store.disk_reads();
        for _ in 0..5 {
            store.read("hot").expect("read");
        }
        assert_eq!(store.disk_reads(), before);
    }

    #[test]
    fn test_force_reload_rereads_from_disk() {
        let (store, _temp) = setup_store();
        store.write("p", &playlist_with("P", 2)).expect("write");

        let before = store.disk_reads();
        store.force_reload("p");
        store.read("p").expect("read");
        assert_eq!(store.disk_reads(), before + 1);
    }

    #[test]
    fn test_lru_eviction_after_capacity_reads() {
        let (store, _temp) = setup_store();

        // 17 playlists against a 16-entry cache; the writes leave the last
        // 16 resident.
        let names: Vec<String> = (0..17).map(|i| format!("list-{i:02}")).collect();
        for name in &names {
            store.write(name, &playlist_with(name, 1)).expect("write");
        }

        let before = store.disk_reads();
        for name in names.iter().skip(1) {
            store.read(name).expect("read");
        }
        assert_eq!(store.disk_reads(), before, "recent names stay cached");

        // list-00 was evicted by the 17th write; reading it evicts the
        // least-recently-touched survivor (list-01).
        store.read("list-00").expect("read");
        assert_eq!(store.disk_reads(), before + 1);
        store.read("list-01").expect("read");
        assert_eq!(store.disk_reads(), before + 2);
        // Everything touched after list-01 is still resident.
        store.read("list-16").expect("read");
        assert_eq!(store.disk_reads(), before + 2);
    }

    #[test]
    fn test_version_too_new_not_cached() {
        let (store, temp) = setup_store();
        fs::write(
            temp.path().join("future"),
            "version:99\nmeta:{\"count\":0,\"title\":\"Future\"}\n",
        )
        .expect("write raw");

        for _ in 0..2 {
            let err = store.read("future").unwrap_err();
            assert!(matches!(err, Error::VersionTooNew { found: 99, .. }));
        }
        // Both attempts hit disk: the failed read never populated the cache.
        assert_eq!(store.disk_reads(), 2);
    }

    #[test]
    fn test_delete_removes_everything() {
        let (store, temp) = setup_store();
        store.write("gone", &playlist_with("Gone", 2)).expect("write");

        store.delete("gone").expect("delete");
        assert!(!temp.path().join("gone").exists());
        assert!(!store.exists("gone"));
        assert!(matches!(
            store.read("gone"),
            Err(Error::PlaylistNotFound(_))
        ));
        assert!(matches!(
            store.delete("gone"),
            Err(Error::PlaylistNotFound(_))
        ));
    }

    #[test]
    fn test_exists_checks_index_then_disk() {
        let (store, temp) = setup_store();
        assert!(!store.exists("nothing"));

        store.write("indexed", &playlist_with("I", 0)).expect("write");
        assert!(store.exists("indexed"));

        // A file dropped in externally is still found via the filesystem.
        fs::write(temp.path().join("external"), "version:3\n").expect("write raw");
        assert!(store.exists("external"));
    }

    #[test]
    fn test_invalid_name_never_reaches_filesystem() {
        let (store, _temp) = setup_store();
        for name in ["has space", "a/b", "", &"x".repeat(65)] {
            assert!(matches!(
                store.read(name),
                Err(Error::InvalidPlaylistName { .. })
            ));
            assert!(!store.exists(name));
        }
        assert_eq!(store.disk_reads(), 0);
    }

    #[test]
    fn test_list_scans_headers() {
        let (store, temp) = setup_store();
        store.write("rock", &playlist_with("Rock Anthems", 2)).expect("write");
        store.write("rap", &playlist_with("Rap Hits", 5)).expect("write");
        store.write("jazz", &playlist_with("Jazz Café", 1)).expect("write");

        // A second store over the same directory exercises the scan path.
        let config = StoreConfig::new().with_playlist_dir(temp.path());
        let fresh = PlaylistStore::new(&config).expect("store");

        let all = fresh.list(None).expect("list");
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].name, "jazz");
        assert_eq!(all[0].title, "Jazz Café");
        assert_eq!(all[0].count, 1);

        let filtered = fresh.list(Some("ra*")).expect("list");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "rap");

        let question = fresh.list(Some("ro?k")).expect("list");
        assert_eq!(question.len(), 1);
        assert_eq!(question[0].name, "rock");
    }

    #[test]
    fn test_stage_and_flush() {
        let (store, temp) = setup_store();
        store.write("wip", &playlist_with("WIP", 1)).expect("write");

        let mut staged = playlist_with("WIP", 1);
        staged.push(PlaylistItem::new(AudioResource::new("track", "x", "X")));
        store.stage("wip", staged.clone()).expect("stage");

        // The staged copy is served from the cache...
        assert_eq!(store.read("wip").expect("read").len(), 2);
        // ...but disk still holds the old version.
        let on_disk = fs::read_to_string(temp.path().join("wip")).expect("raw");
        assert!(on_disk.contains("\"count\":1"));

        assert_eq!(store.flush().expect("flush"), 1);
        let on_disk = fs::read_to_string(temp.path().join("wip")).expect("raw");
        assert!(on_disk.contains("\"count\":2"));

        // Nothing left to flush.
        assert_eq!(store.flush().expect("flush"), 0);
    }
}

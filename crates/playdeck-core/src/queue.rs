//! The active queue ("mix") and its navigation semantics.
//!
//! The mix is a single in-memory playlist that is never persisted. A
//! [`QueueManager`] drives it through a swappable [`SequenceAlgorithm`],
//! applies loop and shuffle policy on top of the raw traversal, and forwards
//! named-playlist operations to the [`PlaylistStore`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::playlist::{Playlist, PlaylistSummary};
use crate::resource::PlaylistItem;
use crate::sequence::{PseudoRandomCycle, Sequential, SequenceAlgorithm};
use crate::store::PlaylistStore;

/// Reserved identifier of the mix. Not a valid filename, so it can never
/// collide with a stored playlist.
pub const MIX_NAME: &str = "$mix";

/// Fixed display title of the mix.
pub const MIX_TITLE: &str = "Now Playing";

/// What happens when playback reaches the end of the mix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopMode {
    /// Automatic advance past the last item stops playback.
    #[default]
    Off,
    /// Automatic advance replays the current item; manual advance moves on.
    RepeatOne,
    /// Advance wraps around to the start of the mix.
    RepeatAll,
}

/// Queue state mutated only under the manager's lock.
struct QueueState {
    mix: Playlist,
    algo: Box<dyn SequenceAlgorithm>,
    loop_mode: LoopMode,
    random: bool,
    seed: i32,
}

/// Owns the mix playlist and fronts the playlist store.
///
/// All mix-state transitions hold one mutex for their duration; no disk I/O
/// happens under it. Named-playlist calls run against the store's own lock.
pub struct QueueManager {
    store: PlaylistStore,
    state: Mutex<QueueState>,
}

impl QueueManager {
    /// Create a manager with an empty mix over the given store.
    #[must_use]
    pub fn new(store: PlaylistStore) -> Self {
        Self {
            store,
            state: Mutex::new(QueueState {
                mix: Playlist::new(MIX_TITLE),
                algo: Box::new(Sequential::new(0)),
                loop_mode: LoopMode::Off,
                random: false,
                seed: 0,
            }),
        }
    }

    /// The underlying playlist store.
    #[must_use]
    pub fn store(&self) -> &PlaylistStore {
        &self.store
    }

    /// The item at the current position, without moving. `None` when the
    /// mix is empty or the position is stale after a shrink.
    #[must_use]
    pub fn current(&self) -> Option<PlaylistItem> {
        let state = self.lock();
        state.mix.get(state.algo.index()).cloned()
    }

    /// Move one step through the mix and return the new current item.
    ///
    /// `forward` selects the direction, `manual` distinguishes a user
    /// navigation request from an automatic track-ended advance. Loop and
    /// shuffle policy:
    ///
    /// - [`LoopMode::RepeatOne`] pins automatic advances to the current
    ///   item; manual ones move normally.
    /// - Completing a full cycle in random mode draws a fresh seed, so each
    ///   pass gets a new permutation.
    /// - With [`LoopMode::Off`], an automatic advance past the end returns
    ///   `None`; manual requests always wrap.
    pub fn advance(&self, forward: bool, manual: bool) -> Option<PlaylistItem> {
        let mut state = self.lock();

        let len = state.mix.len();
        if len == 0 {
            return None;
        }

        // Resynchronize with the mix, which may have changed size since the
        // last step.
        if state.algo.length() != len {
            state.algo.set_length(len);
        }
        if state.algo.index() >= len {
            state.algo.set_index(0);
        }

        if state.loop_mode == LoopMode::RepeatOne && !manual {
            return state.mix.get(state.algo.index()).cloned();
        }

        let wrapped = if forward {
            state.algo.next()
        } else {
            state.algo.prev()
        };

        if wrapped && state.random {
            let seed = rand::random::<i32>();
            state.seed = seed;
            state.algo.set_seed(seed);
            debug!("Queue cycle completed, reshuffled with a fresh seed");
        }

        if wrapped && state.loop_mode == LoopMode::Off && !manual {
            debug!("Queue cycle completed with looping off, stopping");
            return None;
        }

        state.mix.get(state.algo.index()).cloned()
    }

    /// Step forward. See [`Self::advance`].
    pub fn next(&self, manual: bool) -> Option<PlaylistItem> {
        self.advance(true, manual)
    }

    /// Step backward. See [`Self::advance`].
    pub fn previous(&self, manual: bool) -> Option<PlaylistItem> {
        self.advance(false, manual)
    }

    /// Switch between sequential and shuffled traversal.
    ///
    /// The logical position carries over to the new algorithm; entering
    /// random mode draws a fresh seed.
    pub fn set_random(&self, on: bool) {
        let mut state = self.lock();
        if state.random == on {
            return;
        }

        let len = state.mix.len();
        let index = state.algo.index();

        if on {
            let seed = rand::random::<i32>();
            state.seed = seed;
            let mut algo = PseudoRandomCycle::new(len, seed);
            algo.set_index(index);
            state.algo = Box::new(algo);
        } else {
            let mut algo = Sequential::new(len);
            algo.set_index(index);
            state.algo = Box::new(algo);
        }

        state.random = on;
        info!("Random mode {}", if on { "enabled" } else { "disabled" });
    }

    /// Whether shuffled traversal is active.
    #[must_use]
    pub fn is_random(&self) -> bool {
        self.lock().random
    }

    /// Set the loop mode.
    pub fn set_loop_mode(&self, mode: LoopMode) {
        self.lock().loop_mode = mode;
    }

    /// The active loop mode.
    #[must_use]
    pub fn loop_mode(&self) -> LoopMode {
        self.lock().loop_mode
    }

    /// The seed driving the current traversal.
    #[must_use]
    pub fn seed(&self) -> i32 {
        self.lock().seed
    }

    /// Apply a specific seed, restarting the traversal deterministically.
    pub fn set_seed(&self, seed: i32) {
        let mut state = self.lock();
        state.seed = seed;
        state.algo.set_seed(seed);
    }

    /// Reposition inside the mix. Out-of-range indices are ignored.
    pub fn set_index(&self, index: usize) {
        self.lock().algo.set_index(index);
    }

    /// The current position inside the mix.
    #[must_use]
    pub fn index(&self) -> usize {
        self.lock().algo.index()
    }

    /// Append one item to the mix.
    pub fn enqueue(&self, item: PlaylistItem) {
        let mut state = self.lock();
        state.mix.push(item);
        let len = state.mix.len();
        state.algo.set_length(len);
    }

    /// Append several items to the mix, preserving their order.
    pub fn enqueue_many(&self, items: impl IntoIterator<Item = PlaylistItem>) {
        let mut state = self.lock();
        state.mix.extend(items);
        let len = state.mix.len();
        state.algo.set_length(len);
    }

    /// Empty the mix and reset the traversal.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.mix.clear();
        state.algo.set_length(0);
        state.algo.set_index(0);
        info!("Queue cleared");
    }

    /// Load a playlist by name. The reserved mix name is served from memory;
    /// `force_reload` drops any cached copy first for stored playlists.
    ///
    /// # Errors
    ///
    /// Returns a store error for unknown or unreadable playlists.
    pub fn load(&self, name: &str, force_reload: bool) -> Result<Playlist> {
        if name == MIX_NAME {
            return Ok(self.lock().mix.clone());
        }
        if force_reload {
            self.store.force_reload(name);
        }
        self.store.read(name)
    }

    /// Create a new empty named playlist. The title defaults to the name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedName`] for the mix name and
    /// [`Error::PlaylistAlreadyExists`] when the name is taken.
    pub fn create(&self, name: &str, title: Option<&str>) -> Result<()> {
        if name == MIX_NAME {
            return Err(Error::ReservedName(name.to_string()));
        }
        if self.store.exists(name) {
            return Err(Error::PlaylistAlreadyExists(name.to_string()));
        }
        let playlist = Playlist::new(title.unwrap_or(name));
        self.store.write(name, &playlist)
    }

    /// Whether a playlist with this name exists. The mix always does.
    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        name == MIX_NAME || self.store.exists(name)
    }

    /// Run a mutator against a playlist and persist the result.
    ///
    /// The mix is mutated in place under the queue lock and the traversal is
    /// resynchronized; named playlists are read, mutated and written through
    /// to disk.
    ///
    /// # Errors
    ///
    /// Returns a store error when the named playlist cannot be read or
    /// written.
    pub fn modify(&self, name: &str, mutator: impl FnOnce(&mut Playlist)) -> Result<()> {
        if name == MIX_NAME {
            let mut state = self.lock();
            mutator(&mut state.mix);
            let len = state.mix.len();
            state.algo.set_length(len);
            if state.algo.index() >= len {
                state.algo.set_index(0);
            }
            return Ok(());
        }

        let mut playlist = self.store.read(name)?;
        mutator(&mut playlist);
        self.store.write(name, &playlist)
    }

    /// Delete a named playlist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReservedName`] for the mix name, otherwise whatever
    /// the store reports.
    pub fn delete(&self, name: &str) -> Result<()> {
        if name == MIX_NAME {
            return Err(Error::ReservedName(name.to_string()));
        }
        self.store.delete(name)
    }

    /// List stored playlists. The mix is not a file and never appears.
    ///
    /// # Errors
    ///
    /// Returns a store error if the directory scan fails.
    pub fn list(&self, pattern: Option<&str>) -> Result<Vec<PlaylistSummary>> {
        self.store.list(pattern)
    }

    /// Write out any deferred playlist changes. Intended for shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first store error encountered.
    pub fn flush(&self) -> Result<usize> {
        self.store.flush()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

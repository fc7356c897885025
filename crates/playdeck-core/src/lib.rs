//! `Playdeck` Core Library
//!
//! This crate provides the playlist persistence and active-queue subsystem:
//! - A versioned, line-oriented on-disk playlist format with read-only
//!   support for the deprecated legacy record form
//! - A disk-backed, LRU-cached, reader/writer-locked playlist store
//! - The live "mix" queue with sequential or seeded pseudo-random traversal
//!   and configurable loop behavior
//! - Human-shareable base-26 seed strings for reproducible shuffles
//!
//! # Error Handling
//!
//! This crate uses typed errors throughout. See the [`error`] module for
//! details.
//!
//! ```rust,ignore
//! use playdeck_core::{Error, Result};
//!
//! fn do_something() -> Result<()> {
//!     // Your code here
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod playlist;
pub mod queue;
pub mod resource;
pub mod seed;
pub mod sequence;
pub mod store;

pub use config::{DEFAULT_CACHE_CAPACITY, StoreConfig};
pub use error::{Error, Result};
pub use format::FORMAT_VERSION;
pub use playlist::{
    MAX_NAME_LENGTH, Playlist, PlaylistMeta, PlaylistSummary, validate_playlist_name,
};
pub use queue::{LoopMode, MIX_NAME, MIX_TITLE, QueueManager};
pub use resource::{AudioResource, PlaylistItem};
pub use sequence::{PseudoRandomCycle, SequenceAlgorithm, Sequential};
pub use store::PlaylistStore;

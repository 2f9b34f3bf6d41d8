// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up a cross-platform filesystem watcher (`notify`) over a fixed
//!   set of files.
//! - Keeping only write events, and debouncing bursts of identical events.
//! - Handing each remaining change to a [`ChangeHandler`].
//!
//! It does not know what a change means; the engine and the code swapper
//! decide that.

pub mod cache;
pub mod event_handler;
pub mod path_utils;
pub mod watcher;

pub use cache::{DebounceCache, DEBOUNCE_TTL, SWEEP_INTERVAL};
pub use event_handler::{event_key, is_write_event, run_watch_loop, ChangeHandler, Reaction};
pub use watcher::{watch_paths, WatchHandle, WatchMessage};

//! A cached map tile and its load lifecycle.

use std::sync::Arc;

use image::RgbaImage;
use parking_lot::{Condvar, Mutex};

use crate::coord::TileKey;

/// Lifecycle of a tile. `Loaded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileStatus {
    Loading,
    Loaded,
    Failed,
}

enum State {
    Loading,
    Loaded(Arc<RgbaImage>),
    Failed,
}

/// One map tile, shared read-only between the cache and its callers.
///
/// Created in the loading state by whichever request reaches the cache
/// first; that request later resolves it with [`Tile::complete`] or
/// [`Tile::fail`], waking every thread blocked in [`Tile::wait`].
pub struct Tile {
    key: TileKey,
    state: Mutex<State>,
    resolved: Condvar,
}

impl Tile {
    pub(crate) fn loading(key: TileKey) -> Self {
        Self {
            key,
            state: Mutex::new(State::Loading),
            resolved: Condvar::new(),
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn status(&self) -> TileStatus {
        match *self.state.lock() {
            State::Loading => TileStatus::Loading,
            State::Loaded(_) => TileStatus::Loaded,
            State::Failed => TileStatus::Failed,
        }
    }

    /// The decoded RGBA image, once loaded.
    pub fn image(&self) -> Option<Arc<RgbaImage>> {
        match &*self.state.lock() {
            State::Loaded(img) => Some(Arc::clone(img)),
            _ => None,
        }
    }

    /// Image dimensions, once loaded.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image().map(|img| img.dimensions())
    }

    /// Blocks until the tile leaves the loading state and returns the final
    /// status.
    pub fn wait(&self) -> TileStatus {
        let mut state = self.state.lock();
        while matches!(*state, State::Loading) {
            self.resolved.wait(&mut state);
        }
        match *state {
            State::Loaded(_) => TileStatus::Loaded,
            _ => TileStatus::Failed,
        }
    }

    /// Transitions `Loading -> Loaded`.
    pub(crate) fn complete(&self, image: RgbaImage) {
        self.resolve(State::Loaded(Arc::new(image)));
    }

    /// Transitions `Loading -> Failed`.
    pub(crate) fn fail(&self) {
        self.resolve(State::Failed);
    }

    /// Marks the tile failed unless it was already resolved.
    pub(crate) fn fail_if_loading(&self) {
        if self.status() == TileStatus::Loading {
            self.fail();
        }
    }

    fn resolve(&self, next: State) {
        let mut state = self.state.lock();
        debug_assert!(
            matches!(*state, State::Loading),
            "tile {} resolved twice",
            self.key
        );
        if matches!(*state, State::Loading) {
            *state = next;
        }
        drop(state);
        self.resolved.notify_all();
    }
}

impl std::fmt::Debug for Tile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tile")
            .field("key", &self.key)
            .field("status", &self.status())
            .finish()
    }
}

//! Deduplicating tile cache backed by memory, disk and a remote source.
//!
//! The first request for a key inserts a loading placeholder and becomes its
//! owner: it alone reads the disk copy or downloads the tile. Every other
//! request for that key blocks on the placeholder until the owner resolves
//! it. The map lock only guards that insert-or-lookup decision and is never
//! held across I/O.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{
    HttpTileSource, ReqwestClient, Tile, TileError, TileSource, TileStatus, UrlTemplate,
};
use crate::coord::{self, TileKey};

/// Tile cache fetching over HTTP.
pub type HttpTileCache = TileCache<HttpTileSource<ReqwestClient>>;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered by a tile already in memory.
    pub memory_hits: u64,
    /// Tiles loaded from the disk cache.
    pub disk_hits: u64,
    /// Tiles fetched from the source.
    pub downloads: u64,
    /// Tiles that ended in the failed state.
    pub failures: u64,
    /// Tiles currently held in memory, in any state.
    pub entries: usize,
}

#[derive(Default)]
struct Counters {
    memory_hits: AtomicU64,
    disk_hits: AtomicU64,
    downloads: AtomicU64,
    failures: AtomicU64,
}

/// Fails the tile if the owner unwinds before resolving it, so that waiters
/// never block forever.
struct ResolveGuard(Arc<Tile>);

impl Drop for ResolveGuard {
    fn drop(&mut self) {
        self.0.fail_if_loading();
    }
}

/// Shared cache of map tiles keyed by [`TileKey`].
///
/// Tiles persist under `<root>/<zoom>/<x>/<y>.png`.
pub struct TileCache<S: TileSource> {
    root: PathBuf,
    source: S,
    tiles: Mutex<HashMap<TileKey, Arc<Tile>>>,
    counters: Counters,
}

impl HttpTileCache {
    /// Opens a cache that downloads from `url_template`.
    ///
    /// `timeout` bounds each download; `None` waits indefinitely.
    pub fn open_http(
        root: impl Into<PathBuf>,
        url_template: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, TileError> {
        let template = UrlTemplate::parse(url_template)?;
        let client = ReqwestClient::with_timeout(timeout)?;
        info!(url = %template, "Using tile server");
        Self::new(root, HttpTileSource::new(client, template))
    }
}

impl<S: TileSource> TileCache<S> {
    /// Creates a cache rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>, source: S) -> Result<Self, TileError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| TileError::io(&root, e))?;
        Ok(Self {
            root,
            source,
            tiles: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// On-disk location of a tile.
    pub fn tile_path(&self, key: &TileKey) -> PathBuf {
        self.root
            .join(key.zoom.to_string())
            .join(key.x.to_string())
            .join(format!("{}.png", key.y))
    }

    /// Returns the loaded tile at `(x, y, zoom)`, fetching it if needed.
    ///
    /// Concurrent requests for the same key share one fetch. A tile that
    /// failed stays failed: later requests return [`TileError::Failed`]
    /// without refetching until [`TileCache::evict_failed`] is called.
    pub fn get_tile(&self, x: u32, y: u32, zoom: u8) -> Result<Arc<Tile>, TileError> {
        let key = TileKey::new(x, y, zoom);
        if !key.is_valid() {
            return Err(TileError::OutOfGrid(key));
        }

        let (tile, owner) = {
            let mut tiles = self.tiles.lock();
            match tiles.get(&key) {
                Some(existing) => (Arc::clone(existing), false),
                None => {
                    let tile = Arc::new(Tile::loading(key));
                    tiles.insert(key, Arc::clone(&tile));
                    (tile, true)
                }
            }
        };

        if owner {
            let _guard = ResolveGuard(Arc::clone(&tile));
            match self.load(&tile) {
                Ok(image) => {
                    tile.complete(image);
                    Ok(tile)
                }
                Err(e) => {
                    self.counters.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(tile = %key, error = %e, "Tile failed");
                    tile.fail();
                    Err(e)
                }
            }
        } else {
            match tile.wait() {
                TileStatus::Loaded => {
                    self.counters.memory_hits.fetch_add(1, Ordering::Relaxed);
                    Ok(tile)
                }
                _ => Err(TileError::Failed(key)),
            }
        }
    }

    /// Returns the tile under a geographic coordinate together with the
    /// pixel offset of that coordinate inside the tile image.
    pub fn get_tile_at(&self, lat: f64, lon: f64, zoom: u8) -> Result<(Arc<Tile>, u32, u32), TileError> {
        let pos = coord::to_tile_position(lat, lon, zoom)?;
        let tile = self.get_tile(pos.key.x, pos.key.y, pos.key.zoom)?;
        let (w, h) = tile.dimensions().ok_or(TileError::Failed(pos.key))?;
        let (px, py) = pos.pixel(w, h);
        Ok((tile, px, py))
    }

    /// Drops every failed tile from memory so the next request retries it.
    ///
    /// Returns how many tiles were dropped.
    pub fn evict_failed(&self) -> usize {
        let mut tiles = self.tiles.lock();
        let before = tiles.len();
        tiles.retain(|_, t| t.status() != TileStatus::Failed);
        let evicted = before - tiles.len();
        if evicted > 0 {
            debug!(evicted, "Evicted failed tiles");
        }
        evicted
    }

    /// Number of tiles held in memory, in any state.
    pub fn len(&self) -> usize {
        self.tiles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            memory_hits: self.counters.memory_hits.load(Ordering::Relaxed),
            disk_hits: self.counters.disk_hits.load(Ordering::Relaxed),
            downloads: self.counters.downloads.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    /// Owner path: disk first, then the source.
    fn load(&self, tile: &Tile) -> Result<RgbaImage, TileError> {
        let key = tile.key();
        let path = self.tile_path(&key);

        match fs::metadata(&path) {
            Ok(meta) if meta.len() > 0 => {
                let bytes = fs::read(&path).map_err(|e| TileError::io(&path, e))?;
                let image = decode(&key, &bytes).inspect_err(|_| remove_quietly(&path))?;
                self.counters.disk_hits.fetch_add(1, Ordering::Relaxed);
                debug!(tile = %key, "Loaded tile from disk");
                return Ok(image);
            }
            Ok(_) => remove_quietly(&path),
            Err(_) => {}
        }

        let bytes = self.source.fetch(&key)?;
        write_atomic(&path, &bytes)?;
        let image = decode(&key, &bytes).inspect_err(|_| remove_quietly(&path))?;
        self.counters.downloads.fetch_add(1, Ordering::Relaxed);
        debug!(tile = %key, bytes = bytes.len(), source = self.source.name(), "Downloaded tile");
        Ok(image)
    }
}

fn decode(key: &TileKey, bytes: &[u8]) -> Result<RgbaImage, TileError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| TileError::Decode {
            key: *key,
            message: e.to_string(),
        })
}

/// Writes to a sibling temp file first, then renames it into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TileError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| TileError::io(parent, e))?;
    }
    let temp_path = path.with_extension("png.tmp");
    fs::write(&temp_path, bytes)
        .and_then(|_| fs::rename(&temp_path, path))
        .map_err(|e| {
            remove_quietly(&temp_path);
            TileError::io(path, e)
        })
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Could not remove tile file");
        }
    }
}

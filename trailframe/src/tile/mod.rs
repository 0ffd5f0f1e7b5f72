//! Map tile cache and downloader
//!
//! [`TileCache`] hands out shared [`Tile`] handles. Each tile is fetched at
//! most once per process, persisted under `<root>/<zoom>/<x>/<y>.png` and
//! decoded to RGBA.

mod cache;
mod error;
mod handle;
pub mod http;
mod prefetch;
pub(crate) mod source;

pub use cache::{CacheStats, HttpTileCache, TileCache};
pub use error::TileError;
pub use handle::{Tile, TileStatus};
pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use prefetch::{tiles_along, PrefetchReport};
pub use source::{HttpTileSource, TileSource, UrlTemplate};

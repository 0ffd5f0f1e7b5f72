//! Tile coordinate types.

use std::fmt;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;
/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;
/// Minimum longitude.
pub const MIN_LON: f64 = -180.0;
/// Maximum longitude.
pub const MAX_LON: f64 = 180.0;
/// Smallest zoom level (the whole world in one tile).
pub const MIN_ZOOM: u8 = 0;
/// Largest zoom level served by common slippy-map tile servers.
pub const MAX_ZOOM: u8 = 22;

/// Errors from coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("latitude {0} is outside the Web Mercator range")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("zoom level {0} exceeds the maximum of {max}", max = MAX_ZOOM)]
    InvalidZoom(u8),
}

/// Identifies one map tile in the `2^zoom × 2^zoom` slippy-map grid.
///
/// Equality and hashing are purely structural, which makes the key usable
/// directly in the tile cache map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Column, increasing eastward.
    pub x: u32,
    /// Row, increasing southward.
    pub y: u32,
    /// Zoom level.
    pub zoom: u8,
}

impl TileKey {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Number of tiles along one axis at this key's zoom level.
    #[inline]
    pub fn tiles_per_axis(&self) -> u32 {
        1u32 << self.zoom
    }

    /// Returns true if the key addresses a tile inside the grid.
    pub fn is_valid(&self) -> bool {
        self.zoom <= MAX_ZOOM && self.x < self.tiles_per_axis() && self.y < self.tiles_per_axis()
    }

    /// Returns the tile offset by `(dx, dy)`.
    ///
    /// Columns wrap around the antimeridian; rows do not wrap, so a neighbour
    /// above the top or below the bottom row is `None`.
    pub fn neighbor(&self, dx: i64, dy: i64) -> Option<TileKey> {
        let n = self.tiles_per_axis() as i64;
        let y = self.y as i64 + dy;
        if y < 0 || y >= n {
            return None;
        }
        let x = (self.x as i64 + dx).rem_euclid(n);
        Some(TileKey::new(x as u32, y as u32, self.zoom))
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A geographic position expressed in tile space.
///
/// `frac_x`/`frac_y` are the fractional offsets inside [`TilePosition::key`],
/// each in `[0, 1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePosition {
    pub key: TileKey,
    pub frac_x: f64,
    pub frac_y: f64,
}

impl TilePosition {
    /// Pixel offset inside a tile of the given dimensions.
    #[inline]
    pub fn pixel(&self, width: u32, height: u32) -> (u32, u32) {
        let px = (self.frac_x * width as f64) as u32;
        let py = (self.frac_y * height as f64) as u32;
        (px.min(width.saturating_sub(1)), py.min(height.saturating_sub(1)))
    }
}

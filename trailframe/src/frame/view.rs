//! Map view for one zoom level.
//!
//! A [`MapView`] keeps the 3×3 block of tiles around the current position
//! and the viewport offset that centres the position in the output frame.
//! The block is refetched only when the position crosses into another
//! centre tile. Pixel work is left to a compositor; this module only says
//! which tiles go where.

use std::sync::Arc;

use tracing::debug;

use crate::coord::{self, TileKey};
use crate::tile::{Tile, TileCache, TileError, TileSource};
use crate::track::Segment;

/// From this zoom level on, the position is drawn as a heading arrow
/// instead of a dot.
pub const ARROW_MIN_ZOOM: u8 = 11;

/// How the current position is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Indicator {
    Dot,
    Arrow { bearing: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Start,
    Finish,
}

/// A fixed point of interest drawn on every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub lat: f64,
    pub lon: f64,
}

impl Marker {
    /// Start and finish markers at both ends of the whole-trip overview.
    pub fn start_finish(overview: &Segment) -> Vec<Marker> {
        let mut markers = Vec::with_capacity(2);
        if let Some(first) = overview.first() {
            markers.push(Marker {
                kind: MarkerKind::Start,
                lat: first.lat,
                lon: first.lon,
            });
        }
        if let Some(last) = overview.last() {
            markers.push(Marker {
                kind: MarkerKind::Finish,
                lat: last.lat,
                lon: last.lon,
            });
        }
        markers
    }
}

/// A marker resolved to viewport pixels. May lie outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedMarker {
    pub kind: MarkerKind,
    pub x: i64,
    pub y: i64,
}

/// The 3×3 tiles around a centre tile.
///
/// Cells outside the world (above the top or below the bottom row) are
/// empty.
#[derive(Debug)]
pub struct TileGrid {
    center: TileKey,
    tile_width: u32,
    tile_height: u32,
    cells: [[Option<Arc<Tile>>; 3]; 3],
}

impl TileGrid {
    pub fn center(&self) -> TileKey {
        self.center
    }

    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_width, self.tile_height)
    }

    /// Total grid size in pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        (self.tile_width * 3, self.tile_height * 3)
    }

    /// Tile at `row`, `col` (each 0..3, row 0 at the top).
    pub fn cell(&self, row: usize, col: usize) -> Option<&Arc<Tile>> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    /// Iterates over present cells with their pixel offset in the grid.
    pub fn placed_tiles(&self) -> impl Iterator<Item = (u32, u32, &Arc<Tile>)> + '_ {
        self.cells.iter().enumerate().flat_map(move |(row, cols)| {
            cols.iter().enumerate().filter_map(move |(col, cell)| {
                cell.as_ref().map(|t| {
                    (
                        col as u32 * self.tile_width,
                        row as u32 * self.tile_height,
                        t,
                    )
                })
            })
        })
    }
}

/// What a compositor needs to paint the map part of one frame.
#[derive(Debug, Clone)]
pub struct ViewFrame {
    pub zoom: u8,
    pub grid: Arc<TileGrid>,
    /// Grid pixel shown at the top-left corner of the frame.
    pub viewport: (i64, i64),
    pub indicator: Indicator,
    pub markers: Vec<PlacedMarker>,
    /// Whole-trip track in grid pixels, one polyline per segment.
    pub track: Arc<Vec<Vec<(i64, i64)>>>,
}

/// Map generator bound to one zoom level.
pub struct MapView<S: TileSource> {
    cache: Arc<TileCache<S>>,
    zoom: u8,
    frame_size: (u32, u32),
    overview: Arc<Segment>,
    markers: Vec<Marker>,
    grid: Option<Arc<TileGrid>>,
    track: Arc<Vec<Vec<(i64, i64)>>>,
    viewport: (i64, i64),
}

impl<S: TileSource> MapView<S> {
    /// Creates a view at `zoom` rendering into frames of `frame_size`
    /// pixels. `overview` is the whole trip, drawn as the track line.
    pub fn new(cache: Arc<TileCache<S>>, zoom: u8, frame_size: (u32, u32), overview: Arc<Segment>) -> Self {
        let markers = Marker::start_finish(&overview);
        Self {
            cache,
            zoom,
            frame_size,
            overview,
            markers,
            grid: None,
            track: Arc::new(Vec::new()),
            viewport: (0, 0),
        }
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn grid(&self) -> Option<&Arc<TileGrid>> {
        self.grid.as_ref()
    }

    pub fn viewport(&self) -> (i64, i64) {
        self.viewport
    }

    /// Centres the view on a position.
    ///
    /// Returns `true` when the tile block was reloaded. Any tile failure
    /// aborts the update.
    pub fn update(&mut self, lat: f64, lon: f64) -> Result<bool, TileError> {
        let (tile, px, py) = self.cache.get_tile_at(lat, lon, self.zoom)?;
        let key = tile.key();

        let reloaded = match &self.grid {
            Some(grid) if grid.center == key => false,
            _ => {
                self.load_grid(tile)?;
                true
            }
        };

        let grid = self.grid.as_ref().ok_or(TileError::Failed(key))?;
        let (tw, th) = grid.tile_size();
        let gx = i64::from(px) + i64::from(tw);
        let gy = i64::from(py) + i64::from(th);
        self.viewport = (
            gx - i64::from(self.frame_size.0 / 2),
            gy - i64::from(self.frame_size.1 / 2),
        );
        Ok(reloaded)
    }

    /// Snapshot for the compositor. `None` until the first update.
    pub fn frame(&self, bearing: f64) -> Option<ViewFrame> {
        let grid = Arc::clone(self.grid.as_ref()?);
        let markers = self
            .markers
            .iter()
            .filter_map(|m| {
                self.to_viewport(m.lat, m.lon)
                    .map(|(x, y)| PlacedMarker { kind: m.kind, x, y })
            })
            .collect();
        Some(ViewFrame {
            zoom: self.zoom,
            grid,
            viewport: self.viewport,
            indicator: self.indicator(bearing),
            markers,
            track: Arc::clone(&self.track),
        })
    }

    pub fn indicator(&self, bearing: f64) -> Indicator {
        if self.zoom >= ARROW_MIN_ZOOM {
            Indicator::Arrow { bearing }
        } else {
            Indicator::Dot
        }
    }

    /// Grid pixel of a coordinate. Can be negative or beyond the grid.
    pub fn to_grid(&self, lat: f64, lon: f64) -> Option<(i64, i64)> {
        let grid = self.grid.as_ref()?;
        grid_position(grid, lat, lon)
    }

    /// Viewport pixel of a coordinate. Can lie outside the frame.
    pub fn to_viewport(&self, lat: f64, lon: f64) -> Option<(i64, i64)> {
        let (x, y) = self.to_grid(lat, lon)?;
        Some((x - self.viewport.0, y - self.viewport.1))
    }

    fn load_grid(&mut self, center: Arc<Tile>) -> Result<(), TileError> {
        let key = center.key();
        let (tw, th) = center.dimensions().ok_or(TileError::Failed(key))?;

        let mut cells: [[Option<Arc<Tile>>; 3]; 3] = Default::default();
        for (row, dy) in (-1i64..=1).enumerate() {
            for (col, dx) in (-1i64..=1).enumerate() {
                if dx == 0 && dy == 0 {
                    cells[row][col] = Some(Arc::clone(&center));
                    continue;
                }
                if let Some(n) = key.neighbor(dx, dy) {
                    cells[row][col] = Some(self.cache.get_tile(n.x, n.y, n.zoom)?);
                }
            }
        }

        let grid = TileGrid {
            center: key,
            tile_width: tw,
            tile_height: th,
            cells,
        };
        let track = track_polylines(&grid, &self.overview);
        debug!(tile = %key, zoom = self.zoom, "Loaded tile grid");

        self.grid = Some(Arc::new(grid));
        self.track = Arc::new(track);
        Ok(())
    }
}

fn grid_position(grid: &TileGrid, lat: f64, lon: f64) -> Option<(i64, i64)> {
    let pos = coord::to_tile_position(lat, lon, grid.center.zoom).ok()?;
    let (tw, th) = grid.tile_size();
    let (px, py) = pos.pixel(tw, th);
    let col = i64::from(pos.key.x) - (i64::from(grid.center.x) - 1);
    let row = i64::from(pos.key.y) - (i64::from(grid.center.y) - 1);
    Some((
        col * i64::from(tw) + i64::from(px),
        row * i64::from(th) + i64::from(py),
    ))
}

/// Splits the overview into grid-pixel polylines, breaking at segment
/// starts.
fn track_polylines(grid: &TileGrid, overview: &Segment) -> Vec<Vec<(i64, i64)>> {
    let mut lines: Vec<Vec<(i64, i64)>> = Vec::new();
    for p in overview {
        let Some(xy) = grid_position(grid, p.lat, p.lon) else {
            continue;
        };
        match lines.last_mut() {
            Some(line) if !p.is_segment_start => {
                if line.last() != Some(&xy) {
                    line.push(xy);
                }
            }
            _ => lines.push(vec![xy]),
        }
    }
    lines
}

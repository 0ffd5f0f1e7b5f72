//! Per-frame map state
//!
//! Maps video frame indices onto track positions and decides which zoom
//! level is on screen. [`MapSwitcher`] cycles through the configured zoom
//! levels second by second, [`FrameSequencer`] and [`FrameCursor`] produce
//! a [`FrameState`] per frame, and [`MapView`] tracks which tiles surround
//! the current position.

mod error;
mod sequencer;
mod state;
mod switcher;
mod view;

pub use error::FrameError;
pub use sequencer::{assign_map_indices, FrameCursor, FrameSequencer};
pub use state::{format_local_time, FrameState};
pub use switcher::{MapSwitcher, NeverOverride, SyncOverride, ZoomChoice, ZoomLevel, ZoomOverride};
pub use view::{
    Indicator, MapView, Marker, MarkerKind, PlacedMarker, TileGrid, ViewFrame, ARROW_MIN_ZOOM,
};

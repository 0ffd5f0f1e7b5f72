//! Trailframe - GPS tracks to per-frame map state
//!
//! This library turns recorded GPS traces into a deterministic, per-video-frame
//! description of where the traveler was, how fast, and which map tile to show,
//! while fetching and caching the slippy-map tiles needed to render each view.
//!
//! # Pipeline
//!
//! ```text
//! GPX files ──► track (segments, resampling) ──► frame (zoom switching, map views)
//!                                                   │
//!                                video ─────────────┤ (which frames become which file)
//!                                                   ▼
//!                                   render (worker pool, external encoder)
//!                                                   │
//!                                             tile cache ◄── tile server / disk
//! ```

pub mod config;
pub mod coord;
pub mod frame;
pub mod geo;
pub mod logging;
pub mod render;
pub mod tile;
pub mod track;
pub mod video;

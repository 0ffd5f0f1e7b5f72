//! CLI command implementations.

pub mod config;
pub mod plan;
pub mod prefetch;
pub mod render;
pub mod segments;
pub mod timecode;

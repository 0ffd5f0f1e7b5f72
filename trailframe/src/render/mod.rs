//! Rendering and encoding
//!
//! Turns an encoding plan into output files. Pixel work and video codecs
//! live behind the [`Compositor`] and [`VideoEncoder`] traits; the
//! built-in [`ManifestEncoder`] writes the per-frame state as JSON lines.
//!
//! ```text
//! EncodingRange ─► RenderContext::encode_range ─► FrameSource ─► VideoEncoder
//!                        │ (one per worker, via BatchRunner)
//!                        └─► MapView ─► TileCache
//! ```

mod batch;
mod compositor;
mod encoder;
mod error;
mod progress;
mod task;

pub use batch::{BatchFailure, BatchReport, BatchRunner};
pub use compositor::{Compositor, FramePainter, MarkerImages, PaintStyle};
pub use encoder::{EncoderFactory, Frame, FrameSource, ManifestEncoder, ManifestEncoderFactory, VideoEncoder};
pub use error::RenderError;
pub use progress::{format_progress, ProgressCallback, ProgressCounter, ProgressReporter};
pub use task::{RenderContext, RenderSettings};

//! Video encoder contract and the built-in frame manifest writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::RenderError;
use crate::frame::{FrameState, ViewFrame};
use crate::video::FrameRate;

/// Everything produced for one output frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub state: FrameState,
    /// Map layout, if a map is shown.
    pub view: Option<ViewFrame>,
}

/// Supplies frame `i` of the file being encoded, or `None` once the file
/// is complete.
pub type FrameSource<'a> = dyn FnMut(u64) -> Result<Option<Frame>, RenderError> + 'a;

/// One output file being written.
pub trait VideoEncoder {
    /// Pulls frames from `source`, starting at 0, until it returns `None`
    /// or fails. Returns the number of frames written.
    fn encode_loop(&mut self, source: &mut FrameSource<'_>) -> Result<u64, RenderError>;

    /// Flushes and closes the output.
    fn finalize(self: Box<Self>) -> Result<(), RenderError>;
}

/// Opens encoders for output files.
pub trait EncoderFactory: Send + Sync {
    fn create(&self, path: &Path, width: u32, height: u32, fps: FrameRate) -> Result<Box<dyn VideoEncoder>, RenderError>;

    /// Extension given to output files, replacing `.mp4` when different.
    fn extension(&self) -> &str {
        "mp4"
    }
}

/// One JSON line per frame.
#[derive(Serialize)]
struct ManifestLine<'a> {
    #[serde(flatten)]
    state: &'a FrameState,
    tile: Option<String>,
    viewport: Option<(i64, i64)>,
}

/// Writes the frame sequence as JSON lines instead of pixels, for
/// external renderers or inspection.
pub struct ManifestEncoder {
    path: PathBuf,
    out: BufWriter<File>,
}

impl ManifestEncoder {
    pub fn create(path: &Path) -> Result<Self, RenderError> {
        let file = File::create(path).map_err(|e| RenderError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
        })
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), RenderError> {
        let line = ManifestLine {
            state: &frame.state,
            tile: frame
                .view
                .as_ref()
                .map(|v| v.grid.center().to_string()),
            viewport: frame.view.as_ref().map(|v| v.viewport),
        };
        serde_json::to_writer(&mut self.out, &line).map_err(|e| RenderError::Encoder(e.to_string()))?;
        self.out
            .write_all(b"\n")
            .map_err(|e| RenderError::io(&self.path, e))
    }
}

impl VideoEncoder for ManifestEncoder {
    fn encode_loop(&mut self, source: &mut FrameSource<'_>) -> Result<u64, RenderError> {
        let mut index = 0;
        while let Some(frame) = source(index)? {
            self.write_frame(&frame)?;
            index += 1;
        }
        Ok(index)
    }

    fn finalize(mut self: Box<Self>) -> Result<(), RenderError> {
        self.out.flush().map_err(|e| RenderError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "Manifest finalized");
        Ok(())
    }
}

/// Factory for [`ManifestEncoder`]s writing `.jsonl` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestEncoderFactory;

impl EncoderFactory for ManifestEncoderFactory {
    fn create(&self, path: &Path, _width: u32, _height: u32, _fps: FrameRate) -> Result<Box<dyn VideoEncoder>, RenderError> {
        Ok(Box::new(ManifestEncoder::create(path)?))
    }

    fn extension(&self) -> &str {
        "jsonl"
    }
}

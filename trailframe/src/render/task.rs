//! Encoding one output file.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{EncoderFactory, Frame, ProgressCounter, RenderError};
use crate::frame::{assign_map_indices, FrameSequencer, MapView, ZoomLevel, ZoomOverride};
use crate::tile::{TileCache, TileSource};
use crate::track::{merge_segments, Segment};
use crate::video::{EncodingRange, FrameRate};

/// Output geometry and location shared by all files of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub width: u32,
    pub height: u32,
    pub fps: FrameRate,
    pub output_dir: PathBuf,
}

impl RenderSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            width: 512,
            height: 512,
            fps: FrameRate::NTSC_60,
            output_dir: output_dir.into(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_fps(mut self, fps: FrameRate) -> Self {
        self.fps = fps;
        self
    }
}

/// Read-only inputs of a batch: resampled segments, their precomputed zoom
/// selection, the whole-trip overview and the shared tile cache.
pub struct RenderContext<S: TileSource> {
    cache: Arc<TileCache<S>>,
    segments: Vec<Segment>,
    map_indices: Vec<Vec<usize>>,
    levels: Vec<ZoomLevel>,
    overview: Arc<Segment>,
    settings: RenderSettings,
}

impl<S: TileSource> RenderContext<S> {
    /// Prepares a batch. Each segment gets its own zoom schedule, computed
    /// with `policy` over the segment's duration.
    pub fn new<O: ZoomOverride + Clone>(
        cache: Arc<TileCache<S>>,
        segments: Vec<Segment>,
        levels: Vec<ZoomLevel>,
        policy: O,
        settings: RenderSettings,
    ) -> Result<Self, RenderError> {
        let fps = settings.fps.as_f64();
        let map_indices = segments
            .iter()
            .map(|s| assign_map_indices(s, fps, &levels, policy.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let overview = Arc::new(merge_segments(&segments));
        debug!(
            segments = segments.len(),
            overview_points = overview.len(),
            "Prepared render context"
        );
        Ok(Self {
            cache,
            segments,
            map_indices,
            levels,
            overview,
            settings,
        })
    }

    pub fn cache(&self) -> &Arc<TileCache<S>> {
        &self.cache
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn levels(&self) -> &[ZoomLevel] {
        &self.levels
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn map_indices(&self, segment_index: usize) -> Option<&[usize]> {
        self.map_indices.get(segment_index).map(Vec::as_slice)
    }

    /// Output file for a range, with the given extension.
    pub fn output_path(&self, range: &EncodingRange, extension: &str) -> Option<PathBuf> {
        let name = range.file_name(&self.segments)?;
        let path = self.settings.output_dir.join(name);
        Some(path.with_extension(extension))
    }

    /// Encodes one range into its output file.
    ///
    /// Any tile failure fails the file. The cancellation token is checked
    /// before every frame.
    pub fn encode_range(
        &self,
        range: &EncodingRange,
        factory: &dyn EncoderFactory,
        cancellation: &CancellationToken,
        progress: &ProgressCounter,
    ) -> Result<(PathBuf, u64), RenderError> {
        let invalid = || RenderError::InvalidRange {
            segment: range.segment_index,
            start: range.start_frame,
            end: range.end_frame(),
            len: self.segments.get(range.segment_index).map_or(0, Segment::len),
        };
        let segment = self.segments.get(range.segment_index).ok_or_else(invalid)?;
        let indices = self.map_indices(range.segment_index).ok_or_else(invalid)?;
        if range.frame_count == 0 || range.end_frame() > segment.len() {
            return Err(invalid());
        }
        let path = self.output_path(range, factory.extension()).ok_or_else(invalid)?;

        let frame_size = (self.settings.width, self.settings.height);
        let mut views: Vec<MapView<S>> = self
            .levels
            .iter()
            .map(|l| MapView::new(Arc::clone(&self.cache), l.zoom, frame_size, Arc::clone(&self.overview)))
            .collect();
        let sequencer = FrameSequencer::new(segment, indices, &self.levels);

        info!(path = %path.display(), frames = range.frame_count, "Encoding");
        let mut encoder = factory.create(&path, self.settings.width, self.settings.height, self.settings.fps)?;

        let frame_count = range.frame_count as u64;
        let mut source = |i: u64| -> Result<Option<Frame>, RenderError> {
            if cancellation.is_cancelled() {
                return Err(RenderError::Cancelled);
            }
            if i >= frame_count {
                return Ok(None);
            }
            let state = sequencer
                .state(range.start_frame + i as usize, i)
                .ok_or_else(invalid)?;
            let view = views.get_mut(state.map_index).ok_or_else(invalid)?;
            view.update(state.lat, state.lon)?;
            progress.add_frames(1);
            Ok(Some(Frame {
                view: view.frame(state.bearing),
                state,
            }))
        };

        let written = encoder.encode_loop(&mut source)?;
        encoder.finalize()?;
        debug!(path = %path.display(), frames = written, "Encoded");
        Ok((path, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::NeverOverride;
    use crate::render::ManifestEncoderFactory;
    use crate::tile::source::tests::BlankSource;
    use crate::track::TrackPoint;
    use std::fs;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> RenderContext<BlankSource> {
        let mut seg = Segment::new(0.0, 0.0);
        for i in 0..=4 {
            seg.add_point(TrackPoint::new(1_600_000_000.0 + f64::from(i), 48.0, 2.0 + f64::from(i) * 1e-4));
        }
        let seg = seg.interpolate(2.0).unwrap();

        let cache = Arc::new(TileCache::new(dir.path().join("tiles"), BlankSource::new(256)).unwrap());
        let settings = RenderSettings::new(dir.path().join("out"))
            .with_size(256, 256)
            .with_fps(FrameRate::new(2, 1).unwrap());
        fs::create_dir_all(&settings.output_dir).unwrap();
        let levels = vec![ZoomLevel::new(10, 1), ZoomLevel::new(14, 1)];
        RenderContext::new(cache, vec![seg], levels, NeverOverride, settings).unwrap()
    }

    #[test]
    fn test_encode_range_writes_every_frame() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let range = EncodingRange {
            segment_index: 0,
            start_frame: 2,
            frame_count: 6,
            file_id: 1,
            chunk: 0,
        };

        let progress = ProgressCounter::new();
        let (path, frames) = ctx
            .encode_range(&range, &ManifestEncoderFactory, &CancellationToken::new(), &progress)
            .unwrap();

        assert_eq!(frames, 6);
        assert_eq!(progress.frames(), 6);
        assert_eq!(path.extension().unwrap(), "jsonl");

        let text = fs::read_to_string(&path).unwrap();
        let zooms: Vec<u64> = text
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["zoom"].as_u64().unwrap())
            .collect();
        // points 2..8 at 2 fps are seconds 1..3, one second per level
        assert_eq!(zooms, vec![14, 14, 10, 10, 14, 14]);
    }

    #[test]
    fn test_encode_range_rejects_overlong_range() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let range = EncodingRange {
            segment_index: 0,
            start_frame: 5,
            frame_count: 100,
            file_id: 0,
            chunk: 0,
        };
        let result = ctx.encode_range(&range, &ManifestEncoderFactory, &CancellationToken::new(), &ProgressCounter::new());
        assert!(matches!(result, Err(RenderError::InvalidRange { .. })));
    }

    #[test]
    fn test_cancelled_token_stops_encoding() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let range = EncodingRange {
            segment_index: 0,
            start_frame: 0,
            frame_count: 4,
            file_id: 0,
            chunk: 0,
        };
        let token = CancellationToken::new();
        token.cancel();
        let result = ctx.encode_range(&range, &ManifestEncoderFactory, &token, &ProgressCounter::new());
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }
}

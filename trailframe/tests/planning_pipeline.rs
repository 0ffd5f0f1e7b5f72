//! End-to-end tests of the planning path: camera GPS logs and video
//! descriptors are merged into recordings, matched against the ride track
//! and cut into encoding ranges, which are then rendered with the manifest
//! encoder.
//!
//! Run with: `cargo test --test planning_pipeline`

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat};
use image::{ImageFormat, RgbaImage};
use tempfile::TempDir;

use trailframe::coord::TileKey;
use trailframe::frame::{SyncOverride, ZoomLevel};
use trailframe::render::{BatchRunner, ManifestEncoderFactory, RenderContext, RenderSettings};
use trailframe::tile::{TileCache, TileError, TileSource};
use trailframe::track::{LoaderConfig, TrackLoader};
use trailframe::video::{
    compute_map_segments_with_gpx, get_segment_range, load_video_gpx, plan_for_videos, plan_per_segment,
    FrameRate, SegmentsDocument, VideoInfo,
};

// ============================================================================
// Helpers
// ============================================================================

/// 2020-06-01T10:00:00Z
const T0: i64 = 1_591_005_600;

fn rfc3339(t: i64) -> String {
    DateTime::from_timestamp(t, 0)
        .unwrap()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Writes a one-segment GPX file with a point every second in `[from, to]`,
/// heading north.
fn write_gpx(dir: &Path, name: &str, from: i64, to: i64) -> PathBuf {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
<trk><trkseg>"#,
    );
    for t in from..=to {
        let lat = 45.0 + (t - from) as f64 * 1e-4;
        body.push_str(&format!(
            r#"<trkpt lat="{}" lon="7.0"><ele>250</ele><time>{}</time></trkpt>"#,
            lat,
            rfc3339(t)
        ));
    }
    body.push_str("</trkseg></trk></gpx>");

    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

struct BlankSource;

impl TileSource for BlankSource {
    fn fetch(&self, _key: &TileKey) -> Result<Vec<u8>, TileError> {
        let mut out = Cursor::new(Vec::new());
        RgbaImage::new(256, 256)
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| TileError::Http(e.to_string()))?;
        Ok(out.into_inner())
    }

    fn name(&self) -> &str {
        "blank"
    }
}

/// Two parts of recording 1, 100 s and 111 s long, with their camera logs.
fn recorded_parts(dir: &Path) -> (Vec<VideoInfo>, Vec<PathBuf>) {
    let videos = vec![
        VideoInfo::from_probe(dir.join("GX-001-00.MP4"), "60/1", 6000).unwrap(),
        VideoInfo::from_probe(dir.join("GX-001-01.MP4"), "60/1", 6660).unwrap(),
    ];
    let logs = vec![
        write_gpx(dir, "GX-001-00.gpx", T0, T0 + 100),
        write_gpx(dir, "GX-001-01.gpx", T0 + 100, T0 + 211),
    ];
    (videos, logs)
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_parts_merge_into_one_recording() {
    let dir = TempDir::new().unwrap();
    let (videos, logs) = recorded_parts(dir.path());

    let gpx = load_video_gpx(&logs).unwrap();
    assert_eq!(gpx.len(), 2);
    assert_eq!(gpx[0].start, T0);
    assert_eq!(gpx[0].duration, 100.0);
    assert_eq!(gpx[1].duration, 111.0);

    let merged = compute_map_segments_with_gpx(&videos, &gpx).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].file_id, 1);
    assert_eq!(merged[0].frame_count, 12660);
    assert_eq!(merged[0].start, T0);
    assert_eq!(merged[0].duration, 211.0);
    assert_eq!(merged[0].frame_rate, FrameRate::new(60, 1).unwrap());

    let doc_path = dir.path().join("segments.json");
    let doc = SegmentsDocument { segments: merged };
    doc.save(&doc_path).unwrap();
    assert_eq!(SegmentsDocument::load(&doc_path).unwrap(), doc);
}

#[test]
fn test_recording_matched_against_ride() {
    let dir = TempDir::new().unwrap();
    let (videos, logs) = recorded_parts(dir.path());
    let merged = compute_map_segments_with_gpx(&videos, &load_video_gpx(&logs).unwrap()).unwrap();

    // the ride log starts 50 s before the camera and runs 400 s past it
    let ride = write_gpx(dir.path(), "ride.gpx", T0 - 50, T0 + 400);
    let loader = TrackLoader::new(LoaderConfig::default().with_frequency(1.0));
    let segments = loader.load_segments(&[ride]);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0][50].timestamp, T0 as f64);

    let range = get_segment_range(&segments, (T0 + 20) as f64, 300.0).unwrap();
    assert_eq!(range.segment_index, 0);
    assert_eq!(range.start_index, 70);
    assert_eq!(range.end_index, 370);

    // 1 fps with 100 s chunks; the 12660 video frames are clamped to the
    // points left in the segment
    let plan = plan_for_videos(&segments, &merged, 1.0, 100);
    let available = segments[0].len() - 50;
    assert_eq!(plan.iter().map(|r| r.frame_count).sum::<usize>(), available);
    assert!(plan.iter().all(|r| r.frame_count <= 100 && r.file_id == 1));
    assert_eq!(plan[0].start_frame, 50);
    for pair in plan.windows(2) {
        assert_eq!(pair[0].end_frame(), pair[1].start_frame);
        assert_eq!(pair[0].chunk + 1, pair[1].chunk);
    }
    let name = plan[0].file_name(&segments).unwrap();
    assert!(name.starts_with("001-000 - "));
    assert!(name.ends_with(".mp4"));
    assert!(!name.contains(':'));
}

#[test]
fn test_window_outside_ride_is_not_matched() {
    let dir = TempDir::new().unwrap();
    let ride = write_gpx(dir.path(), "ride.gpx", T0, T0 + 60);
    let segments = TrackLoader::default().load_segments(&[ride]);

    assert!(get_segment_range(&segments, (T0 - 500) as f64, 10.0).is_none());
    let late = VideoInfo::new("GX-002-00.MP4", 2, 0, FrameRate::NTSC_60, 600).with_timing(T0 + 3600, 10.0);
    assert!(plan_for_videos(&segments, &[late], 1.0, 300).is_empty());
}

#[test]
fn test_render_per_segment_plan() {
    let dir = TempDir::new().unwrap();
    let ride = write_gpx(dir.path(), "ride.gpx", T0, T0 + 9);
    let segments = TrackLoader::new(LoaderConfig::default().with_frequency(2.0)).load_segments(&[ride]);
    let points = segments[0].len();

    let out = dir.path().join("out");
    fs::create_dir_all(&out).unwrap();
    let cache = Arc::new(TileCache::new(dir.path().join("tiles"), BlankSource).unwrap());
    let settings = RenderSettings::new(&out)
        .with_size(256, 256)
        .with_fps(FrameRate::new(2, 1).unwrap());
    let levels = vec![ZoomLevel::new(9, 2), ZoomLevel::new(15, 2)];
    let ctx = RenderContext::new(cache, segments, levels, SyncOverride::default(), settings).unwrap();

    let plan = plan_per_segment(ctx.segments());
    let report = BatchRunner::new(2)
        .run(&ctx, &plan, &ManifestEncoderFactory)
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.total_frames(), points as u64);
    let (path, _) = &report.completed[0];
    let lines = fs::read_to_string(path).unwrap();
    assert_eq!(lines.lines().count(), points);
    // a short segment stays on the finest map
    assert!(lines
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap())
        .all(|v| v["zoom"] == 15));
}

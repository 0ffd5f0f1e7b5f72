//! Video file descriptors and their JSON documents.
//!
//! Frame rates are kept as exact rationals so that frame counts and
//! durations stay consistent over hours of footage. The float `frame_rate`
//! field written next to them is informative only and ignored on read.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::VideoError;
use crate::track::SegmentInfo;

/// Exact frame rate `num / den`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRate {
    pub num: u32,
    pub den: u32,
}

impl FrameRate {
    /// 59.94 fps, the rate most action cameras record at.
    pub const NTSC_60: FrameRate = FrameRate {
        num: 60000,
        den: 1001,
    };

    /// Creates a rate, rejecting zero numerators and denominators.
    pub fn new(num: u32, den: u32) -> Result<Self, VideoError> {
        if num == 0 || den == 0 {
            return Err(VideoError::InvalidFrameRate(format!("{}/{}", num, den)));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Whole frames in `seconds` of video.
    pub fn frames_in(&self, seconds: f64) -> u64 {
        (seconds * self.as_f64()).floor().max(0.0) as u64
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::NTSC_60
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// Parses `"num/den"`, as printed by stream probes.
impl FromStr for FrameRate {
    type Err = VideoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VideoError::InvalidFrameRate(s.to_string());
        let (num, den) = s.trim().split_once('/').ok_or_else(invalid)?;
        let num = num.trim().parse::<u32>().map_err(|_| invalid())?;
        let den = den.trim().parse::<u32>().map_err(|_| invalid())?;
        Self::new(num, den).map_err(|_| invalid())
    }
}

/// One recorded video file, or several contiguous parts merged into one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "VideoInfoRecord", try_from = "VideoInfoRecord")]
pub struct VideoInfo {
    pub path: PathBuf,
    /// Recording id; all parts of one recording share it.
    pub file_id: u32,
    /// Part number within the recording.
    pub file_seq: u32,
    pub frame_rate: FrameRate,
    pub frame_count: u64,
    /// Recording start as Unix seconds, 0 when unknown.
    pub start: i64,
    /// Recording length in seconds, 0 when unknown.
    pub duration: f64,
}

impl VideoInfo {
    pub fn new(path: impl Into<PathBuf>, file_id: u32, file_seq: u32, frame_rate: FrameRate, frame_count: u64) -> Self {
        Self {
            path: path.into(),
            file_id,
            file_seq,
            frame_rate,
            frame_count,
            start: 0,
            duration: 0.0,
        }
    }

    /// Builds a descriptor from stream probe output: the frame rate as
    /// `num/den` and the number of frames. File id and part number come
    /// from the `GX-<id>-<seq>` file stem.
    pub fn from_probe(path: impl Into<PathBuf>, frame_rate: &str, frame_count: u64) -> Result<Self, VideoError> {
        let path = path.into();
        let (file_id, file_seq) = parse_file_name(&path)?;
        let frame_rate = frame_rate.parse::<FrameRate>()?;
        let info = Self::new(path, file_id, file_seq, frame_rate, frame_count);
        info!(
            path = %info.path.display(),
            file_id,
            file_seq,
            frame_count,
            frame_rate = info.frame_rate.as_f64(),
            duration = info.video_duration(),
            "Loaded video info"
        );
        Ok(info)
    }

    pub fn with_timing(mut self, start: i64, duration: f64) -> Self {
        self.start = start;
        self.duration = duration;
        self
    }

    /// Length implied by the frame count.
    pub fn video_duration(&self) -> f64 {
        self.frame_count as f64 / self.frame_rate.as_f64()
    }
}

/// Serialized shape of [`VideoInfo`].
#[derive(Serialize, Deserialize)]
struct VideoInfoRecord {
    path: String,
    file_id: u32,
    file_seq: u32,
    #[serde(default)]
    frame_rate: f64,
    frame_rate_num: u32,
    frame_rate_den: u32,
    frame_count: u64,
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    start: i64,
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    duration: f64,
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

impl From<VideoInfo> for VideoInfoRecord {
    fn from(info: VideoInfo) -> Self {
        Self {
            path: info.path.to_string_lossy().into_owned(),
            file_id: info.file_id,
            file_seq: info.file_seq,
            frame_rate: info.frame_rate.as_f64(),
            frame_rate_num: info.frame_rate.num,
            frame_rate_den: info.frame_rate.den,
            frame_count: info.frame_count,
            start: info.start,
            duration: info.duration,
        }
    }
}

impl TryFrom<VideoInfoRecord> for VideoInfo {
    type Error = VideoError;

    fn try_from(r: VideoInfoRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            path: PathBuf::from(r.path),
            file_id: r.file_id,
            file_seq: r.file_seq,
            frame_rate: FrameRate::new(r.frame_rate_num, r.frame_rate_den)?,
            frame_count: r.frame_count,
            start: r.start,
            duration: r.duration,
        })
    }
}

/// Start and length of the GPS log recorded alongside one video file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpxInfo {
    pub start: i64,
    pub duration: f64,
}

impl From<SegmentInfo> for GpxInfo {
    fn from(info: SegmentInfo) -> Self {
        Self {
            start: info.start.floor() as i64,
            duration: info.duration,
        }
    }
}

/// `{"segments": [...]}`: merged recordings ready for matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentsDocument {
    pub segments: Vec<VideoInfo>,
}

impl SegmentsDocument {
    pub fn load(path: &Path) -> Result<Self, VideoError> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), VideoError> {
        write_json(path, self)
    }
}

/// `{"video_info": [...], "gpx_info": [...]}`: per-file probe results and
/// the matching per-file GPS log timing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoInfoDocument {
    pub video_info: Vec<VideoInfo>,
    #[serde(default)]
    pub gpx_info: Vec<GpxInfo>,
}

impl VideoInfoDocument {
    pub fn load(path: &Path) -> Result<Self, VideoError> {
        read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), VideoError> {
        write_json(path, self)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, VideoError> {
    let text = fs::read_to_string(path).map_err(|e| VideoError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| VideoError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), VideoError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| VideoError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    fs::write(path, text).map_err(|e| VideoError::io(path, e))?;
    info!(path = %path.display(), "Wrote JSON document");
    Ok(())
}

/// `GX-<id>-<seq>` at the start of a file stem.
fn gx_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^GX-(\d+)-(\d+)").unwrap())
}

/// Extracts `(file_id, file_seq)` from a `GX-<id>-<seq>` file name.
///
/// ```
/// use trailframe::video::parse_file_name;
/// use std::path::Path;
///
/// assert_eq!(parse_file_name(Path::new("/videos/GX-12-3.MP4")).unwrap(), (12, 3));
/// ```
pub fn parse_file_name(path: &Path) -> Result<(u32, u32), VideoError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let invalid = || VideoError::InvalidFileName(stem.clone());

    let captures = gx_pattern().captures(&stem).ok_or_else(invalid)?;
    let file_id = captures[1].parse::<u32>().map_err(|_| invalid())?;
    let file_seq = captures[2].parse::<u32>().map_err(|_| invalid())?;
    Ok((file_id, file_seq))
}

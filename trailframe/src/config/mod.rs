//! Configuration file handling.
//!
//! Settings live in an INI file, by default
//! `~/.config/trailframe/config.ini`:
//!
//! ```ini
//! [tiles]
//! directory = /var/cache/trailframe/tiles
//! url = https://tile.openstreetmap.org/$z/$x/$y.png
//! timeout = 30
//!
//! [render]
//! fps_num = 60000
//! fps_den = 1001
//! width = 512
//! height = 512
//! max_chunk_secs = 300
//! workers = 0
//!
//! [zoom]
//! levels = 5:5,7:5,11:5,16:60
//! short_segment_secs = 120
//! head_secs = 20
//! tail_secs = 40
//!
//! [track]
//! split_idle = false
//! max_gap_secs = 0
//! idle_epsilon = 0.00000001
//!
//! [logging]
//! level = info
//! file = /tmp/trailframe.log
//! ```
//!
//! Missing keys take their defaults; present keys are validated.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use crate::frame::{SyncOverride, ZoomLevel};
use crate::tile::DEFAULT_TIMEOUT_SECS;
use crate::track::{LoaderConfig, DEFAULT_IDLE_EPSILON};
use crate::video::{FrameRate, DEFAULT_MAX_CHUNK_SECS};

/// Default tile server.
pub const DEFAULT_TILE_URL: &str = "https://tile.openstreetmap.org/$z/$x/$y.png";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilesConfig {
    pub directory: PathBuf,
    /// URL template with `$x`, `$y` and `$z` placeholders.
    pub url: String,
    /// Per-download timeout in seconds; 0 waits forever.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub frame_rate: FrameRate,
    pub width: u32,
    pub height: u32,
    pub max_chunk_secs: u32,
    /// 0 uses one worker per CPU.
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomConfig {
    pub levels: Vec<ZoomLevel>,
    pub short_segment_secs: f64,
    pub head_secs: f64,
    pub tail_secs: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackConfig {
    pub split_idle: bool,
    pub max_gap_secs: f64,
    pub idle_epsilon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    pub file: Option<PathBuf>,
}

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub tiles: TilesConfig,
    pub render: RenderConfig,
    pub zoom: ZoomConfig,
    pub track: TrackConfig,
    pub logging: LoggingConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            tiles: TilesConfig {
                directory: default_tiles_dir(),
                url: DEFAULT_TILE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            render: RenderConfig {
                frame_rate: FrameRate::NTSC_60,
                width: 512,
                height: 512,
                max_chunk_secs: DEFAULT_MAX_CHUNK_SECS,
                workers: 0,
            },
            zoom: ZoomConfig {
                levels: ZoomLevel::default_cycle(),
                short_segment_secs: 120.0,
                head_secs: 20.0,
                tail_secs: 40.0,
            },
            track: TrackConfig {
                split_idle: false,
                max_gap_secs: 0.0,
                idle_epsilon: DEFAULT_IDLE_EPSILON,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}

/// `<config dir>/trailframe/config.ini`.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trailframe")
        .join("config.ini")
}

fn default_tiles_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("trailframe")
        .join("tiles")
}

impl ConfigFile {
    /// Loads the default config file, or the defaults if it does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Reads settings from parsed INI data.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let d = Self::default();

        let fps_num = value(ini, "render", "fps_num", d.render.frame_rate.num)?;
        let fps_den = value(ini, "render", "fps_den", d.render.frame_rate.den)?;
        let frame_rate = FrameRate::new(fps_num, fps_den).map_err(|_| ConfigError::InvalidValue {
            key: "render.fps_num/fps_den".to_string(),
            value: format!("{}/{}", fps_num, fps_den),
        })?;

        let levels = match raw(ini, "zoom", "levels") {
            Some(s) => ZoomLevel::parse_list(s).map_err(|_| invalid("zoom", "levels", s))?,
            None => d.zoom.levels,
        };

        let url = raw(ini, "tiles", "url").map_or(d.tiles.url, str::to_string);
        if !(url.contains("$x") && url.contains("$y") && url.contains("$z")) {
            return Err(invalid("tiles", "url", &url));
        }

        let config = Self {
            tiles: TilesConfig {
                directory: raw(ini, "tiles", "directory").map_or(d.tiles.directory, PathBuf::from),
                url,
                timeout_secs: value(ini, "tiles", "timeout", d.tiles.timeout_secs)?,
            },
            render: RenderConfig {
                frame_rate,
                width: positive(ini, "render", "width", d.render.width)?,
                height: positive(ini, "render", "height", d.render.height)?,
                max_chunk_secs: positive(ini, "render", "max_chunk_secs", d.render.max_chunk_secs)?,
                workers: value(ini, "render", "workers", d.render.workers)?,
            },
            zoom: ZoomConfig {
                levels,
                short_segment_secs: value(ini, "zoom", "short_segment_secs", d.zoom.short_segment_secs)?,
                head_secs: value(ini, "zoom", "head_secs", d.zoom.head_secs)?,
                tail_secs: value(ini, "zoom", "tail_secs", d.zoom.tail_secs)?,
            },
            track: TrackConfig {
                split_idle: value(ini, "track", "split_idle", d.track.split_idle)?,
                max_gap_secs: value(ini, "track", "max_gap_secs", d.track.max_gap_secs)?,
                idle_epsilon: value(ini, "track", "idle_epsilon", d.track.idle_epsilon)?,
            },
            logging: LoggingConfig {
                level: raw(ini, "logging", "level").map_or(d.logging.level, str::to_string),
                file: raw(ini, "logging", "file").map(PathBuf::from),
            },
        };
        Ok(config)
    }

    /// Writes every setting, defaults included.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("tiles"))
            .set("directory", self.tiles.directory.to_string_lossy())
            .set("url", self.tiles.url.as_str())
            .set("timeout", self.tiles.timeout_secs.to_string());
        ini.with_section(Some("render"))
            .set("fps_num", self.render.frame_rate.num.to_string())
            .set("fps_den", self.render.frame_rate.den.to_string())
            .set("width", self.render.width.to_string())
            .set("height", self.render.height.to_string())
            .set("max_chunk_secs", self.render.max_chunk_secs.to_string())
            .set("workers", self.render.workers.to_string());
        ini.with_section(Some("zoom"))
            .set("levels", ZoomLevel::format_list(&self.zoom.levels))
            .set("short_segment_secs", self.zoom.short_segment_secs.to_string())
            .set("head_secs", self.zoom.head_secs.to_string())
            .set("tail_secs", self.zoom.tail_secs.to_string());
        ini.with_section(Some("track"))
            .set("split_idle", self.track.split_idle.to_string())
            .set("max_gap_secs", self.track.max_gap_secs.to_string())
            .set("idle_epsilon", self.track.idle_epsilon.to_string());
        ini.with_section(Some("logging")).set("level", self.logging.level.as_str());
        if let Some(file) = &self.logging.file {
            ini.with_section(Some("logging"))
                .set("file", file.to_string_lossy());
        }
        ini
    }

    /// Saves to [`config_file_path`].
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    pub fn with_tiles_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.tiles.directory = directory.into();
        self
    }

    pub fn with_tile_url(mut self, url: impl Into<String>) -> Self {
        self.tiles.url = url.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.render.workers = workers;
        self
    }

    pub fn with_zoom_levels(mut self, levels: Vec<ZoomLevel>) -> Self {
        self.zoom.levels = levels;
        self
    }

    /// Download timeout, `None` when disabled.
    pub fn tile_timeout(&self) -> Option<Duration> {
        match self.tiles.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Loader settings resampling to the output frame rate.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig::default()
            .with_frequency(self.render.frame_rate.as_f64())
            .with_split_idle(self.track.split_idle)
            .with_idle_epsilon(self.track.idle_epsilon)
            .with_max_gap_secs(self.track.max_gap_secs)
    }

    pub fn sync_override(&self) -> SyncOverride {
        SyncOverride {
            short_segment_secs: self.zoom.short_segment_secs,
            head_secs: self.zoom.head_secs,
            tail_secs: self.zoom.tail_secs,
        }
    }
}

fn raw<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.section(Some(section))
        .and_then(|s| s.get(key))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("{}.{}", section, key),
        value: value.to_string(),
    }
}

fn value<T: FromStr>(ini: &Ini, section: &str, key: &str, default: T) -> Result<T, ConfigError> {
    match raw(ini, section, key) {
        Some(s) => s.parse().map_err(|_| invalid(section, key, s)),
        None => Ok(default),
    }
}

fn positive<T>(ini: &Ini, section: &str, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + Display + Copy,
{
    let v = value(ini, section, key, default)?;
    if v <= T::default() {
        return Err(invalid(section, key, &v.to_string()));
    }
    Ok(v)
}

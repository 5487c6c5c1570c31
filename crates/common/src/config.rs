//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{StrataError, StrataResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root under which each render creates its private scratch directory.
    pub scratch_dir: PathBuf,

    /// Encoding engine settings.
    pub engine: EngineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Settings for the external encoding engine (ffmpeg).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// ffmpeg executable name or path.
    pub ffmpeg_bin: String,

    /// ffprobe executable name or path.
    pub ffprobe_bin: String,

    /// Per-invocation timeout in seconds. A timed out step fails the render.
    pub timeout_secs: u64,

    /// Upper bound on concurrently composited intervals.
    /// `None` uses the host CPU count.
    pub max_concurrency: Option<usize>,

    /// Intermediate and final video encode settings.
    pub video: VideoEncodeConfig,

    /// Normalized audio settings.
    pub audio: AudioEncodeConfig,
}

/// Video encode parameters for interval clips.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoEncodeConfig {
    pub codec: String,
    pub preset: String,
    pub crf: u32,
    pub pix_fmt: String,
}

/// Audio normalization parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioEncodeConfig {
    pub sample_rate: u32,
    pub channels: u32,
    /// AAC bitrate used when muxing the final container.
    pub bitrate_kbps: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "strata=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("strata"),
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            timeout_secs: 300,
            max_concurrency: None,
            video: VideoEncodeConfig::default(),
            audio: AudioEncodeConfig::default(),
        }
    }
}

impl Default for VideoEncodeConfig {
    fn default() -> Self {
        Self {
            codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            crf: 18,
            pix_fmt: "yuv420p".to_string(),
        }
    }
}

impl Default for AudioEncodeConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            channels: 2,
            bitrate_kbps: 192,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl EngineConfig {
    /// Effective interval concurrency: the configured limit, capped by the
    /// number of CPUs the host reports, and never below one.
    pub fn effective_concurrency(&self) -> usize {
        bounded_concurrency(self.max_concurrency)
    }
}

/// CPUs the host reports, at least one.
pub fn host_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Clamp a requested worker count to `[1, host_cpus()]`; `None` means all CPUs.
pub fn bounded_concurrency(requested: Option<usize>) -> usize {
    let cpus = host_cpus();
    requested.unwrap_or(cpus).min(cpus).max(1)
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Missing keys take defaults.
    pub fn load_from(path: impl AsRef<Path>) -> StrataResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StrataError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| StrataError::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("strata").join("config.json")
}

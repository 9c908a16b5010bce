use crate::error::{ArchiveError, Result};
use chrono::Duration as TimeDelta;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Names of the external binaries driven by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Merges and trims WAV captures.
    pub merge: String,
    /// Encodes WAV to MP3.
    pub encoder: String,
    /// Writes ID3 tags and cover art.
    pub tagger: String,
    /// Normalizes loudness of the finished MP3.
    pub normalizer: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            merge: "sox".to_string(),
            encoder: "lame".to_string(),
            tagger: "eyeD3".to_string(),
            normalizer: "mp3gain".to_string(),
        }
    }
}

fn default_phase() -> String {
    "all".to_string()
}

fn default_genre() -> String {
    "Radio".to_string()
}

fn default_bitrate() -> u32 {
    192
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the date-bucketed capture directories.
    pub source_dir: PathBuf,
    /// Where merged WAVs and encoded MP3s are written.
    pub target_dir: PathBuf,
    /// Where downloaded cover images are cached.
    pub image_target_dir: PathBuf,
    /// Timezone the backend's wall-clock timestamps are expressed in.
    pub timezone: Tz,
    /// Seconds added to event start and end before locating and cutting.
    #[serde(default)]
    pub offset: f64,
    /// Base URL of the scheduling backend.
    pub api_url: String,
    /// Base URL for image paths that are not absolute URLs.
    #[serde(default)]
    pub image_base_url: Option<String>,
    #[serde(default = "default_phase")]
    pub event_phase: String,
    #[serde(default = "default_genre")]
    pub genre: String,
    /// MP3 bitrate in kbit/s.
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load the configuration file at `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ArchiveError::Config(format!("Cannot read {}: {e}", path.display()))
        })?;

        let mut config = Self::from_toml(&contents)?;

        if let Ok(url) = std::env::var("BROADCAST_ARCHIVE_API_URL") {
            config.api_url = url;
        }
        if let Ok(offset) = std::env::var("BROADCAST_ARCHIVE_OFFSET") {
            config.set_offset(&offset)?;
        }

        Ok(config)
    }

    /// Override the offset from a string, as given in the environment.
    pub fn set_offset(&mut self, raw: &str) -> Result<()> {
        self.offset = raw.trim().parse().map_err(|_| {
            ArchiveError::Config(format!(
                "BROADCAST_ARCHIVE_OFFSET must be a number of seconds, got {raw:?}"
            ))
        })?;
        Ok(())
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ArchiveError::Config(e.message().to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !self.offset.is_finite() {
            return Err(ArchiveError::Config(
                "offset must be a finite number of seconds".to_string(),
            ));
        }

        if self.api_url.trim().is_empty() {
            return Err(ArchiveError::Config("api_url must not be empty".to_string()));
        }

        if self.bitrate == 0 {
            return Err(ArchiveError::Config(
                "bitrate must be greater than 0".to_string(),
            ));
        }

        if !self.source_dir.is_dir() {
            return Err(ArchiveError::Config(format!(
                "source_dir {} is not a directory",
                self.source_dir.display()
            )));
        }

        Ok(())
    }

    /// The configured offset as a signed time delta, nanosecond precision.
    pub fn offset_delta(&self) -> TimeDelta {
        TimeDelta::nanoseconds((self.offset * 1_000_000_000.0).round() as i64)
    }
}

//! Deterministic file names derived from event metadata.

use crate::config::Config;
use crate::error::Result;
use crate::schedule::Event;
use std::path::{Path, PathBuf};

const FORBIDDEN: &[char] = &['/', '<', '>', '$', '|', '\'', '"', '*'];

/// Strip characters unsafe in file names and collapse whitespace runs.
pub fn escape_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !FORBIDDEN.contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Path of the merged WAV: `{target_dir}/{YYYY-MM-DD} {HH_MM}-{title}.wav`.
pub fn build_source_filename(event: &Event, config: &Config) -> Result<PathBuf> {
    let start = event.start(config.timezone)?;
    let name = format!(
        "{}-{}.wav",
        start.format("%Y-%m-%d %H_%M"),
        escape_filename(&event.full_title)
    );
    Ok(config.target_dir.join(name))
}

/// Marker path `{target_dir}/{YYYY-MM-DD}/{source stem}.wav` used for skip detection.
///
/// The encoded MP3 lives next to it, see [`mp3_path`].
pub fn build_output_filename(event: &Event, source: &Path, config: &Config) -> Result<PathBuf> {
    let start = event.start(config.timezone)?;
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(config
        .target_dir
        .join(start.format("%Y-%m-%d").to_string())
        .join(format!("{stem}.wav")))
}

/// The encoded artifact belonging to an output marker.
pub fn mp3_path(output: &Path) -> PathBuf {
    output.with_extension("mp3")
}

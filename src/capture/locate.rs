use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::schedule::Event;
use crate::time::format_duration;

use super::CaptureFile;

/// Event window shifted by the configured offset, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_date: NaiveDate,
    pub end_time: NaiveTime,
}

impl SearchWindow {
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        let whole = |t: NaiveTime| t.with_nanosecond(0).unwrap_or(t);
        Self {
            start_date: start.date_naive(),
            start_time: whole(start.time()),
            end_date: end.date_naive(),
            end_time: whole(end.time()),
        }
    }

    pub fn for_event(event: &Event, config: &Config) -> Result<Self> {
        let offset = config.offset_delta();
        let start = event.start(config.timezone)? + offset;
        let end = event.end(config.timezone)? + offset;
        Ok(Self::new(start, end))
    }

    /// Day directories that may hold captures for this window.
    pub fn day_dirs(&self, source_dir: &Path) -> Vec<PathBuf> {
        let mut dirs = vec![source_dir.join(self.start_date.format("%Y-%m-%d").to_string())];
        if self.end_date != self.start_date {
            dirs.push(source_dir.join(self.end_date.format("%Y-%m-%d").to_string()));
        }
        dirs
    }
}

/// Pick the captures covering `window` from files sorted by name.
///
/// A file starting no later than the window start (compared per date and per
/// time of day) replaces the selection; a file from the start day onwards
/// whose time of day is before the window end is appended. Both rules are
/// checked for every file, in that order.
pub fn select_captures(files: &[CaptureFile], window: &SearchWindow) -> Vec<CaptureFile> {
    let mut selected: Vec<CaptureFile> = Vec::new();

    for file in files {
        if file.date <= window.start_date && file.time <= window.start_time {
            debug!("{} starts before the window, restarting selection", file.path.display());
            selected.clear();
            selected.push(file.clone());
        }

        if file.date >= window.start_date
            && file.time < window.end_time
            && selected.last() != Some(file)
        {
            debug!("{} overlaps the window", file.path.display());
            selected.push(file.clone());
        }
    }

    selected
}

/// List the WAV files of one day directory; a missing directory yields nothing.
fn list_wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        warn!("Capture directory {} does not exist", dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_wav = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

/// Capture files overlapping the event window, in chronological order.
///
/// The result may be empty; callers decide whether that is fatal.
pub fn find_capture_files(event: &Event, config: &Config) -> Result<Vec<PathBuf>> {
    let window = SearchWindow::for_event(event, config)?;

    let mut paths = Vec::new();
    for dir in window.day_dirs(&config.source_dir) {
        debug!("Scanning {}", dir.display());
        paths.extend(list_wav_files(&dir)?);
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let captures: Vec<CaptureFile> = paths
        .iter()
        .filter_map(|path| {
            let parsed = CaptureFile::from_path(path);
            if parsed.is_none() {
                debug!("Skipping {}: no timestamp in name", path.display());
            }
            parsed
        })
        .collect();

    let selected = select_captures(&captures, &window);

    for file in &selected {
        match file.estimated_duration() {
            Some(secs) => info!("Capture {} ({})", file.path.display(), format_duration(secs)),
            None => info!("Capture {} (duration unknown)", file.path.display()),
        }
    }

    Ok(selected.into_iter().map(|f| f.path).collect())
}

use std::path::{Path, PathBuf};

use chrono::Timelike;
use tracing::{debug, info};

use crate::capture::find_capture_files;
use crate::config::Config;
use crate::error::{ArchiveError, Result};
use crate::schedule::Event;
use crate::time::format_duration;

use super::runner::{run_checked, ProcessRunner};

/// Where to trim the concatenated captures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutWindow {
    /// Seconds from the start of the first capture.
    pub start_offset_seconds: f64,
    pub duration_seconds: f64,
}

impl CutWindow {
    pub fn end_offset_seconds(&self) -> f64 {
        self.start_offset_seconds + self.duration_seconds
    }
}

impl std::fmt::Display for CutWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} +{}",
            format_duration(self.start_offset_seconds),
            format_duration(self.duration_seconds)
        )
    }
}

/// Outcome of the merge step for one event.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeOutcome {
    Merged(CutWindow),
    /// The merged file already existed and force mode was off.
    Skipped,
}

/// Compute the cut window of `event` within its merged captures.
///
/// The duration is taken from the unshifted event; the offset only moves the
/// start. Captures are assumed to begin on the full hour.
pub fn plan_cut(event: &Event, config: &Config) -> Result<CutWindow> {
    let mut start = event.start(config.timezone)?;
    let end = event.end(config.timezone)?;

    let duration = (end - start).num_milliseconds() as f64 / 1000.0;

    if config.offset != 0.0 {
        start = start + config.offset_delta();
    }

    let start_cut = f64::from(start.minute() * 60 + start.second())
        + f64::from(start.nanosecond()) / 1_000_000_000.0;

    Ok(CutWindow {
        start_offset_seconds: start_cut,
        duration_seconds: duration,
    })
}

/// Decide whether `target` has to be (re)built.
///
/// Returns `false` when it exists and `force` is off. With `force` an existing
/// file is removed first.
pub fn prepare_target(target: &Path, force: bool) -> Result<bool> {
    if !target.exists() {
        return Ok(true);
    }

    if !force {
        info!("{} already exists, skipped", target.display());
        return Ok(false);
    }

    info!("Removing existing {}", target.display());
    std::fs::remove_file(target)?;
    Ok(true)
}

fn seconds_arg(secs: f64) -> String {
    format!("{secs:.3}")
}

/// `sox` arguments concatenating `files` into `output`, trimmed to `cut`.
pub fn merge_args(files: &[PathBuf], output: &Path, cut: &CutWindow) -> Vec<String> {
    let mut args: Vec<String> = files
        .iter()
        .map(|f| f.to_string_lossy().into_owned())
        .collect();
    args.push(output.to_string_lossy().into_owned());
    args.push("trim".to_string());
    args.push(seconds_arg(cut.start_offset_seconds));
    args.push(seconds_arg(cut.duration_seconds));
    args
}

/// Concatenate and trim `files` into `output` with the configured merge tool.
pub fn merge_captures(
    files: &[PathBuf],
    output: &Path,
    cut: &CutWindow,
    tool: &str,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    if files.is_empty() {
        return Err(ArchiveError::NotFound(format!(
            "No captures to merge into {}",
            output.display()
        )));
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(
        "Merging {} captures into {} (cut {})",
        files.len(),
        output.display(),
        cut
    );

    run_checked(runner, tool, &merge_args(files, output, cut))?;

    if !output.exists() {
        return Err(ArchiveError::ExternalTool {
            tool: tool.to_string(),
            code: Some(0),
            stderr: format!("{} was not created", output.display()),
        });
    }

    Ok(())
}

/// Locate, plan and merge one event unless its merged file already exists.
///
/// Captures are only looked up when the merge actually runs; finding none is
/// an error.
pub fn merge_event(
    event: &Event,
    output: &Path,
    config: &Config,
    runner: &dyn ProcessRunner,
    force: bool,
) -> Result<MergeOutcome> {
    if !prepare_target(output, force)? {
        return Ok(MergeOutcome::Skipped);
    }

    let files = find_capture_files(event, config)?;
    if files.is_empty() {
        return Err(ArchiveError::NotFound(format!(
            "No capture files for event {} ({} - {})",
            event.event_id, event.start_datetime, event.end_datetime
        )));
    }

    let cut = plan_cut(event, config)?;
    debug!(
        "Cut for event {}: start {:.3}s, end {:.3}s",
        event.event_id,
        cut.start_offset_seconds,
        cut.end_offset_seconds()
    );

    merge_captures(&files, output, &cut, &config.tools.merge, runner)?;
    Ok(MergeOutcome::Merged(cut))
}

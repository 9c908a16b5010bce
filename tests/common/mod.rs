//! Fixtures shared by the integration test suites.

#![allow(dead_code)]

use async_trait::async_trait;
use broadcast_archive::audio::{ProcessOutput, ProcessRunner};
use broadcast_archive::error::{ArchiveError, Result};
use broadcast_archive::schedule::{Event, EventSource};
use broadcast_archive::Config;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records every invocation and creates the `.wav`/`.mp3` outputs a real
/// tool would have written, with the program name as content.
#[derive(Clone, Default)]
pub struct RecordingRunner {
    calls: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    failing: Option<(String, i32)>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `program` exit with `code`.
    pub fn failing(program: &str, code: i32) -> Self {
        Self {
            failing: Some((program.to_string(), code)),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|(program, _)| program).collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<ProcessOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        if let Some((failing, code)) = &self.failing {
            if failing == program {
                return Ok(ProcessOutput {
                    code: Some(*code),
                    stdout: String::new(),
                    stderr: format!("{program} exploded"),
                });
            }
        }

        for arg in args {
            let path = Path::new(arg);
            let is_audio = arg.ends_with(".wav") || arg.ends_with(".mp3");
            let parent_exists = path.parent().is_some_and(|p| p.is_dir());
            if is_audio && parent_exists && !path.exists() {
                std::fs::write(path, program.as_bytes()).map_err(ArchiveError::Io)?;
            }
        }

        Ok(ProcessOutput {
            code: Some(0),
            ..Default::default()
        })
    }
}

/// Serves a fixed list of events.
pub struct StaticEvents(pub Vec<Event>);

#[async_trait]
impl EventSource for StaticEvents {
    async fn events_on(&self, date: NaiveDate) -> Result<Vec<Event>> {
        let day = date.format("%Y-%m-%d").to_string();
        Ok(self
            .0
            .iter()
            .filter(|e| e.start_datetime.starts_with(&day))
            .cloned()
            .collect())
    }

    async fn event_by_id(&self, id: i64) -> Result<Event> {
        self.0
            .iter()
            .find(|e| e.event_id == id)
            .cloned()
            .ok_or_else(|| ArchiveError::NotFound(format!("No event with id {id}")))
    }
}

/// A temporary directory tree laid out like a recorder host.
pub struct Workspace {
    pub root: TempDir,
    pub config: Config,
}

impl Workspace {
    pub fn new() -> Self {
        Self::with_extra("")
    }

    /// Workspace whose config has `extra` TOML appended.
    pub fn with_extra(extra: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let base = root.path().display().to_string();
        let contents = format!(
            r#"
source_dir = "{base}/captures"
target_dir = "{base}/archive"
image_target_dir = "{base}/images"
timezone = "Europe/Berlin"
api_url = "http://127.0.0.1:9/events"
{extra}
"#
        );
        let config = Config::from_toml(&contents).unwrap();
        std::fs::create_dir_all(&config.source_dir).unwrap();
        Self { root, config }
    }

    /// Write a short silent WAV capture named `{date} {time}.wav`.
    pub fn capture(&self, date: &str, time: &str) -> PathBuf {
        let dir = self.config.source_dir.join(date);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(format!("{date} {time}.wav"));
        write_silence(&path, 0.25);
        path
    }

    /// Hourly captures covering a whole day.
    pub fn hourly_captures(&self, date: &str) {
        for hour in 0..24 {
            self.capture(date, &format!("{hour:02}:00:00"));
        }
    }
}

pub fn write_silence(path: &Path, seconds: f64) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..(seconds * 8000.0) as usize {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

pub fn event(id: i64, start: &str, end: &str, title: &str) -> Event {
    Event {
        event_id: id,
        start_datetime: start.to_string(),
        end_datetime: end.to_string(),
        full_title: title.to_string(),
        series_name: "Archive Test".to_string(),
        title: title.to_string(),
        episode: "1".to_string(),
        location_mapped: "Studio A".to_string(),
        excerpt: "Test broadcast".to_string(),
        image: String::new(),
    }
}

pub fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

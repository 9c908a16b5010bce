pub mod locate;

pub use locate::{find_capture_files, select_captures, SearchWindow};

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn capture_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})[ T_-](\d{2})[:_-](\d{2})(?:[:_-](\d{2}))?")
            .expect("Invalid regex")
    })
}

/// A WAV segment written by the recorder, timestamped by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl CaptureFile {
    /// Parse the date and time embedded in the file name, `None` if there is none.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let caps = capture_name_pattern().captures(name)?;

        let num = |i: usize| -> Option<u32> {
            caps.get(i).map_or(Some(0), |m| m.as_str().parse().ok())
        };

        let date = NaiveDate::from_ymd_opt(caps[1].parse().ok()?, num(2)?, num(3)?)?;
        let time = NaiveTime::from_hms_opt(num(4)?, num(5)?, num(6)?)?;

        Some(Self {
            path: path.to_path_buf(),
            date,
            time,
        })
    }

    /// Duration read from the WAV header, if the file is readable.
    pub fn estimated_duration(&self) -> Option<f64> {
        let reader = hound::WavReader::open(&self.path).ok()?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return None;
        }
        Some(reader.duration() as f64 / spec.sample_rate as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_colon_name() {
        let file = CaptureFile::from_path(Path::new("/c/2025-04-06/2025-04-06 13:00:00.wav")).unwrap();
        assert_eq!(file.date, NaiveDate::from_ymd_opt(2025, 4, 6).unwrap());
        assert_eq!(file.time, NaiveTime::from_hms_opt(13, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_flexible_separators() {
        for name in [
            "rec_2025-04-06T13-05-09.wav",
            "2025-04-06_13_05_09.wav",
            "2025-04-06-13-05-09.wav",
        ] {
            let file = CaptureFile::from_path(Path::new(name)).unwrap();
            assert_eq!(file.time, NaiveTime::from_hms_opt(13, 5, 9).unwrap(), "{name}");
        }
    }

    #[test]
    fn test_parse_without_seconds() {
        let file = CaptureFile::from_path(Path::new("2025-04-06 13_05.wav")).unwrap();
        assert_eq!(file.time, NaiveTime::from_hms_opt(13, 5, 0).unwrap());
    }

    #[test]
    fn test_malformed_names() {
        for name in ["notes.wav", "2025-04-06.wav", "2025-04-06 25:00:00.wav", "2025-02-30 10:00:00.wav"] {
            assert!(CaptureFile::from_path(Path::new(name)).is_none(), "{name}");
        }
    }

    #[test]
    fn test_estimated_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2025-04-06 13:00:00.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..12_000 {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let file = CaptureFile::from_path(&path).unwrap();
        assert_eq!(file.estimated_duration(), Some(1.5));
    }
}

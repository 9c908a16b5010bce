use std::path::{Path, PathBuf};

use chrono::Datelike;
use tracing::info;

use crate::config::Config;
use crate::error::{ArchiveError, Result};
use crate::schedule::Event;

use super::runner::{run_checked, ProcessRunner};

/// ID3 fields written to a finished MP3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub publisher: String,
    pub genre: String,
    pub track: Option<u32>,
    pub year: Option<i32>,
    pub comment: String,
    pub cover: Option<PathBuf>,
}

fn first_non_empty<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

impl TagSet {
    pub fn from_event(event: &Event, config: &Config, cover: Option<PathBuf>) -> Self {
        let series = first_non_empty(&[event.series_name.as_str(), event.full_title.as_str()]);
        Self {
            title: first_non_empty(&[event.title.as_str(), event.full_title.as_str()]).to_string(),
            artist: series.to_string(),
            album: series.to_string(),
            publisher: event.location_mapped.trim().to_string(),
            genre: config.genre.clone(),
            track: event.episode.trim().parse().ok(),
            year: event.start(config.timezone).ok().map(|start| start.year()),
            comment: event.excerpt.trim().to_string(),
            cover,
        }
    }
}

/// `lame` arguments encoding `input` to `output` at a constant bitrate.
pub fn encode_args(input: &Path, output: &Path, bitrate: u32) -> Vec<String> {
    vec![
        "--quiet".to_string(),
        "-b".to_string(),
        bitrate.to_string(),
        input.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    ]
}

/// `eyeD3` arguments; empty fields are left out.
pub fn tag_args(file: &Path, tags: &TagSet) -> Vec<String> {
    let mut args = vec!["--quiet".to_string()];

    let mut text = |flag: &str, value: &str| {
        if !value.is_empty() {
            args.push(flag.to_string());
            args.push(value.to_string());
        }
    };
    text("--title", &tags.title);
    text("--artist", &tags.artist);
    text("--album", &tags.album);
    text("--publisher", &tags.publisher);
    text("--genre", &tags.genre);
    text("--comment", &tags.comment);

    if let Some(track) = tags.track {
        args.push("--track".to_string());
        args.push(track.to_string());
    }
    if let Some(year) = tags.year {
        args.push("--release-year".to_string());
        args.push(year.to_string());
    }
    if let Some(cover) = &tags.cover {
        args.push("--add-image".to_string());
        args.push(format!("{}:FRONT_COVER", cover.to_string_lossy()));
    }

    args.push(file.to_string_lossy().into_owned());
    args
}

/// `mp3gain` arguments applying track gain in place.
pub fn normalize_args(file: &Path) -> Vec<String> {
    vec![
        "-r".to_string(),
        "-k".to_string(),
        "-q".to_string(),
        file.to_string_lossy().into_owned(),
    ]
}

/// Encode the merged WAV to MP3.
pub fn encode(
    input: &Path,
    output: &Path,
    config: &Config,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    if !input.exists() {
        return Err(ArchiveError::NotFound(input.display().to_string()));
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!("Encoding {} to {}", input.display(), output.display());
    run_checked(
        runner,
        &config.tools.encoder,
        &encode_args(input, output, config.bitrate),
    )?;

    if !output.exists() {
        return Err(ArchiveError::ExternalTool {
            tool: config.tools.encoder.clone(),
            code: Some(0),
            stderr: format!("{} was not created", output.display()),
        });
    }

    Ok(())
}

pub fn tag(file: &Path, tags: &TagSet, config: &Config, runner: &dyn ProcessRunner) -> Result<()> {
    info!("Tagging {} as '{}'", file.display(), tags.title);
    run_checked(runner, &config.tools.tagger, &tag_args(file, tags))?;
    Ok(())
}

pub fn normalize(file: &Path, config: &Config, runner: &dyn ProcessRunner) -> Result<()> {
    info!("Normalizing loudness of {}", file.display());
    run_checked(runner, &config.tools.normalizer, &normalize_args(file))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_toml(
            r#"
source_dir = "/srv/captures"
target_dir = "/srv/archive"
image_target_dir = "/srv/archive/images"
timezone = "Europe/Berlin"
api_url = "http://localhost/events"
genre = "Talk"
"#,
        )
        .unwrap()
    }

    fn event() -> Event {
        Event {
            event_id: 12,
            start_datetime: "2025-04-06 20:00:00".to_string(),
            end_datetime: "2025-04-06 21:00:00".to_string(),
            full_title: "Late Talk: Cities".to_string(),
            series_name: "Late Talk".to_string(),
            title: "Cities".to_string(),
            episode: "14".to_string(),
            location_mapped: "Studio 2".to_string(),
            excerpt: "On urban noise".to_string(),
            image: String::new(),
        }
    }

    #[test]
    fn test_tags_from_event() {
        let tags = TagSet::from_event(&event(), &config(), Some(PathBuf::from("/img/c.jpg")));
        assert_eq!(tags.title, "Cities");
        assert_eq!(tags.artist, "Late Talk");
        assert_eq!(tags.album, "Late Talk");
        assert_eq!(tags.publisher, "Studio 2");
        assert_eq!(tags.genre, "Talk");
        assert_eq!(tags.track, Some(14));
        assert_eq!(tags.year, Some(2025));
        assert_eq!(tags.comment, "On urban noise");
    }

    #[test]
    fn test_tags_fall_back_to_full_title() {
        let mut e = event();
        e.title = " ".to_string();
        e.series_name = String::new();
        e.episode = "Special".to_string();
        let tags = TagSet::from_event(&e, &config(), None);
        assert_eq!(tags.title, "Late Talk: Cities");
        assert_eq!(tags.artist, "Late Talk: Cities");
        assert_eq!(tags.track, None);
    }

    #[test]
    fn test_tag_args() {
        let tags = TagSet::from_event(&event(), &config(), Some(PathBuf::from("/img/c.jpg")));
        let args = tag_args(Path::new("/a/show.mp3"), &tags);
        let joined = args.join(" ");
        assert!(joined.contains("--title Cities"));
        assert!(joined.contains("--track 14"));
        assert!(joined.contains("--release-year 2025"));
        assert!(joined.contains("--comment On urban noise"));
        assert!(joined.contains("--add-image /img/c.jpg:FRONT_COVER"));
        assert_eq!(args.last().unwrap(), "/a/show.mp3");
    }

    #[test]
    fn test_tag_args_skip_empty_fields() {
        let tags = TagSet {
            title: "Only title".to_string(),
            ..Default::default()
        };
        let args = tag_args(Path::new("x.mp3"), &tags);
        assert_eq!(args, vec!["--quiet", "--title", "Only title", "x.mp3"]);
    }

    #[test]
    fn test_encode_args() {
        let args = encode_args(Path::new("in.wav"), Path::new("out.mp3"), 256);
        assert_eq!(args, vec!["--quiet", "-b", "256", "in.wav", "out.mp3"]);
    }

    #[test]
    fn test_normalize_args() {
        assert_eq!(
            normalize_args(Path::new("out.mp3")),
            vec!["-r", "-k", "-q", "out.mp3"]
        );
    }
}

use crate::audio::{encode, merge_event, normalize, tag, MergeOutcome, ProcessRunner, TagSet};
use crate::config::Config;
use crate::error::Result;
use crate::naming::{build_output_filename, build_source_filename, mp3_path};
use crate::schedule::{Event, EventQuery, EventSource, ImageFetcher};
use crate::time::format_duration;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// What happened to a single event.
#[derive(Debug, Clone, PartialEq)]
pub enum ArchiveOutcome {
    /// The MP3 was (re)built.
    Archived { mp3: PathBuf, merged: MergeOutcome },
    /// An archive for the event already existed.
    Skipped { mp3: PathBuf },
}

/// Result of archiving every event of a query.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    pub query: EventQuery,
    pub archived: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub total_time: Duration,
}

/// Sequential per-event archiving pipeline.
pub struct Archiver {
    config: Config,
    source: Box<dyn EventSource>,
    runner: Box<dyn ProcessRunner>,
    images: ImageFetcher,
    force: bool,
    show_progress: bool,
}

impl Archiver {
    pub fn new(
        config: Config,
        source: Box<dyn EventSource>,
        runner: Box<dyn ProcessRunner>,
        images: ImageFetcher,
    ) -> Self {
        Self {
            config,
            source,
            runner,
            images,
            force: false,
            show_progress: true,
        }
    }

    /// Rebuild outputs that already exist instead of skipping them.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Enable or disable the per-stage spinners.
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn spinner(&self, message: String) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Archive every event matching `query`, one after another.
    ///
    /// The first failing event aborts the run.
    pub async fn run(&self, query: EventQuery) -> Result<ArchiveSummary> {
        let start_time = Instant::now();

        info!("Looking up {}", query);
        let events = self.source.resolve(query).await?;
        info!("Found {} events", events.len());

        let mut archived = Vec::new();
        let mut skipped = Vec::new();

        for (index, event) in events.iter().enumerate() {
            info!(
                "Event {}/{}: #{} '{}' ({} - {})",
                index + 1,
                events.len(),
                event.event_id,
                event.full_title,
                event.start_datetime,
                event.end_datetime
            );

            match self.archive_event(event).await? {
                ArchiveOutcome::Archived { mp3, .. } => archived.push(mp3),
                ArchiveOutcome::Skipped { mp3 } => skipped.push(mp3),
            }
        }

        Ok(ArchiveSummary {
            query,
            archived,
            skipped,
            total_time: start_time.elapsed(),
        })
    }

    /// Merge, encode, tag and normalize a single event.
    pub async fn archive_event(&self, event: &Event) -> Result<ArchiveOutcome> {
        let config = &self.config;
        let runner = self.runner.as_ref();

        let merged_wav = build_source_filename(event, config)?;
        let marker = build_output_filename(event, &merged_wav, config)?;
        let mp3 = mp3_path(&marker);

        // The marker is only written once normalize succeeds, so an mp3
        // without one is left over from an interrupted run.
        if marker.exists() && !self.force {
            info!("{} already exists, skipped", mp3.display());
            return Ok(ArchiveOutcome::Skipped { mp3 });
        }
        for stale in [&marker, &mp3] {
            if stale.exists() {
                debug!("Removing {}", stale.display());
                std::fs::remove_file(stale)?;
            }
        }

        // Stage 1: locate captures, cut and merge
        let pb = self.spinner(format!("Merging captures for #{}...", event.event_id));
        let merged = merge_event(event, &merged_wav, config, runner, self.force)?;
        if let Some(pb) = pb {
            pb.finish_with_message(match &merged {
                MergeOutcome::Merged(cut) => format!(
                    "✓ Merged {} ({} long)",
                    merged_wav.display(),
                    format_duration(cut.duration_seconds)
                ),
                MergeOutcome::Skipped => format!("✓ Reusing {}", merged_wav.display()),
            });
        }

        // Stage 2: encode
        let pb = self.spinner(format!("Encoding {}...", mp3.display()));
        encode(&merged_wav, &mp3, config, runner)?;
        if let Some(pb) = pb {
            pb.finish_with_message(format!("✓ Encoded {}", mp3.display()));
        }

        // Stage 3: cover, tags, loudness
        let cover = self.images.fetch(&event.image).await?;
        let tags = TagSet::from_event(event, config, cover);
        tag(&mp3, &tags, config, runner)?;
        normalize(&mp3, config, runner)?;
        std::fs::write(&marker, b"")?;

        info!("Archived event #{} to {}", event.event_id, mp3.display());
        Ok(ArchiveOutcome::Archived { mp3, merged })
    }
}

/// Print a summary of the run.
pub fn print_summary(summary: &ArchiveSummary) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                      Archive Run Complete                      ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Query:      {}", summary.query);
    println!(
        "  Archived:   {}",
        style(summary.archived.len()).green().bold()
    );
    println!("  Skipped:    {}", style(summary.skipped.len()).yellow());
    println!(
        "  Time:       {:.2}s",
        summary.total_time.as_secs_f64()
    );
    if !summary.archived.is_empty() {
        println!();
        for path in &summary.archived {
            println!("    {} {}", style("+").green(), path.display());
        }
    }
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

use anyhow::{Context, Result};
use broadcast_archive::audio::SystemRunner;
use broadcast_archive::schedule::{EventQuery, ImageFetcher, ScheduleClient};
use broadcast_archive::{print_summary, Archiver, Config};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "broadcast-archive")]
#[command(version, about = "Archive recorded radio broadcasts as tagged MP3 files")]
#[command(
    long_about = "Look up scheduled events, cut them out of the recorder's WAV captures, then encode, tag and normalize the result."
)]
struct Cli {
    /// Date (YYYY-MM-DD) to archive all events of, or a single event id
    target: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: PathBuf,

    /// Rebuild outputs that already exist
    #[arg(short, long)]
    force: bool,

    /// Disable progress spinners
    #[arg(long)]
    no_progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let query: EventQuery = cli.target.parse()?;

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    config
        .validate()
        .context("Configuration validation failed")?;

    info!("Source:   {}", config.source_dir.display());
    info!("Target:   {}", config.target_dir.display());
    info!("Timezone: {}", config.timezone);
    info!("Offset:   {}s", config.offset);
    if cli.force {
        info!("Force mode: existing outputs will be rebuilt");
    }

    let source = ScheduleClient::new(config.api_url.clone()).with_phase(config.event_phase.clone());
    let images = ImageFetcher::new(config.image_base_url.clone(), config.image_target_dir.clone());

    let archiver = Archiver::new(config, Box::new(source), Box::new(SystemRunner), images)
        .with_force(cli.force)
        .with_progress(!cli.no_progress);

    let summary = archiver
        .run(query)
        .await
        .with_context(|| format!("Archiving {query} failed"))?;

    print_summary(&summary);

    Ok(())
}

pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod naming;
pub mod pipeline;
pub mod schedule;
pub mod time;

pub use config::Config;
pub use error::{ArchiveError, Result};
pub use pipeline::{print_summary, ArchiveOutcome, ArchiveSummary, Archiver};

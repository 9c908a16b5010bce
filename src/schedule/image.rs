use crate::error::{ArchiveError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Downloads cover images into a local cache directory.
pub struct ImageFetcher {
    client: reqwest::Client,
    base_url: Option<String>,
    target_dir: PathBuf,
}

impl ImageFetcher {
    pub fn new(base_url: Option<String>, target_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            target_dir: target_dir.into(),
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Absolute URL for an event's `image` field.
    pub fn resolve_url(&self, image: &str) -> Result<String> {
        if image.starts_with("http://") || image.starts_with("https://") {
            return Ok(image.to_string());
        }

        let base = self.base_url.as_deref().ok_or_else(|| {
            ArchiveError::Config(format!(
                "image '{image}' is relative but image_base_url is not set"
            ))
        })?;

        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            image.trim_start_matches('/')
        ))
    }

    /// Download `image` and return the local path, or `None` if the event has no image.
    ///
    /// An existing file with the same name is overwritten.
    pub async fn fetch(&self, image: &str) -> Result<Option<PathBuf>> {
        let image = image.trim();
        if image.is_empty() {
            return Ok(None);
        }

        let url = self.resolve_url(image)?;
        let file_name = image_file_name(&url)
            .ok_or_else(|| ArchiveError::Format(format!("No file name in image URL {url}")))?;
        let destination = self.target_dir.join(file_name);

        debug!("Downloading cover {} to {}", url, destination.display());

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Api(format!(
                "Image download {url} returned {status}"
            )));
        }
        let bytes = response.bytes().await?;

        std::fs::create_dir_all(&self.target_dir)?;
        let mut staged = NamedTempFile::new_in(&self.target_dir)?;
        staged.write_all(&bytes)?;
        staged.persist(&destination).map_err(|e| e.error)?;

        info!("Cover image saved to {}", destination.display());
        Ok(Some(destination))
    }
}

/// Last path segment of `url`, without query or fragment. Dot segments
/// are not file names.
fn image_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path
        .split_once("://")
        .map_or(path, |(_, rest)| rest.split_once('/').map_or("", |(_, p)| p));
    path.rsplit('/')
        .next()
        .filter(|name| !matches!(*name, "" | "." | ".."))
}

//! Dataset Fetch Module
//! Downloads the dataset archive into a temporary workspace and unpacks it.

use reqwest::blocking::Client;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};
use zip::ZipArchive;

/// UCI Machine Learning Repository location of the bike-sharing dataset.
pub const DATA_SOURCE_URL: &str =
    "http://archive.ics.uci.edu/ml/machine-learning-databases/00275/Bike-Sharing-Dataset.zip";
/// File name the archive is saved under inside the workspace.
pub const ARCHIVE_NAME: &str = "Bike-Sharing-Dataset.zip";
/// Day-level table inside the archive.
pub const DAILY_FILE: &str = "day.csv";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Archive has no member named '{0}'")]
    MissingMember(String),
}

/// Stream the body of `url` into `dest`. Returns the number of bytes written.
pub fn download(client: &Client, url: &str, dest: &Path) -> Result<u64, FetchError> {
    let mut resp = client.get(url).send()?.error_for_status()?;
    let mut file = File::create(dest)?;
    let written = resp.copy_to(&mut file)?;
    file.flush()?;
    Ok(written)
}

/// Extract every member of `archive` below `dir`, keeping the archive's
/// directory layout. Returns the paths of the extracted files.
pub fn extract_all(archive: &Path, dir: &Path) -> Result<Vec<PathBuf>, FetchError> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut extracted = Vec::with_capacity(zip.len());

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!(name = entry.name(), "Skipping archive member with unsafe path");
            continue;
        };
        let out_path = dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = File::create(&out_path)?;
        io::copy(&mut entry, &mut out)?;
        debug!(member = %out_path.display(), size = entry.size(), "Extracted");
        extracted.push(out_path);
    }

    Ok(extracted)
}

/// Temporary directory holding the downloaded archive and its contents.
///
/// `close` removes the directory and reports failures; dropping the
/// workspace without closing it removes the directory silently.
pub struct Workspace {
    dir: TempDir,
    extracted: Vec<PathBuf>,
}

impl Workspace {
    pub fn new() -> Result<Self, FetchError> {
        let dir = tempfile::Builder::new().prefix("bikeshare-").tempdir()?;
        debug!(path = %dir.path().display(), "Created workspace");
        Ok(Self {
            dir,
            extracted: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Files extracted so far.
    pub fn extracted(&self) -> &[PathBuf] {
        &self.extracted
    }

    /// Download the archive at `url` into the workspace and extract it.
    pub fn fetch_remote(&mut self, url: &str, timeout: Duration) -> Result<(), FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        let archive = self.path().join(ARCHIVE_NAME);

        info!(url, "Downloading dataset");
        let bytes = download(&client, url, &archive)?;
        info!(bytes, "Download complete");

        self.import_archive(&archive)
    }

    /// Extract a local archive into the workspace.
    pub fn import_archive(&mut self, archive: &Path) -> Result<(), FetchError> {
        let files = extract_all(archive, self.dir.path())?;
        info!(members = files.len(), "Archive extracted");
        self.extracted.extend(files);
        Ok(())
    }

    /// Find an extracted file by name, at any depth of the archive.
    pub fn locate(&self, file_name: &str) -> Result<PathBuf, FetchError> {
        self.extracted
            .iter()
            .filter(|p| p.file_name().is_some_and(|n| n == file_name))
            .min_by_key(|p| p.components().count())
            .cloned()
            .ok_or_else(|| FetchError::MissingMember(file_name.to_string()))
    }

    /// Remove the workspace directory.
    pub fn close(self) -> Result<(), FetchError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(path = %path.display(), "Removed workspace");
        Ok(())
    }
}

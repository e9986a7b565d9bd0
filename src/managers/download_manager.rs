//! Download Manager for the step recorder.
//!
//! Saves exported documents into the download directory and keeps an
//! in-memory record of every save for the lifetime of the process.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};
use uuid::Uuid;

use crate::types::download::{DownloadItem, DownloadStatus};
use crate::types::errors::DownloadError;
use crate::types::export::ExportArtifact;

/// Trait defining download operations.
pub trait DownloadManagerTrait {
    fn save(&mut self, artifact: &ExportArtifact) -> Result<DownloadItem, DownloadError>;
    fn list_downloads(&self) -> Vec<&DownloadItem>;
    fn get_download(&self, id: &str) -> Option<&DownloadItem>;
}

/// Download manager writing artifacts to a directory on disk.
pub struct DownloadManager {
    download_dir: PathBuf,
    downloads: Vec<DownloadItem>,
}

impl DownloadManager {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
            downloads: Vec::new(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Later saves go to `download_dir`; the download history is kept.
    pub fn set_download_dir(&mut self, download_dir: impl Into<PathBuf>) {
        self.download_dir = download_dir.into();
    }

    fn now_ts() -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
    }

    /// Picks a free path for `filename`, appending ` (n)` before the extension
    /// when the name is taken.
    fn unique_path(&self, filename: &str) -> PathBuf {
        let candidate = self.download_dir.join(filename);
        if !candidate.exists() {
            return candidate;
        }
        let (stem, ext) = match filename.rsplit_once('.') {
            Some((stem, ext)) => (stem.to_string(), format!(".{}", ext)),
            None => (filename.to_string(), String::new()),
        };
        let mut n = 1;
        loop {
            let candidate = self.download_dir.join(format!("{} ({}){}", stem, n, ext));
            if !candidate.exists() {
                return candidate;
            }
            n += 1;
        }
    }
}

impl DownloadManagerTrait for DownloadManager {
    fn save(&mut self, artifact: &ExportArtifact) -> Result<DownloadItem, DownloadError> {
        let started_at = Self::now_ts();
        fs::create_dir_all(&self.download_dir)
            .map_err(|e| DownloadError::FileSystemError(e.to_string()))?;

        let path = self.unique_path(&artifact.filename);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| artifact.filename.clone());

        let mut item = DownloadItem {
            id: Uuid::new_v4().to_string(),
            filename,
            filepath: path.to_string_lossy().to_string(),
            size: artifact.body.len() as u64,
            status: DownloadStatus::Completed,
            mime_type: artifact.mime_type().to_string(),
            started_at,
            completed_at: None,
        };

        match fs::write(&path, &artifact.body) {
            Ok(()) => {
                item.completed_at = Some(Self::now_ts());
                info!(file = %item.filepath, bytes = item.size, "document saved");
                self.downloads.insert(0, item.clone());
                Ok(item)
            }
            Err(e) => {
                warn!(file = %item.filepath, error = %e, "saving document failed");
                item.status = DownloadStatus::Failed(e.to_string());
                self.downloads.insert(0, item);
                Err(DownloadError::FileSystemError(e.to_string()))
            }
        }
    }

    fn list_downloads(&self) -> Vec<&DownloadItem> {
        self.downloads.iter().collect()
    }

    fn get_download(&self, id: &str) -> Option<&DownloadItem> {
        self.downloads.iter().find(|d| d.id == id)
    }
}

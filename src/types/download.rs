use serde::{Deserialize, Serialize};

/// Status of a saved download.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DownloadStatus {
    Completed,
    Failed(String),
}

/// A document handed to the download sink and where it ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadItem {
    pub id: String,
    pub filename: String,
    pub filepath: String,
    pub size: u64,
    pub status: DownloadStatus,
    pub mime_type: String,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

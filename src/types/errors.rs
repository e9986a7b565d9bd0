use std::time::Duration;

use thiserror::Error;

// === TransportError ===

/// Errors crossing a context boundary (page script, popup, background).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The receiving context does not exist or refused the message.
    #[error("Receiving end unreachable: {0}")]
    Unreachable(String),
    /// No reply arrived within the allotted time.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// The reply did not have the shape the request expects.
    #[error("Unexpected response to {0}")]
    UnexpectedResponse(String),
}

// === CaptureError ===

/// Errors related to screenshot capture and annotation.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No capture could be obtained for the visible tab.
    #[error("Screenshot unavailable: {0}")]
    Unavailable(String),
    /// The screenshot payload is not a decodable image data URL.
    #[error("Screenshot decode failed: {0}")]
    Decode(String),
    /// The annotated image could not be re-encoded.
    #[error("Screenshot encode failed: {0}")]
    Encode(String),
}

// === ExportError ===

/// Errors related to document export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A step screenshot could not be embedded.
    #[error("Image embedding failed: {0}")]
    Image(String),
    /// The paged document could not be assembled or serialized.
    #[error("Document rendering failed: {0}")]
    Render(String),
    /// The rendered artifact could not be saved.
    #[error("Saving document failed: {0}")]
    Save(String),
}

// === DownloadError ===

/// Errors related to saving downloads.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Download with the given ID was not found.
    #[error("Download not found: {0}")]
    NotFound(String),
    /// A file system error occurred.
    #[error("Download file system error: {0}")]
    FileSystemError(String),
}

impl From<DownloadError> for ExportError {
    fn from(err: DownloadError) -> Self {
        ExportError::Save(err.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

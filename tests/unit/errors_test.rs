use std::time::Duration;

use steprecorder::types::errors::*;

// === TransportError Tests ===

#[test]
fn transport_error_display_variants() {
    assert_eq!(
        TransportError::Unreachable("tab 4".to_string()).to_string(),
        "Receiving end unreachable: tab 4"
    );
    assert_eq!(
        TransportError::Timeout(Duration::from_millis(1500)).to_string(),
        "Request timed out after 1.5s"
    );
    assert_eq!(
        TransportError::UnexpectedResponse("GET_STEPS".to_string()).to_string(),
        "Unexpected response to GET_STEPS"
    );
}

#[test]
fn transport_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(TransportError::Unreachable("x".to_string()));
    assert!(err.source().is_none());
}

// === CaptureError Tests ===

#[test]
fn capture_error_display_variants() {
    assert_eq!(
        CaptureError::Unavailable("quota".to_string()).to_string(),
        "Screenshot unavailable: quota"
    );
    assert_eq!(
        CaptureError::Decode("bad png".to_string()).to_string(),
        "Screenshot decode failed: bad png"
    );
    assert_eq!(
        CaptureError::Encode("oom".to_string()).to_string(),
        "Screenshot encode failed: oom"
    );
}

// === ExportError Tests ===

#[test]
fn export_error_display_variants() {
    assert_eq!(
        ExportError::Image("step 2: truncated".to_string()).to_string(),
        "Image embedding failed: step 2: truncated"
    );
    assert_eq!(
        ExportError::Render("xref".to_string()).to_string(),
        "Document rendering failed: xref"
    );
    assert_eq!(
        ExportError::Save("disk full".to_string()).to_string(),
        "Saving document failed: disk full"
    );
}

// === DownloadError Tests ===

#[test]
fn download_error_converts_into_save_error() {
    let err: ExportError = DownloadError::FileSystemError("read-only".to_string()).into();
    match err {
        ExportError::Save(msg) => assert_eq!(msg, "Download file system error: read-only"),
        other => panic!("expected Save, got {:?}", other),
    }
}

#[test]
fn download_error_not_found_display() {
    assert_eq!(
        DownloadError::NotFound("abc".to_string()).to_string(),
        "Download not found: abc"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
    assert_eq!(
        SettingsError::SerializationError("eof".to_string()).to_string(),
        "Settings serialization error: eof"
    );
    assert_eq!(
        SettingsError::InvalidKey("page.nope".to_string()).to_string(),
        "Invalid settings key: page.nope"
    );
    assert_eq!(
        SettingsError::InvalidValue("negative".to_string()).to_string(),
        "Invalid settings value: negative"
    );
}

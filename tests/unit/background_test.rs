//! Unit tests for the background process message contract.

use std::fs;
use std::sync::{Arc, Mutex};

use image::{Rgba, RgbaImage};
use steprecorder::background::{BackgroundService, ImageFileCapturer, ScreenCapturer, UnavailableCapturer};
use steprecorder::managers::download_manager::DownloadManager;
use steprecorder::types::errors::ExportError;
use steprecorder::types::export::{ExportKind, ExportOutcome};
use steprecorder::types::message::{Ack, BackgroundRequest, BackgroundResponse, ContentCommand, TabLoadStatus};
use steprecorder::types::settings::RecorderSettings;
use steprecorder::types::step::Step;
use steprecorder::types::tab_state::{TabId, TabStateView};
use tempfile::TempDir;

const TAB: TabId = TabId(7);

fn service_in(dir: &TempDir) -> BackgroundService {
    service_with(dir, RecorderSettings::default(), Arc::new(UnavailableCapturer))
}

fn service_with(dir: &TempDir, settings: RecorderSettings, capturer: Arc<dyn ScreenCapturer>) -> BackgroundService {
    let sink = Arc::new(Mutex::new(DownloadManager::new(dir.path())));
    BackgroundService::new(&settings, capturer, sink)
}

fn no_window() -> RecorderSettings {
    let mut settings = RecorderSettings::default();
    settings.timing.sanitize_window_ms = 0;
    settings
}

fn set_state(recording: bool, steps: Vec<Step>) -> BackgroundRequest {
    BackgroundRequest::SetTabState { tab_id: None, is_recording: recording, steps }
}

fn steps_of(response: BackgroundResponse) -> Vec<Step> {
    match response {
        BackgroundResponse::Steps(steps) => steps,
        other => panic!("expected steps, got {:?}", other),
    }
}

fn tab_state_of(response: BackgroundResponse) -> TabStateView {
    match response {
        BackgroundResponse::TabState(view) => view,
        other => panic!("expected tab state, got {:?}", other),
    }
}

// ─── Tab resolution ───

#[test]
fn test_sender_tab_is_used_when_request_names_none() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.handle(Some(TAB), set_state(true, vec![]));
    service.handle(Some(TAB), BackgroundRequest::UpdateSteps { tab_id: None, steps: vec![Step::text("a")] });

    assert!(service.is_recording(TAB));
    let steps = steps_of(service.handle(None, BackgroundRequest::GetSteps { tab_id: Some(TAB) }));
    assert_eq!(steps, vec![Step::text("a")]);
}

#[test]
fn test_explicit_tab_wins_over_sender() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.handle(
        Some(TabId(1)),
        BackgroundRequest::SetTabState { tab_id: Some(TabId(2)), is_recording: true, steps: vec![] },
    );

    assert!(service.is_recording(TabId(2)));
    assert!(!service.is_recording(TabId(1)));
}

#[test]
fn test_requests_without_any_tab_are_acknowledged_no_ops() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    assert_eq!(service.handle(None, set_state(true, vec![])), BackgroundResponse::Ack(Ack::ok()));
    assert_eq!(service.handle(None, BackgroundRequest::DeleteSteps { tab_id: None }), BackgroundResponse::Ack(Ack::ok()));
    assert!(steps_of(service.handle(None, BackgroundRequest::GetSteps { tab_id: None })).is_empty());
    assert_eq!(tab_state_of(service.handle(None, BackgroundRequest::GetTabState { tab_id: None })), TabStateView::idle());
    assert_eq!(service.tab_count(), 0);
}

#[test]
fn test_unknown_tab_reads_idle() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let view = tab_state_of(service.handle(Some(TabId(99)), BackgroundRequest::GetTabState { tab_id: None }));
    assert_eq!(view, TabStateView::idle());
    assert!(steps_of(service.handle(Some(TabId(99)), BackgroundRequest::GetSteps { tab_id: None })).is_empty());
}

// ─── State transitions ───

#[test]
fn test_read_right_after_stop_is_sanitized() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.handle(Some(TAB), set_state(true, vec![]));
    service.handle(Some(TAB), set_state(false, vec![Step::text("a"), Step::text("b")]));

    let view = tab_state_of(service.handle(Some(TAB), BackgroundRequest::GetTabState { tab_id: None }));
    assert_eq!(view, TabStateView::idle());
    // Steps stay readable for the editor.
    assert_eq!(steps_of(service.handle(Some(TAB), BackgroundRequest::GetSteps { tab_id: None })).len(), 2);
}

#[test]
fn test_stopped_state_is_visible_once_window_elapsed() {
    let dir = TempDir::new().unwrap();
    let service = service_with(&dir, no_window(), Arc::new(UnavailableCapturer));

    service.handle(Some(TAB), set_state(true, vec![]));
    service.handle(Some(TAB), set_state(false, vec![Step::text("a")]));

    let view = tab_state_of(service.handle(Some(TAB), BackgroundRequest::GetTabState { tab_id: None }));
    assert!(!view.is_recording);
    assert_eq!(view.steps, vec![Step::text("a")]);
    assert!(view.recording_stopped_at.is_some());
}

#[test]
fn test_navigation_steps_only_append_while_recording() {
    let dir = TempDir::new().unwrap();
    let service = service_with(&dir, no_window(), Arc::new(UnavailableCapturer));
    let nav = |url: &str| BackgroundRequest::AddNavigationEvent { tab_id: None, step: Step::text(url) };

    service.handle(Some(TAB), nav("Navigated to https://a.test"));
    assert!(steps_of(service.handle(Some(TAB), BackgroundRequest::GetSteps { tab_id: None })).is_empty());

    service.handle(Some(TAB), set_state(true, vec![]));
    service.handle(Some(TAB), nav("Navigated to https://b.test"));
    let steps = steps_of(service.handle(Some(TAB), BackgroundRequest::GetSteps { tab_id: None }));
    assert_eq!(steps, vec![Step::text("Navigated to https://b.test")]);
}

#[test]
fn test_delete_steps_clears_and_stops() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.handle(Some(TAB), set_state(true, vec![Step::text("a")]));
    service.handle(Some(TAB), BackgroundRequest::DeleteSteps { tab_id: None });

    assert!(!service.is_recording(TAB));
    assert!(steps_of(service.handle(Some(TAB), BackgroundRequest::GetSteps { tab_id: None })).is_empty());
}

#[test]
fn test_editor_open_flag() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.handle(Some(TAB), BackgroundRequest::SetEditorOpen { tab_id: None, open: true });
    assert!(service.editor_open(TAB));
    service.handle(Some(TAB), BackgroundRequest::SetEditorOpen { tab_id: None, open: false });
    assert!(!service.editor_open(TAB));
}

// ─── Capture ───

#[test]
fn test_capture_without_source_is_null() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);
    assert_eq!(service.handle(Some(TAB), BackgroundRequest::CaptureScreenshot), BackgroundResponse::Screenshot(None));
}

#[test]
fn test_capture_reads_image_file() {
    let dir = TempDir::new().unwrap();
    let shot = dir.path().join("visible.png");
    RgbaImage::from_pixel(4, 3, Rgba([1, 2, 3, 255])).save(&shot).unwrap();
    let service = service_with(&dir, RecorderSettings::default(), Arc::new(ImageFileCapturer::new(&shot)));

    match service.handle(Some(TAB), BackgroundRequest::CaptureScreenshot) {
        BackgroundResponse::Screenshot(Some(url)) => assert!(url.starts_with("data:image/png;base64,")),
        other => panic!("expected a capture, got {:?}", other),
    }
}

// ─── Export ───

#[test]
fn test_generate_document_saves_into_sink() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let response = service.handle(
        Some(TAB),
        BackgroundRequest::GenerateDocument { kind: ExportKind::Html, steps: vec![Step::text("Click on OK")] },
    );

    assert_eq!(response, BackgroundResponse::Export(ExportOutcome::ok()));
    let html = fs::read_to_string(dir.path().join("recorded_steps.html")).unwrap();
    assert!(html.contains("Step 1"));
}

#[test]
fn test_generate_document_rejects_empty_steps() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    assert!(matches!(service.generate_document(ExportKind::Pdf, &[]), Err(ExportError::Render(_))));
    match service.handle(None, BackgroundRequest::GenerateDocument { kind: ExportKind::Pdf, steps: vec![] }) {
        BackgroundResponse::Export(outcome) => {
            assert!(!outcome.success);
            assert!(outcome.error.unwrap().contains("no steps"));
        }
        other => panic!("expected export outcome, got {:?}", other),
    }
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_failed_render_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);
    let steps = vec![Step::text("broken").with_screenshot("data:image/png;base64,aGVsbG8=")];

    assert!(matches!(service.generate_document(ExportKind::Pdf, &steps), Err(ExportError::Image(_))));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

// ─── Tab lifecycle ───

#[test]
fn test_tab_updated_notifies_only_recording_tabs() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);
    let url = Some("https://example.test/next".to_string());

    assert_eq!(service.on_tab_updated(TAB, TabLoadStatus::Complete, url.clone()), None);

    service.handle(Some(TAB), set_state(true, vec![]));
    assert_eq!(service.on_tab_updated(TAB, TabLoadStatus::Loading, url.clone()), None);
    assert_eq!(service.on_tab_updated(TAB, TabLoadStatus::Complete, None), None);
    assert_eq!(
        service.on_tab_updated(TAB, TabLoadStatus::Complete, url),
        Some(ContentCommand::PageNavigated { url: "https://example.test/next".to_string() })
    );
}

#[test]
fn test_tab_removed_destroys_state() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.handle(Some(TAB), set_state(true, vec![]));
    assert!(service.on_tab_removed(TAB));
    assert!(!service.on_tab_removed(TAB));
    assert!(!service.is_recording(TAB));
    assert_eq!(service.tab_count(), 0);
}

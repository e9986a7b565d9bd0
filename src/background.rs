//! Background process for the step recorder.
//!
//! Owns every tab's recording state and answers the message contract used by
//! page scripts and the popup. Nothing outside this module mutates tab state.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::managers::tab_state_manager::{TabStateManager, TabStateManagerTrait};
use crate::services::annotator::encode_png_data_url;
use crate::services::exporter::{DownloadSink, Exporter, ExporterTrait};
use crate::services::messaging::BackgroundPort;
use crate::types::errors::{CaptureError, ExportError, TransportError};
use crate::types::export::{ExportKind, ExportOutcome};
use crate::types::message::{Ack, BackgroundRequest, BackgroundResponse, ContentCommand, TabLoadStatus};
use crate::types::settings::RecorderSettings;
use crate::types::step::Step;
use crate::types::tab_state::{TabId, TabStateView};

/// Visible-tab capture primitive.
pub trait ScreenCapturer: Send + Sync {
    /// Returns the visible tab as a PNG data URL.
    fn capture_visible(&self) -> Result<String, CaptureError>;
}

/// Capturer used when no capture source is configured.
pub struct UnavailableCapturer;

impl ScreenCapturer for UnavailableCapturer {
    fn capture_visible(&self) -> Result<String, CaptureError> {
        Err(CaptureError::Unavailable("no capture source configured".to_string()))
    }
}

/// Serves the image file at `path` as the current capture; the file is read
/// again on every call so an external tool can keep overwriting it.
pub struct ImageFileCapturer {
    path: PathBuf,
}

impl ImageFileCapturer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScreenCapturer for ImageFileCapturer {
    fn capture_visible(&self) -> Result<String, CaptureError> {
        let img = image::open(&self.path)
            .map_err(|e| CaptureError::Unavailable(format!("{}: {}", self.path.display(), e)))?;
        encode_png_data_url(&img.to_rgba8())
    }
}

pub struct BackgroundService {
    tabs: Mutex<TabStateManager>,
    capturer: RwLock<Arc<dyn ScreenCapturer>>,
    exporter: RwLock<Exporter>,
    sink: Arc<dyn DownloadSink>,
}

impl BackgroundService {
    pub fn new(
        settings: &RecorderSettings,
        capturer: Arc<dyn ScreenCapturer>,
        sink: Arc<dyn DownloadSink>,
    ) -> Self {
        let window = Duration::from_millis(settings.timing.sanitize_window_ms);
        Self {
            tabs: Mutex::new(TabStateManager::with_sanitize_window(window)),
            capturer: RwLock::new(capturer),
            exporter: RwLock::new(Exporter::new(settings.page.clone(), settings.export.clone())),
            sink,
        }
    }

    /// Switches to new settings without touching recorded tab state. The
    /// sanitize window, the export layout and naming, and the capture source
    /// apply from the next request on.
    pub fn apply_settings(&self, settings: &RecorderSettings, capturer: Arc<dyn ScreenCapturer>) {
        self.tabs()
            .set_sanitize_window(Duration::from_millis(settings.timing.sanitize_window_ms));
        *self.exporter.write().unwrap_or_else(|poisoned| poisoned.into_inner()) =
            Exporter::new(settings.page.clone(), settings.export.clone());
        *self.capturer.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = capturer;
        debug!("background settings applied");
    }

    /// A poisoned lock only means another handler panicked mid-update; the map
    /// itself is still usable.
    fn tabs(&self) -> MutexGuard<'_, TabStateManager> {
        self.tabs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn tab_count(&self) -> usize {
        self.tabs().tab_count()
    }

    pub fn is_recording(&self, tab_id: TabId) -> bool {
        self.tabs().is_recording(tab_id)
    }

    pub fn editor_open(&self, tab_id: TabId) -> bool {
        self.tabs().get_state(tab_id).is_some_and(|s| s.editor_open)
    }

    /// Answers one request. `sender` is the tab the message came from, used
    /// when the request names no tab itself.
    pub fn handle(&self, sender: Option<TabId>, request: BackgroundRequest) -> BackgroundResponse {
        debug!(action = request.action(), sender = ?sender, "background request");
        let resolve = |explicit: Option<TabId>| explicit.or(sender);

        match request {
            BackgroundRequest::GetSteps { tab_id } => match resolve(tab_id) {
                Some(tab) => BackgroundResponse::Steps(self.tabs().get_steps(tab)),
                None => BackgroundResponse::Steps(Vec::new()),
            },
            BackgroundRequest::CaptureScreenshot => BackgroundResponse::Screenshot(self.capture()),
            BackgroundRequest::DeleteSteps { tab_id } => {
                if let Some(tab) = resolve(tab_id) {
                    self.tabs().clear(tab);
                }
                BackgroundResponse::Ack(Ack::ok())
            }
            BackgroundRequest::UpdateSteps { tab_id, steps } => {
                if let Some(tab) = resolve(tab_id) {
                    self.tabs().replace(tab, steps);
                }
                BackgroundResponse::Ack(Ack::ok())
            }
            BackgroundRequest::SetTabState {
                tab_id,
                is_recording,
                steps,
            } => {
                if let Some(tab) = resolve(tab_id) {
                    self.tabs().set_tab_state(tab, is_recording, steps);
                }
                BackgroundResponse::Ack(Ack::ok())
            }
            BackgroundRequest::GetTabState { tab_id } => match resolve(tab_id) {
                Some(tab) => BackgroundResponse::TabState(self.tabs().get_tab_state(tab)),
                None => BackgroundResponse::TabState(TabStateView::idle()),
            },
            BackgroundRequest::AddNavigationEvent { tab_id, step } => {
                if let Some(tab) = resolve(tab_id) {
                    if !self.tabs().append_step(tab, step) {
                        debug!(tab = %tab, "navigation step dropped, tab not recording");
                    }
                }
                BackgroundResponse::Ack(Ack::ok())
            }
            BackgroundRequest::SetEditorOpen { tab_id, open } => {
                if let Some(tab) = resolve(tab_id) {
                    self.tabs().set_editor_open(tab, open);
                }
                BackgroundResponse::Ack(Ack::ok())
            }
            BackgroundRequest::GenerateDocument { kind, steps } => {
                BackgroundResponse::Export(match self.generate_document(kind, &steps) {
                    Ok(filename) => {
                        info!(kind = kind.label(), filename = %filename, "document saved");
                        ExportOutcome::ok()
                    }
                    Err(e) => {
                        warn!(kind = kind.label(), error = %e, "export failed");
                        ExportOutcome::failed(e.to_string())
                    }
                })
            }
        }
    }

    fn capture(&self) -> Option<String> {
        let capturer = self.capturer.read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone();
        match capturer.capture_visible() {
            Ok(shot) => Some(shot),
            Err(e) => {
                warn!(error = %e, "visible tab capture failed");
                None
            }
        }
    }

    /// Renders and saves a document; returns the saved file name. The
    /// artifact is rendered completely before anything is written.
    pub fn generate_document(&self, kind: ExportKind, steps: &[Step]) -> Result<String, ExportError> {
        if steps.is_empty() {
            return Err(ExportError::Render("no steps to export".to_string()));
        }
        let artifact = self
            .exporter
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .render(kind, steps)?;
        self.sink.save(&artifact)
    }

    /// Tab-updated hook: a recording tab that finished loading gets told
    /// about the navigation so its page script can capture it.
    pub fn on_tab_updated(&self, tab_id: TabId, status: TabLoadStatus, url: Option<String>) -> Option<ContentCommand> {
        if status != TabLoadStatus::Complete || !self.tabs().is_recording(tab_id) {
            return None;
        }
        let url = url?;
        debug!(tab = %tab_id, url = %url, "recording tab navigated");
        Some(ContentCommand::PageNavigated { url })
    }

    /// Tab-removed hook.
    pub fn on_tab_removed(&self, tab_id: TabId) -> bool {
        let removed = self.tabs().remove_tab(tab_id);
        if removed {
            debug!(tab = %tab_id, "tab state destroyed");
        }
        removed
    }
}

/// In-process port delivering requests straight to a [`BackgroundService`]
/// as if sent from `sender`.
#[derive(Clone)]
pub struct LocalPort {
    service: Arc<BackgroundService>,
    sender: Option<TabId>,
}

impl LocalPort {
    pub fn new(service: Arc<BackgroundService>, sender: Option<TabId>) -> Self {
        Self { service, sender }
    }

    pub fn service(&self) -> &Arc<BackgroundService> {
        &self.service
    }
}

#[async_trait]
impl BackgroundPort for LocalPort {
    async fn send(&self, request: BackgroundRequest) -> Result<BackgroundResponse, TransportError> {
        Ok(self.service.handle(self.sender, request))
    }
}

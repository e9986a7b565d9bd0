//! Popup Controller for the step recorder.
//!
//! Decides what the toolbar popup shows and drives the start, show-steps and
//! delete actions against the active tab.

use std::sync::Arc;

use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::services::messaging::{BackgroundClient, BackgroundPort, TabsPort};
use crate::types::errors::TransportError;
use crate::types::message::{ContentCommand, ContentResponse};
use crate::types::settings::TimingSettings;
use crate::types::tab_state::TabId;

pub const UNSUPPORTED_PAGE: &str = "This page does not support recording.";

/// What the popup renders after querying the tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub tab_id: TabId,
    pub record_enabled: bool,
    pub record_title: String,
    /// Show-steps and delete controls are visible only when steps exist.
    pub steps_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyRecording,
}

pub struct PopupController<P: BackgroundPort, T: TabsPort> {
    background: BackgroundClient<P>,
    tabs: Arc<T>,
    timing: TimingSettings,
}

impl<P: BackgroundPort, T: TabsPort> PopupController<P, T> {
    pub fn new(background: BackgroundClient<P>, tabs: Arc<T>, timing: TimingSettings) -> Self {
        Self { background, tabs, timing }
    }

    async fn send(&self, tab_id: TabId, command: ContentCommand) -> Result<ContentResponse, TransportError> {
        let limit = self.timing.request_timeout();
        match timeout(limit, self.tabs.send_to_content(tab_id, command)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(limit)),
        }
    }

    /// Queries the page script and the background concurrently.
    pub async fn open(&self) -> Result<PopupView, TransportError> {
        let tab_id = self.tabs.active_tab().await?;
        let (content, background) = tokio::join!(
            self.send(tab_id, ContentCommand::CheckRecording),
            self.background.get_tab_state(Some(tab_id)),
        );

        let steps_count = match background {
            Ok(view) => view.steps.len(),
            Err(e) => {
                warn!(tab = %tab_id, error = %e, "could not read background state");
                0
            }
        };

        let view = match content {
            Err(e) => {
                debug!(tab = %tab_id, error = %e, "page script unreachable");
                PopupView {
                    tab_id,
                    record_enabled: false,
                    record_title: UNSUPPORTED_PAGE.to_string(),
                    steps_visible: false,
                }
            }
            Ok(ContentResponse::Recording { is_recording: true }) => PopupView {
                tab_id,
                record_enabled: false,
                record_title: "Recording...".to_string(),
                steps_visible: steps_count > 0,
            },
            Ok(_) => PopupView {
                tab_id,
                record_enabled: true,
                record_title: "Start Recording".to_string(),
                steps_visible: steps_count > 0,
            },
        };
        Ok(view)
    }

    /// Pings the page script until it reports ready, a bounded number of times.
    pub async fn wait_for_content_script(&self, tab_id: TabId) -> Result<(), TransportError> {
        let retries = self.timing.probe_retries.max(1);
        for attempt in 1..=retries {
            if let Ok(ContentResponse::Ready { ready: true }) = self.send(tab_id, ContentCommand::Ping).await {
                return Ok(());
            }
            if attempt < retries {
                sleep(self.timing.probe_delay()).await;
            }
        }
        Err(TransportError::Unreachable(format!("page script in tab {} not ready", tab_id)))
    }

    /// Starts recording in the active tab.
    ///
    /// An unreachable page script gets one reload and one retry before the
    /// page is reported as unsupported.
    pub async fn start_recording(&self) -> Result<StartOutcome, TransportError> {
        let tab_id = self.tabs.active_tab().await?;

        let status = match self.send(tab_id, ContentCommand::CheckRecording).await {
            Ok(status) => status,
            Err(first) => {
                warn!(tab = %tab_id, error = %first, "page script unreachable, reloading once");
                self.tabs.reload(tab_id).await?;
                sleep(self.timing.reload_retry_delay()).await;
                self.send(tab_id, ContentCommand::CheckRecording)
                    .await
                    .map_err(|_| TransportError::Unreachable(UNSUPPORTED_PAGE.to_string()))?
            }
        };

        if let ContentResponse::Recording { is_recording: true } = status {
            debug!(tab = %tab_id, "already recording");
            return Ok(StartOutcome::AlreadyRecording);
        }

        sleep(self.timing.start_command_delay()).await;
        self.send(tab_id, ContentCommand::StartRecording)
            .await
            .map_err(|_| TransportError::Unreachable(UNSUPPORTED_PAGE.to_string()))?;
        info!(tab = %tab_id, "start command delivered");
        Ok(StartOutcome::Started)
    }

    /// Opens the in-page editor on the active tab.
    pub async fn show_steps(&self) -> Result<(), TransportError> {
        let tab_id = self.tabs.active_tab().await?;
        self.send(tab_id, ContentCommand::ShowEditorModal)
            .await
            .map_err(|_| TransportError::Unreachable(UNSUPPORTED_PAGE.to_string()))?;
        Ok(())
    }

    /// Clears the active tab's steps; the returned view hides the step controls.
    pub async fn delete_steps(&self, view: &PopupView) -> Result<PopupView, TransportError> {
        self.background.delete_steps(Some(view.tab_id)).await?;
        info!(tab = %view.tab_id, "steps deleted");
        Ok(PopupView {
            steps_visible: false,
            ..view.clone()
        })
    }
}

//! Asynchronous request/response plumbing between contexts.
//!
//! The browser's messaging transport is external; these traits are the seam
//! where it plugs in. Every request is a suspension point bounded by a timeout.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::types::errors::TransportError;
use crate::types::export::{ExportKind, ExportOutcome};
use crate::types::message::{Ack, BackgroundRequest, BackgroundResponse, ContentCommand, ContentResponse};
use crate::types::step::Step;
use crate::types::tab_state::{TabId, TabStateView};

/// Sends requests from a page script or popup to the background process.
#[async_trait]
pub trait BackgroundPort: Send + Sync + 'static {
    async fn send(&self, request: BackgroundRequest) -> Result<BackgroundResponse, TransportError>;
}

/// Browser tab operations available to the popup.
#[async_trait]
pub trait TabsPort: Send + Sync + 'static {
    async fn active_tab(&self) -> Result<TabId, TransportError>;
    /// Delivers a command to the page script of `tab_id`.
    async fn send_to_content(&self, tab_id: TabId, command: ContentCommand) -> Result<ContentResponse, TransportError>;
    async fn reload(&self, tab_id: TabId) -> Result<(), TransportError>;
}

/// Typed, timeout-bounded client over a [`BackgroundPort`].
pub struct BackgroundClient<P: BackgroundPort> {
    port: Arc<P>,
    timeout: Duration,
}

impl<P: BackgroundPort> Clone for BackgroundClient<P> {
    fn clone(&self) -> Self {
        Self {
            port: Arc::clone(&self.port),
            timeout: self.timeout,
        }
    }
}

impl<P: BackgroundPort> BackgroundClient<P> {
    pub fn new(port: Arc<P>, timeout: Duration) -> Self {
        Self { port, timeout }
    }

    pub fn port(&self) -> &Arc<P> {
        &self.port
    }

    pub async fn request(&self, request: BackgroundRequest) -> Result<BackgroundResponse, TransportError> {
        let action = request.action();
        match tokio::time::timeout(self.timeout, self.port.send(request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(action, "background request timed out");
                Err(TransportError::Timeout(self.timeout))
            }
        }
    }

    async fn ack(&self, request: BackgroundRequest) -> Result<Ack, TransportError> {
        let action = request.action();
        match self.request(request).await? {
            BackgroundResponse::Ack(ack) => Ok(ack),
            BackgroundResponse::Export(outcome) => Ok(Ack { success: outcome.success }),
            _ => Err(TransportError::UnexpectedResponse(action.to_string())),
        }
    }

    pub async fn get_steps(&self, tab_id: Option<TabId>) -> Result<Vec<Step>, TransportError> {
        match self.request(BackgroundRequest::GetSteps { tab_id }).await? {
            BackgroundResponse::Steps(steps) => Ok(steps),
            _ => Err(TransportError::UnexpectedResponse("GET_STEPS".to_string())),
        }
    }

    pub async fn capture_screenshot(&self) -> Result<Option<String>, TransportError> {
        match self.request(BackgroundRequest::CaptureScreenshot).await? {
            BackgroundResponse::Screenshot(shot) => Ok(shot),
            _ => Err(TransportError::UnexpectedResponse("CAPTURE_SCREENSHOT".to_string())),
        }
    }

    pub async fn get_tab_state(&self, tab_id: Option<TabId>) -> Result<TabStateView, TransportError> {
        match self.request(BackgroundRequest::GetTabState { tab_id }).await? {
            BackgroundResponse::TabState(view) => Ok(view),
            _ => Err(TransportError::UnexpectedResponse("GET_TAB_STATE".to_string())),
        }
    }

    pub async fn set_tab_state(&self, is_recording: bool, steps: Vec<Step>) -> Result<Ack, TransportError> {
        self.ack(BackgroundRequest::SetTabState {
            tab_id: None,
            is_recording,
            steps,
        })
        .await
    }

    pub async fn update_steps(&self, steps: Vec<Step>) -> Result<Ack, TransportError> {
        self.ack(BackgroundRequest::UpdateSteps { tab_id: None, steps }).await
    }

    pub async fn delete_steps(&self, tab_id: Option<TabId>) -> Result<Ack, TransportError> {
        self.ack(BackgroundRequest::DeleteSteps { tab_id }).await
    }

    pub async fn set_editor_open(&self, open: bool) -> Result<Ack, TransportError> {
        self.ack(BackgroundRequest::SetEditorOpen { tab_id: None, open }).await
    }

    pub async fn generate_document(&self, kind: ExportKind, steps: Vec<Step>) -> Result<ExportOutcome, TransportError> {
        match self.request(BackgroundRequest::GenerateDocument { kind, steps }).await? {
            BackgroundResponse::Export(outcome) => Ok(outcome),
            BackgroundResponse::Ack(ack) if ack.success => Ok(ExportOutcome::ok()),
            _ => Err(TransportError::UnexpectedResponse("GENERATE_DOCUMENT".to_string())),
        }
    }
}

//! Message contract between the page script, the popup and the background process.

use serde::{Deserialize, Serialize};

use super::export::{ExportKind, ExportOutcome};
use super::step::Step;
use super::tab_state::{TabId, TabStateView};

/// Requests handled by the background process.
///
/// `tab_id` is optional on the wire; when absent the sender's tab is used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum BackgroundRequest {
    GetSteps {
        #[serde(default)]
        tab_id: Option<TabId>,
    },
    CaptureScreenshot,
    DeleteSteps {
        #[serde(default)]
        tab_id: Option<TabId>,
    },
    UpdateSteps {
        #[serde(default)]
        tab_id: Option<TabId>,
        steps: Vec<Step>,
    },
    SetTabState {
        #[serde(default)]
        tab_id: Option<TabId>,
        is_recording: bool,
        #[serde(default)]
        steps: Vec<Step>,
    },
    GetTabState {
        #[serde(default)]
        tab_id: Option<TabId>,
    },
    AddNavigationEvent {
        #[serde(default)]
        tab_id: Option<TabId>,
        step: Step,
    },
    SetEditorOpen {
        #[serde(default)]
        tab_id: Option<TabId>,
        open: bool,
    },
    GenerateDocument {
        kind: ExportKind,
        #[serde(default)]
        steps: Vec<Step>,
    },
}

impl BackgroundRequest {
    /// Wire name of the request, used in log lines.
    pub fn action(&self) -> &'static str {
        match self {
            BackgroundRequest::GetSteps { .. } => "GET_STEPS",
            BackgroundRequest::CaptureScreenshot => "CAPTURE_SCREENSHOT",
            BackgroundRequest::DeleteSteps { .. } => "DELETE_STEPS",
            BackgroundRequest::UpdateSteps { .. } => "UPDATE_STEPS",
            BackgroundRequest::SetTabState { .. } => "SET_TAB_STATE",
            BackgroundRequest::GetTabState { .. } => "GET_TAB_STATE",
            BackgroundRequest::AddNavigationEvent { .. } => "ADD_NAVIGATION_EVENT",
            BackgroundRequest::SetEditorOpen { .. } => "SET_EDITOR_OPEN",
            BackgroundRequest::GenerateDocument { .. } => "GENERATE_DOCUMENT",
        }
    }
}

/// Acknowledgement for write requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Responses produced by the background process.
///
/// On the wire an acknowledgement and a successful export look the same, so
/// decoding yields `Export` for both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum BackgroundResponse {
    Steps(Vec<Step>),
    Screenshot(Option<String>),
    Export(ExportOutcome),
    Ack(Ack),
    TabState(TabStateView),
}

/// Commands delivered to the page script of one tab.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentCommand {
    CheckRecording,
    StartRecording,
    Ping,
    ShowEditorModal,
    CloseEditorModal,
    PageNavigated { url: String },
}

/// Replies from the page script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ContentResponse {
    Recording {
        #[serde(rename = "isRecording")]
        is_recording: bool,
    },
    Ready { ready: bool },
    Ack(Ack),
    None,
}

/// Load status reported by the browser's tab-updated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabLoadStatus {
    Loading,
    Complete,
}

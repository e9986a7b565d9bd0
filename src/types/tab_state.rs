use serde::{Deserialize, Serialize};

use super::step::Step;

/// Opaque browser tab handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recording phase derived from a tab's stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingPhase {
    Idle,
    Recording,
    StoppedWithSteps,
}

/// Authoritative per-tab recording record owned by the background process.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabRecordingState {
    pub is_recording: bool,
    pub steps: Vec<Step>,
    /// Milliseconds since the Unix epoch; present only while the latest
    /// transition was a stop.
    pub recording_stopped_at: Option<i64>,
    pub editor_open: bool,
    /// Last stop time, kept across restarts for the read debounce.
    #[serde(skip)]
    pub(crate) last_stop_at: Option<i64>,
}

impl TabRecordingState {
    pub fn phase(&self) -> RecordingPhase {
        if self.is_recording {
            RecordingPhase::Recording
        } else if self.steps.is_empty() {
            RecordingPhase::Idle
        } else {
            RecordingPhase::StoppedWithSteps
        }
    }
}

/// What a `GetTabState` read returns.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TabStateView {
    pub is_recording: bool,
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_stopped_at: Option<i64>,
}

impl TabStateView {
    /// The idle view: not recording, no steps.
    pub fn idle() -> Self {
        Self::default()
    }
}

impl From<&TabRecordingState> for TabStateView {
    fn from(state: &TabRecordingState) -> Self {
        Self {
            is_recording: state.is_recording,
            steps: state.steps.clone(),
            recording_stopped_at: state.recording_stopped_at,
        }
    }
}

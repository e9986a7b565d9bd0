//! Tab State Manager for the step recorder.
//!
//! Keyed store of per-tab recording state, owned by the background process.
//! Every transition is driven by an explicit call; nothing is inferred.
//! Operations on tabs without an entry are no-ops (reads return the idle view),
//! except writes, which create the entry lazily.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::types::step::Step;
use crate::types::tab_state::{RecordingPhase, TabId, TabRecordingState, TabStateView};

/// Grace window after a stop during which reads report the idle view.
pub const DEFAULT_SANITIZE_WINDOW: Duration = Duration::from_secs(5);

/// Trait defining the tab recording state interface.
pub trait TabStateManagerTrait {
    /// Idle/StoppedWithSteps → Recording. Steps are reset to empty.
    fn start(&mut self, tab_id: TabId);
    /// Recording → Recording with one more step. Returns false when the tab is not recording.
    fn append_step(&mut self, tab_id: TabId, step: Step) -> bool;
    /// Recording → StoppedWithSteps, stamping the stop time.
    fn stop(&mut self, tab_id: TabId);
    /// Any → Idle.
    fn clear(&mut self, tab_id: TabId);
    /// Full step-list replacement; the recording flag is untouched.
    fn replace(&mut self, tab_id: TabId, steps: Vec<Step>);
    /// Applies a `SetTabState` message: start or stop as needed, then replace the steps.
    fn set_tab_state(&mut self, tab_id: TabId, is_recording: bool, steps: Vec<Step>);
    fn set_editor_open(&mut self, tab_id: TabId, open: bool);
    fn get_steps(&self, tab_id: TabId) -> Vec<Step>;
    /// Sanitized read; see [`TabStateManager::get_tab_state_at`].
    fn get_tab_state(&self, tab_id: TabId) -> TabStateView;
    fn get_state(&self, tab_id: TabId) -> Option<&TabRecordingState>;
    fn phase(&self, tab_id: TabId) -> RecordingPhase;
    fn is_recording(&self, tab_id: TabId) -> bool;
    /// Drops the entry of a closed tab.
    fn remove_tab(&mut self, tab_id: TabId) -> bool;
    fn tab_count(&self) -> usize;
}

/// In-memory per-tab recording state store.
pub struct TabStateManager {
    tabs: HashMap<TabId, TabRecordingState>,
    sanitize_window: Duration,
}

impl TabStateManager {
    pub fn new() -> Self {
        Self::with_sanitize_window(DEFAULT_SANITIZE_WINDOW)
    }

    pub fn with_sanitize_window(sanitize_window: Duration) -> Self {
        Self {
            tabs: HashMap::new(),
            sanitize_window,
        }
    }

    pub fn set_sanitize_window(&mut self, sanitize_window: Duration) {
        self.sanitize_window = sanitize_window;
    }

    pub fn now_ms() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64
    }

    fn entry(&mut self, tab_id: TabId) -> &mut TabRecordingState {
        self.tabs.entry(tab_id).or_default()
    }

    pub fn stop_at(&mut self, tab_id: TabId, now_ms: i64) {
        let state = self.entry(tab_id);
        state.is_recording = false;
        state.recording_stopped_at = Some(now_ms);
        state.last_stop_at = Some(now_ms);
        debug!(tab = %tab_id, steps = state.steps.len(), "recording stopped");
    }

    pub fn set_tab_state_at(&mut self, tab_id: TabId, is_recording: bool, steps: Vec<Step>, now_ms: i64) {
        let was_recording = self.is_recording(tab_id);
        if is_recording {
            if !was_recording {
                self.start(tab_id);
            }
        } else {
            self.stop_at(tab_id, now_ms);
        }
        self.replace(tab_id, steps);
    }

    /// Reads a tab's state as of `now_ms`.
    ///
    /// Within the sanitize window after the latest stop the idle view is
    /// returned whatever is stored, so a stop that narrowly overlaps a restart
    /// never leaks a stale "still recording" view. Outside the window the
    /// stored state is returned as is.
    pub fn get_tab_state_at(&self, tab_id: TabId, now_ms: i64) -> TabStateView {
        let Some(state) = self.tabs.get(&tab_id) else {
            return TabStateView::idle();
        };
        if let Some(stopped_at) = state.last_stop_at {
            let elapsed = now_ms.saturating_sub(stopped_at);
            if elapsed >= 0 && (elapsed as u128) < self.sanitize_window.as_millis() {
                return TabStateView::idle();
            }
        }
        TabStateView::from(state)
    }
}

impl Default for TabStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabStateManagerTrait for TabStateManager {
    fn start(&mut self, tab_id: TabId) {
        let state = self.entry(tab_id);
        state.is_recording = true;
        state.steps.clear();
        state.recording_stopped_at = None;
        debug!(tab = %tab_id, "recording started");
    }

    fn append_step(&mut self, tab_id: TabId, step: Step) -> bool {
        let state = self.entry(tab_id);
        if !state.is_recording {
            debug!(tab = %tab_id, "ignoring step for a tab that is not recording");
            return false;
        }
        state.steps.push(step);
        true
    }

    fn stop(&mut self, tab_id: TabId) {
        self.stop_at(tab_id, Self::now_ms());
    }

    fn clear(&mut self, tab_id: TabId) {
        if let Some(state) = self.tabs.get_mut(&tab_id) {
            state.steps.clear();
            if state.is_recording {
                state.is_recording = false;
                let now = Self::now_ms();
                state.recording_stopped_at = Some(now);
                state.last_stop_at = Some(now);
            }
        }
    }

    fn replace(&mut self, tab_id: TabId, steps: Vec<Step>) {
        self.entry(tab_id).steps = steps;
    }

    fn set_tab_state(&mut self, tab_id: TabId, is_recording: bool, steps: Vec<Step>) {
        self.set_tab_state_at(tab_id, is_recording, steps, Self::now_ms());
    }

    fn set_editor_open(&mut self, tab_id: TabId, open: bool) {
        self.entry(tab_id).editor_open = open;
    }

    fn get_steps(&self, tab_id: TabId) -> Vec<Step> {
        self.tabs.get(&tab_id).map(|s| s.steps.clone()).unwrap_or_default()
    }

    fn get_tab_state(&self, tab_id: TabId) -> TabStateView {
        self.get_tab_state_at(tab_id, Self::now_ms())
    }

    fn get_state(&self, tab_id: TabId) -> Option<&TabRecordingState> {
        self.tabs.get(&tab_id)
    }

    fn phase(&self, tab_id: TabId) -> RecordingPhase {
        self.tabs
            .get(&tab_id)
            .map(TabRecordingState::phase)
            .unwrap_or(RecordingPhase::Idle)
    }

    fn is_recording(&self, tab_id: TabId) -> bool {
        self.tabs.get(&tab_id).map(|s| s.is_recording).unwrap_or(false)
    }

    fn remove_tab(&mut self, tab_id: TabId) -> bool {
        self.tabs.remove(&tab_id).is_some()
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}

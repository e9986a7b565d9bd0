//! Event Observer for the step recorder.
//!
//! Runs inside the page. Turns clicks, committed text entry and navigations
//! into annotated [`Step`]s, keeps a shadow copy of the tab's recording state
//! and pushes the whole step list to the background after every change.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{sleep, sleep_until, Duration, Instant};
use tracing::{debug, info, warn};

use crate::services::annotator::{self, composite};
use crate::services::editor_session::EditorSession;
use crate::services::messaging::{BackgroundClient, BackgroundPort};
use crate::services::screenshot_cache::ScreenshotCache;
use crate::types::export::{ExportKind, ExportOutcome};
use crate::types::message::{Ack, ContentCommand, ContentResponse};
use crate::types::page::{ElementSnapshot, PageEvent, PageLifecycle};
use crate::types::settings::{AnnotationSettings, RecorderSettings, TimingSettings};
use crate::types::step::{Highlight, Step, Viewport};

/// The page-side rendering surface: indicator, notices and the editor overlay.
pub trait PageSurface: Send + Sync + 'static {
    fn viewport(&self) -> Viewport;
    fn set_recording_indicator(&self, visible: bool);
    fn show_capture_started(&self);
    fn show_editor(&self, steps: &[Step]);
    fn dismiss_editor(&self);
    /// Blocking notice shown to the user.
    fn notify(&self, message: &str);
}

/// Nearest `LI` ancestor of the clicked element, or the element itself when
/// the walk reaches `BODY` first.
pub fn resolve_target(element: &ElementSnapshot) -> &ElementSnapshot {
    let mut current = Some(element);
    while let Some(el) = current {
        if el.is_body() {
            break;
        }
        if el.is_tag("LI") {
            return el;
        }
        current = el.parent.as_deref();
    }
    element
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Accessible label, form labels, placeholder, alt, then visible text.
fn element_label(element: &ElementSnapshot) -> Option<String> {
    if let Some(label) = non_blank(&element.aria_label) {
        return Some(label);
    }
    let labels: Vec<&str> = element
        .label_texts
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if !labels.is_empty() {
        return Some(labels.join(", "));
    }
    non_blank(&element.placeholder)
        .or_else(|| non_blank(&element.alt))
        .or_else(|| non_blank(&element.inner_text))
}

fn input_type(element: &ElementSnapshot) -> &str {
    element.input_type.as_deref().unwrap_or("text")
}

pub fn describe_click(element: &ElementSnapshot) -> String {
    if let Some(label) = element_label(element) {
        return format!("Click on {}", label);
    }
    if element.is_tag("BUTTON") {
        "Click on button".to_string()
    } else if element.is_tag("A") {
        "Click on link".to_string()
    } else if element.is_tag("INPUT") {
        format!("Click on input ({})", input_type(element))
    } else {
        format!("Click on {}", element.tag_name.to_ascii_lowercase())
    }
}

/// Field name used in text-entry descriptions.
pub fn describe_input(element: &ElementSnapshot) -> String {
    if let Some(label) = element_label(element) {
        return label;
    }
    if element.is_tag("INPUT") {
        format!("{} field", input_type(element))
    } else {
        "input field".to_string()
    }
}

pub fn describe_text_entry(element: &ElementSnapshot) -> String {
    format!(
        "Entered text in {}: \"{}\"",
        describe_input(element),
        element.value.as_deref().unwrap_or("")
    )
}

pub struct EventObserver<P: BackgroundPort, S: PageSurface> {
    client: BackgroundClient<P>,
    surface: Arc<S>,
    cache: ScreenshotCache<P>,
    timing: TimingSettings,
    annotation: AnnotationSettings,
    is_recording: bool,
    steps: Vec<Step>,
    lifecycle: PageLifecycle,
    /// Commands arriving before this instant see a not-yet-ready page.
    ready_at: Option<Instant>,
    /// Start commands are ignored until this instant after an automatic reset.
    suppress_until: Option<Instant>,
    editor: Option<EditorSession<P>>,
    pending_writes: Vec<JoinHandle<()>>,
}

impl<P: BackgroundPort, S: PageSurface> EventObserver<P, S> {
    pub fn new(client: BackgroundClient<P>, surface: Arc<S>, settings: &RecorderSettings) -> Self {
        let cache = ScreenshotCache::new(client.clone(), settings.timing.screenshot_interval());
        Self {
            client,
            surface,
            cache,
            timing: settings.timing.clone(),
            annotation: settings.annotation.clone(),
            is_recording: false,
            steps: Vec::new(),
            lifecycle: PageLifecycle::InitialLoad,
            ready_at: None,
            suppress_until: None,
            editor: None,
            pending_writes: Vec::new(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn lifecycle(&self) -> PageLifecycle {
        self.lifecycle
    }

    pub fn is_ready(&self) -> bool {
        self.ready_at.map_or(true, |at| Instant::now() >= at)
    }

    pub fn is_start_suppressed(&self) -> bool {
        self.suppress_until.is_some_and(|until| Instant::now() < until)
    }

    pub fn cache(&self) -> &ScreenshotCache<P> {
        &self.cache
    }

    pub fn editor(&self) -> Option<&EditorSession<P>> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditorSession<P>> {
        self.editor.as_mut()
    }

    /// Brings a fresh page context in line with the background state.
    ///
    /// A history restore is never a continuation: the page is forced idle and
    /// commands are held off for the ready delay. Any other load resumes the
    /// stored session when the background still reports it as recording.
    pub async fn initialize(&mut self, lifecycle: PageLifecycle) {
        self.lifecycle = lifecycle;

        if lifecycle == PageLifecycle::HistoryRestore {
            self.reset_local();
            self.ready_at = Some(Instant::now() + self.timing.ready_delay());
            info!("page restored from history cache, recording state discarded");
            return;
        }

        self.ready_at = None;
        match self.client.get_tab_state(None).await {
            Ok(view) if view.is_recording => {
                self.is_recording = true;
                self.steps = view.steps;
                self.surface.set_recording_indicator(true);
                self.cache.start();
                info!(steps = self.steps.len(), "recording resumed after page load");
            }
            Ok(_) => self.clean_reset(),
            Err(e) => {
                warn!(error = %e, "could not read tab state, starting idle");
                self.clean_reset();
            }
        }
    }

    fn reset_local(&mut self) {
        self.is_recording = false;
        self.steps.clear();
        self.surface.set_recording_indicator(false);
        self.cache.stop();
    }

    fn clean_reset(&mut self) {
        self.reset_local();
        self.suppress_until = Some(Instant::now() + self.timing.cleanup_suppress());
        debug!("clean idle reset, start commands suppressed briefly");
    }

    pub async fn handle_page_event(&mut self, event: PageEvent) {
        match event {
            PageEvent::Click(element) => {
                if !self.is_recording || element.recorder_control {
                    return;
                }
                let target = resolve_target(&element);
                let description = describe_click(target);
                let rect = target.rect;
                self.capture_step(description, rect).await;
            }
            PageEvent::InputBlur(element) => {
                if !self.is_recording || element.recorder_control || !element.accepts_text() {
                    return;
                }
                let description = describe_text_entry(&element);
                self.capture_step(description, element.rect).await;
            }
            PageEvent::PageShow { persisted } => {
                let lifecycle = if persisted {
                    PageLifecycle::HistoryRestore
                } else {
                    PageLifecycle::NormalLoad
                };
                self.initialize(lifecycle).await;
            }
            PageEvent::PageHide => self.cache.stop(),
            PageEvent::VisibilityChange { hidden: true } => self.cache.stop(),
            PageEvent::VisibilityChange { hidden: false } => {
                if self.is_recording {
                    self.cache.start();
                } else {
                    self.surface.set_recording_indicator(false);
                    self.cache.stop();
                }
            }
            PageEvent::StopControl => self.stop_recording(),
        }
    }

    /// Answers a command sent by the popup or the background.
    pub async fn handle_command(&mut self, command: ContentCommand) -> ContentResponse {
        if !self.is_ready() {
            match command {
                ContentCommand::CheckRecording => return ContentResponse::Recording { is_recording: false },
                ContentCommand::Ping => return ContentResponse::Ready { ready: false },
                ContentCommand::StartRecording => {
                    if let Some(at) = self.ready_at {
                        sleep_until(at).await;
                    }
                    sleep(self.timing.start_retry_delay()).await;
                }
                _ => return ContentResponse::None,
            }
        }

        match command {
            ContentCommand::Ping => ContentResponse::Ready { ready: true },
            ContentCommand::CheckRecording => ContentResponse::Recording {
                is_recording: self.is_recording,
            },
            ContentCommand::StartRecording => ContentResponse::Ack(self.start_recording().await),
            ContentCommand::ShowEditorModal => {
                let steps = match self.client.get_steps(None).await {
                    Ok(steps) => steps,
                    Err(e) => {
                        warn!(error = %e, "could not load steps for the editor");
                        Vec::new()
                    }
                };
                self.open_editor(steps);
                ContentResponse::Ack(Ack::ok())
            }
            ContentCommand::CloseEditorModal => {
                self.close_editor();
                ContentResponse::Ack(Ack::ok())
            }
            ContentCommand::PageNavigated { url } => {
                if self.is_recording {
                    self.capture_navigation(&url).await;
                }
                ContentResponse::Ack(Ack::ok())
            }
        }
    }

    /// Shows the capture-started notice, waits for it to fade, then begins a
    /// fresh recording. Ignored while recording or right after a clean reset.
    pub async fn start_recording(&mut self) -> Ack {
        if self.is_recording {
            debug!("start ignored, already recording");
            return Ack { success: false };
        }
        if self.is_start_suppressed() {
            debug!("start ignored, page was just reset");
            return Ack { success: false };
        }

        self.surface.show_capture_started();
        sleep(self.timing.start_delay()).await;

        self.is_recording = true;
        self.steps.clear();
        self.surface.set_recording_indicator(true);
        self.cache.start();
        self.push_state(true, Vec::new());
        info!("recording started");
        Ack::ok()
    }

    /// Stops recording and opens the editor on what was captured.
    pub fn stop_recording(&mut self) {
        if !self.is_recording {
            return;
        }
        self.is_recording = false;
        self.surface.set_recording_indicator(false);
        self.cache.stop();
        self.push_state(false, self.steps.clone());
        info!(steps = self.steps.len(), "recording stopped");
        let steps = self.steps.clone();
        self.open_editor(steps);
    }

    fn open_editor(&mut self, steps: Vec<Step>) {
        self.surface.show_editor(&steps);
        self.editor = Some(EditorSession::new(self.client.clone(), steps));
        let client = self.client.clone();
        self.track(tokio::spawn(async move {
            if let Err(e) = client.set_editor_open(true).await {
                warn!(error = %e, "could not mark editor open");
            }
        }));
    }

    /// Closes the editor, keeping the edited steps while recording stays off.
    pub fn close_editor(&mut self) {
        let Some(editor) = self.editor.take() else {
            return;
        };
        self.is_recording = false;
        self.surface.set_recording_indicator(false);
        self.cache.stop();
        self.surface.dismiss_editor();

        let steps = editor.into_steps();
        self.steps = steps.clone();
        self.push_state(false, steps);
        let client = self.client.clone();
        self.track(tokio::spawn(async move {
            if let Err(e) = client.set_editor_open(false).await {
                warn!(error = %e, "could not mark editor closed");
            }
        }));
    }

    /// Deletes a step from the open editor and redraws it.
    pub async fn delete_editor_step(&mut self, index: usize) -> bool {
        let Some(editor) = self.editor.as_mut() else {
            return false;
        };
        match editor.delete_step(index).await {
            Ok(deleted) => {
                if deleted {
                    self.surface.show_editor(editor.steps());
                }
                deleted
            }
            Err(e) => {
                warn!(error = %e, "could not sync deleted step");
                self.surface.show_editor(editor.steps());
                true
            }
        }
    }

    /// Exports the editor's steps, surfacing any failure as a notice.
    pub async fn export(&mut self, kind: ExportKind) -> ExportOutcome {
        let outcome = match self.editor.as_ref() {
            Some(editor) => editor.export(kind).await,
            None => ExportOutcome::failed("The editor is not open"),
        };
        if let Some(error) = outcome.error.as_deref() {
            self.surface.notify(error);
        }
        outcome
    }

    async fn capture_step(&mut self, description: String, rect: Highlight) {
        let viewport = self.surface.viewport();
        let step = match self.cache.latest_or_capture().await {
            Some(shot) => {
                let style = &self.annotation;
                let annotated = composite(&shot, |w, h| {
                    annotator::highlight_annotations(rect, w, h, viewport, style)
                })
                .unwrap_or_else(|e| {
                    warn!(error = %e, "annotation failed, keeping raw capture");
                    shot
                });
                Step::text(description).with_screenshot(annotated)
            }
            None => {
                warn!("no capture available, recording step without screenshot");
                Step::text(description)
            }
        };

        // The capture may resolve after recording moved on.
        if !self.is_recording {
            return;
        }
        self.steps.push(step.with_highlight(rect));
        self.push_state(true, self.steps.clone());
    }

    async fn capture_navigation(&mut self, url: &str) {
        for wait in self.timing.navigation_settle_ms.clone() {
            sleep(Duration::from_millis(wait)).await;
        }
        if !self.is_recording {
            return;
        }

        let viewport = self.surface.viewport();
        let strip = Highlight::new(0.0, 0.0, viewport.width, self.annotation.navigation_strip_height);
        let description = format!("Navigated to {}", url);
        let step = match self.cache.capture_now().await {
            Some(shot) => {
                let style = &self.annotation;
                let annotated = composite(&shot, |w, h| annotator::navigation_annotations(w, h, viewport, style))
                    .unwrap_or_else(|e| {
                        warn!(error = %e, "annotation failed, keeping raw capture");
                        shot
                    });
                Step::text(description).with_screenshot(annotated)
            }
            None => Step::text(description),
        };

        if !self.is_recording {
            return;
        }
        self.steps.push(step.with_highlight(strip));
        self.push_state(true, self.steps.clone());
    }

    /// Sends the full step list without waiting for the reply.
    fn push_state(&mut self, is_recording: bool, steps: Vec<Step>) {
        let client = self.client.clone();
        self.track(tokio::spawn(async move {
            if let Err(e) = client.set_tab_state(is_recording, steps).await {
                warn!(error = %e, "tab state write failed");
            }
        }));
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.pending_writes.retain(|h| !h.is_finished());
        self.pending_writes.push(handle);
    }

    /// Waits for every in-flight write to the background.
    pub async fn flush(&mut self) {
        for handle in self.pending_writes.drain(..) {
            let _ = handle.await;
        }
    }
}

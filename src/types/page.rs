//! Page-side inputs: element snapshots and lifecycle events.

use serde::{Deserialize, Serialize};

use super::step::Highlight;

/// Snapshot of a DOM element taken when an event fires, with its ancestor chain.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    /// Upper-case tag name (`BUTTON`, `A`, `INPUT`, `LI`, ...).
    pub tag_name: String,
    #[serde(default)]
    pub aria_label: Option<String>,
    /// Text of the `<label>` elements associated with a form control.
    #[serde(default)]
    pub label_texts: Vec<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub inner_text: Option<String>,
    /// `type` attribute of an input element.
    #[serde(default)]
    pub input_type: Option<String>,
    /// Current value of a form control.
    #[serde(default)]
    pub value: Option<String>,
    /// Bounding client rectangle in viewport CSS pixels.
    #[serde(default)]
    pub rect: Highlight,
    /// Set when the element belongs to the recorder's own on-page control.
    #[serde(default)]
    pub recorder_control: bool,
    #[serde(default)]
    pub parent: Option<Box<ElementSnapshot>>,
}

impl ElementSnapshot {
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_ascii_uppercase(),
            ..Self::default()
        }
    }

    pub fn is_body(&self) -> bool {
        self.tag_name.eq_ignore_ascii_case("BODY")
    }

    pub fn is_tag(&self, tag: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag)
    }

    /// True for controls whose edits are committed as text-entry steps.
    pub fn accepts_text(&self) -> bool {
        if self.is_tag("TEXTAREA") {
            return true;
        }
        if !self.is_tag("INPUT") {
            return false;
        }
        !matches!(
            self.input_type.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("button" | "submit" | "reset" | "checkbox" | "radio" | "file" | "image" | "hidden" | "range" | "color")
        )
    }
}

/// DOM and page lifecycle events observed while the page script runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    Click(ElementSnapshot),
    InputBlur(ElementSnapshot),
    /// `persisted` is true when the page came back from the back/forward cache.
    PageShow { persisted: bool },
    PageHide,
    VisibilityChange { hidden: bool },
    /// The on-page recording indicator was clicked.
    StopControl,
}

/// Why the page script is running in a fresh page context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLifecycle {
    InitialLoad,
    NormalLoad,
    HistoryRestore,
}

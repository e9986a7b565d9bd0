use serde::{Deserialize, Serialize};

/// Viewport-relative rectangle marking the element a step interacted with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct Highlight {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Highlight {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

/// One recorded unit of user interaction.
///
/// `screenshot` holds an encoded image (a `data:image/png;base64,` URL). Only
/// `description` is edited after the step is appended.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Step {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight: Option<Highlight>,
}

impl Step {
    /// Creates a text-only step.
    pub fn text(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            screenshot: None,
            highlight: None,
        }
    }

    pub fn with_screenshot(mut self, screenshot: impl Into<String>) -> Self {
        self.screenshot = Some(screenshot.into());
        self
    }

    pub fn with_highlight(mut self, highlight: Highlight) -> Self {
        self.highlight = Some(highlight);
        self
    }
}

/// CSS-pixel dimensions of the page viewport.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280.0, height: 720.0 }
    }
}

use serde::{Deserialize, Serialize};

/// Pixel dimensions of an image placed by the layout engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

/// One step as seen by the layout engine: its description and, if the step
/// carries a screenshot, the screenshot's natural size.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutBlock {
    pub description: String,
    pub image: Option<ImageSize>,
}

/// A positioned drawing instruction. Coordinates use the PDF convention:
/// origin at the bottom-left corner of the page, `y` growing upwards.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// Starts a new page; every following op lands on it.
    PageBreak,
    /// Places the image of step `step_index` with its lower-left corner at (`x`, `y`).
    Image {
        step_index: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// Thin frame drawn around a placed image.
    Border {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    /// One wrapped text line with its baseline at (`x`, `y`).
    Text { text: String, x: f64, y: f64, size: f64 },
}

/// Result of paginating a step sequence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub page_count: usize,
    pub ops: Vec<DrawOp>,
}

impl PageLayout {
    /// Ops grouped by page, in page order.
    pub fn pages(&self) -> Vec<Vec<&DrawOp>> {
        let mut pages: Vec<Vec<&DrawOp>> = vec![Vec::new()];
        for op in &self.ops {
            match op {
                DrawOp::PageBreak => pages.push(Vec::new()),
                other => {
                    if let Some(page) = pages.last_mut() {
                        page.push(other);
                    }
                }
            }
        }
        pages
    }
}

//! Layout engine for the paged export.
//!
//! Single greedy pass over the steps: every step is numbered, wrapped to the
//! content width with real glyph metrics, its screenshot scaled into the
//! content box and centered, and a page break is emitted whenever the next
//! block would cross the bottom margin. Nothing placed is ever revisited.

use crate::services::text_metrics::TextMeasurer;
use crate::types::layout::{DrawOp, ImageSize, LayoutBlock, PageLayout};
use crate::types::settings::PageSettings;
use crate::types::step::Step;

/// Prefixes a description with its 1-based step number.
pub fn numbered_description(index: usize, description: &str) -> String {
    format!("Step {}: {}", index + 1, description)
}

/// Byte offset just past the first `n` characters of `s`.
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Number of leading characters of `word` (at least one) that fit in `max_width`.
fn fitting_prefix<M: TextMeasurer>(word: &str, measurer: &M, size: f64, max_width: f64) -> usize {
    let total = word.chars().count();
    let mut fit = 1;
    while fit < total && measurer.width_of(&word[..char_offset(word, fit + 1)], size) <= max_width {
        fit += 1;
    }
    fit
}

/// Wraps `text` into lines no wider than `max_width`.
///
/// Each newline-separated paragraph is wrapped on its own. Words are added
/// greedily; a word wider than the budget is split character by character.
/// The first word of a paragraph is special-cased: as much of it as fits is
/// kept on the first line instead of leaving that line empty.
pub fn wrap_text<M: TextMeasurer>(text: &str, measurer: &M, size: f64, max_width: f64) -> Vec<String> {
    let width = |s: &str| measurer.width_of(s, size);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for (i, raw_word) in paragraph.split(' ').enumerate() {
            let mut word = raw_word;

            if i == 0 && !word.is_empty() && width(word) > max_width {
                let mut fit = 0;
                let total = word.chars().count();
                while fit < total && width(&word[..char_offset(word, fit + 1)]) <= max_width {
                    fit += 1;
                }
                let fit = fit.max(1);
                let (head, rest) = word.split_at(char_offset(word, fit));
                lines.push(head.to_string());
                word = rest;
                while !word.is_empty() {
                    let fit = fitting_prefix(word, measurer, size, max_width);
                    let (head, rest) = word.split_at(char_offset(word, fit));
                    lines.push(head.to_string());
                    word = rest;
                }
                continue;
            }

            while width(word) > max_width {
                let fit = fitting_prefix(word, measurer, size, max_width);
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let (head, rest) = word.split_at(char_offset(word, fit));
                lines.push(head.to_string());
                word = rest;
            }

            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if width(&candidate) > max_width && !line.is_empty() {
                lines.push(std::mem::replace(&mut line, word.to_string()));
            } else {
                line = candidate;
            }
        }
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Scales an image uniformly into the `max_width` x `max_height` box, never upscaling.
pub fn fit_image(size: ImageSize, max_width: f64, max_height: f64) -> ImageSize {
    if size.width <= 0.0 || size.height <= 0.0 {
        return ImageSize { width: 0.0, height: 0.0 };
    }
    let scale = (max_width / size.width).min(max_height / size.height).min(1.0);
    ImageSize {
        width: size.width * scale,
        height: size.height * scale,
    }
}

/// Builds layout blocks for `steps`, asking `image_size` for each screenshot's size.
pub fn blocks_for_steps<F>(steps: &[Step], mut image_size: F) -> Vec<LayoutBlock>
where
    F: FnMut(usize, &str) -> Option<ImageSize>,
{
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| LayoutBlock {
            description: step.description.clone(),
            image: step.screenshot.as_deref().and_then(|s| image_size(i, s)),
        })
        .collect()
}

/// Greedy paginator over a fixed page geometry.
pub struct LayoutEngine<M: TextMeasurer> {
    page: PageSettings,
    measurer: M,
}

impl<M: TextMeasurer> LayoutEngine<M> {
    pub fn new(page: PageSettings, measurer: M) -> Self {
        Self { page, measurer }
    }

    pub fn page(&self) -> &PageSettings {
        &self.page
    }

    pub fn measurer(&self) -> &M {
        &self.measurer
    }

    /// Lays out `blocks` in order. Block `i` is rendered as "Step i+1: ...".
    pub fn layout(&self, blocks: &[LayoutBlock]) -> PageLayout {
        let page = &self.page;
        let top = page.height - page.margin;
        let content_width = page.content_width();
        let line_height = page.line_height();
        let min_text_block = line_height + page.padding;
        let max_image_height = page.usable_image_height();

        let mut ops = Vec::new();
        let mut page_count = 1;
        let mut y = top;

        let mut new_page = |ops: &mut Vec<DrawOp>, y: &mut f64| {
            // A break on an untouched page would only add a blank page.
            if *y < top {
                ops.push(DrawOp::PageBreak);
                page_count += 1;
                *y = top;
            }
        };

        for (index, block) in blocks.iter().enumerate() {
            let text = numbered_description(index, &block.description);
            let lines = wrap_text(&text, &self.measurer, page.font_size, content_width);

            match block.image {
                Some(natural) => {
                    let scaled = fit_image(natural, content_width, max_image_height);
                    if y - scaled.height - min_text_block < page.margin {
                        new_page(&mut ops, &mut y);
                    }
                    let x = page.margin + (content_width - scaled.width) / 2.0;
                    let bottom = y - scaled.height;
                    ops.push(DrawOp::Image {
                        step_index: index,
                        x,
                        y: bottom,
                        width: scaled.width,
                        height: scaled.height,
                    });
                    ops.push(DrawOp::Border {
                        x,
                        y: bottom,
                        width: scaled.width,
                        height: scaled.height,
                    });
                    y -= scaled.height + page.padding;
                }
                None => {
                    if y - min_text_block < page.margin {
                        new_page(&mut ops, &mut y);
                    }
                }
            }

            for line in lines {
                if y - line_height < page.margin {
                    new_page(&mut ops, &mut y);
                }
                ops.push(DrawOp::Text {
                    text: line,
                    x: page.margin,
                    y: y - page.font_size,
                    size: page.font_size,
                });
                y -= line_height;
            }
            y -= page.padding;
        }

        PageLayout { page_count, ops }
    }
}

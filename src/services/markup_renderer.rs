//! Static markup renderers: a styled HTML document and the same document
//! flagged for word processors. Screenshots stay inline as data URIs and the
//! viewing surface scrolls, so there is no pagination here.

use crate::types::step::Step;

const WORD_COMPATIBILITY_MARKER: &str =
    "<xml><w:wordDocument xmlns:w=\"http://schemas.microsoft.com/office/word/2003/wordml\"></w:wordDocument></xml>";

const STYLESHEET: &str = "    body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; color: #111827; background: #ffffff; margin: 24px; }
    .container { max-width: 840px; margin: 0 auto; }
    h1 { font-size: 22px; margin: 0 0 16px 0; }
    .step { border: 1px solid #e5e7eb; border-radius: 8px; padding: 16px; margin-bottom: 16px; }
    .step h2 { font-size: 16px; margin: 0 0 8px 0; color: #111827; }
    .desc { font-size: 14px; margin-bottom: 12px; color: #374151; white-space: pre-wrap; }
    img.step-img { width: 100%; height: auto; border: 1px solid #e5e7eb; border-radius: 6px; }";

/// Markup flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupFlavor {
    Html,
    Word,
}

/// Escapes `&`, `<` and `>`; nothing else is touched.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes a value placed inside a double-quoted attribute.
fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

/// Renders one container block for the step at `index`.
pub fn render_step_block(index: usize, step: &Step) -> String {
    let number = index + 1;
    let mut block = String::new();
    block.push_str("      <div class=\"step\">\n");
    block.push_str(&format!("        <h2>Step {}</h2>\n", number));
    block.push_str(&format!("        <div class=\"desc\">{}</div>\n", escape_text(&step.description)));
    if let Some(screenshot) = step.screenshot.as_deref().filter(|s| !s.is_empty()) {
        block.push_str(&format!(
            "        <img class=\"step-img\" src=\"{}\" alt=\"Step {}\" />\n",
            escape_attribute(screenshot),
            number
        ));
    }
    block.push_str("      </div>\n");
    block
}

/// Renders the full document.
pub fn render_document(steps: &[Step], title: &str, flavor: MarkupFlavor) -> String {
    let title = escape_text(title);
    let marker = match flavor {
        MarkupFlavor::Html => "",
        MarkupFlavor::Word => WORD_COMPATIBILITY_MARKER,
    };
    let blocks: String = steps
        .iter()
        .enumerate()
        .map(|(i, step)| render_step_block(i, step))
        .collect();

    format!(
        "<!doctype html>
<html>
<head>
  <meta charset=\"utf-8\" />
  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\" />
  <title>{title}</title>
  <style>
{STYLESHEET}
  </style>
  {marker}
</head>
<body>
  <div class=\"container\">
    <h1>{title}</h1>
{blocks}  </div>
</body>
</html>
"
    )
}

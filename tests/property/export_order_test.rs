//! Property-based tests: every export format keeps every step, in order.

use proptest::prelude::*;
use steprecorder::services::layout_engine::{blocks_for_steps, LayoutEngine};
use steprecorder::services::markup_renderer::{escape_text, render_document, MarkupFlavor};
use steprecorder::services::text_metrics::Helvetica;
use steprecorder::types::layout::{DrawOp, ImageSize};
use steprecorder::types::settings::PageSettings;
use steprecorder::types::step::Step;

fn arb_markup_step() -> impl Strategy<Value = Step> {
    ("[a-z<>&\" ]{0,40}", proptest::bool::ANY).prop_map(|(description, with_image)| {
        let step = Step::text(description);
        if with_image {
            step.with_screenshot("data:image/png;base64,iVBORw0KGgo=")
        } else {
            step
        }
    })
}

fn arb_paged_step() -> impl Strategy<Value = Step> {
    (
        proptest::collection::vec("[a-z]{1,12}", 1..80).prop_map(|w| w.join(" ")),
        proptest::bool::ANY,
    )
        .prop_map(|(description, with_image)| {
            let step = Step::text(description);
            if with_image {
                step.with_screenshot("img")
            } else {
                step
            }
        })
}

// **Property: markup keeps every step in order**
//
// For both markup flavors the document holds exactly one block per step,
// numbered 1..=n in document order, each with its escaped description.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn markup_blocks_follow_step_order(
        steps in proptest::collection::vec(arb_markup_step(), 0..15),
        word in proptest::bool::ANY,
    ) {
        let flavor = if word { MarkupFlavor::Word } else { MarkupFlavor::Html };
        let doc = render_document(&steps, "Recorded Steps", flavor);

        prop_assert_eq!(doc.matches("<div class=\"step\">").count(), steps.len());
        let images = steps.iter().filter(|s| s.screenshot.is_some()).count();
        prop_assert_eq!(doc.matches("<img class=\"step-img\"").count(), images);

        let mut cursor = 0;
        for (i, step) in steps.iter().enumerate() {
            let heading = format!("<h2>Step {}</h2>", i + 1);
            let at = doc[cursor..].find(&heading);
            prop_assert!(at.is_some(), "missing {}", heading);
            cursor += at.unwrap_or(0);

            let desc = format!("<div class=\"desc\">{}</div>", escape_text(&step.description));
            let at = doc[cursor..].find(&desc);
            prop_assert!(at.is_some(), "description of step {} out of order", i + 1);
            cursor += at.unwrap_or(0);
        }
    }
}

// **Property: paged layout numbers steps in order**
//
// Reading the text ops front to back, the numbered first lines appear as
// "Step 1:", "Step 2:", ... with none skipped or repeated.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    #[test]
    fn paged_layout_numbers_follow_step_order(steps in proptest::collection::vec(arb_paged_step(), 0..12)) {
        let engine = LayoutEngine::new(PageSettings::default(), Helvetica);
        let blocks = blocks_for_steps(&steps, |_, _| Some(ImageSize { width: 1280.0, height: 720.0 }));
        let layout = engine.layout(&blocks);

        let numbers: Vec<usize> = layout
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => text
                    .strip_prefix("Step ")
                    .and_then(|rest| rest.split_once(':'))
                    .and_then(|(n, _)| n.parse().ok()),
                _ => None,
            })
            .collect();

        let expected: Vec<usize> = (1..=steps.len()).collect();
        prop_assert_eq!(numbers, expected);

        let images = layout.ops.iter().filter(|op| matches!(op, DrawOp::Image { .. })).count();
        prop_assert_eq!(images, steps.iter().filter(|s| s.screenshot.is_some()).count());
    }
}

//! Paged document renderer.
//!
//! Turns the layout engine's draw ops into a PDF with lopdf: one content
//! stream per page, standard Helvetica text and RGB image XObjects shared
//! through the page tree's resources.

use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::services::annotator::decode_data_url;
use crate::services::layout_engine::{blocks_for_steps, LayoutEngine};
use crate::services::text_metrics::{encode_win_ansi, Helvetica};
use crate::types::errors::ExportError;
use crate::types::layout::{DrawOp, ImageSize, PageLayout};
use crate::types::settings::PageSettings;
use crate::types::step::Step;

const FONT_RESOURCE: &[u8] = b"F1";

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn image_resource_name(step_index: usize) -> Vec<u8> {
    format!("Im{}", step_index).into_bytes()
}

/// Renders `steps` as a paginated PDF.
pub struct PdfRenderer {
    engine: LayoutEngine<Helvetica>,
}

impl PdfRenderer {
    pub fn new(page: PageSettings) -> Self {
        Self {
            engine: LayoutEngine::new(page, Helvetica),
        }
    }

    /// Decodes every screenshot up front; a step without one renders as text only.
    fn decode_images(steps: &[Step]) -> Result<Vec<Option<RgbImage>>, ExportError> {
        steps
            .iter()
            .enumerate()
            .map(|(i, step)| match step.screenshot.as_deref() {
                None | Some("") => Ok(None),
                Some(data) => decode_data_url(data)
                    .map(|img| Some(img.to_rgb8()))
                    .map_err(|e| ExportError::Image(format!("step {}: {}", i + 1, e))),
            })
            .collect()
    }

    /// Computes the page layout for `steps` with the given decoded images.
    pub fn layout(&self, steps: &[Step], images: &[Option<RgbImage>]) -> PageLayout {
        let blocks = blocks_for_steps(steps, |i, _| {
            images.get(i).and_then(|img| img.as_ref()).map(|img| ImageSize {
                width: f64::from(img.width()),
                height: f64::from(img.height()),
            })
        });
        self.engine.layout(&blocks)
    }

    pub fn render(&self, steps: &[Step]) -> Result<Vec<u8>, ExportError> {
        let images = Self::decode_images(steps)?;
        let layout = self.layout(steps, &images);
        let page = self.engine.page();

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut xobjects = Dictionary::new();
        for (index, image) in images.iter().enumerate() {
            let Some(image) = image else { continue };
            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width()),
                    "Height" => i64::from(image.height()),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8_i64,
                },
                image.as_raw().clone(),
            );
            let image_id = doc.add_object(stream);
            xobjects.set(image_resource_name(index), Object::Reference(image_id));
        }

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            "XObject" => xobjects,
        });

        let mut page_ids: Vec<ObjectId> = Vec::with_capacity(layout.page_count);
        for ops in layout.pages() {
            let content = Content {
                operations: Self::page_operations(&ops, page),
            };
            let encoded = content
                .encode()
                .map_err(|e| ExportError::Render(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![Object::Integer(0), Object::Integer(0), real(page.width), real(page.height)],
                "Resources" => Object::Reference(resources_id),
                "Contents" => Object::Reference(content_id),
            });
            page_ids.push(page_id);
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => page_ids.len() as i64,
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<Object>>(),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc.compress();

        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| ExportError::Render(e.to_string()))?;
        debug!(pages = page_ids.len(), bytes = output.len(), "pdf rendered");
        Ok(output)
    }

    fn page_operations(ops: &[&DrawOp], page: &PageSettings) -> Vec<Operation> {
        let mut out = Vec::new();
        for op in ops {
            match op {
                DrawOp::PageBreak => {}
                DrawOp::Image { step_index, x, y, width, height } => {
                    out.push(Operation::new("q", vec![]));
                    out.push(Operation::new(
                        "cm",
                        vec![real(*width), real(0.0), real(0.0), real(*height), real(*x), real(*y)],
                    ));
                    out.push(Operation::new("Do", vec![Object::Name(image_resource_name(*step_index))]));
                    out.push(Operation::new("Q", vec![]));
                }
                DrawOp::Border { x, y, width, height } => {
                    let gray = page.border_gray;
                    out.push(Operation::new("q", vec![]));
                    out.push(Operation::new("RG", vec![real(gray), real(gray), real(gray)]));
                    out.push(Operation::new("w", vec![real(page.border_width)]));
                    out.push(Operation::new("re", vec![real(*x), real(*y), real(*width), real(*height)]));
                    out.push(Operation::new("S", vec![]));
                    out.push(Operation::new("Q", vec![]));
                }
                DrawOp::Text { text, x, y, size } => {
                    out.push(Operation::new("rg", vec![real(0.0), real(0.0), real(0.0)]));
                    out.push(Operation::new("BT", vec![]));
                    out.push(Operation::new("Tf", vec![Object::Name(FONT_RESOURCE.to_vec()), real(*size)]));
                    out.push(Operation::new("Td", vec![real(*x), real(*y)]));
                    out.push(Operation::new(
                        "Tj",
                        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                    ));
                    out.push(Operation::new("ET", vec![]));
                }
            }
        }
        out
    }
}

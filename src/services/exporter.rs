//! Document export: picks the renderer for the requested format and names the artifact.

use std::sync::Mutex;

use tracing::info;

use crate::managers::download_manager::{DownloadManager, DownloadManagerTrait};
use crate::services::markup_renderer::{render_document, MarkupFlavor};
use crate::services::pdf_renderer::PdfRenderer;
use crate::types::errors::ExportError;
use crate::types::export::{ExportArtifact, ExportKind};
use crate::types::settings::{ExportSettings, PageSettings};
use crate::types::step::Step;

/// Where rendered artifacts go once they are complete.
pub trait DownloadSink: Send + Sync {
    /// Saves `artifact`; returns the final file name.
    fn save(&self, artifact: &ExportArtifact) -> Result<String, ExportError>;
}

impl DownloadSink for Mutex<DownloadManager> {
    fn save(&self, artifact: &ExportArtifact) -> Result<String, ExportError> {
        let mut manager = self
            .lock()
            .map_err(|e| ExportError::Save(e.to_string()))?;
        let item = manager.save(artifact)?;
        Ok(item.filename)
    }
}

/// Trait defining export operations.
pub trait ExporterTrait {
    fn filename_for(&self, kind: ExportKind) -> String;
    fn render(&self, kind: ExportKind, steps: &[Step]) -> Result<ExportArtifact, ExportError>;
}

/// Renders step sequences into any of the three export formats.
pub struct Exporter {
    pdf: PdfRenderer,
    settings: ExportSettings,
}

impl Exporter {
    pub fn new(page: PageSettings, settings: ExportSettings) -> Self {
        Self {
            pdf: PdfRenderer::new(page),
            settings,
        }
    }
}

impl ExporterTrait for Exporter {
    fn filename_for(&self, kind: ExportKind) -> String {
        format!("{}.{}", self.settings.base_name, kind.extension())
    }

    /// Renders the whole artifact in memory; nothing is handed out on failure.
    fn render(&self, kind: ExportKind, steps: &[Step]) -> Result<ExportArtifact, ExportError> {
        let body = match kind {
            ExportKind::Pdf => self.pdf.render(steps)?,
            ExportKind::Html => render_document(steps, &self.settings.document_title, MarkupFlavor::Html).into_bytes(),
            ExportKind::Word => render_document(steps, &self.settings.document_title, MarkupFlavor::Word).into_bytes(),
        };
        info!(format = kind.label(), steps = steps.len(), bytes = body.len(), "document rendered");
        Ok(ExportArtifact {
            kind,
            filename: self.filename_for(kind),
            body,
        })
    }
}

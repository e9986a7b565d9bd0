//! Editor Session for the step recorder.
//!
//! The in-page editor works on its own copy of the recorded steps. Every
//! delete or description edit replaces the background's list wholesale.

use tracing::{info, warn};

use crate::services::messaging::{BackgroundClient, BackgroundPort};
use crate::types::errors::TransportError;
use crate::types::export::{ExportKind, ExportOutcome};
use crate::types::step::Step;

pub struct EditorSession<P: BackgroundPort> {
    client: BackgroundClient<P>,
    steps: Vec<Step>,
}

impl<P: BackgroundPort> EditorSession<P> {
    pub fn new(client: BackgroundClient<P>, steps: Vec<Step>) -> Self {
        Self { client, steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.steps
    }

    /// Export controls are enabled only while there is something to export.
    pub fn export_enabled(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Removes one step, keeping the order of the rest. Returns `Ok(false)`
    /// when `index` is out of range, in which case nothing is sent.
    pub async fn delete_step(&mut self, index: usize) -> Result<bool, TransportError> {
        if index >= self.steps.len() {
            return Ok(false);
        }
        self.steps.remove(index);
        self.client.update_steps(self.steps.clone()).await?;
        Ok(true)
    }

    pub async fn edit_description(&mut self, index: usize, description: &str) -> Result<bool, TransportError> {
        match self.steps.get_mut(index) {
            Some(step) => step.description = description.to_string(),
            None => return Ok(false),
        }
        self.client.update_steps(self.steps.clone()).await?;
        Ok(true)
    }

    /// Asks the background to render and save the current steps.
    ///
    /// A failed outcome carries the text shown to the user; the control stays
    /// usable for a retry.
    pub async fn export(&self, kind: ExportKind) -> ExportOutcome {
        if !self.export_enabled() {
            return ExportOutcome::failed("No steps recorded yet. Please interact with the page before stopping recording.");
        }
        let label = kind.label();
        match self.client.generate_document(kind, self.steps.clone()).await {
            Ok(outcome) if outcome.success => {
                info!(kind = label, steps = self.steps.len(), "export finished");
                outcome
            }
            Ok(outcome) => {
                let reason = outcome.error.unwrap_or_else(|| "Unknown error".to_string());
                warn!(kind = label, error = %reason, "export failed");
                ExportOutcome::failed(format!("Error generating {}: {}", label, reason))
            }
            Err(e) => {
                warn!(kind = label, error = %e, "export request failed");
                ExportOutcome::failed(format!("Error generating {}. Please try again.", label))
            }
        }
    }
}

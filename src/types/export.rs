use serde::{Deserialize, Serialize};

/// Output format of a document export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Pdf,
    Html,
    Word,
}

impl ExportKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::Html => "html",
            ExportKind::Word => "doc",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportKind::Pdf => "application/pdf",
            ExportKind::Html => "text/html",
            ExportKind::Word => "application/msword",
        }
    }

    /// Label shown to the user in progress and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ExportKind::Pdf => "PDF",
            ExportKind::Html => "HTML",
            ExportKind::Word => "Word",
        }
    }
}

/// A rendered document ready to be handed to the download sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub kind: ExportKind,
    pub filename: String,
    pub body: Vec<u8>,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }

    /// Encodes the artifact as a data URI: base64 for the binary PDF,
    /// percent-encoded UTF-8 for the markup formats.
    pub fn to_data_url(&self) -> String {
        use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
        match self.kind {
            ExportKind::Pdf => format!("data:{};base64,{}", self.mime_type(), BASE64.encode(&self.body)),
            ExportKind::Html | ExportKind::Word => format!(
                "data:{};charset=utf-8,{}",
                self.mime_type(),
                urlencoding::encode_binary(&self.body)
            ),
        }
    }
}

/// Result reported back for a `GenerateDocument` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExportOutcome {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

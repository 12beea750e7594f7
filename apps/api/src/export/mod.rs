//! Export adapters that render the CV aggregate into downloadable documents.
//!
//! Each adapter is a pure, synchronous function of `&CvAggregate`. Handlers run them on the
//! blocking pool since layout and compression are CPU-bound.

pub mod document;
pub mod docx;
pub mod font_metrics;
pub mod handlers;
pub mod labels;
pub mod pdf;

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CvAggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" | "word" => Ok(ExportFormat::Docx),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub content: Bytes,
    pub content_type: &'static str,
    /// Suggested filename for download.
    pub filename: String,
    pub format: ExportFormat,
}

impl ExportedDocument {
    pub fn new(content: Vec<u8>, format: ExportFormat, base_filename: &str) -> Self {
        Self {
            content: Bytes::from(content),
            content_type: format.content_type(),
            filename: format!("{base_filename}.{}", format.extension()),
            format,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ExportError {
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("Document rendering failed: {0}")]
    Render(String),
}

/// Renders a CV into one document format.
pub trait CvExporter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn export(&self, cv: &CvAggregate) -> Result<ExportedDocument, ExportError>;
}

/// The exporters available to the API, one per format.
#[derive(Clone)]
pub struct Exporters {
    registered: Vec<Arc<dyn CvExporter>>,
}

impl Exporters {
    pub fn new(registered: Vec<Arc<dyn CvExporter>>) -> Self {
        Self { registered }
    }

    /// PDF and DOCX.
    pub fn standard() -> Self {
        Self::new(vec![Arc::new(pdf::PdfExporter), Arc::new(docx::DocxExporter)])
    }

    pub fn get(&self, format: ExportFormat) -> Result<Arc<dyn CvExporter>, ExportError> {
        self.registered
            .iter()
            .find(|e| e.format() == format)
            .cloned()
            .ok_or_else(|| ExportError::UnsupportedFormat(format.to_string()))
    }
}

/// Download name derived from the person's name, `cv` when there is none.
pub fn base_filename(cv: &CvAggregate) -> String {
    let slug = cv
        .personal
        .full_name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "cv".to_string()
    } else {
        format!("{slug}-cv")
    }
}

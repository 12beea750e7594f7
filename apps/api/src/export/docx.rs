//! Word (.docx) rendering through `docx-rs`.

use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Run};

use crate::export::document::{Block, CvDocument, EntryBlock};
use crate::export::{base_filename, CvExporter, ExportError, ExportFormat, ExportedDocument};
use crate::models::CvAggregate;

// Run sizes are in half-points.
const NAME_SIZE: usize = 40;
const HEADING_SIZE: usize = 26;
const TITLE_SIZE: usize = 22;
const BODY_SIZE: usize = 20;
const META_SIZE: usize = 18;

pub struct DocxExporter;

impl CvExporter for DocxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn export(&self, cv: &CvAggregate) -> Result<ExportedDocument, ExportError> {
        let bytes = pack(build(&CvDocument::build(cv)))?;
        Ok(ExportedDocument::new(
            bytes,
            ExportFormat::Docx,
            &base_filename(cv),
        ))
    }
}

fn hex((r, g, b): (u8, u8, u8)) -> String {
    format!("{r:02x}{g:02x}{b:02x}")
}

fn text_paragraph(text: &str, size: usize, color: Option<&str>, bold: bool) -> Paragraph {
    let mut run = Run::new().add_text(text).size(size);
    if let Some(color) = color {
        run = run.color(color);
    }
    if bold {
        run = run.bold();
    }
    Paragraph::new().add_run(run)
}

fn entry_paragraphs(entry: &EntryBlock, meta_color: &str) -> Vec<Paragraph> {
    let mut paragraphs = vec![text_paragraph(&entry.title, TITLE_SIZE, None, true)];
    let meta = [entry.subtitle.as_str(), entry.period.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("  |  ");
    if !meta.is_empty() {
        paragraphs.push(text_paragraph(&meta, META_SIZE, Some(meta_color), false));
    }
    if !entry.description.is_empty() {
        paragraphs.push(text_paragraph(&entry.description, BODY_SIZE, None, false));
    }
    for bullet in &entry.bullets {
        paragraphs.push(text_paragraph(&format!("\u{2022} {bullet}"), BODY_SIZE, None, false));
    }
    paragraphs
}

/// Lays the document out as a flat sequence of paragraphs.
pub fn build(doc: &CvDocument) -> Docx {
    let primary = hex(doc.primary_rgb);
    let secondary = hex(doc.secondary_rgb);
    let mut paragraphs = Vec::new();

    if !doc.name.is_empty() {
        paragraphs.push(text_paragraph(&doc.name, NAME_SIZE, Some(&primary), true));
    }
    if !doc.contact.is_empty() {
        paragraphs.push(text_paragraph(
            &doc.contact.join("  |  "),
            META_SIZE,
            Some(&secondary),
            false,
        ));
    }

    for section in &doc.sections {
        paragraphs.push(text_paragraph(&section.heading, HEADING_SIZE, Some(&primary), true));
        for block in &section.blocks {
            match block {
                Block::Paragraph(text) => {
                    paragraphs.push(text_paragraph(text, BODY_SIZE, None, false))
                }
                Block::Entry(entry) => paragraphs.extend(entry_paragraphs(entry, &secondary)),
                Block::Labeled { label, text } => paragraphs.push(
                    Paragraph::new()
                        .add_run(Run::new().add_text(format!("{label}: ")).size(BODY_SIZE).bold())
                        .add_run(Run::new().add_text(text.as_str()).size(BODY_SIZE)),
                ),
            }
        }
    }

    paragraphs
        .into_iter()
        .fold(Docx::new(), |docx, p| docx.add_paragraph(p))
}

fn pack(docx: Docx) -> Result<Vec<u8>, ExportError> {
    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| ExportError::Render(format!("DOCX: {e}")))?;
    Ok(buf.into_inner())
}

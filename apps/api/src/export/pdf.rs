//! A4 PDF rendering with the built-in Helvetica faces.
//!
//! Text is laid out top-down with a cursor; lines are wrapped using the static Helvetica
//! width tables and a new page starts whenever the next line would cross the bottom margin.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Rgb,
};
use tracing::debug;

use crate::export::document::{Block, CvDocument, EntryBlock};
use crate::export::font_metrics::{get_metrics, PdfFont};
use crate::export::{base_filename, CvExporter, ExportError, ExportFormat, ExportedDocument};
use crate::models::CvAggregate;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 18.0;
const BULLET_INDENT_MM: f32 = 4.0;
const MM_PER_PT: f32 = 25.4 / 72.0;
const LAYER_NAME: &str = "Content";

const NAME_SIZE_PT: f32 = 20.0;
const HEADING_SIZE_PT: f32 = 13.0;
const TITLE_SIZE_PT: f32 = 11.0;
const BODY_SIZE_PT: f32 = 10.0;
const META_SIZE_PT: f32 = 9.0;

const BODY_RGB: (u8, u8, u8) = (0x1f, 0x29, 0x37);

pub struct PdfExporter;

impl CvExporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn export(&self, cv: &CvAggregate) -> Result<ExportedDocument, ExportError> {
        let rendered = render(&CvDocument::build(cv))?;
        debug!(
            "Rendered PDF: {} pages, {} bytes",
            rendered.page_count,
            rendered.bytes.len()
        );
        Ok(ExportedDocument::new(
            rendered.bytes,
            ExportFormat::Pdf,
            &base_filename(cv),
        ))
    }
}

pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

fn render_error(e: printpdf::Error) -> ExportError {
    ExportError::Render(format!("PDF: {e}"))
}

fn color((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    ))
}

struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Baseline of the next line, measured from the bottom edge.
    y_mm: f32,
    line_height_factor: f32,
    page_count: usize,
}

impl PageWriter {
    fn new(title: &str, line_height_factor: f32) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y_mm: PAGE_HEIGHT_MM - MARGIN_MM,
            line_height_factor,
            page_count: 1,
        })
    }

    fn line_height_mm(&self, size_pt: f32) -> f32 {
        size_pt * self.line_height_factor * MM_PER_PT
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), LAYER_NAME);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y_mm = PAGE_HEIGHT_MM - MARGIN_MM;
        self.page_count += 1;
    }

    fn gap(&mut self, mm: f32) {
        self.y_mm -= mm;
    }

    fn line(&mut self, text: &str, font: PdfFont, size_pt: f32, rgb: (u8, u8, u8), indent_mm: f32) {
        let height = self.line_height_mm(size_pt);
        if self.y_mm - height < MARGIN_MM {
            self.new_page();
        }
        self.y_mm -= height;
        let font_ref = match font {
            PdfFont::Helvetica => &self.regular,
            PdfFont::HelveticaBold => &self.bold,
        };
        self.layer.set_fill_color(color(rgb));
        self.layer
            .use_text(text, size_pt, Mm(MARGIN_MM + indent_mm), Mm(self.y_mm), font_ref);
    }

    fn wrapped(&mut self, text: &str, font: PdfFont, size_pt: f32, rgb: (u8, u8, u8), indent_mm: f32) {
        let width_pt = (PAGE_WIDTH_MM - 2.0 * MARGIN_MM - indent_mm) / MM_PER_PT;
        for line in get_metrics(font).wrap_lines(text, width_pt, size_pt) {
            self.line(&line, font, size_pt, rgb, indent_mm);
        }
    }

    fn finish(self) -> Result<RenderedPdf, ExportError> {
        let page_count = self.page_count;
        let bytes = self.doc.save_to_bytes().map_err(render_error)?;
        Ok(RenderedPdf { bytes, page_count })
    }
}

pub fn render(doc: &CvDocument) -> Result<RenderedPdf, ExportError> {
    let title = if doc.name.is_empty() { "CV" } else { doc.name.as_str() };
    let mut w = PageWriter::new(title, doc.line_height_factor)?;

    if !doc.name.is_empty() {
        w.wrapped(&doc.name, PdfFont::HelveticaBold, NAME_SIZE_PT, doc.primary_rgb, 0.0);
    }
    if !doc.contact.is_empty() {
        w.wrapped(
            &doc.contact.join("  |  "),
            PdfFont::Helvetica,
            META_SIZE_PT,
            doc.secondary_rgb,
            0.0,
        );
    }

    for section in &doc.sections {
        w.gap(4.0);
        w.line(&section.heading, PdfFont::HelveticaBold, HEADING_SIZE_PT, doc.primary_rgb, 0.0);
        w.gap(1.0);
        for block in &section.blocks {
            match block {
                Block::Paragraph(text) => {
                    w.wrapped(text, PdfFont::Helvetica, BODY_SIZE_PT, BODY_RGB, 0.0)
                }
                Block::Entry(entry) => write_entry(&mut w, entry, doc.secondary_rgb),
                Block::Labeled { label, text } => w.wrapped(
                    &format!("{label}: {text}"),
                    PdfFont::Helvetica,
                    BODY_SIZE_PT,
                    BODY_RGB,
                    0.0,
                ),
            }
        }
    }

    w.finish()
}

fn write_entry(w: &mut PageWriter, entry: &EntryBlock, meta_rgb: (u8, u8, u8)) {
    w.gap(1.5);
    w.wrapped(&entry.title, PdfFont::HelveticaBold, TITLE_SIZE_PT, BODY_RGB, 0.0);
    let meta = [entry.subtitle.as_str(), entry.period.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("  |  ");
    if !meta.is_empty() {
        w.wrapped(&meta, PdfFont::Helvetica, META_SIZE_PT, meta_rgb, 0.0);
    }
    if !entry.description.is_empty() {
        w.wrapped(&entry.description, PdfFont::Helvetica, BODY_SIZE_PT, BODY_RGB, 0.0);
    }
    for bullet in &entry.bullets {
        w.wrapped(
            &format!("- {bullet}"),
            PdfFont::Helvetica,
            BODY_SIZE_PT,
            BODY_RGB,
            BULLET_INDENT_MM,
        );
    }
}

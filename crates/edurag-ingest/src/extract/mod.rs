//! Per-format text extraction.

use async_trait::async_trait;
use std::path::Path;

use crate::discovery::DocumentKind;
use crate::error::Result;

mod ocr;
mod pdf;
mod pptx;
mod text;

pub use ocr::OcrEngine;
pub use pdf::{needs_ocr, PdfExtractor};
pub use pptx::PptxExtractor;
pub use text::PlainTextExtractor;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn extract(&self, path: &Path) -> Result<String>;
}

/// One extractor per supported document kind.
pub struct Extractors {
    pdf: PdfExtractor,
    pptx: PptxExtractor,
    text: PlainTextExtractor,
}

impl Extractors {
    pub fn new(pdf: PdfExtractor) -> Self {
        Self { pdf, pptx: PptxExtractor, text: PlainTextExtractor }
    }

    pub fn for_kind(&self, kind: DocumentKind) -> &dyn TextExtractor {
        match kind {
            DocumentKind::Pdf => &self.pdf,
            DocumentKind::Pptx => &self.pptx,
            DocumentKind::Text => &self.text,
        }
    }
}

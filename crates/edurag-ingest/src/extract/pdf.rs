use async_trait::async_trait;
use std::path::Path;
use tracing::{info, warn};

use super::{OcrEngine, TextExtractor};
use crate::error::{IngestError, Result};

pub struct PdfExtractor {
    ocr: OcrEngine,
    probe_pages: usize,
    min_chars: usize,
}

impl PdfExtractor {
    pub fn new(ocr: OcrEngine, probe_pages: usize, min_chars: usize) -> Self {
        Self { ocr, probe_pages, min_chars }
    }
}

fn visible_chars(page: &str) -> usize {
    page.chars().filter(|c| !c.is_whitespace()).count()
}

/// A PDF is treated as scanned when every probed page is (nearly) blank.
pub fn needs_ocr(pages: &[String], probe_pages: usize, min_chars: usize) -> bool {
    pages.is_empty() || pages.iter().take(probe_pages.max(1)).all(|p| visible_chars(p) < min_chars)
}

#[async_trait]
impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        // pdf-extract may panic on malformed input; the join error keeps it contained.
        let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
            .await
            .map_err(|e| IngestError::extraction(path, format!("extractor aborted: {e}")))?
            .map_err(|e| IngestError::extraction(path, e))?;

        if !needs_ocr(&pages, self.probe_pages, self.min_chars) {
            return Ok(pages.join("\n"));
        }

        info!(path = %path.display(), "no usable text layer, running OCR");
        match self.ocr.recognize_pdf(path).await {
            Ok(text) => Ok(text),
            Err(IngestError::OcrUnavailable(reason)) if pages.iter().any(|p| visible_chars(p) > 0) => {
                warn!(path = %path.display(), %reason, "OCR unavailable, keeping sparse text layer");
                Ok(pages.join("\n"))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn blank_probe_pages_trigger_ocr() {
        assert!(needs_ocr(&[], 3, 50));
        assert!(needs_ocr(&pages(&["", "  \n ", "12"]), 3, 50));
        let dense = "x".repeat(60);
        assert!(!needs_ocr(&pages(&["", &dense, ""]), 3, 50));
        // Only the first pages are probed.
        assert!(needs_ocr(&pages(&["", "", "", &dense]), 3, 50));
    }

    /// One page per entry, each drawing its text in Helvetica. An empty entry
    /// is a page with no text layer, like a scan.
    fn build_pdf(pages: &[&str]) -> Vec<u8> {
        let font_id = 3 + 2 * pages.len();
        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                (0..pages.len()).map(|i| format!("{} 0 R", 3 + 2 * i)).collect::<Vec<_>>().join(" "),
                pages.len()
            ),
        ];
        for (i, text) in pages.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {} 0 R >>",
                4 + 2 * i
            ));
            let content = if text.is_empty() { "q Q".to_string() } else { format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET") };
            objects.push(format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()));
        }
        objects.push("<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string());

        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n", objects.len() + 1).as_bytes(),
        );
        out
    }

    async fn extract_pages(pages: &[&str], min_chars: usize) -> Result<String> {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("doc.pdf");
        std::fs::write(&path, build_pdf(pages)).unwrap();
        PdfExtractor::new(OcrEngine::disabled("eng"), 3, min_chars).extract(&path).await
    }

    #[tokio::test]
    async fn text_layer_is_read_page_by_page() {
        let text = extract_pages(&["Mitochondria produce energy for the cell", "Ribosomes build proteins"], 20)
            .await
            .unwrap();
        let first = text.find("Mitochondria").expect("first page text");
        let second = text.find("Ribosomes").expect("second page text");
        assert!(first < second);
    }

    #[tokio::test]
    async fn scan_without_ocr_fails_the_document() {
        let err = extract_pages(&["", ""], 20).await.unwrap_err();
        assert!(matches!(err, IngestError::OcrUnavailable(_)), "{err}");
    }

    #[tokio::test]
    async fn sparse_text_layer_is_kept_without_ocr() {
        let text = extract_pages(&["Fig 1"], 50).await.unwrap();
        assert!(text.contains("Fig"), "{text:?}");
    }

    #[tokio::test]
    async fn garbage_is_an_extraction_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();
        let extractor = PdfExtractor::new(OcrEngine::disabled("eng"), 3, 50);
        let err = extractor.extract(&path).await.unwrap_err();
        assert!(matches!(err, IngestError::Extraction { .. }), "{err}");
    }
}

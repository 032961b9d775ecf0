use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{IngestError, Result};

/// Renders PDF pages with `pdftoppm` and reads them back with `tesseract`.
#[derive(Debug, Clone)]
pub struct OcrEngine {
    language: String,
    dpi: u32,
    pdftoppm: Option<PathBuf>,
    tesseract: Option<PathBuf>,
}

impl OcrEngine {
    /// Locate both binaries on `PATH`. Missing ones only matter once OCR is needed.
    pub fn detect(language: &str) -> Self {
        let pdftoppm = which::which("pdftoppm").ok();
        let tesseract = which::which("tesseract").ok();
        info!(pdftoppm = pdftoppm.is_some(), tesseract = tesseract.is_some(), "OCR tools probed");
        Self { language: language.to_string(), dpi: 300, pdftoppm, tesseract }
    }

    pub fn disabled(language: &str) -> Self {
        Self { language: language.to_string(), dpi: 300, pdftoppm: None, tesseract: None }
    }

    pub async fn recognize_pdf(&self, pdf: &Path) -> Result<String> {
        let (Some(pdftoppm), Some(tesseract)) = (&self.pdftoppm, &self.tesseract) else {
            return Err(IngestError::OcrUnavailable("pdftoppm and tesseract must both be on PATH".into()));
        };

        let scratch = tempfile::tempdir()?;
        let output = Command::new(pdftoppm)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(scratch.path().join("page"))
            .output()
            .await?;
        if !output.status.success() {
            return Err(IngestError::extraction(pdf, format!("pdftoppm: {}", String::from_utf8_lossy(&output.stderr).trim())));
        }

        let mut images: Vec<PathBuf> = std::fs::read_dir(scratch.path())?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        images.sort();
        debug!(pdf = %pdf.display(), pages = images.len(), "rendered pages for OCR");

        let mut pages = Vec::with_capacity(images.len());
        for image in &images {
            let output = Command::new(tesseract)
                .arg(image)
                .arg("stdout")
                .arg("-l")
                .arg(&self.language)
                .output()
                .await?;
            if !output.status.success() {
                return Err(IngestError::extraction(pdf, format!("tesseract: {}", String::from_utf8_lossy(&output.stderr).trim())));
            }
            pages.push(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        Ok(pages.join("\n"))
    }
}

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::TextExtractor;
use crate::error::{IngestError, Result};

static SLIDE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid regex"));
static TEXT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<a:t(?:\s[^>]*)?>([^<]*)</a:t>").expect("valid regex"));

/// Text runs of every slide, one paragraph per slide in slide order.
pub struct PptxExtractor;

#[async_trait]
impl TextExtractor for PptxExtractor {
    fn name(&self) -> &'static str {
        "pptx"
    }

    async fn extract(&self, path: &Path) -> Result<String> {
        let owned: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_slides(&owned))
            .await
            .map_err(|e| IngestError::extraction(path, e))?
    }
}

fn read_slides(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| IngestError::extraction(path, e))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let n = SLIDE_NAME.captures(name)?.get(1)?.as_str().parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    slides.sort();

    let mut paragraphs = Vec::with_capacity(slides.len());
    for (_, name) in slides {
        let mut xml = String::new();
        archive
            .by_name(&name)
            .map_err(|e| IngestError::extraction(path, e))?
            .read_to_string(&mut xml)?;
        let runs: Vec<String> = TEXT_RUN
            .captures_iter(&xml)
            .filter_map(|c| c.get(1))
            .map(|m| unescape(m.as_str()))
            .filter(|s| !s.trim().is_empty())
            .collect();
        if !runs.is_empty() {
            paragraphs.push(runs.join(" "));
        }
    }
    Ok(paragraphs.join("\n\n"))
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

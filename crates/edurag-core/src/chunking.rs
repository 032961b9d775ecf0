//! Word-packing chunker.
//!
//! Text is cut on whitespace boundaries into chunks of at most `max_chars`
//! characters. Each chunk is a contiguous slice of the source running from its
//! first word to its last word, so separators inside a chunk are kept verbatim
//! and only the whitespace between two chunks is dropped. There is no overlap
//! between consecutive chunks. A single word longer than the budget becomes a
//! chunk of its own.

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: 500 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

#[derive(Debug, Clone, Copy)]
struct WordSpan {
    byte_start: usize,
    byte_end: usize,
    char_start: usize,
    char_end: usize,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub fn max_chars(&self) -> usize {
        self.config.max_chars
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let spans = word_spans(text);
        let mut chunks = Vec::new();
        let mut first: Option<WordSpan> = None;
        let mut last: Option<WordSpan> = None;
        for span in spans {
            if let (Some(f), Some(l)) = (first, last) {
                if span.char_end - f.char_start > self.config.max_chars {
                    chunks.push(text[f.byte_start..l.byte_end].to_string());
                    first = Some(span);
                }
            } else {
                first = Some(span);
            }
            last = Some(span);
        }
        if let (Some(f), Some(l)) = (first, last) {
            chunks.push(text[f.byte_start..l.byte_end].to_string());
        }
        chunks
    }
}

fn word_spans(text: &str) -> Vec<WordSpan> {
    let mut spans = Vec::new();
    let mut open: Option<(usize, usize)> = None;
    let mut char_count = 0usize;
    for (byte_idx, ch) in text.char_indices() {
        if ch.is_whitespace() {
            if let Some((byte_start, char_start)) = open.take() {
                spans.push(WordSpan { byte_start, byte_end: byte_idx, char_start, char_end: char_count });
            }
        } else if open.is_none() {
            open = Some((byte_idx, char_count));
        }
        char_count += 1;
    }
    if let Some((byte_start, char_start)) = open {
        spans.push(WordSpan { byte_start, byte_end: text.len(), char_start, char_end: char_count });
    }
    spans
}

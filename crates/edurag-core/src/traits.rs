/// Maps text chunks to fixed-dimension vectors.
///
/// Implementations must be deterministic for a given model: the same text
/// always yields the same vector, otherwise query vectors drift away from the
/// vectors stored at ingestion time.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    /// One vector per input text, in input order, each of length `dim()`.
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

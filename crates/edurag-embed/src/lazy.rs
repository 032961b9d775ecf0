use anyhow::{bail, Result};
use once_cell::sync::OnceCell;

use edurag_core::traits::Embedder;

type Loader = Box<dyn Fn() -> Result<Box<dyn Embedder>> + Send + Sync>;

/// Defers loading an expensive model until the first `embed_batch` call.
///
/// Initialisation is guarded by a `OnceCell`: concurrent first callers block
/// on a single load. A failed load is not cached, the next call retries.
pub struct LazyEmbedder {
    dim: usize,
    max_len: usize,
    loader: Loader,
    cell: OnceCell<Box<dyn Embedder>>,
}

impl LazyEmbedder {
    pub fn new<F>(dim: usize, max_len: usize, loader: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Embedder>> + Send + Sync + 'static,
    {
        Self { dim, max_len, loader: Box::new(loader), cell: OnceCell::new() }
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }

    fn inner(&self) -> Result<&dyn Embedder> {
        let inner = self.cell.get_or_try_init(|| (self.loader)())?;
        if inner.dim() != self.dim {
            bail!("model produces {}-d vectors but {} were configured", inner.dim(), self.dim);
        }
        Ok(inner.as_ref())
    }
}

impl Embedder for LazyEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn max_len(&self) -> usize { self.max_len }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.inner()?.embed_batch(texts)
    }
}

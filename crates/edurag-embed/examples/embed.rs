use edurag_core::config::EmbeddingSettings;
use edurag_core::traits::Embedder;
use edurag_embed::embedder_from_settings;

fn main() -> anyhow::Result<()> {
    edurag_core::logging::init();
    let embedder = embedder_from_settings(&EmbeddingSettings::default());
    let texts = vec!["hello world".to_string(), "rust embeddings".to_string()];
    let embs = embedder.embed_batch(&texts)?;
    println!("B={} dim={}", embs.len(), embedder.dim());
    Ok(())
}

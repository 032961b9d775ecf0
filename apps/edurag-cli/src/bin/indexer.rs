use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use edurag_ingest::{IngestOutcome, IngestReport, Ingestor};
use edurag_vector::IndexStore;

#[derive(Parser, Debug)]
#[command(name = "edurag-indexer")]
#[command(about = "Extract, chunk and embed the corpus into per-subject indexes")]
struct Args {
    /// Corpus root with one directory per subject (defaults to data.corpus_dir)
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Only ingest this subject
    #[arg(long)]
    subject: Option<String>,

    /// Rebuild even when the corpus is unchanged
    #[arg(long)]
    force: bool,
}

fn print_report(report: &IngestReport) {
    let status = match &report.outcome {
        IngestOutcome::Rebuilt => "✅ rebuilt".to_string(),
        IngestOutcome::Unchanged => "⏭️  unchanged".to_string(),
        IngestOutcome::Empty => "⚠️  no text found".to_string(),
        IngestOutcome::Failed(reason) => format!("❌ failed: {reason}"),
    };
    println!("{:<24} {:<18} {:>4} docs {:>6} chunks", report.subject, status, report.documents, report.chunks);
    for doc in &report.failed {
        println!("    skipped {}: {}", doc.source, doc.reason);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = edurag_cli::init()?;
    let corpus = args.corpus.unwrap_or_else(|| settings.data.corpus_path());
    let index_dir = settings.data.index_path();

    println!("edurag indexer\n==============");
    println!("Corpus: {}", corpus.display());
    println!("Index:  {}", index_dir.display());

    let store = Arc::new(
        IndexStore::open(&index_dir, settings.embedding.dim)
            .await
            .with_context(|| format!("Failed to open index store at {}", index_dir.display()))?,
    );
    let embedder = edurag_embed::embedder_from_settings(&settings.embedding);
    let ingestor = Ingestor::new(store, embedder, &settings).with_progress(true);

    let reports = match args.subject {
        Some(subject) => vec![ingestor.ingest_subject(&subject, &corpus.join(&subject), args.force).await?],
        None => ingestor.ingest_all(&corpus, args.force).await?,
    };

    println!();
    for report in &reports {
        print_report(report);
    }
    let failed = reports.iter().filter(|r| matches!(r.outcome, IngestOutcome::Failed(_))).count();
    println!("\n📊 {} subjects, {} failed", reports.len(), failed);
    Ok(())
}

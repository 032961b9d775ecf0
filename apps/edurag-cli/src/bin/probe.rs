use clap::Parser;

use edurag_server::AppState;

#[derive(Parser, Debug)]
#[command(name = "edurag-probe")]
#[command(about = "Show the chunks retrieved for a question, without generating an answer")]
struct Args {
    subject: String,
    question: String,

    /// Number of chunks to show (defaults to retrieval.top_k)
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = edurag_cli::init()?;
    let limit = args.limit.unwrap_or(settings.retrieval.top_k);
    let state = AppState::from_settings(&settings).await?;

    let hits = state.query.retrieve(&args.subject, &args.question, limit).await?;
    println!("🔍 '{}' in {} -> {} hits", args.question, args.subject, hits.len());
    for (rank, hit) in hits.iter().enumerate() {
        println!("{:>2}. [{:.4}] #{} {}", rank + 1, hit.distance, hit.position, hit.source);
        println!("    {}", edurag_cli::preview(&hit.text, 160));
    }
    Ok(())
}

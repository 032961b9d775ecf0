use clap::Parser;

use edurag_server::{serve, AppState};

#[derive(Parser, Debug)]
#[command(name = "edurag-server")]
#[command(about = "Serve per-subject question answering over HTTP")]
struct Args {
    /// Interface to bind (defaults to server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (defaults to $PORT, then server.port)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = edurag_cli::init()?;

    let host = args.host.unwrap_or_else(|| settings.server.host.clone());
    let port = args
        .port
        .or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(settings.server.port);

    let state = AppState::from_settings(&settings).await?;
    match state.query.subjects() {
        Ok(subjects) => tracing::info!(count = subjects.len(), "subjects available: {:?}", subjects),
        Err(e) => tracing::warn!("Failed to read subjects: {}", e),
    }
    serve(state, &format!("{host}:{port}")).await
}

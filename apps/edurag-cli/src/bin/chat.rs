use clap::Parser;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use edurag_server::AppState;

#[derive(Parser, Debug)]
#[command(name = "edurag-chat")]
#[command(about = "Ask questions about one subject interactively")]
struct Args {
    subject: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = edurag_cli::init()?;
    let state = AppState::from_settings(&settings).await?;

    if !state.query.store().contains(&args.subject)? {
        println!("No index found for subject '{}'.", args.subject);
        return Ok(());
    }
    println!("Chatbot loaded for subject: {}\n", args.subject);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Ask a question (or type 'exit' to quit): ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else { break };
        let question = line.trim();
        if question.eq_ignore_ascii_case("exit") {
            println!("Exiting.");
            break;
        }
        if question.is_empty() {
            continue;
        }
        match state.query.answer(&args.subject, question).await {
            Ok(answer) => {
                println!("\n{}\n", answer.answer);
                if !answer.sources.is_empty() {
                    println!("Sources: {}\n", answer.sources.join(", "));
                }
            }
            Err(e) => eprintln!("Error: {e}\n"),
        }
    }
    Ok(())
}

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

use ragchat::{
    ChatService, Config, DocumentIngestor, InMemoryConversationLog, OllamaClient, StoreManager,
    TextChunker,
};

#[derive(Parser)]
#[command(name = "ragchat", version, about = "Per-user retrieval-augmented chat over Ollama")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index documents into a user's vector store
    Ingest {
        /// User whose store receives the documents
        #[arg(long)]
        user: String,
        /// Files to index (.txt or .md)
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask a question, streaming the answer to stdout
    Ask {
        /// User whose documents ground the answer
        #[arg(long)]
        user: String,
        question: String,
    },
}

#[tokio::main]
async fn main() -> ragchat::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ragchat=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let ollama = Arc::new(OllamaClient::from_config(&config.llm));
    let stores = StoreManager::from_config(&config.storage);

    match cli.command {
        Command::Ingest { user, files } => {
            let ingestor = DocumentIngestor::new(
                stores,
                ollama,
                TextChunker::new(config.rag.chunk_size, config.rag.chunk_overlap),
            );
            let report = ingestor.ingest_files(&user, &files).await?;
            println!(
                "Indexed {} file(s), skipped {}, added {} chunk(s)",
                report.files_indexed, report.files_skipped, report.chunks_added
            );
        }
        Command::Ask { user, question } => {
            let chat = ChatService::new(
                stores,
                ollama.clone(),
                ollama,
                Arc::new(InMemoryConversationLog::new()),
                config.rag.top_k,
            );

            let mut answer = chat.answer(&user, &question);
            while let Some(fragment) = answer.next().await {
                print!("{fragment}");
                std::io::stdout().flush().ok();
            }
            println!();
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use bloom_cli::session::NO_NEW_RECOMMENDATIONS;
use bloom_cli::{ChatSession, TurnOutcome, ui};
use bloom_core::{AppConfig, ChainEvent, ChainResponse, VectorStore};
use bloom_openai::OpenAiClient;
use bloom_rag::{ChainOptions, ConversationalRetrievalChain, IngestionPipeline, QdrantVectorStore};
use bloom_server::AppState;

#[derive(Parser)]
#[command(name = "bloom")]
#[command(about = "Retrieval-augmented course catalogue advisor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, chunk, embed, and index the course catalogue
    Ingest {
        /// Directory holding the catalogue CSV files
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Namespace to upsert into
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Run the HTTP chat API
    Serve {
        /// Address to bind
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Chat with the course catalogue in the terminal
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bloom=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env()?;

    match cli.command {
        Commands::Ingest { dir, namespace } => {
            if let Some(dir) = dir {
                config.docs_dir = dir;
            }
            if let Some(namespace) = namespace {
                config.namespace = namespace;
            }
            ingest(&config).await
        }
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            serve(&config).await
        }
        Commands::Chat => chat(&config).await,
    }
}

async fn connect_store(config: &AppConfig) -> Result<Arc<QdrantVectorStore>> {
    let mut store = QdrantVectorStore::new(
        &config.qdrant_url,
        &config.collection,
        config.embedding_dimension,
    );
    store.connect().await?;
    Ok(Arc::new(store))
}

async fn ingest(config: &AppConfig) -> Result<()> {
    let client = Arc::new(OpenAiClient::from_env()?);
    let store = connect_store(config).await?;

    let pipeline = IngestionPipeline::new(config, client, store)?;
    let report = pipeline.run().await?;

    println!(
        "{} Ingested {} documents as {} chunks into namespace '{}'",
        "✅".green(),
        report.documents,
        report.chunks,
        config.namespace
    );
    Ok(())
}

fn build_chain(
    config: &AppConfig,
    client: Arc<OpenAiClient>,
    store: Arc<QdrantVectorStore>,
) -> Result<ConversationalRetrievalChain> {
    let options = ChainOptions::new(&config.namespace, config.top_k)?;
    Ok(ConversationalRetrievalChain::new(
        client.clone(),
        client,
        store,
        options,
    ))
}

async fn serve(config: &AppConfig) -> Result<()> {
    let client = Arc::new(OpenAiClient::from_env()?);
    let store = connect_store(config).await?;
    let chain = build_chain(config, client, store)?;

    bloom_server::serve(
        config.bind_addr,
        AppState {
            chain: Arc::new(chain),
        },
    )
    .await?;
    Ok(())
}

async fn chat(config: &AppConfig) -> Result<()> {
    let client = Arc::new(OpenAiClient::from_env()?);
    let store = connect_store(config).await?;
    let chain = Arc::new(build_chain(config, client, store)?);

    ui::display_banner();

    let mut session = ChatSession::new();
    if let Some(greeting) = session.messages().first() {
        ui::print_assistant_prefix();
        println!("{}", ui::render_markdown(&greeting.text));
        println!();
    }

    let mut input_history = Vec::new();

    loop {
        let input = ui::read_question(&mut input_history)?;
        if input.is_empty() {
            continue;
        }

        let lowered = input.to_lowercase();
        if lowered == "exit" || lowered == "quit" {
            println!("{}", "👋 Goodbye!".green());
            break;
        }
        if lowered == "help" {
            ui::print_help();
            continue;
        }

        let question = match session.begin(&input) {
            Ok(question) => question,
            Err(e) => {
                ui::print_error(&e.to_string());
                continue;
            }
        };

        let (events_tx, mut events_rx) = tokio::sync::mpsc::channel::<ChainEvent>(32);
        let history = session.history().to_vec();
        let ask_chain = chain.clone();
        let turn = tokio::spawn(async move {
            ask_chain.ask_stream(&question, &history, events_tx).await
        });

        ui::print_assistant_prefix();
        let mut done: Option<ChainResponse> = None;
        while let Some(event) = events_rx.recv().await {
            match event {
                ChainEvent::Token(token) => ui::print_token(&token),
                ChainEvent::Done(response) => done = Some(response),
            }
        }
        println!();

        match turn.await? {
            Ok(response) => {
                // Prefer the Done payload; both carry the same response.
                let response = done.unwrap_or(response);
                match session.complete(response) {
                    TurnOutcome::Answered(message) => {
                        ui::print_sources(&message.source_documents);
                        println!();
                    }
                    TurnOutcome::NothingNew => {
                        ui::print_notice(NO_NEW_RECOMMENDATIONS);
                        println!();
                    }
                    TurnOutcome::Failed(message) => {
                        ui::print_error(&message);
                    }
                }
            }
            Err(e) => {
                session.fail(e.to_string());
                ui::print_error(&e.to_string());
            }
        }
    }

    Ok(())
}

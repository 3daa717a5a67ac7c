use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use faq_assistant::chat;
use faq_assistant::core::config::{AppPaths, ConfigService};
use faq_assistant::core::logging;
use faq_assistant::core::retry::RetryPolicy;
use faq_assistant::rag::Ingestor;
use faq_assistant::server;
use faq_assistant::state::{build_embedder, build_index, AppState};

#[derive(Debug, Parser)]
#[command(
    name = "faq-assistant",
    about = "Answer customer questions from an FAQ knowledge base",
    version
)]
struct Cli {
    /// Settings file (YAML); overrides discovery and FAQ_ASSISTANT_CONFIG_PATH
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load a question/answer CSV into the vector index
    Ingest { path: PathBuf },
    /// Answer a single question and exit
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Also print the FAQ entries the answer was based on
        #[arg(long)]
        sources: bool,
    },
    /// Interactive chat in the terminal
    Chat,
    /// Run the HTTP API
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    let default_level = match cli.command {
        Command::Chat | Command::Ask { .. } => "warn",
        _ => "info",
    };
    logging::init(&paths, default_level);

    let mut config_service = ConfigService::new(paths);
    if let Some(path) = &cli.config {
        config_service = config_service.with_config_path(path);
    }
    let config = Arc::new(
        config_service
            .load()
            .context("Failed to load configuration")?,
    );

    match cli.command {
        Command::Ingest { path } => {
            let settings = &config.settings;
            let ingestor = Ingestor::new(
                build_embedder(&config)?,
                build_index(&config)?,
                RetryPolicy::from(&settings.retry),
                &settings.ingest,
            );
            let report = ingestor
                .ingest_file(&path)
                .await
                .with_context(|| format!("Ingestion of {} failed", path.display()))?;

            println!(
                "Ingested {} of {} rows from {} into index '{}' in {} ms",
                report.upserted,
                report.total_rows,
                report.source,
                settings.index.name,
                (report.finished_at - report.started_at).num_milliseconds()
            );
            for issue in &report.skipped {
                println!(
                    "  skipped row {} ({}): {}",
                    issue.row,
                    issue.id.as_deref().unwrap_or("-"),
                    issue.reason
                );
            }
        }
        Command::Ask { question, sources } => {
            let state = AppState::initialize(config.clone())?;
            let question = question.join(" ");
            match state.assistant.ask(&question).await {
                Ok(answer) => {
                    println!("{}", answer.text);
                    if sources {
                        println!();
                        for source in &answer.sources {
                            println!("  [{:.3}] {} ({})", source.score, source.record.question, source.record.id);
                        }
                    }
                }
                Err(err) => {
                    tracing::error!("Failed to answer question: {}", err);
                    println!("{}", err.user_message());
                    std::process::exit(1);
                }
            }
        }
        Command::Chat => {
            let state = AppState::initialize(config.clone())?;
            chat::run_repl(&state.assistant, &config.settings.app.store_name)
                .await
                .context("Chat session failed")?;
        }
        Command::Serve => {
            let state = AppState::initialize(config.clone())?;
            let bind_addr = server::bind_address(&config.settings.server, env::var("PORT").ok().as_deref());

            let listener = TcpListener::bind(&bind_addr)
                .await
                .with_context(|| format!("Failed to bind to {}", bind_addr))?;
            let addr = listener.local_addr()?;
            tracing::info!("Listening on {}", addr);

            let app = server::router::router(state);
            axum::serve(listener, app).await.context("Server error")?;
        }
    }

    Ok(())
}

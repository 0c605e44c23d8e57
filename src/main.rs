use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use live_search::agent::ClientAgentFactory;
use live_search::config::Config;
use live_search::instrumentation::{TurnLog, TurnLogger};
use live_search::llm::LlmClient;
use live_search::search::GoogleSearchClient;
use live_search::session::Session;
use live_search::web::{create_router, AppState};

#[derive(Parser)]
#[command(name = "live-search", about = "Conversational web search assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print each search the agent makes
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the chat page (default)
    Serve {
        /// Address to listen on, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<String>,
    },
    /// Ask a single question
    Ask {
        /// The question to answer
        question: String,
    },
    /// Interactive conversation on stdin
    Chat,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    // Nothing touches the network until every credential is present.
    let config = Config::from_env().context("Missing required environment variables")?;
    tracing::debug!(?config, "configuration loaded");

    let factory = Arc::new(build_factory(&config)?);
    let logger = TurnLogger::new(Path::new(&config.log_dir))?;
    tracing::debug!(path = %logger.path().display(), "turn log open");

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            let app = create_router(AppState::new(
                factory,
                Some(logger),
                config.session_timeout,
            ));
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .context(format!("Failed to bind {}", addr))?;
            tracing::info!(%addr, model = %config.model, "serving");
            axum::serve(listener, app).await.context("Server error")?;
        }
        Commands::Ask { question } => {
            let mut session = Session::new();
            let turn_log = session
                .submit(&question, factory.as_ref())
                .await
                .map_err(|e| anyhow::anyhow!("{}: {}", e.user_message(), e))?;
            logger.write(&turn_log)?;
            print_turn(&turn_log, cli.verbose);
        }
        Commands::Chat => {
            let mut session = Session::new();
            let stdin = std::io::stdin();
            prompt_line()?;
            for line in stdin.lock().lines() {
                let line = line.context("Failed to read line")?;
                match session.submit(&line, factory.as_ref()).await {
                    Ok(turn_log) => {
                        logger.write(&turn_log)?;
                        print_turn(&turn_log, cli.verbose);
                    }
                    Err(e) => eprintln!("{} ({})", e.user_message(), e),
                }
                prompt_line()?;
            }
        }
    }

    Ok(())
}

fn build_factory(config: &Config) -> Result<ClientAgentFactory> {
    let llm = LlmClient::new(
        &config.groq_api_key,
        &config.llm_base_url,
        &config.model,
        config.max_tokens,
        config.request_timeout,
    )
    .context("Failed to initialize LLM client")?;
    let search = GoogleSearchClient::new(
        &config.search_base_url,
        &config.google_search_api_key,
        &config.google_cse_id,
        config.request_timeout,
    )
    .context("Error initializing Google Search engine")?;

    Ok(ClientAgentFactory::new(
        Arc::new(llm),
        Arc::new(search),
        config.max_iterations,
    ))
}

fn print_turn(turn_log: &TurnLog, verbose: bool) {
    if verbose {
        for call in &turn_log.tool_calls {
            eprintln!(
                "[{}] {:?} -> {} results in {}ms",
                call.tool, call.query, call.num_results, call.latency_ms
            );
        }
    }
    println!("\n{}\n", turn_log.answer);
    println!("{}", turn_log.summary());
}

fn prompt_line() -> Result<()> {
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

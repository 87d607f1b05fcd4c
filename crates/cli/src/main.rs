//! AgriMind CLI
//!
//! Main entry point for the agrimind command-line tool.
//! Answers agricultural questions via adaptive retrieval or specialist
//! dispatch, and manages the local knowledge base.

mod commands;

use agrimind_core::{config::AppConfig, logging, AppResult, Strategy};
use clap::{Parser, Subcommand};
use commands::{AgentsCommand, AskCommand, KnowledgeCommand};
use std::path::PathBuf;

/// AgriMind CLI - adaptive agricultural question answering
#[derive(Parser, Debug)]
#[command(name = "agrimind")]
#[command(about = "Adaptive agricultural question answering", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "AGRIMIND_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "AGRIMIND_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, mock)
    #[arg(short, long, global = true, env = "AGRIMIND_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "AGRIMIND_MODEL")]
    model: Option<String>,

    /// Initial answering strategy (retrieval, dispatch)
    #[arg(short, long, global = true, env = "AGRIMIND_STRATEGY")]
    strategy: Option<Strategy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a question with the adaptive workflow
    Ask(AskCommand),

    /// Knowledge base management (local corpus)
    Knowledge(KnowledgeCommand),

    /// List the specialist agent roster
    Agents(AgentsCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.strategy,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // An invalid provider or controller setup is fatal before any work starts
    config.validate()?;

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("AgriMind CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!(
        "Initial strategy: {}",
        config.controller.initial_strategy
    );

    config.ensure_dirs()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Knowledge(_) => "knowledge",
        Commands::Agents(_) => "agents",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Knowledge(cmd) => cmd.execute(&config).await,
        Commands::Agents(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

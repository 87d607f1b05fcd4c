//! Knowledge command handler.
//!
//! Handles local corpus management: ingestion, statistics, and reset.

use agrimind_core::{config::AppConfig, AppResult};
use agrimind_knowledge::LearnOptions;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Knowledge base management (local corpus)
#[derive(Args, Debug)]
pub struct KnowledgeCommand {
    #[command(subcommand)]
    pub action: KnowledgeAction,
}

#[derive(Subcommand, Debug)]
pub enum KnowledgeAction {
    /// Learn from files and directories
    Learn(KnowledgeLearnCommand),
    /// Reset a knowledge base
    Reset(KnowledgeResetCommand),
    /// Show knowledge base statistics
    Stats(KnowledgeStatsCommand),
}

impl KnowledgeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            KnowledgeAction::Learn(cmd) => cmd.execute(config).await,
            KnowledgeAction::Reset(cmd) => cmd.execute(config).await,
            KnowledgeAction::Stats(cmd) => cmd.execute(config).await,
        }
    }
}

/// Learn from sources
#[derive(Args, Debug)]
pub struct KnowledgeLearnCommand {
    /// Knowledge base name
    pub base: String,

    /// Paths to learn from
    #[arg(long)]
    pub path: Vec<PathBuf>,

    /// Include patterns (substring match)
    #[arg(long)]
    pub include: Vec<String>,

    /// Exclude patterns (substring match)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Reset base before learning
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeLearnCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing knowledge learn command for base '{}'", self.base);

        let options = LearnOptions {
            base_name: self.base.clone(),
            paths: self.path.clone(),
            include: self.include.clone(),
            exclude: self.exclude.clone(),
            reset: self.reset,
            provider: Some(config.embedding_provider.clone()),
            model: Some(config.embedding_model.clone()),
            dimensions: Some(config.embedding_dim),
        };

        let stats = agrimind_knowledge::learn(&config.workspace, options).await?;

        if self.json {
            let output = serde_json::json!({
                "base": self.base,
                "sourcesCount": stats.sources_count,
                "chunksCount": stats.chunks_count,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        } else {
            println!(
                "Learned {} sources ({} chunks, {} bytes) in {:.2}s",
                stats.sources_count, stats.chunks_count, stats.bytes_processed, stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Reset a knowledge base
#[derive(Args, Debug)]
pub struct KnowledgeResetCommand {
    /// Knowledge base name
    pub base: String,
}

impl KnowledgeResetCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        agrimind_knowledge::reset(&config.workspace, &self.base)?;
        println!("Knowledge base '{}' reset", self.base);
        Ok(())
    }
}

/// Show knowledge base statistics
#[derive(Args, Debug)]
pub struct KnowledgeStatsCommand {
    /// Knowledge base name
    pub base: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl KnowledgeStatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let stats = agrimind_knowledge::stats(&config.workspace, &self.base)?;

        if self.json {
            let output = serde_json::to_value(&stats)
                .map_err(|e| agrimind_core::AppError::Serialization(e.to_string()))?;
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        } else {
            println!("Knowledge base: {}", stats.base_name);
            println!("  Sources: {}", stats.sources_count);
            println!("  Chunks:  {}", stats.chunks_count);
            println!("  Size:    {} bytes", stats.db_size_bytes);
        }

        Ok(())
    }
}

//! Configuration management for AgriMind.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (.agrimind/config.yaml)
//!
//! The configuration is workspace-centric: the vector index and the two
//! content-hash caches all live under `.agrimind/` in the workspace.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// The two alternative answering strategies the controller can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Answer from the private document corpus (adaptive RAG).
    Retrieval,
    /// Answer by fanning the query out to specialist agents.
    Dispatch,
}

impl Strategy {
    /// The other strategy.
    pub fn other(&self) -> Self {
        match self {
            Self::Retrieval => Self::Dispatch,
            Self::Dispatch => Self::Retrieval,
        }
    }

    /// Canonical name used in config files and output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieval => "retrieval",
            Self::Dispatch => "dispatch",
        }
    }
}

impl FromStr for Strategy {
    type Err = AppError;

    /// Parse a strategy name.
    ///
    /// An unknown value is a fatal configuration error, raised before any
    /// workflow state is created.
    fn from_str(s: &str) -> AppResult<Self> {
        match s.to_lowercase().as_str() {
            "retrieval" | "rag" => Ok(Self::Retrieval),
            "dispatch" | "agents" => Ok(Self::Dispatch),
            other => Err(AppError::Config(format!(
                "Unknown strategy: '{}'. Supported: retrieval, dispatch",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tuning knobs for the adaptive retrieval subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of candidate chunks fetched per retrieve pass
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Candidates considered during document grading
    #[serde(default = "default_grade_cap")]
    pub grade_cap: usize,

    /// Accepted documents after which grading stops early
    #[serde(default = "default_grade_early_stop")]
    pub grade_early_stop: usize,

    /// Maximum query-transform retries before the forced fallback
    #[serde(default = "default_recursion_limit")]
    pub recursion_limit: u32,

    /// Rolling chat-history window capacity (FIFO eviction)
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_top_k() -> usize {
    3
}

fn default_grade_cap() -> usize {
    3
}

fn default_grade_early_stop() -> usize {
    2
}

fn default_recursion_limit() -> u32 {
    7
}

fn default_history_capacity() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            grade_cap: default_grade_cap(),
            grade_early_stop: default_grade_early_stop(),
            recursion_limit: default_recursion_limit(),
            history_capacity: default_history_capacity(),
        }
    }
}

/// Tuning knobs for specialist dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Maximum specialist calls in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-handler timeout in seconds
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,
}

fn default_max_concurrency() -> usize {
    4
}

fn default_handler_timeout_secs() -> u64 {
    60
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            handler_timeout_secs: default_handler_timeout_secs(),
        }
    }
}

/// Tuning knobs for the outer mode controller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Strategy attempted first
    #[serde(default = "default_initial_strategy")]
    pub initial_strategy: Strategy,

    /// Maximum rewrite-then-dispatch cycles after the one strategy switch
    #[serde(default = "default_max_rewrites")]
    pub max_rewrites: u32,

    /// Wall-clock deadline for one workflow execution, in seconds
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

fn default_initial_strategy() -> Strategy {
    Strategy::Retrieval
}

fn default_max_rewrites() -> u32 {
    2
}

fn default_deadline_secs() -> u64 {
    300
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            initial_strategy: default_initial_strategy(),
            max_rewrites: default_max_rewrites(),
            deadline_secs: default_deadline_secs(),
        }
    }
}

/// Main application configuration.
///
/// This struct holds all global configuration options that affect
/// behavior across commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .agrimind/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider (e.g., "ollama", "mock")
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Embedding provider (e.g., "ollama", "trigram")
    pub embedding_provider: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Embedding vector dimension
    pub embedding_dim: usize,

    /// Provider endpoint override
    pub endpoint: Option<String>,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Outer controller settings
    pub controller: ControllerConfig,

    /// Retrieval subsystem settings
    pub retrieval: RetrievalConfig,

    /// Dispatch subsystem settings
    pub dispatch: DispatchConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "embeddingProvider")]
    embedding_provider: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    #[serde(rename = "embeddingDim")]
    embedding_dim: Option<usize>,
    endpoint: Option<String>,
    controller: Option<ControllerConfig>,
    retrieval: Option<RetrievalConfig>,
    dispatch: Option<DispatchConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(), // Local-first default
            model: "llama3.2".to_string(),
            // Deterministic offline embeddings by default; "ollama" +
            // nomic-embed-text (768 dims) is the semantic alternative
            embedding_provider: "trigram".to_string(),
            embedding_model: "trigram-v1".to_string(),
            embedding_dim: 384,
            endpoint: None,
            api_key: None,
            controller: ControllerConfig::default(),
            retrieval: RetrievalConfig::default(),
            dispatch: DispatchConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `AGRIMIND_WORKSPACE`: Override workspace path
    /// - `AGRIMIND_CONFIG`: Path to config file
    /// - `AGRIMIND_PROVIDER`: LLM provider
    /// - `AGRIMIND_MODEL`: Model identifier
    /// - `AGRIMIND_API_KEY`: API key
    /// - `AGRIMIND_STRATEGY`: Initial answering strategy
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("AGRIMIND_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Ok(config_file) = std::env::var("AGRIMIND_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Validate workspace exists
        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            config.workspace.join(".agrimind/config.yaml")
        };

        if config_path.exists() {
            tracing::debug!("Merging config file {:?}", config_path);
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("AGRIMIND_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("AGRIMIND_MODEL") {
            config.model = model;
        }

        if let Ok(strategy) = std::env::var("AGRIMIND_STRATEGY") {
            config.controller.initial_strategy = strategy.parse()?;
        }

        config.api_key = std::env::var("AGRIMIND_API_KEY").ok();
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(provider) = config_file.provider {
            result.provider = provider;
        }
        if let Some(model) = config_file.model {
            result.model = model;
        }
        if let Some(provider) = config_file.embedding_provider {
            result.embedding_provider = provider;
        }
        if let Some(model) = config_file.embedding_model {
            result.embedding_model = model;
        }
        if let Some(dim) = config_file.embedding_dim {
            result.embedding_dim = dim;
        }
        if let Some(endpoint) = config_file.endpoint {
            result.endpoint = Some(endpoint);
        }
        if let Some(controller) = config_file.controller {
            result.controller = controller;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(dispatch) = config_file.dispatch {
            result.dispatch = dispatch;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// This method merges command-line flags with the loaded configuration,
    /// giving precedence to CLI flags over environment variables.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        strategy: Option<Strategy>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(strategy) = strategy {
            self.controller.initial_strategy = strategy;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .agrimind directory.
    pub fn agrimind_dir(&self) -> PathBuf {
        self.workspace.join(".agrimind")
    }

    /// Root directory for the content-hash caches.
    pub fn cache_dir(&self) -> PathBuf {
        self.agrimind_dir().join("cache")
    }

    /// Flat store for cached embedding vectors.
    pub fn embedding_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("embeddings")
    }

    /// Flat store for memoized whole-prompt responses.
    pub fn response_cache_dir(&self) -> PathBuf {
        self.cache_dir().join("responses")
    }

    /// Directory holding the vector index files.
    pub fn index_dir(&self) -> PathBuf {
        self.agrimind_dir().join("index")
    }

    /// Ensure the .agrimind directory tree exists.
    pub fn ensure_dirs(&self) -> AppResult<()> {
        for dir in [
            self.agrimind_dir(),
            self.embedding_cache_dir(),
            self.response_cache_dir(),
            self.index_dir(),
        ] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    AppError::Config(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }
        Ok(())
    }

    /// Validate configuration for the active provider.
    pub fn validate(&self) -> AppResult<()> {
        let known_providers = ["ollama", "mock"];

        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        if self.controller.max_rewrites == 0 && self.controller.deadline_secs == 0 {
            return Err(AppError::Config(
                "Either a rewrite budget or a deadline must be set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.controller.initial_strategy, Strategy::Retrieval);
        assert_eq!(config.retrieval.recursion_limit, 7);
        assert_eq!(config.retrieval.history_capacity, 5);
        assert_eq!(config.controller.max_rewrites, 2);
        assert!(!config.verbose);
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("retrieval".parse::<Strategy>().unwrap(), Strategy::Retrieval);
        assert_eq!("rag".parse::<Strategy>().unwrap(), Strategy::Retrieval);
        assert_eq!("dispatch".parse::<Strategy>().unwrap(), Strategy::Dispatch);
        assert_eq!("DISPATCH".parse::<Strategy>().unwrap(), Strategy::Dispatch);
        assert!("tooling".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_strategy_other() {
        assert_eq!(Strategy::Retrieval.other(), Strategy::Dispatch);
        assert_eq!(Strategy::Dispatch.other(), Strategy::Retrieval);
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            None,
            None,
            Some("mock".to_string()),
            Some("test-model".to_string()),
            Some(Strategy::Dispatch),
            None,
            true,
            false,
        );

        assert_eq!(overridden.provider, "mock");
        assert_eq!(overridden.model, "test-model");
        assert_eq!(overridden.controller.initial_strategy, Strategy::Dispatch);
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cache_layout() {
        let config = AppConfig::default();
        assert!(config
            .embedding_cache_dir()
            .ends_with(".agrimind/cache/embeddings"));
        assert!(config
            .response_cache_dir()
            .ends_with(".agrimind/cache/responses"));
        assert!(config.index_dir().ends_with(".agrimind/index"));
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }
}

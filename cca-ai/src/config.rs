//! Configuration resolution for cca-ai
//!
//! Pipeline tunables come from TOML with CLI overrides. The LLM API key
//! uses a three-tier lookup with Database → ENV → TOML priority.

use crate::error::{AnalysisError, AnalysisResult};
use cca_common::config::TomlConfig;
use cca_common::{Error, Result};
use sqlx::{Pool, Sqlite};
use tracing::{info, warn};

/// Externally tunable parameters of the analysis core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Calls selected per batch; also the concurrency bound
    pub batch_size: usize,
    /// Passages retrieved per segment
    pub top_k: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            top_k: 3,
        }
    }
}

impl PipelineConfig {
    /// Take tunables from the bootstrap config
    pub fn from_toml(config: &TomlConfig) -> Self {
        Self {
            batch_size: config.pipeline.batch_size,
            top_k: config.retrieval.top_k,
        }
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, batch_size: Option<usize>, top_k: Option<usize>) -> Self {
        if let Some(batch_size) = batch_size {
            self.batch_size = batch_size;
        }
        if let Some(top_k) = top_k {
            self.top_k = top_k;
        }
        self
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if self.batch_size == 0 {
            return Err(AnalysisError::Config("batch_size must be at least 1".to_string()));
        }
        if self.top_k == 0 {
            return Err(AnalysisError::Config("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Resolve the LLM API key from 3-tier configuration
///
/// **Priority:** Database → ENV (`llm.api_key_env`) → TOML (`llm.llm_api_key`)
pub async fn resolve_llm_api_key(db: &Pool<Sqlite>, toml_config: &TomlConfig) -> Result<String> {
    let mut sources = Vec::new();
    let env_var = toml_config.llm.api_key_env.as_str();

    // Tier 1: Database (authoritative)
    let db_key = crate::db::settings::get_llm_api_key(db).await?;
    if db_key.as_deref().is_some_and(is_valid_key) {
        sources.push("database");
    }

    // Tier 2: Environment variable
    let env_key = std::env::var(env_var).ok();
    if env_key.as_deref().is_some_and(is_valid_key) {
        sources.push("environment");
    }

    // Tier 3: TOML config
    let toml_key = toml_config.llm.llm_api_key.as_ref();
    if toml_key.is_some_and(|k| is_valid_key(k)) {
        sources.push("TOML");
    }

    if sources.len() > 1 {
        warn!(
            "LLM API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    if let Some(key) = db_key.filter(|k| is_valid_key(k)) {
        info!("LLM API key loaded from database");
        return Ok(key);
    }

    if let Some(key) = env_key.filter(|k| is_valid_key(k)) {
        info!("LLM API key loaded from environment variable {}", env_var);
        return Ok(key);
    }

    if let Some(key) = toml_key.filter(|k| is_valid_key(k)) {
        info!("LLM API key loaded from TOML config");
        return Ok(key.clone());
    }

    Err(Error::Config(format!(
        "LLM API key not configured. Please configure using one of:\n\
         1. Database: settings table, key '{}'\n\
         2. Environment: {}=your-key-here\n\
         3. TOML config: [llm] llm_api_key = \"your-key\"",
        crate::db::settings::LLM_API_KEY,
        env_var
    )))
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

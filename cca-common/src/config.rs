//! Bootstrap configuration loading and data folder resolution
//!
//! Bootstrap settings come from a TOML file. A missing file is not an error:
//! the service logs a warning and starts with built-in defaults. Secrets such
//! as the LLM API key may also live in the database `settings` table, which
//! takes priority over this file (see `cca-ai` config resolution).

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "CCA_CONFIG";

/// Environment variable naming the data folder
pub const DATA_FOLDER_ENV_VAR: &str = "CCA_DATA_FOLDER";

/// Bootstrap configuration loaded from TOML
///
/// Every field has a default so partial files are accepted.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the SQLite database (optional)
    pub data_folder: Option<PathBuf>,

    /// Database file name inside the data folder
    pub database_file: Option<String>,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// LLM endpoint configuration
    pub llm: LlmConfig,

    /// Document index endpoint configuration
    pub retrieval: RetrievalConfig,

    /// Batch scheduling parameters
    pub pipeline: PipelineSection,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API key stored directly in the file (lowest priority)
    pub llm_api_key: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4-turbo".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            llm_api_key: None,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Document index service endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Base URL of the index service
    pub base_url: String,
    /// Passages returned per query
    pub top_k: usize,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8765".to_string(),
            top_k: 3,
            timeout_secs: 30,
        }
    }
}

/// Batch scheduling parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Calls selected and analyzed concurrently per batch
    pub batch_size: usize,
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self { batch_size: 5 }
    }
}

impl TomlConfig {
    /// Database path inside the given data folder
    pub fn database_path(&self, data_folder: &Path) -> PathBuf {
        let file = self
            .database_file
            .clone()
            .unwrap_or_else(|| "compliance.db".to_string());
        data_folder.join(file)
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Locate and load the bootstrap config
///
/// Priority: explicit path → `CCA_CONFIG` → `~/.config/cca/cca-ai.toml`.
/// An explicit path that cannot be read is an error; a missing default file
/// falls back to built-in defaults with a warning.
pub fn load_bootstrap_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = explicit {
        info!("Loading config from {}", path.display());
        return load_toml_config(path);
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        let path = PathBuf::from(path);
        info!("Loading config from {} ({})", path.display(), CONFIG_ENV_VAR);
        return load_toml_config(&path);
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            info!("Loading config from {}", path.display());
            load_toml_config(&path)
        }
        _ => {
            warn!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Default per-user config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("cca").join("cca-ai.toml"))
}

/// Data folder resolution:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent default (fallback)
pub fn resolve_data_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.data_folder {
        return path.clone();
    }

    default_data_folder()
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cca"))
        .unwrap_or_else(|| PathBuf::from("./cca_data"))
}

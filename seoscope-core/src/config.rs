// Configuration: secrets from the environment, tunables from TOML

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const SERPER_API_KEY: &str = "SERPER_API_KEY";

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/seoscope/";
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Secrets required before any run may start.
#[derive(Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub serper_api_key: String,
}

impl AppConfig {
    /// Reads secrets from the process environment, honouring a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    /// Builds the config from an arbitrary key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::MissingSecret(key))
        };

        Ok(Self {
            openai_api_key: required(OPENAI_API_KEY)?,
            serper_api_key: required(SERPER_API_KEY)?,
        })
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  {}: {}", OPENAI_API_KEY, preview(&self.openai_api_key));
        tracing::info!("  {}: {}", SERPER_API_KEY, preview(&self.serper_api_key));
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("openai_api_key", &preview(&self.openai_api_key))
            .field("serper_api_key", &preview(&self.serper_api_key))
            .finish()
    }
}

fn preview(val: &str) -> String {
    let shown: String = val.chars().take(5).collect();
    format!("{}...({} chars)", shown, val.chars().count())
}

/// Tunables loaded from `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub audit: AuditConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub name: String,
    pub temperature: f32,
    /// Upper bound on generation attempts per stage.
    pub max_iterations: usize,
    /// Linear backoff unit between attempts.
    pub retry_delay_ms: u64,
    pub base_url: String,
    pub timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_iterations: 5,
            retry_delay_ms: 500,
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub base_url: String,
    pub num_results: usize,
    pub gl: String,
    pub hl: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://google.serper.dev".to_string(),
            num_results: 10,
            gl: "us".to_string(),
            hl: "en".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            timeout_secs: seoscope_scanner::auditor::DEFAULT_TIMEOUT_SECS,
            user_agent: seoscope_scanner::auditor::DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Abort on the first search, audit or stage failure instead of degrading.
    pub strict: bool,
    /// Cap on characters of each prior-stage report embedded in later prompts.
    pub max_context_chars: Option<usize>,
}

impl FileConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::Invalid(format!(
                "model.temperature must be between 0 and 2, got {}",
                self.model.temperature
            )));
        }
        if self.model.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "model.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.search.num_results == 0 {
            return Err(ConfigError::Invalid(
                "search.num_results must be at least 1".to_string(),
            ));
        }
        if self.pipeline.max_context_chars == Some(0) {
            return Err(ConfigError::Invalid(
                "pipeline.max_context_chars must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    FileConfig::from_toml_str(&content, path)
}

/// Like [`load_config`], but a missing file yields the defaults.
pub fn load_config_or_default(path: &Path) -> Result<FileConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!("No config file at {}, using defaults", path.display());
        Ok(FileConfig::default())
    }
}

/// Expands `~` in a user-supplied config directory.
pub fn expand_config_dir(dir: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(dir).as_ref())
}

pub fn default_config_path() -> PathBuf {
    expand_config_dir(DEFAULT_CONFIG_DIR).join(CONFIG_FILE_NAME)
}

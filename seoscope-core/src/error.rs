use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse search response: {0}")]
    Parse(String),
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("Text generation API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Text generation returned no content")]
    EmptyOutput,

    #[error("Invalid API key: {0}")]
    InvalidKey(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required secret {0}")]
    MissingSecret(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Failures that stop a run. Outside strict mode only `MissingKeyword` is
/// ever returned; everything else degrades into report text.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Inserisci una keyword o un argomento per avviare l'analisi.")]
    MissingKeyword,

    #[error("Search failed: {0}")]
    Search(#[from] SearchError),

    #[error("Site audit failed: {0}")]
    Audit(#[from] seoscope_scanner::AuditError),

    #[error("{stage} stage produced no output after {attempts} attempt(s)")]
    Stage { stage: String, attempts: usize },
}

pub type Result<T, E = RunError> = std::result::Result<T, E>;

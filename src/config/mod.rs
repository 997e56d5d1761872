pub mod prompts;

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

pub const CONFIG_PATH: &str = "config/docsmith.toml";
pub const ENV_PATH: &str = ".env";
pub const PARSER_API_KEY_VAR: &str = "LLAMA_CLOUD_API_KEY";

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_READER_MODEL: &str = "llama3.2";
const DEFAULT_CODER_MODEL: &str = "codellama";
const DEFAULT_EMBED_MODEL: &str = "nomic-embed-text";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_SIMILARITY_TOP_K: usize = 2;
const DEFAULT_CHUNK_SIZE: usize = 1024;
const DEFAULT_CHUNK_OVERLAP: usize = 200;
const DEFAULT_MAX_AGENT_STEPS: usize = 10;
const DEFAULT_HISTORY_LIMIT: usize = 40;
const DEFAULT_PARSER_BASE_URL: &str = "https://api.cloud.llamaindex.ai";
const DEFAULT_PARSER_POLL_SECS: u64 = 2;
const DEFAULT_PARSER_MAX_POLLS: u32 = 150;
const DEFAULT_PARSER_TIMEOUT_SECS: u64 = 120;

static ENV_LOADER: Once = Once::new();

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub ollama_url: String,
    pub reader_model: String,
    pub coder_model: String,
    pub embed_model: String,
    pub request_timeout: Duration,
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub max_retries: u32,
    pub similarity_top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_agent_steps: usize,
    pub history_limit: usize,
    pub verbose: bool,
    pub recursive: bool,
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
    pub max_polls: u32,
    /// Upper bound on each HTTP request to the service.
    pub request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("failed to expand path '{value}': {reason}")]
    PathExpansion { value: String, reason: String },
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    ollama_url: Option<String>,
    reader_model: Option<String>,
    coder_model: Option<String>,
    embed_model: Option<String>,
    request_timeout_secs: Option<u64>,
    data_dir: Option<String>,
    output_dir: Option<String>,
    max_retries: Option<u32>,
    similarity_top_k: Option<usize>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    max_agent_steps: Option<usize>,
    history_limit: Option<usize>,
    verbose: Option<bool>,
    recursive: Option<bool>,
    parser_base_url: Option<String>,
    parser_poll_secs: Option<u64>,
    parser_max_polls: Option<u32>,
    parser_timeout_secs: Option<u64>,
}

/// Loads `.env` from the working directory once per process. Variables that
/// are already set keep their values.
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        if dotenvy::from_filename(ENV_PATH).is_ok() {
            debug!(path = ENV_PATH, "Loaded environment file");
        }
    });
}

impl AppConfig {
    /// Reads the TOML file at `path`, or the default location when `None`.
    /// A missing default file yields the built-in defaults; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        ensure_env_loaded();
        let raw = match path {
            Some(path) => read_raw(path)?,
            None => match read_raw(Path::new(CONFIG_PATH)) {
                Ok(raw) => raw,
                Err(ConfigError::NotFound { .. }) => {
                    info!("Configuration file not found; using defaults");
                    RawConfig::default()
                }
                Err(other) => return Err(other),
            },
        };
        let config = Self::from_raw(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_ollama_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_url = url.into();
        self
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let data_dir = expand_dir(raw.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR))?;
        let output_dir = expand_dir(raw.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR))?;
        let api_key = std::env::var(PARSER_API_KEY_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty());

        Ok(Self {
            ollama_url: raw
                .ollama_url
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string()),
            reader_model: raw
                .reader_model
                .unwrap_or_else(|| DEFAULT_READER_MODEL.to_string()),
            coder_model: raw
                .coder_model
                .unwrap_or_else(|| DEFAULT_CODER_MODEL.to_string()),
            embed_model: raw
                .embed_model
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            request_timeout: Duration::from_secs(
                raw.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            data_dir,
            output_dir,
            max_retries: raw.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            similarity_top_k: raw.similarity_top_k.unwrap_or(DEFAULT_SIMILARITY_TOP_K),
            chunk_size: raw.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: raw.chunk_overlap.unwrap_or(DEFAULT_CHUNK_OVERLAP),
            max_agent_steps: raw.max_agent_steps.unwrap_or(DEFAULT_MAX_AGENT_STEPS),
            history_limit: raw.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT),
            verbose: raw.verbose.unwrap_or(true),
            recursive: raw.recursive.unwrap_or(false),
            parser: ParserConfig {
                base_url: raw
                    .parser_base_url
                    .unwrap_or_else(|| DEFAULT_PARSER_BASE_URL.to_string()),
                api_key,
                poll_interval: Duration::from_secs(
                    raw.parser_poll_secs.unwrap_or(DEFAULT_PARSER_POLL_SECS),
                ),
                max_polls: raw.parser_max_polls.unwrap_or(DEFAULT_PARSER_MAX_POLLS),
                request_timeout: Duration::from_secs(
                    raw.parser_timeout_secs
                        .unwrap_or(DEFAULT_PARSER_TIMEOUT_SECS),
                ),
            },
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(invalid("max_retries", "must be greater than zero"));
        }
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size", "must be greater than zero"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(invalid(
                "chunk_overlap",
                format!("must be smaller than chunk_size ({})", self.chunk_size),
            ));
        }
        if self.similarity_top_k == 0 {
            return Err(invalid("similarity_top_k", "must be greater than zero"));
        }
        if self.max_agent_steps == 0 {
            return Err(invalid("max_agent_steps", "must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            reader_model: DEFAULT_READER_MODEL.to_string(),
            coder_model: DEFAULT_CODER_MODEL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_retries: DEFAULT_MAX_RETRIES,
            similarity_top_k: DEFAULT_SIMILARITY_TOP_K,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_agent_steps: DEFAULT_MAX_AGENT_STEPS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            verbose: true,
            recursive: false,
            parser: ParserConfig {
                base_url: DEFAULT_PARSER_BASE_URL.to_string(),
                api_key: None,
                poll_interval: Duration::from_secs(DEFAULT_PARSER_POLL_SECS),
                max_polls: DEFAULT_PARSER_MAX_POLLS,
                request_timeout: Duration::from_secs(DEFAULT_PARSER_TIMEOUT_SECS),
            },
        }
    }
}

fn read_raw(path: &Path) -> Result<RawConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");
    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn expand_dir(value: &str) -> Result<PathBuf, ConfigError> {
    shellexpand::full(value)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|err| ConfigError::PathExpansion {
            value: value.to_string(),
            reason: err.to_string(),
        })
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

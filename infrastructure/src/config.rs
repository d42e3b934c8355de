use domain::error::RagError;
use domain::generation::GenerationParams;
use domain::models::SearchType;
use shared::types::Result;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const SECRETS_FILE_ENV: &str = "RAG_SECRETS_FILE";
const DEFAULT_SECRETS_FILE: &str = ".streamlit/secrets.toml";

/// Where configuration values come from. Chosen once at startup.
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &'static str;
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment, with `.env` loaded first.
pub struct EnvConfigSource;

impl EnvConfigSource {
    pub fn new() -> Self {
        dotenvy::dotenv().ok();
        Self
    }
}

impl Default for EnvConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvConfigSource {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

/// Flat TOML secrets file (`KEY = "value"` pairs).
pub struct SecretStoreConfigSource {
    values: HashMap<String, String>,
}

impl SecretStoreConfigSource {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RagError::Config(format!("cannot read secrets file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let table: toml::Table = raw
            .parse()
            .map_err(|e| RagError::Config(format!("invalid secrets file: {e}")))?;
        let values = table
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();
        Ok(Self { values })
    }
}

impl ConfigSource for SecretStoreConfigSource {
    fn name(&self) -> &'static str {
        "secret store"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Secret store when a secrets file is present, environment otherwise.
pub fn select_config_source() -> Result<Box<dyn ConfigSource>> {
    dotenvy::dotenv().ok();
    let secrets = env::var(SECRETS_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SECRETS_FILE));
    if secrets.is_file() {
        tracing::info!("Using secrets file {}", secrets.display());
        return Ok(Box::new(SecretStoreConfigSource::from_file(&secrets)?));
    }
    Ok(Box::new(EnvConfigSource::new()))
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub pdf_directory: PathBuf,
    pub vector_db_path: PathBuf,
    pub logs_path: PathBuf,
    pub embedding_model: String,
    pub ollama_base_url: String,
    pub groq_api_key: Option<String>,
    pub groq_model: String,
    pub groq_base_url: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub retrieval_k: usize,
    pub search_type: SearchType,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pdf_directory: PathBuf::from("PDFs"),
            vector_db_path: PathBuf::from("vector_index"),
            logs_path: PathBuf::from("logs"),
            embedding_model: "all-minilm".to_string(),
            ollama_base_url: "http://localhost:11434".to_string(),
            groq_api_key: None,
            groq_model: "llama-3.3-70b-versatile".to_string(),
            groq_base_url: "https://api.groq.com/openai/v1".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            retrieval_k: 6,
            search_type: SearchType::Similarity,
            temperature: 0.1,
            max_tokens: 1000,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let defaults = Self::default();
        let lookup = |key: &str| source.get(key).filter(|v| !v.trim().is_empty());

        let search_type = match lookup("SEARCH_TYPE") {
            Some(raw) => SearchType::parse(&raw)
                .ok_or_else(|| RagError::Config(format!("unsupported SEARCH_TYPE {raw:?}")))?,
            None => defaults.search_type,
        };

        let config = Self {
            pdf_directory: lookup("PDF_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or(defaults.pdf_directory),
            vector_db_path: lookup("VECTOR_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.vector_db_path),
            logs_path: lookup("LOGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.logs_path),
            embedding_model: lookup("EMBEDDING_MODEL").unwrap_or(defaults.embedding_model),
            ollama_base_url: lookup("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            groq_api_key: lookup("GROQ_API_KEY"),
            groq_model: lookup("GROQ_MODEL").unwrap_or(defaults.groq_model),
            groq_base_url: lookup("GROQ_BASE_URL").unwrap_or(defaults.groq_base_url),
            chunk_size: parse_or(source, "CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_or(source, "CHUNK_OVERLAP", defaults.chunk_overlap)?,
            retrieval_k: parse_or(source, "RETRIEVAL_K", defaults.retrieval_k)?,
            search_type,
            temperature: parse_or(source, "TEMPERATURE", defaults.temperature)?,
            max_tokens: parse_or(source, "MAX_TOKENS", defaults.max_tokens)?,
            request_timeout: Duration::from_secs(parse_or(
                source,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
        };
        config.validate()?;
        tracing::debug!(source = source.name(), "Configuration loaded");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("CHUNK_SIZE must be positive".into()).into());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                self.chunk_overlap, self.chunk_size
            ))
            .into());
        }
        if self.retrieval_k == 0 {
            return Err(RagError::Config("RETRIEVAL_K must be positive".into()).into());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(RagError::Config(format!(
                "TEMPERATURE must be within 0.0..=2.0, got {}",
                self.temperature
            ))
            .into());
        }
        if self.request_timeout.is_zero() {
            return Err(RagError::Config("REQUEST_TIMEOUT_SECS must be positive".into()).into());
        }
        Ok(())
    }

    /// The hosted model cannot be reached without it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.groq_api_key
            .as_deref()
            .ok_or_else(|| RagError::Config("GROQ_API_KEY is not set".into()).into())
    }

    pub fn query_log_path(&self) -> PathBuf {
        self.logs_path.join("queries.jsonl")
    }

    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn parse_or<T: FromStr>(source: &dyn ConfigSource, key: &str, default: T) -> Result<T> {
    match source.get(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| RagError::Config(format!("invalid value for {key}: {raw:?}")).into()),
        None => Ok(default),
    }
}

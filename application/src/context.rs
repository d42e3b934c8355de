//! Application context built once at startup and handed to each command.

use crate::ingest_service::IngestService;
use crate::rag_service::RagService;
use crate::retriever::Retriever;
use infrastructure::config::{select_config_source, AppConfig};
use infrastructure::embedder::Embedder;
use infrastructure::ollama_client::OllamaClient;
use infrastructure::openai_client::OpenAiCompatibleClient;
use infrastructure::query_logger::QueryLogger;
use infrastructure::vector_store::VectorStore;
use shared::types::Result;

pub type CoachService = RagService<Embedder, OpenAiCompatibleClient>;

pub struct AppContext {
    pub config: AppConfig,
    pub embedder: Embedder,
}

impl AppContext {
    /// Pick the config source, load the config, wire the embedder.
    pub fn bootstrap() -> Result<Self> {
        let source = select_config_source()?;
        tracing::debug!("Reading configuration from {}", source.name());
        let config = AppConfig::from_source(source.as_ref())?;
        Self::from_config(config)
    }

    pub fn from_config(config: AppConfig) -> Result<Self> {
        let client = OllamaClient::new(
            &config.ollama_base_url,
            &config.embedding_model,
            config.request_timeout,
        )?;
        Ok(Self {
            embedder: Embedder::new(client),
            config,
        })
    }

    pub fn ingest_service(&self) -> IngestService<Embedder> {
        IngestService::new(self.config.clone(), self.embedder.clone())
    }

    pub fn load_store(&self) -> Result<VectorStore> {
        VectorStore::load(&self.config.vector_db_path, &self.config.embedding_model)
    }

    pub fn retriever(&self) -> Result<Retriever<Embedder>> {
        Ok(Retriever::new(
            self.load_store()?,
            self.embedder.clone(),
            self.config.retrieval_k,
            self.config.search_type,
        ))
    }

    /// The answering path. Fails with `ConfigError` without an API key and
    /// with `IndexNotFound` before the index is built.
    pub fn coach_service(&self) -> Result<CoachService> {
        let api_key = self.config.require_api_key()?;
        let model = OpenAiCompatibleClient::new(
            &self.config.groq_base_url,
            api_key,
            &self.config.groq_model,
            self.config.request_timeout,
        )?;
        let retriever = self.retriever()?;
        let logger = QueryLogger::open(self.config.query_log_path())?;
        tracing::info!(
            model = %self.config.groq_model,
            temperature = self.config.temperature,
            k = self.config.retrieval_k,
            "RAG chain ready"
        );
        Ok(RagService::new(
            retriever,
            model,
            self.config.generation_params(),
            logger,
        ))
    }
}

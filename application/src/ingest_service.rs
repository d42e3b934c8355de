use domain::categorizer::Category;
use domain::embedding::TextEmbedder;
use domain::error::RagError;
use domain::models::{category_breakdown, Chunk, DocumentStats};
use infrastructure::chunker::split_documents;
use infrastructure::config::AppConfig;
use infrastructure::pdf_loader::PdfLoader;
use infrastructure::text_splitter::RecursiveTextSplitter;
use infrastructure::vector_store::{IndexStats, VectorStore};
use shared::telemetry::Telemetry;
use shared::types::Result;

#[derive(Debug, Clone)]
pub struct IngestReport {
    pub documents: DocumentStats,
    pub chunks: usize,
    pub chunks_by_category: Vec<(Category, usize)>,
    pub index: IndexStats,
    pub elapsed_secs: f64,
}

/// Offline pipeline: PDFs -> documents -> chunks -> persisted index.
pub struct IngestService<E> {
    config: AppConfig,
    embedder: E,
}

impl<E: TextEmbedder> IngestService<E> {
    pub fn new(config: AppConfig, embedder: E) -> Self {
        Self { config, embedder }
    }

    pub fn index_exists(&self) -> bool {
        VectorStore::exists(&self.config.vector_db_path)
    }

    /// Load and split the corpus. Missing or empty corpus directories fail here,
    /// before any embedding work.
    pub fn load_chunks(&self) -> Result<(Vec<Chunk>, DocumentStats)> {
        let splitter =
            RecursiveTextSplitter::new(self.config.chunk_size, self.config.chunk_overlap)
                .map_err(|e| RagError::Config(e.to_string()))?;
        let documents = PdfLoader::new(&self.config.pdf_directory).load()?;
        let stats = DocumentStats::from_documents(&documents);
        let chunks = split_documents(&documents, &splitter);
        Ok((chunks, stats))
    }

    pub async fn build_index(&self, force_recreate: bool) -> Result<IngestReport> {
        // Checked up front so a refused rebuild does not parse the whole corpus.
        if self.index_exists() && !force_recreate {
            return Err(RagError::IndexExists(self.config.vector_db_path.clone()).into());
        }
        let timer = Telemetry::new();
        let (chunks, documents) = self.load_chunks()?;
        let chunk_count = chunks.len();
        let chunks_by_category = category_breakdown(chunks.iter().map(|c| c.metadata.category));
        let store = self.build_from_chunks(chunks, force_recreate).await?;
        Ok(IngestReport {
            documents,
            chunks: chunk_count,
            chunks_by_category,
            index: store.stats(),
            elapsed_secs: timer.elapsed_secs(),
        })
    }

    pub async fn build_from_chunks(
        &self,
        chunks: Vec<Chunk>,
        force_recreate: bool,
    ) -> Result<VectorStore> {
        VectorStore::create(
            &self.config.vector_db_path,
            chunks,
            &self.embedder,
            force_recreate,
        )
        .await
    }
}

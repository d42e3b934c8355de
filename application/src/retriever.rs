use domain::embedding::TextEmbedder;
use domain::models::{ScoredChunk, SearchType};
use infrastructure::vector_store::VectorStore;
use shared::types::Result;

/// A loaded index bound to the embedder it was built with.
pub struct Retriever<E> {
    store: VectorStore,
    embedder: E,
    k: usize,
    search_type: SearchType,
}

impl<E: TextEmbedder> Retriever<E> {
    pub fn new(store: VectorStore, embedder: E, k: usize, search_type: SearchType) -> Self {
        Self {
            store,
            embedder,
            k,
            search_type,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        self.retrieve_k(query, self.k).await
    }

    /// Up to `k` chunks, nearest first.
    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        match self.search_type {
            SearchType::Similarity => {
                self.store
                    .similarity_search_with_score(&self.embedder, query, k)
                    .await
            }
        }
    }
}

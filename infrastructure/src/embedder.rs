use super::ollama_client::OllamaClient;
use domain::embedding::{l2_normalize, TextEmbedder};
use futures::stream::{self, StreamExt, TryStreamExt};
use shared::types::Result;

const BATCH_SIZE: usize = 32;
const MAX_IN_FLIGHT: usize = 8;

/// Ollama-backed embedder producing L2-normalized vectors.
#[derive(Clone)]
pub struct Embedder {
    client: OllamaClient,
}

impl Embedder {
    pub fn new(client: OllamaClient) -> Self {
        Self { client }
    }

    async fn generate_batch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let futures: Vec<_> = texts.iter().map(|text| self.embed_one(text)).collect();

        // `buffered` keeps input order, which ties each vector to its chunk.
        stream::iter(futures)
            .buffered(MAX_IN_FLIGHT)
            .try_collect()
            .await
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = self.client.generate_embedding(text).await?;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

impl TextEmbedder for Embedder {
    fn model_id(&self) -> &str {
        self.client.model()
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for (batch_no, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            tracing::debug!(
                "Embedding batch {} ({} chunks, {}/{})",
                batch_no + 1,
                batch.len(),
                embeddings.len() + batch.len(),
                texts.len()
            );
            embeddings.extend(self.generate_batch_embeddings(batch).await?);
        }
        if let Some(first) = embeddings.first() {
            let dimension = first.len();
            anyhow::ensure!(
                embeddings.iter().all(|v| v.len() == dimension),
                "embedding model {} returned vectors of differing dimension",
                self.model_id()
            );
        }
        Ok(embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_one(text).await
    }
}

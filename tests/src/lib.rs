//! Deterministic stand-ins for the embedding model and the hosted LLM, plus
//! corpus helpers shared by the end-to-end tests.

use anyhow::anyhow;
use domain::embedding::{l2_normalize, TextEmbedder};
use domain::error::RagError;
use domain::generation::{GenerationParams, LanguageModel};
use domain::models::Document;
use infrastructure::config::AppConfig;
use shared::types::Result;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const HASHING_DIM: usize = 256;

/// Bag-of-words embedder: each lowercase word is hashed into one of
/// `HASHING_DIM` buckets. Shared words pull vectors together.
#[derive(Default)]
pub struct HashingEmbedder {
    calls: AtomicUsize,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0; HASHING_DIM];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            v[fnv1a(&word.to_lowercase()) % HASHING_DIM] += 1.0;
        }
        l2_normalize(&mut v);
        v
    }
}

fn fnv1a(word: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in word.bytes() {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash as usize
}

impl TextEmbedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        "hashing-bow"
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }
}

/// Shares the call counter with the test through a reference.
impl TextEmbedder for &HashingEmbedder {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed_documents(texts).await
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        (**self).embed_query(text).await
    }
}

/// Embedder that always fails, for the retrieval error path.
pub struct BrokenEmbedder;

impl TextEmbedder for BrokenEmbedder {
    fn model_id(&self) -> &str {
        "hashing-bow"
    }

    async fn embed_documents(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(anyhow!("embedding server unreachable"))
    }

    async fn embed_query(&self, _text: &str) -> Result<Vec<f32>> {
        Err(anyhow!("embedding server unreachable"))
    }
}

/// Returns a fixed answer and records every prompt it receives.
pub struct ScriptedModel {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        Ok(self.answer.clone())
    }
}

/// Simulates the hosted model being down.
pub struct FailingModel;

impl LanguageModel for FailingModel {
    fn model_id(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String> {
        Err(RagError::Generation("503 Service Unavailable".into()).into())
    }
}

/// A small corpus named like the real course PDFs.
pub fn fitness_documents() -> Vec<Document> {
    vec![
        Document::new(
            "Protein is a macronutrient made of amino acids. A protein intake of \
             1.6 g per kg of bodyweight per day maximizes muscle protein synthesis.\n\n\
             Spread protein over three to four meals.",
            "PDFs/Protein PTC 2022.pdf",
        ),
        Document::new(
            "Squats and deadlifts train the lower body. Choose exercises with a long \
             range of motion and a good strength curve.\n\nRows and presses cover the \
             upper body.",
            "PDFs/Exercise Selection PTC 2022 (1).pdf",
        ),
        Document::new(
            "Sleep seven to nine hours. Manage stress and keep a consistent daily \
             routine to support recovery.",
            "PDFs/Lifestyle Factors PTC 2023.pdf",
        ),
    ]
}

/// Config rooted in a temporary directory.
pub fn test_config(root: &Path) -> AppConfig {
    AppConfig {
        pdf_directory: root.join("PDFs"),
        vector_db_path: root.join("vector_index"),
        logs_path: root.join("logs"),
        chunk_size: 120,
        chunk_overlap: 30,
        retrieval_k: 2,
        ..AppConfig::default()
    }
}

pub fn read_log_lines(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter_map(|l| serde_json::from_str(l).ok())
        .collect()
}

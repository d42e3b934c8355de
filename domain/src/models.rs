use crate::categorizer::Category;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Metadata key holding a document's 0-based page number.
pub const PAGE_KEY: &str = "page";

/// Raw text of one loaded unit (a PDF page) plus its provenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub source: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Page `page` (0-based) of the PDF at `source`.
    pub fn page_of(text: impl Into<String>, source: impl Into<String>, page: usize) -> Self {
        let mut document = Self::new(text, source);
        document
            .metadata
            .insert(PAGE_KEY.to_string(), page.to_string());
        document
    }

    pub fn page(&self) -> Option<usize> {
        self.metadata.get(PAGE_KEY).and_then(|p| p.parse().ok())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Sequential across the whole corpus, not per document.
    pub chunk_id: usize,
    /// Length in characters.
    pub chunk_length: usize,
    /// Character offset of the chunk inside its document (page).
    pub start_index: usize,
    /// 0-based PDF page, when the document came from one.
    #[serde(default)]
    pub page: Option<usize>,
    pub category: Category,
    pub topic: String,
    pub source: String,
    pub course: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A retrieved chunk with its squared L2 distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub distance: f32,
}

impl ScoredChunk {
    /// Monotone similarity in (0, 1]; 1 means identical vectors.
    pub fn similarity(&self) -> f32 {
        1.0 / (1.0 + self.distance)
    }
}

/// Nearest-neighbour strategy used by the retriever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchType {
    #[default]
    Similarity,
}

impl SearchType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "similarity" => Some(Self::Similarity),
            _ => None,
        }
    }
}

/// Result of one question: either an answer with its sources or a failure.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    Answer {
        text: String,
        sources: Vec<ScoredChunk>,
    },
    Failure {
        reason: String,
    },
}

impl QueryOutcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer { .. })
    }

    /// Tuple view: `(Some(answer), sources)` or the `(None, [])` sentinel.
    pub fn into_parts(self) -> (Option<String>, Vec<ScoredChunk>) {
        match self {
            Self::Answer { text, sources } => (Some(text), sources),
            Self::Failure { .. } => (None, Vec::new()),
        }
    }
}

/// Group sources by topic, keeping first-seen topic order.
pub fn group_by_topic(sources: &[ScoredChunk]) -> Vec<(String, Vec<&ScoredChunk>)> {
    let mut groups: Vec<(String, Vec<&ScoredChunk>)> = Vec::new();
    for source in sources {
        let topic = &source.chunk.metadata.topic;
        match groups.iter_mut().find(|(t, _)| t == topic) {
            Some((_, members)) => members.push(source),
            None => groups.push((topic.clone(), vec![source])),
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStats {
    pub total_pages: usize,
    pub total_characters: usize,
    pub avg_page_length: f64,
    pub unique_sources: usize,
}

impl DocumentStats {
    pub fn from_documents(documents: &[Document]) -> Self {
        let total_characters: usize = documents.iter().map(|d| d.text.chars().count()).sum();
        let unique_sources = documents
            .iter()
            .map(|d| d.source.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();
        let avg_page_length = if documents.is_empty() {
            0.0
        } else {
            total_characters as f64 / documents.len() as f64
        };
        Self {
            total_pages: documents.len(),
            total_characters,
            avg_page_length,
            unique_sources,
        }
    }
}

/// Count items per category, sorted by category name.
pub fn category_breakdown<I>(categories: I) -> Vec<(Category, usize)>
where
    I: IntoIterator<Item = Category>,
{
    let mut counts: HashMap<Category, usize> = HashMap::new();
    for category in categories {
        *counts.entry(category).or_default() += 1;
    }
    let mut out: Vec<_> = counts.into_iter().collect();
    out.sort_by_key(|(c, _)| c.as_str());
    out
}

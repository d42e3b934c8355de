use crate::text_splitter::RecursiveTextSplitter;
use domain::categorizer::{classify, COURSE_LABEL};
use domain::models::{category_breakdown, Chunk, ChunkMetadata, Document};
use shared::utils::file_name_of;

/// Split documents into chunks numbered sequentially across the whole corpus.
/// `start_index` restarts at 0 for every document, so it is page-relative for
/// PDF pages.
pub fn split_documents(documents: &[Document], splitter: &RecursiveTextSplitter) -> Vec<Chunk> {
    tracing::info!(
        chunk_size = splitter.chunk_size(),
        overlap = splitter.chunk_overlap(),
        "Splitting {} documents",
        documents.len()
    );
    let mut chunks = Vec::new();

    for document in documents {
        let (category, topic) = classify(file_name_of(&document.source));
        let text = document.text.as_str();
        // Spans come back in order, so char offsets can be counted incrementally.
        let mut byte_cursor = 0;
        let mut char_cursor = 0;

        for span in splitter.split_spans(text) {
            char_cursor += text[byte_cursor..span.start].chars().count();
            byte_cursor = span.start;
            let piece = span.slice(text);
            chunks.push(Chunk {
                text: piece.to_string(),
                metadata: ChunkMetadata {
                    chunk_id: chunks.len(),
                    chunk_length: piece.chars().count(),
                    start_index: char_cursor,
                    page: document.page(),
                    category,
                    topic: topic.clone(),
                    source: document.source.clone(),
                    course: COURSE_LABEL.to_string(),
                },
            });
        }
    }

    tracing::info!("Created {} chunks", chunks.len());
    for (category, count) in category_breakdown(chunks.iter().map(|c| c.metadata.category)) {
        tracing::info!("  {}: {} chunks", category.as_str().to_uppercase(), count);
    }
    chunks
}

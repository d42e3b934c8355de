use application::ingest_service::IngestService;
use application::rag_service::RagService;
use application::retriever::Retriever;
use domain::error::RagError;
use domain::models::{Chunk, SearchType};
use infrastructure::chunker::split_documents;
use infrastructure::query_logger::QueryLogger;
use infrastructure::text_splitter::RecursiveTextSplitter;
use infrastructure::vector_store::VectorStore;
use tests::{
    fitness_documents, read_log_lines, test_config, BrokenEmbedder, FailingModel,
    HashingEmbedder, ScriptedModel,
};

fn corpus_chunks() -> Vec<Chunk> {
    let splitter = RecursiveTextSplitter::new(120, 30).unwrap();
    split_documents(&fitness_documents(), &splitter)
}

async fn build_store(dir: &std::path::Path) -> VectorStore {
    VectorStore::create(dir, corpus_chunks(), &HashingEmbedder::new(), false)
        .await
        .unwrap()
}

#[test]
fn chunks_are_numbered_bounded_and_traceable() {
    let documents = fitness_documents();
    let chunks = corpus_chunks();
    assert!(chunks.len() > documents.len());

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata.chunk_id, i);
        assert!(chunk.text.chars().count() <= 120);
        assert_eq!(chunk.metadata.chunk_length, chunk.text.chars().count());

        let doc = documents
            .iter()
            .find(|d| d.source == chunk.metadata.source)
            .unwrap();
        let rebuilt: String = doc
            .text
            .chars()
            .skip(chunk.metadata.start_index)
            .take(chunk.metadata.chunk_length)
            .collect();
        assert_eq!(rebuilt, chunk.text);
    }
}

#[test]
fn chunk_metadata_carries_category_and_topic() {
    let chunks = corpus_chunks();
    let exercise = chunks
        .iter()
        .find(|c| c.metadata.source.contains("Exercise Selection"))
        .unwrap();
    assert_eq!(exercise.metadata.category.as_str(), "training");
    assert_eq!(exercise.metadata.topic, "Exercise Selection");
    assert_eq!(exercise.metadata.course, "Menno Henselmans PTC");
}

#[tokio::test]
async fn protein_question_retrieves_the_protein_lecture() {
    let dir = tempfile::tempdir().unwrap();
    let store = build_store(dir.path()).await;
    let retriever = Retriever::new(store, HashingEmbedder::new(), 2, SearchType::Similarity);

    let results = retriever.retrieve("What is protein?").await.unwrap();
    assert!(!results.is_empty() && results.len() <= 2);
    assert!(results
        .iter()
        .any(|r| r.chunk.metadata.topic == "Protein"
            && r.chunk.metadata.category.as_str() == "nutrition"));
    assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
}

#[tokio::test]
async fn reloaded_index_answers_like_the_fresh_one() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashingEmbedder::new();
    let fresh = build_store(dir.path()).await;
    let loaded = VectorStore::load(dir.path(), "hashing-bow").unwrap();

    assert_eq!(fresh.stats().total_embeddings, loaded.stats().total_embeddings);
    for query in ["What is protein?", "how long should I sleep", "squat depth"] {
        let a = fresh
            .similarity_search_with_score(&embedder, query, 3)
            .await
            .unwrap();
        let b = loaded
            .similarity_search_with_score(&embedder, query, 3)
            .await
            .unwrap();
        let ids = |r: &[domain::models::ScoredChunk]| {
            r.iter().map(|s| s.chunk.metadata.chunk_id).collect::<Vec<_>>()
        };
        assert_eq!(ids(&a[..]), ids(&b[..]));
        for (x, y) in a.iter().zip(&b) {
            assert!((x.distance - y.distance).abs() < 1e-6);
        }
    }
}

#[tokio::test]
async fn empty_chunk_set_is_refused_before_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashingEmbedder::new();
    let service = IngestService::new(test_config(dir.path()), &embedder);

    let err = service
        .build_from_chunks(Vec::new(), false)
        .await
        .err()
        .unwrap();
    assert!(matches!(err.downcast_ref::<RagError>(), Some(RagError::NoInput)));
    assert_eq!(embedder.calls(), 0);
    assert!(!service.index_exists());
}

#[tokio::test]
async fn missing_corpus_fails_before_embedding() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = HashingEmbedder::new();
    let service = IngestService::new(test_config(dir.path()), &embedder);

    let err = service.build_index(false).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RagError>(),
        Some(RagError::CorpusNotFound(_))
    ));
    assert_eq!(embedder.calls(), 0);
}

#[tokio::test]
async fn existing_index_is_kept_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    build_store(&config.vector_db_path).await;

    let embedder = HashingEmbedder::new();
    let service = IngestService::new(config.clone(), &embedder);
    let err = service.build_index(false).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RagError>(),
        Some(RagError::IndexExists(_))
    ));
    assert_eq!(embedder.calls(), 0);
    assert!(VectorStore::load(&config.vector_db_path, "hashing-bow").is_ok());
}

#[test]
fn loading_before_building_reports_missing_index() {
    let dir = tempfile::tempdir().unwrap();
    let err = VectorStore::load(dir.path().join("vector_index"), "hashing-bow")
        .err()
        .unwrap();
    assert!(matches!(
        err.downcast_ref::<RagError>(),
        Some(RagError::IndexNotFound(_))
    ));
}

#[tokio::test]
async fn successful_answer_is_grounded_and_logged() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = build_store(&config.vector_db_path).await;
    let retriever = Retriever::new(store, HashingEmbedder::new(), 2, SearchType::Similarity);
    let model = ScriptedModel::new("Aim for about 1.6 g/kg per day.");
    let logger = QueryLogger::open(config.query_log_path()).unwrap();
    let service = RagService::new(retriever, model, config.generation_params(), logger);

    let outcome = service.ask("What is protein?").await.unwrap();
    let (answer, sources) = outcome.into_parts();
    assert_eq!(answer.as_deref(), Some("Aim for about 1.6 g/kg per day."));
    assert!(!sources.is_empty());

    let lines = read_log_lines(&config.query_log_path());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["success"], true);
    assert_eq!(lines[0]["question"], "What is protein?");
    assert_eq!(lines[0]["num_sources"], sources.len());
    assert!(lines[0]["error"].is_null());
}

#[tokio::test]
async fn prompt_contains_retrieved_context_and_question() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = build_store(&config.vector_db_path).await;
    let retriever = Retriever::new(store, HashingEmbedder::new(), 1, SearchType::Similarity);
    let logger = QueryLogger::open(config.query_log_path()).unwrap();
    let service = RagService::new(
        retriever,
        ScriptedModel::new("ok"),
        config.generation_params(),
        logger,
    );

    let (_, sources) = service
        .ask("What is protein?")
        .await
        .unwrap()
        .into_parts();
    let prompts = service_prompts(&service);
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&sources[0].chunk.text));
    assert!(prompts[0].contains("What is protein?"));
    assert!(!prompts[0].contains("{context}"));
}

fn service_prompts(service: &RagService<HashingEmbedder, ScriptedModel>) -> Vec<String> {
    service.model().prompts()
}

#[tokio::test]
async fn generation_failure_yields_sentinel_and_one_failure_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = build_store(&config.vector_db_path).await;
    let retriever = Retriever::new(store, HashingEmbedder::new(), 2, SearchType::Similarity);
    let logger = QueryLogger::open(config.query_log_path()).unwrap();
    let service = RagService::new(retriever, FailingModel, config.generation_params(), logger);

    let before = read_log_lines(&config.query_log_path()).len();
    let outcome = service.ask("What is protein?").await.unwrap();
    assert!(!outcome.is_answer());
    let (answer, sources) = outcome.into_parts();
    assert!(answer.is_none());
    assert!(sources.is_empty());

    let lines = read_log_lines(&config.query_log_path());
    assert_eq!(lines.len(), before + 1);
    let last = &lines[lines.len() - 1];
    assert_eq!(last["success"], false);
    assert!(last["error"].as_str().unwrap().contains("503"));
    assert!(last["elapsed_time"].as_f64().is_some());
}

#[tokio::test]
async fn retrieval_failure_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = build_store(&config.vector_db_path).await;
    let retriever = Retriever::new(store, BrokenEmbedder, 2, SearchType::Similarity);
    let logger = QueryLogger::open(config.query_log_path()).unwrap();
    let model = ScriptedModel::new("unused");
    let service = RagService::new(retriever, model, config.generation_params(), logger);

    let (answer, sources) = service
        .ask("What is protein?")
        .await
        .unwrap()
        .into_parts();
    assert!(answer.is_none());
    assert!(sources.is_empty());
    assert!(service.model().prompts().is_empty());

    let lines = read_log_lines(&config.query_log_path());
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["success"], false);
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn failed_log_write_is_raised_after_a_failed_answer() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = build_store(&config.vector_db_path).await;
    let retriever = Retriever::new(store, HashingEmbedder::new(), 2, SearchType::Similarity);
    let logger = QueryLogger::open("/dev/full").unwrap();
    let service = RagService::new(retriever, FailingModel, config.generation_params(), logger);

    assert!(service.ask("What is protein?").await.is_err());
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn failed_log_write_is_raised_after_a_good_answer() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let store = build_store(&config.vector_db_path).await;
    let retriever = Retriever::new(store, HashingEmbedder::new(), 2, SearchType::Similarity);
    let logger = QueryLogger::open("/dev/full").unwrap();
    let model = ScriptedModel::new("Eat protein.");
    let service = RagService::new(retriever, model, config.generation_params(), logger);

    let err = service.ask("What is protein?").await.err().unwrap();
    assert!(err.downcast_ref::<RagError>().is_none());
    assert_eq!(service.model().prompts().len(), 1);
}

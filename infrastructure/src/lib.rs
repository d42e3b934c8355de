pub mod chunker;
pub mod config;
pub mod embedder;
pub mod ollama_client;
pub mod openai_client;
pub mod pdf_loader;
pub mod query_logger;
pub mod search;
pub mod text_splitter;
pub mod vector_store;

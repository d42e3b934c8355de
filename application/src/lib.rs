pub mod context;
pub mod ingest_service;
pub mod rag_service;
pub mod retriever;

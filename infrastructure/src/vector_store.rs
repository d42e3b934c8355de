//! Persisted vector index.
//!
//! A store directory holds `index.bin` (bincode-encoded [`FlatIndex`]) and
//! `docstore.db` (SQLite side table mapping vector position to chunk, plus
//! index metadata). `index.bin` is written last and doubles as the
//! "index exists" marker.

use crate::search::FlatIndex;
use anyhow::Context;
use domain::categorizer::Category;
use domain::embedding::TextEmbedder;
use domain::error::RagError;
use domain::models::{Chunk, ChunkMetadata, ScoredChunk};
use memmap2::Mmap;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use shared::types::Result;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const INDEX_FILE: &str = "index.bin";
pub const DOCSTORE_FILE: &str = "docstore.db";

#[derive(Debug, Clone, PartialEq)]
pub struct IndexMeta {
    pub embedding_model: String,
    pub dimension: usize,
    pub count: usize,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexStats {
    pub total_embeddings: usize,
    pub embedding_dimension: usize,
    pub embedding_model: String,
}

pub struct VectorStore {
    dir: PathBuf,
    index: FlatIndex,
    chunks: Vec<Chunk>,
    meta: IndexMeta,
}

impl VectorStore {
    pub fn exists(dir: impl AsRef<Path>) -> bool {
        dir.as_ref().join(INDEX_FILE).is_file()
    }

    /// Embed `chunks` and persist a fresh index under `dir`.
    ///
    /// Refuses with `NoInput` on an empty chunk set (before any embedding call)
    /// and with `IndexExists` when an index is present and `force_recreate` is
    /// false.
    pub async fn create<E: TextEmbedder>(
        dir: impl AsRef<Path>,
        chunks: Vec<Chunk>,
        embedder: &E,
        force_recreate: bool,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if chunks.is_empty() {
            return Err(RagError::NoInput.into());
        }
        if Self::exists(&dir) && !force_recreate {
            return Err(RagError::IndexExists(dir).into());
        }

        tracing::info!(
            "Embedding {} chunks with {}",
            chunks.len(),
            embedder.model_id()
        );
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embedder.embed_documents(&texts).await?;
        anyhow::ensure!(
            vectors.len() == chunks.len(),
            "embedder returned {} vectors for {} chunks",
            vectors.len(),
            chunks.len()
        );
        let index = FlatIndex::from_vectors(&vectors)?;
        let meta = IndexMeta {
            embedding_model: embedder.model_id().to_string(),
            dimension: index.dimension(),
            count: index.len(),
            created_at: chrono::Local::now().to_rfc3339(),
        };

        let store = Self {
            dir,
            index,
            chunks,
            meta,
        };
        store.persist()?;
        tracing::info!(
            "Vector index with {} embeddings saved to {}",
            store.meta.count,
            store.dir.display()
        );
        Ok(store)
    }

    /// Load a persisted index, checking it was built with `embedding_model`.
    pub fn load(dir: impl AsRef<Path>, embedding_model: &str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let index_path = dir.join(INDEX_FILE);
        if !index_path.is_file() {
            return Err(RagError::IndexNotFound(dir).into());
        }
        tracing::info!("Loading vector index from {}", dir.display());

        let file = File::open(&index_path)
            .with_context(|| format!("failed to open {}", index_path.display()))?;
        // SAFETY: the index file is only replaced wholesale via rename, never
        // modified in place, while a store may be reading it.
        let mmap = unsafe { Mmap::map(&file)? };
        let index: FlatIndex = bincode::deserialize(&mmap)
            .with_context(|| format!("corrupt index file {}", index_path.display()))?;

        let docstore = dir.join(DOCSTORE_FILE);
        if !docstore.is_file() {
            anyhow::bail!(
                "index at {} has no {DOCSTORE_FILE}; rebuild it with `ingest --force`",
                dir.display()
            );
        }
        let conn = Connection::open_with_flags(&docstore, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", docstore.display()))?;
        let meta = read_meta(&conn)?;
        let chunks = read_chunks(&conn)?;

        if meta.embedding_model != embedding_model {
            return Err(RagError::EmbeddingMismatch {
                expected: meta.embedding_model,
                expected_dim: meta.dimension,
                actual: embedding_model.to_string(),
                actual_dim: meta.dimension,
            }
            .into());
        }
        anyhow::ensure!(
            meta.dimension == index.dimension() && chunks.len() == index.len(),
            "index at {} is inconsistent: {} vectors of {} dims, {} chunks, metadata says {} dims",
            dir.display(),
            index.len(),
            index.dimension(),
            chunks.len(),
            meta.dimension
        );

        tracing::info!("Loaded {} embeddings", index.len());
        Ok(Self {
            dir,
            index,
            chunks,
            meta,
        })
    }

    /// Embed `query` and return up to `k` nearest chunks.
    pub async fn similarity_search_with_score<E: TextEmbedder>(
        &self,
        embedder: &E,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let vector = embedder.embed_query(query).await?;
        if vector.len() != self.meta.dimension {
            return Err(RagError::EmbeddingMismatch {
                expected: self.meta.embedding_model.clone(),
                expected_dim: self.meta.dimension,
                actual: embedder.model_id().to_string(),
                actual_dim: vector.len(),
            }
            .into());
        }
        Ok(self.search_by_vector(&vector, k))
    }

    pub fn search_by_vector(&self, vector: &[f32], k: usize) -> Vec<ScoredChunk> {
        self.index
            .search(vector, k)
            .into_iter()
            .filter_map(|(position, distance)| {
                self.chunks.get(position).map(|chunk| ScoredChunk {
                    chunk: chunk.clone(),
                    distance,
                })
            })
            .collect()
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_embeddings: self.index.len(),
            embedding_dimension: self.index.dimension(),
            embedding_model: self.meta.embedding_model.clone(),
        }
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn persist(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let index_path = self.dir.join(INDEX_FILE);
        // Drop the marker first so a half-written rebuild is never loadable.
        if index_path.exists() {
            fs::remove_file(&index_path)?;
        }
        let docstore = self.dir.join(DOCSTORE_FILE);
        for stale in [
            docstore.clone(),
            self.dir.join(format!("{DOCSTORE_FILE}-wal")),
            self.dir.join(format!("{DOCSTORE_FILE}-shm")),
        ] {
            if stale.exists() {
                fs::remove_file(&stale)?;
            }
        }

        let mut conn = Connection::open(&docstore)?;
        setup_db(&conn)?;
        write_docstore(&mut conn, &self.chunks, &self.meta)?;

        let bytes = bincode::serialize(&self.index)?;
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &index_path)?;
        Ok(())
    }
}

fn setup_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode=DELETE;
        CREATE TABLE IF NOT EXISTS chunks (
            position INTEGER PRIMARY KEY,
            text TEXT NOT NULL,
            source TEXT NOT NULL,
            chunk_id INTEGER NOT NULL,
            chunk_length INTEGER NOT NULL,
            start_index INTEGER NOT NULL,
            category TEXT NOT NULL,
            topic TEXT NOT NULL,
            course TEXT NOT NULL DEFAULT '',
            page INTEGER
        );
        CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
        CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
    ",
    )
}

fn write_docstore(conn: &mut Connection, chunks: &[Chunk], meta: &IndexMeta) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO chunks (position, text, source, chunk_id, chunk_length, start_index,
                                 category, topic, course, page)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for (position, chunk) in chunks.iter().enumerate() {
            let m = &chunk.metadata;
            stmt.execute(params![
                position as i64,
                chunk.text,
                m.source,
                m.chunk_id as i64,
                m.chunk_length as i64,
                m.start_index as i64,
                m.category.as_str(),
                m.topic,
                m.course,
                m.page.map(|p| p as i64),
            ])?;
        }
        let mut meta_stmt = tx.prepare("INSERT OR REPLACE INTO meta (key, value) VALUES (?1, ?2)")?;
        for (key, value) in [
            ("embedding_model", meta.embedding_model.clone()),
            ("dimension", meta.dimension.to_string()),
            ("count", meta.count.to_string()),
            ("created_at", meta.created_at.clone()),
        ] {
            meta_stmt.execute(params![key, value])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn read_meta(conn: &Connection) -> Result<IndexMeta> {
    let get = |key: &str| -> Result<String> {
        conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| row.get(0))
            .optional()?
            .with_context(|| format!("index metadata is missing `{key}`"))
    };
    Ok(IndexMeta {
        embedding_model: get("embedding_model")?,
        dimension: get("dimension")?.parse().context("bad `dimension` metadata")?,
        count: get("count")?.parse().context("bad `count` metadata")?,
        created_at: get("created_at")?,
    })
}

fn read_chunks(conn: &Connection) -> Result<Vec<Chunk>> {
    let mut stmt = conn.prepare(
        "SELECT text, source, chunk_id, chunk_length, start_index, category, topic, course, page
         FROM chunks ORDER BY position",
    )?;
    let rows = stmt.query_map([], |row| {
        let category: String = row.get(5)?;
        Ok(Chunk {
            text: row.get(0)?,
            metadata: ChunkMetadata {
                source: row.get(1)?,
                chunk_id: row.get::<_, i64>(2)? as usize,
                chunk_length: row.get::<_, i64>(3)? as usize,
                start_index: row.get::<_, i64>(4)? as usize,
                page: row.get::<_, Option<i64>>(8)?.map(|p| p as usize),
                category: Category::parse(&category),
                topic: row.get(6)?,
                course: row.get(7)?,
            },
        })
    })?;
    let mut chunks = Vec::new();
    for chunk in rows {
        chunks.push(chunk?);
    }
    Ok(chunks)
}

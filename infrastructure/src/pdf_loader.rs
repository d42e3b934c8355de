use anyhow::anyhow;
use domain::categorizer::categorize;
use domain::error::RagError;
use domain::models::{category_breakdown, Document};
use rayon::prelude::*;
use shared::types::Result;
use shared::utils::{file_name_of, is_supported_file};
use std::path::{Path, PathBuf};

/// Loads every PDF under a corpus directory, one `Document` per page.
pub struct PdfLoader {
    root_path: PathBuf,
}

impl PdfLoader {
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// All PDF paths under the root, sorted. Fails before any parsing work when
    /// the directory is missing or holds no PDFs.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root_path.is_dir() {
            return Err(RagError::CorpusNotFound(self.root_path.clone()).into());
        }
        let mut files = Vec::new();
        Self::collect_files_recursive(&self.root_path, &mut files)?;
        if files.is_empty() {
            return Err(RagError::NoPdfFiles(self.root_path.clone()).into());
        }
        files.sort();
        Ok(files)
    }

    pub fn load(&self) -> Result<Vec<Document>> {
        let files = self.collect_files()?;
        tracing::info!(
            "Found {} PDF files in {}",
            files.len(),
            self.root_path.display()
        );
        let names: Vec<String> = files
            .iter()
            .map(|p| file_name_of(&p.to_string_lossy()).to_string())
            .collect();
        for (category, count) in category_breakdown(names.iter().map(|n| categorize(n))) {
            tracing::info!("  {}: {} files", category.as_str().to_uppercase(), count);
        }
        let documents = self.load_paths(&files);
        tracing::info!("Loaded {} pages from {} PDFs", documents.len(), files.len());
        Ok(documents)
    }

    /// Extract in parallel. Unreadable PDFs, and PDFs without any text, are
    /// logged and skipped.
    pub fn load_paths(&self, paths: &[PathBuf]) -> Vec<Document> {
        let results: Vec<(PathBuf, Result<Vec<String>>)> = paths
            .par_iter()
            .map(|path| (path.clone(), extract_pages(path)))
            .collect();

        results
            .into_iter()
            .flat_map(|(path, pages)| match pages {
                Ok(pages) if pages.iter().all(|p| p.trim().is_empty()) => {
                    tracing::warn!("No text content found in {}", path.display());
                    Vec::new()
                }
                Ok(pages) => to_documents(&path, pages),
                Err(e) => {
                    tracing::warn!("Skipping {}: {e:#}", path.display());
                    Vec::new()
                }
            })
            .collect()
    }

    fn collect_files_recursive(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                Self::collect_files_recursive(&path, files)?;
            } else if is_supported_file(&path) {
                files.push(path);
            }
        }
        Ok(())
    }
}

fn extract_pages(path: &Path) -> Result<Vec<String>> {
    // pdf-extract panics on some malformed files.
    std::panic::catch_unwind(|| pdf_extract::extract_text_by_pages(path))
        .map_err(|_| anyhow!("PDF parser panicked on {}", path.display()))?
        .map_err(|e| anyhow!("failed to extract text from {}: {e}", path.display()))
}

/// One document per page, numbered from 0. Blank pages are kept so page
/// numbers and counts match the file.
fn to_documents(path: &Path, pages: Vec<String>) -> Vec<Document> {
    let source = path.to_string_lossy().to_string();
    let file_name = file_name_of(&source).to_string();
    pages
        .into_iter()
        .enumerate()
        .map(|(page, text)| {
            let mut document = Document::page_of(text, source.clone(), page);
            document
                .metadata
                .insert("file_name".to_string(), file_name.clone());
            document
        })
        .collect()
}

use anyhow::{anyhow, Context};
use domain::query_log::QueryLogRecord;
use shared::types::Result;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only JSON-lines log of every question asked.
///
/// Each record goes out as a single `write_all` of one full line under the
/// mutex, so concurrent callers never interleave partial lines. Write errors
/// are returned, never swallowed.
pub struct QueryLogger {
    path: PathBuf,
    file: Mutex<File>,
}

impl QueryLogger {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open query log {}", path.display()))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &QueryLogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = self
            .file
            .lock()
            .map_err(|_| anyhow!("query log lock poisoned"))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("failed to write query log {}", self.path.display()))?;
        file.flush()?;
        Ok(())
    }
}

//! Filesystem capability provider.
//!
//! Services `fs/readTextFile` and `fs/writeTextFile` requests from agents.
//! Every write is recorded in an append-only [`FileChange`] log capturing
//! before/after content for review and undo, and reported to the registered
//! observer.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::acp::types::{ReadTextFileParams, ReadTextFileResult, WriteTextFileParams};
use crate::{AppError, Result};

/// Receives a notification for every tracked file write.
pub trait FileChangeObserver: Send + Sync {
    fn file_changed(&self, change: &FileChange);
}

/// A single file modification made by an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct FileChange {
    pub path: String,
    pub old_content: String,
    pub new_content: String,
    pub timestamp: DateTime<Utc>,
    /// Session on whose behalf the write happened, when known.
    pub session_id: String,
    /// Agent that performed the write, when known.
    pub agent_name: String,
}

/// Handles agent file-system requests and tracks modifications.
pub struct FsProvider {
    changes: Mutex<Vec<FileChange>>,
    observer: Arc<dyn FileChangeObserver>,
}

impl FsProvider {
    #[must_use]
    pub fn new(observer: Arc<dyn FileChangeObserver>) -> Self {
        Self {
            changes: Mutex::new(Vec::new()),
            observer,
        }
    }

    /// Read a text file with an optional line window.
    ///
    /// `line` is 1-based; zero or negative defaults to 1. `limit` bounds the
    /// number of lines returned; zero means to end of file. A `line` beyond
    /// the end of the file yields empty content without error. The selection
    /// gets a trailing `\n` iff it extends to the last line of a non-empty
    /// file.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` when the file cannot be opened or read.
    pub async fn read_text_file(
        &self,
        params: ReadTextFileParams,
    ) -> Result<ReadTextFileResult> {
        let raw = tokio::fs::read_to_string(&params.path)
            .await
            .map_err(|e| AppError::Io(format!("failed to read file {}: {e}", params.path)))?;

        let lines: Vec<&str> = raw.lines().collect();
        let total = lines.len();

        let offset = if params.line <= 0 { 1 } else { params.line };
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        if offset > total {
            return Ok(ReadTextFileResult {
                content: String::new(),
            });
        }

        let start = offset - 1;
        let mut end = total;
        if params.limit > 0 {
            let limit = usize::try_from(params.limit).unwrap_or(usize::MAX);
            let candidate = start.saturating_add(limit);
            if candidate < end {
                end = candidate;
            }
        }

        let mut content = lines[start..end].join("\n");
        if end == total && total > 0 {
            content.push('\n');
        }

        Ok(ReadTextFileResult { content })
    }

    /// Write content to a file, creating parent directories as needed.
    ///
    /// Reads the existing content first (a missing file counts as empty) so
    /// the change log captures the old state, then appends a [`FileChange`]
    /// and notifies the observer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` on directory-creation or write failure.
    pub async fn write_text_file(
        &self,
        params: WriteTextFileParams,
        agent_name: &str,
    ) -> Result<()> {
        let old_content = tokio::fs::read_to_string(&params.path)
            .await
            .unwrap_or_default();

        if let Some(dir) = Path::new(&params.path).parent() {
            if !dir.as_os_str().is_empty() {
                create_dir_all(dir).await.map_err(|e| {
                    AppError::Io(format!(
                        "failed to create directories for {}: {e}",
                        params.path
                    ))
                })?;
            }
        }

        write_file(&params.path, params.content.as_bytes())
            .await
            .map_err(|e| AppError::Io(format!("failed to write file {}: {e}", params.path)))?;

        let change = FileChange {
            path: params.path,
            old_content,
            new_content: params.content,
            timestamp: Utc::now(),
            session_id: params.session_id,
            agent_name: agent_name.to_owned(),
        };

        self.changes.lock().await.push(change.clone());
        debug!(path = %change.path, "file written by agent");
        self.observer.file_changed(&change);

        Ok(())
    }

    /// Snapshot of all recorded file changes, oldest first.
    pub async fn changes(&self) -> Vec<FileChange> {
        self.changes.lock().await.clone()
    }
}

/// Create `dir` and its ancestors with mode 0755.
async fn create_dir_all(dir: &Path) -> std::io::Result<()> {
    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o755);
    builder.create(dir).await
}

/// Create-or-truncate `path` with mode 0644 and write `content`. The mode
/// applies only at creation; an existing file keeps its permissions.
async fn write_file(path: &str, content: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o644);
    let mut file = options.open(path).await?;
    file.write_all(content).await?;
    file.flush().await
}

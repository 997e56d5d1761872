//! Loads the input corpus from the data directory.

use crate::domain::document::Document;
use crate::infrastructure::parsing::DocumentParser;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("data directory {path:?} does not exist")]
    MissingDirectory { path: PathBuf },
    #[error("failed to list {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct DirectoryReader<'a> {
    root: PathBuf,
    recursive: bool,
    pdf_parser: Option<&'a dyn DocumentParser>,
}

impl<'a> DirectoryReader<'a> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: false,
            pdf_parser: None,
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// PDFs are only ingested when a parser is attached.
    pub fn with_pdf_parser(mut self, parser: &'a dyn DocumentParser) -> Self {
        self.pdf_parser = Some(parser);
        self
    }

    /// Reads every visible file under the root, sorted by path. Files that
    /// cannot be turned into text are logged and skipped.
    pub async fn load(&self) -> Result<Vec<Document>, IngestError> {
        let is_dir = tokio::fs::metadata(&self.root)
            .await
            .is_ok_and(|meta| meta.is_dir());
        if !is_dir {
            return Err(IngestError::MissingDirectory {
                path: self.root.clone(),
            });
        }
        let mut paths = self.collect_files().await?;
        paths.sort();

        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            match self.read_one(&path).await {
                Some(text) => {
                    let id = relative_id(&self.root, &path);
                    debug!(id = id.as_str(), bytes = text.len(), "Loaded document");
                    documents.push(Document::new(id, text, path));
                }
                None => continue,
            }
        }
        info!(
            root = %self.root.display(),
            documents = documents.len(),
            "Finished loading documents"
        );
        Ok(documents)
    }

    /// Visible regular files under the root, descending only when recursive.
    /// Symlinks are followed; dangling ones are skipped.
    async fn collect_files(&self) -> Result<Vec<PathBuf>, IngestError> {
        let mut pending = vec![self.root.clone()];
        let mut files = Vec::new();
        while let Some(dir) = pending.pop() {
            let list_error = |source| IngestError::Io {
                path: dir.clone(),
                source,
            };
            let mut entries = tokio::fs::read_dir(&dir).await.map_err(list_error)?;
            while let Some(entry) = entries.next_entry().await.map_err(list_error)? {
                let path = entry.path();
                if is_hidden(&path) {
                    continue;
                }
                let meta = match tokio::fs::metadata(&path).await {
                    Ok(meta) => meta,
                    Err(err) => {
                        warn!(path = %path.display(), %err, "Skipping entry that cannot be inspected");
                        continue;
                    }
                };
                if meta.is_dir() {
                    if self.recursive {
                        pending.push(path);
                    }
                } else if meta.is_file() {
                    files.push(path);
                }
            }
        }
        Ok(files)
    }

    async fn read_one(&self, path: &Path) -> Option<String> {
        if is_pdf(path) {
            let Some(parser) = self.pdf_parser else {
                warn!(path = %path.display(), "Skipping PDF: no parsing service configured");
                return None;
            };
            return match parser.to_markdown(path).await {
                Ok(markdown) => Some(markdown),
                Err(err) => {
                    warn!(path = %path.display(), %err, "Skipping PDF that failed to parse");
                    None
                }
            };
        }
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(path = %path.display(), %err, "Skipping unreadable file");
                None
            }
        }
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

fn relative_id(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

use crate::domain::output::CodeOutput;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("refusing to write unsafe file name {filename:?}: {reason}")]
    UnsafeFilename { filename: String, reason: &'static str },
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Writes generated code under a fixed output directory.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Writes `output.code` to `<root>/<output.filename>` and returns the path.
    /// Names that could escape the directory are rejected, never rewritten.
    pub async fn save(&self, output: &CodeOutput) -> Result<PathBuf, PersistError> {
        validate_filename(&output.filename)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| PersistError::Io {
                path: self.root.clone(),
                source,
            })?;
        let path = self.root.join(&output.filename);
        tokio::fs::write(&path, output.code.as_bytes())
            .await
            .map_err(|source| PersistError::Io {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), bytes = output.code.len(), "Saved generated file");
        Ok(path)
    }
}

/// Accepts a single path component made of ASCII letters, digits, `.`, `_`
/// and `-`, not starting with a dot.
pub fn validate_filename(filename: &str) -> Result<(), PersistError> {
    let reject = |reason: &'static str| -> Result<(), PersistError> {
        Err(PersistError::UnsafeFilename {
            filename: filename.to_string(),
            reason,
        })
    };
    if filename.is_empty() {
        return reject("empty name");
    }
    if filename.starts_with('.') {
        return reject("hidden files and relative components are not allowed");
    }
    if filename.contains(['/', '\\']) {
        return reject("path separators are not allowed");
    }
    if !filename
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return reject("only letters, digits, '.', '_' and '-' are allowed");
    }
    Ok(())
}

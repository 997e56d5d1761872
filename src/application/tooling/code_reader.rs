use super::{ToolError, string_argument};
use crate::config::prompts::{CODE_READER_TOOL_DESCRIPTION, CODE_READER_TOOL_NAME};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Reads files from the input directory on the agent's behalf.
///
/// Read failures are returned as an `{"error": ...}` value rather than an
/// `Err`, so the agent sees them as an ordinary observation. The file name is
/// joined to the root as given; callers are trusted to pass relative names.
#[derive(Debug, Clone)]
pub struct CodeReaderTool {
    root: PathBuf,
}

impl CodeReaderTool {
    pub const NAME: &'static str = CODE_READER_TOOL_NAME;
    pub const DESCRIPTION: &'static str = CODE_READER_TOOL_DESCRIPTION;

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn invoke(&self, input: &Value) -> Result<Value, ToolError> {
        let file_name = string_argument(input, &["file_name", "filename", "path"]).ok_or_else(
            || ToolError::InvalidInput {
                tool: Self::NAME,
                reason: "expected a file name".into(),
            },
        )?;
        Ok(self.read(&file_name).await)
    }

    pub async fn read(&self, file_name: &str) -> Value {
        let path = self.root.join(file_name);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                println!("Code is read\n");
                debug!(path = %path.display(), bytes = content.len(), "Read file for agent");
                json!({ "file_content": content })
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "Agent asked for an unreadable file");
                json!({ "error": format!("Error reading code: {err}") })
            }
        }
    }
}

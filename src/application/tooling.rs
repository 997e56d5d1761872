pub mod code_reader;
pub mod documentation;

pub use code_reader::CodeReaderTool;
pub use documentation::DocumentationTool;

use crate::application::rag::RagError;
use crate::model::ModelProvider;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool requested: {0}")]
    UnknownTool(String),
    #[error("invalid input for tool '{tool}': {reason}")]
    InvalidInput { tool: &'static str, reason: String },
    #[error("documentation lookup failed: {0}")]
    Query(#[from] RagError),
}

impl ToolError {
    pub fn user_message(&self) -> String {
        match self {
            ToolError::Query(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

/// The capabilities the agent can call.
pub enum Tool<P: ModelProvider> {
    Documentation(DocumentationTool<P>),
    CodeReader(CodeReaderTool),
}

impl<P: ModelProvider> Tool<P> {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Documentation(_) => DocumentationTool::<P>::NAME,
            Tool::CodeReader(_) => CodeReaderTool::NAME,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::Documentation(_) => DocumentationTool::<P>::DESCRIPTION,
            Tool::CodeReader(_) => CodeReaderTool::DESCRIPTION,
        }
    }

    pub async fn invoke(&self, input: &Value) -> Result<Value, ToolError> {
        match self {
            Tool::Documentation(tool) => tool.invoke(input).await,
            Tool::CodeReader(tool) => tool.invoke(input).await,
        }
    }
}

pub struct ToolRegistry<P: ModelProvider> {
    tools: Vec<Tool<P>>,
}

impl<P: ModelProvider> ToolRegistry<P> {
    pub fn new(tools: Vec<Tool<P>>) -> Self {
        Self { tools }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Tool<P>> {
        self.tools
            .iter()
            .find(|tool| tool.name().eq_ignore_ascii_case(name.trim()))
    }

    /// One `- name: description` line per tool, for the agent's system prompt.
    pub fn describe(&self) -> Vec<String> {
        self.tools
            .iter()
            .map(|tool| format!("- {}: {}", tool.name(), tool.description()))
            .collect()
    }

    pub async fn invoke(&self, name: &str, input: &Value) -> Result<Value, ToolError> {
        let Some(tool) = self.get(name) else {
            warn!(requested_tool = name, "Unknown tool requested by agent");
            return Err(ToolError::UnknownTool(name.to_string()));
        };
        debug!(tool = tool.name(), "Invoking tool");
        tool.invoke(input).await
    }
}

/// Accepts either a bare JSON string or an object carrying one of `keys`.
pub(crate) fn string_argument(input: &Value, keys: &[&str]) -> Option<String> {
    match input {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => keys
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

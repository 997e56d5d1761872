use super::{ToolError, string_argument};
use crate::application::rag::QueryEngine;
use crate::config::prompts::{DOCUMENTATION_TOOL_DESCRIPTION, DOCUMENTATION_TOOL_NAME};
use crate::model::ModelProvider;
use serde_json::Value;

/// Exposes the documentation query engine to the agent.
pub struct DocumentationTool<P: ModelProvider> {
    engine: QueryEngine<P>,
}

impl<P: ModelProvider> DocumentationTool<P> {
    pub const NAME: &'static str = DOCUMENTATION_TOOL_NAME;
    pub const DESCRIPTION: &'static str = DOCUMENTATION_TOOL_DESCRIPTION;

    pub fn new(engine: QueryEngine<P>) -> Self {
        Self { engine }
    }

    pub async fn invoke(&self, input: &Value) -> Result<Value, ToolError> {
        let question = string_argument(input, &["input", "query", "question"])
            .filter(|question| !question.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidInput {
                tool: Self::NAME,
                reason: "expected a question".into(),
            })?;
        let answer = self.engine.query(&question).await?;
        Ok(Value::String(answer))
    }
}

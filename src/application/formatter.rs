//! Coerces the agent's free-text answer into a [`CodeOutput`] record.

use crate::application::agent::extract_json;
use crate::client::{ChatClient, ClientError};
use crate::config::prompts::CODE_PARSER_TEMPLATE;
use crate::domain::output::CodeOutput;
use crate::model::ModelProvider;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

const ROLE_PREFIX: &str = "assistant:";

#[derive(Debug, Error)]
pub enum FormatError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("malformed model output: {reason}")]
    MalformedOutput { reason: String, raw: String },
}

impl FormatError {
    pub fn user_message(&self) -> String {
        match self {
            FormatError::Client(err) => err.user_message(),
            FormatError::MalformedOutput { reason, .. } => {
                format!("The model did not return a valid code record ({reason}).")
            }
        }
    }
}

pub struct OutputFormatter<P: ModelProvider> {
    client: Arc<ChatClient<P>>,
}

impl<P: ModelProvider> OutputFormatter<P> {
    pub fn new(client: Arc<ChatClient<P>>) -> Self {
        Self { client }
    }

    pub async fn format(&self, agent_response: &str) -> Result<CodeOutput, FormatError> {
        let prompt = render_prompt(agent_response);
        let raw = self.client.complete(prompt).await?;
        debug!(bytes = raw.len(), "Formatter model replied");
        parse_code_output(&raw).inspect_err(|err| warn!(%err, "Discarding formatter output"))
    }
}

pub fn render_prompt(agent_response: &str) -> String {
    let schema = json!({
        "title": "CodeOutput",
        "type": "object",
        "properties": {
            "code": { "title": "Code", "type": "string" },
            "description": { "title": "Description", "type": "string" },
            "filename": { "title": "Filename", "type": "string" }
        },
        "required": ["code", "description", "filename"]
    });
    let template = CODE_PARSER_TEMPLATE.replace("{response}", agent_response);
    format!(
        "{template}\n\nHere's a JSON schema to follow:\n{schema}\n\n\
         Output a valid JSON object but do not repeat the schema."
    )
}

/// Decodes model text into a record. All three fields must be present and be
/// strings; any other keys are ignored.
pub fn parse_code_output(raw: &str) -> Result<CodeOutput, FormatError> {
    let text = strip_role_prefix(raw);
    let value = extract_json(text).ok_or_else(|| FormatError::MalformedOutput {
        reason: "no JSON object found".into(),
        raw: raw.to_string(),
    })?;
    serde_json::from_value(value).map_err(|err| FormatError::MalformedOutput {
        reason: err.to_string(),
        raw: raw.to_string(),
    })
}

fn strip_role_prefix(raw: &str) -> &str {
    let trimmed = raw.trim_start();
    match trimmed.get(..ROLE_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(ROLE_PREFIX) => &trimmed[ROLE_PREFIX.len()..],
        _ => trimmed,
    }
}

use crate::application::agent::{Agent, AgentError, AgentOptions};
use crate::application::formatter::{FormatError, OutputFormatter};
use crate::domain::output::CodeOutput;
use crate::model::ModelProvider;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Everything that can sink one turn. All variants count against the
/// session's retry budget.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl TurnError {
    pub fn user_message(&self) -> String {
        match self {
            TurnError::Agent(err) => err.user_message(),
            TurnError::Format(err) => err.user_message(),
        }
    }
}

/// Turns one user prompt into a code record.
#[async_trait]
pub trait CodeAssistant: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<CodeOutput, TurnError>;
}

/// Agent run followed by structured-output coercion. The agent conversation
/// is kept across calls.
pub struct AssistantPipeline<P: ModelProvider> {
    agent: Agent<P>,
    formatter: OutputFormatter<P>,
    max_steps: usize,
    session_id: Mutex<Option<String>>,
}

impl<P: ModelProvider> AssistantPipeline<P> {
    pub fn new(agent: Agent<P>, formatter: OutputFormatter<P>, max_steps: usize) -> Self {
        Self {
            agent,
            formatter,
            max_steps,
            session_id: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<P: ModelProvider> CodeAssistant for AssistantPipeline<P> {
    async fn generate(&self, prompt: &str) -> Result<CodeOutput, TurnError> {
        let session_id = self.session_id.lock().await.clone();
        let outcome = self
            .agent
            .run(
                prompt,
                AgentOptions {
                    session_id,
                    max_steps: self.max_steps,
                },
            )
            .await?;
        *self.session_id.lock().await = Some(outcome.session_id.clone());
        debug!(
            steps = outcome.steps.len(),
            "Agent finished; formatting response"
        );
        Ok(self.formatter.format(&outcome.response).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::tooling::ToolRegistry;
    use crate::client::{ChatClient, ClientConfig};
    use crate::model::{ModelError, ModelRequest, ModelResponse};
    use crate::types::{ChatMessage, MessageRole};
    use std::sync::Arc;

    #[derive(Clone)]
    struct ScriptedProvider {
        responses: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<&str>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(
                    responses.into_iter().map(String::from).collect(),
                )),
            }
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            let response = self.responses.lock().await.remove(0);
            Ok(ModelResponse {
                message: ChatMessage::new(MessageRole::Assistant, response),
                session_id: request.session_id,
            })
        }
    }

    fn pipeline(coder: ScriptedProvider, reader: ScriptedProvider) -> AssistantPipeline<ScriptedProvider> {
        let coder = Arc::new(ChatClient::new(coder, ClientConfig::new("codellama")));
        let reader = Arc::new(ChatClient::new(reader, ClientConfig::new("llama3.2")));
        let agent = Agent::new(coder, Arc::new(ToolRegistry::new(Vec::new())));
        AssistantPipeline::new(agent, OutputFormatter::new(reader), 4)
    }

    #[tokio::test]
    async fn produces_code_record() {
        let assistant = pipeline(
            ScriptedProvider::new(vec![r#"{"action":"final","response":"print(1)"}"#]),
            ScriptedProvider::new(vec![
                r#"assistant: {"code":"print(1)","description":"prints","filename":"foo.py"}"#,
            ]),
        );

        let output = assistant.generate("write foo").await.expect("generate");
        assert_eq!(output.code, "print(1)");
        assert_eq!(output.filename, "foo.py");
    }

    #[tokio::test]
    async fn malformed_formatter_output_is_a_format_error() {
        let assistant = pipeline(
            ScriptedProvider::new(vec![r#"{"action":"final","response":"print(1)"}"#]),
            ScriptedProvider::new(vec!["I cannot do that"]),
        );

        let err = assistant.generate("write foo").await.expect_err("malformed");
        assert!(matches!(
            err,
            TurnError::Format(FormatError::MalformedOutput { .. })
        ));
    }
}

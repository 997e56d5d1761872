mod parser;

pub(crate) use parser::extract_json;

use crate::application::tooling::{ToolError, ToolRegistry};
use crate::client::{ChatClient, ChatRequest, ClientError};
use crate::config::prompts::AGENT_CONTEXT;
use crate::model::ModelProvider;
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_MAX_STEPS: usize = 10;

/// Receives the verbose trace lines of an agent run.
pub type Echo = Arc<dyn Fn(&str) + Send + Sync>;
const VERBOSE_PREVIEW_CHARS: usize = 400;

#[derive(Debug, Clone)]
pub struct AgentStep {
    pub tool: String,
    pub input: Value,
    pub success: bool,
    pub output: Value,
}

#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub session_id: String,
    pub response: String,
    pub steps: Vec<AgentStep>,
}

#[derive(Debug, Clone)]
pub struct AgentOptions {
    /// Reusing a session id carries the conversation across turns.
    pub session_id: Option<String>,
    pub max_steps: usize,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            session_id: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error("invalid agent response: {0}")]
    InvalidResponse(String),
    #[error("agent exceeded the maximum of {0} tool interactions")]
    StepLimit(usize),
}

impl AgentError {
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Client(err) => err.user_message(),
            AgentError::Tool(err) => err.user_message(),
            AgentError::InvalidResponse(_) => {
                "The agent gave a response that could not be understood.".to_string()
            }
            AgentError::StepLimit(limit) => {
                format!("The agent did not finish within {limit} tool calls.")
            }
        }
    }
}

#[derive(Debug)]
enum AgentDirective {
    Final { response: String },
    CallTool { tool: String, input: Value },
}

/// Tool-using reasoning loop: asks the coder model for a JSON action, runs
/// the requested tool, feeds the result back, until a final answer arrives.
pub struct Agent<P: ModelProvider> {
    client: Arc<ChatClient<P>>,
    tools: Arc<ToolRegistry<P>>,
    echo: Option<Echo>,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(client: Arc<ChatClient<P>>, tools: Arc<ToolRegistry<P>>) -> Self {
        Self {
            client,
            tools,
            echo: None,
        }
    }

    /// Echo each tool call and its outcome to stdout.
    pub fn verbose(self, verbose: bool) -> Self {
        if verbose {
            self.echo_to(Arc::new(|line: &str| println!("{line}")))
        } else {
            Self { echo: None, ..self }
        }
    }

    /// Sends the verbose trace to `echo` instead of stdout.
    pub fn echo_to(mut self, echo: Echo) -> Self {
        self.echo = Some(echo);
        self
    }

    fn trace(&self, line: impl FnOnce() -> String) {
        if let Some(echo) = &self.echo {
            echo(&line());
        }
    }

    pub async fn run(
        &self,
        prompt: &str,
        options: AgentOptions,
    ) -> Result<AgentOutcome, AgentError> {
        info!("Agent run started");
        let mut session_id = options.session_id;
        let mut steps = Vec::new();
        let system_prompt = self.system_prompt();
        let mut next_prompt = initial_user_prompt(prompt);
        let mut remaining_steps = options.max_steps;

        loop {
            debug!(
                session = session_id.as_deref(),
                remaining_steps, "Submitting agent turn to model provider"
            );
            let result = self
                .client
                .chat(ChatRequest {
                    prompt: next_prompt,
                    system_prompt: Some(system_prompt.clone()),
                    session_id: session_id.clone(),
                })
                .await?;
            session_id = Some(result.session_id.clone());

            match parser::parse_agent_action(&result.content)? {
                AgentDirective::Final { response } => {
                    info!(
                        session_id = result.session_id.as_str(),
                        steps = steps.len(),
                        "Agent returned final response"
                    );
                    return Ok(AgentOutcome {
                        session_id: result.session_id,
                        response,
                        steps,
                    });
                }
                AgentDirective::CallTool { tool, input } => {
                    if remaining_steps == 0 {
                        warn!("Agent exceeded max tool interactions");
                        return Err(AgentError::StepLimit(options.max_steps));
                    }
                    remaining_steps -= 1;
                    info!(tool = %tool, "Agent requested tool execution");
                    self.trace(|| format!("Calling tool {tool} with input {input}"));

                    let step = self.execute(&tool, input).await?;
                    self.trace(|| format!("Observation: {}", preview(&step.output)));
                    next_prompt = json!({
                        "tool_result": {
                            "tool": step.tool,
                            "input": step.input,
                            "success": step.success,
                            "output": step.output,
                        }
                    })
                    .to_string();
                    steps.push(step);
                }
            }
        }
    }

    /// Lookup failures are reported back to the model as unsuccessful
    /// observations. Errors raised inside a tool abort the run.
    async fn execute(&self, tool: &str, input: Value) -> Result<AgentStep, AgentError> {
        let result = self.tools.invoke(tool, &input).await;
        match result {
            Ok(output) => Ok(AgentStep {
                tool: tool.to_string(),
                input,
                success: true,
                output,
            }),
            Err(err @ (ToolError::UnknownTool(_) | ToolError::InvalidInput { .. })) => {
                Ok(AgentStep {
                    tool: tool.to_string(),
                    input,
                    success: false,
                    output: json!({ "error": err.to_string() }),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    fn system_prompt(&self) -> String {
        let mut lines = vec![
            AGENT_CONTEXT.to_string(),
            String::new(),
            "You can call tools to solve user requests.".to_string(),
            "All responses must be valid JSON without commentary or code fences.".to_string(),
            "To invoke a tool, respond with: {\"action\":\"call_tool\",\"tool\":\"tool_name\",\"input\":{...}}.".to_string(),
            "When you are ready to answer, respond with: {\"action\":\"final\",\"response\":\"...\"}.".to_string(),
            "Tool results arrive as {\"tool_result\":{...}} messages.".to_string(),
        ];
        if self.tools.is_empty() {
            lines.push("No tools are available.".to_string());
        } else {
            lines.push("Available tools:".to_string());
            lines.extend(self.tools.describe());
            lines.push(
                "Call api_documentation with {\"input\":\"question\"} and code_reader with {\"file_name\":\"name\"}."
                    .to_string(),
            );
        }
        lines.join("\n")
    }
}

fn initial_user_prompt(prompt: &str) -> String {
    json!({ "action": "user_request", "prompt": prompt }).to_string()
}

fn preview(value: &Value) -> String {
    let text = match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    if text.chars().count() <= VERBOSE_PREVIEW_CHARS {
        return text;
    }
    let cut: String = text.chars().take(VERBOSE_PREVIEW_CHARS).collect();
    format!("{cut}...")
}

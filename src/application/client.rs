use crate::model::{ModelError, ModelProvider, ModelRequest};
use crate::types::ChatMessage;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub default_model: String,
    /// Maximum number of messages kept per session. Whole exchanges are
    /// dropped, oldest first, so history always opens with a user message.
    pub history_limit: usize,
}

impl ClientConfig {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
            history_limit: usize::MAX,
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }
}

#[derive(Debug)]
pub struct ChatRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChatResult {
    pub content: String,
    pub session_id: String,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ClientError {
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Model(err) => err.user_message(),
        }
    }
}

/// Chat front-end for one model: fills in the model name and keeps per-session history so multi-step conversations stay coherent.
pub struct ChatClient<P: ModelProvider> {
    provider: P,
    config: ClientConfig,
    sessions: Mutex<HashMap<String, Vec<ChatMessage>>>,
}

impl<P: ModelProvider> ChatClient<P> {
    pub fn new(provider: P, config: ClientConfig) -> Self {
        Self {
            provider,
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn model(&self) -> &str {
        &self.config.default_model
    }

    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResult, ClientError> {
        let session_id = request.session_id.unwrap_or_else(new_session_id);
        let history = {
            let mut sessions = self.sessions.lock().await;
            sessions.entry(session_id.clone()).or_default().clone()
        };
        debug!(
            session_id = session_id.as_str(),
            history_count = history.len(),
            "Preparing chat request with prior history"
        );

        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(system) = request
            .system_prompt
            .filter(|text| !text.trim().is_empty())
        {
            messages.push(ChatMessage::system(system));
        }
        messages.extend(history);
        messages.push(ChatMessage::user(request.prompt.clone()));

        let response = self
            .provider
            .chat(ModelRequest {
                model: self.config.default_model.clone(),
                messages,
                session_id: Some(session_id.clone()),
            })
            .await?;

        let final_session = response
            .session_id
            .clone()
            .unwrap_or_else(|| session_id.clone());
        info!(
            session_id = final_session.as_str(),
            "Received response from model provider"
        );

        self.persist_exchange(&final_session, request.prompt, response.message.clone())
            .await;

        Ok(ChatResult {
            content: response.message.content,
            session_id: final_session,
        })
    }

    /// Single prompt, single answer, no session history.
    pub async fn complete(&self, prompt: impl Into<String>) -> Result<String, ClientError> {
        let response = self
            .provider
            .chat(ModelRequest {
                model: self.config.default_model.clone(),
                messages: vec![ChatMessage::user(prompt)],
                session_id: None,
            })
            .await?;
        Ok(response.message.content)
    }

    async fn persist_exchange(&self, session_id: &str, user_prompt: String, assistant: ChatMessage) {
        let mut sessions = self.sessions.lock().await;
        let history = sessions.entry(session_id.to_string()).or_default();
        history.push(ChatMessage::user(user_prompt));
        history.push(assistant);
        if history.len() > self.config.history_limit {
            let excess = history.len() - self.config.history_limit;
            // Round up to a whole exchange.
            history.drain(..(excess + excess % 2).min(history.len()));
        }
        debug!(
            session_id,
            total_messages = history.len(),
            "Persisted chat exchange to session history"
        );
    }
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

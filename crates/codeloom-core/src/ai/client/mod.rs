//! Completion service boundary
//!
//! - `CompletionService` - what workflows call to get the next assistant turn
//! - `AiClient` - reqwest implementation speaking OpenAI or Anthropic format

mod config;
mod core;

pub use config::{AiClientConfig, ApiFormat};
pub use self::core::AiClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::ai::types::{AiTool, Message};

/// Provider or transport failure. Never retried by the graph engine.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("no API key configured (set CODELOOM_API_KEY or ai.api_key)")]
    MissingApiKey,
}

/// One request to the completion service
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<AiTool>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_tools(mut self, tools: Vec<AiTool>) -> Self {
        self.tools = tools;
        self
    }
}

/// Given an ordered conversation and tool signatures, returns one assistant turn.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Message, CompletionError>;

    /// Tool-less single prompt; returns the trimmed assistant text.
    async fn complete_text(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let request =
            CompletionRequest::new(vec![Message::user(user)]).with_system(system.to_string());
        let reply = self.complete(request).await?;
        Ok(reply.content.trim().to_string())
    }
}

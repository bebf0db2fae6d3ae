//! Core AI client: HTTP plumbing shared by both wire formats

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::{debug, info};

use super::config::{AiClientConfig, ApiFormat};
use super::{CompletionError, CompletionRequest, CompletionService};
use crate::ai::format::anthropic::AnthropicFormat;
use crate::ai::format::openai::OpenAIFormat;
use crate::ai::format::FormatHandler;
use crate::ai::retry::{is_retryable_status, with_retry, IsRetryable};
use crate::ai::types::Message;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Non-streaming completion client
pub struct AiClient {
    http: Client,
    config: AiClientConfig,
}

impl AiClient {
    pub fn new(config: AiClientConfig) -> Result<Self, CompletionError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        info!(
            model = %config.model,
            format = ?config.api_format,
            "AI client initialized"
        );
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &AiClientConfig {
        &self.config
    }

    fn format_handler(&self) -> &'static dyn FormatHandler {
        match self.config.api_format {
            ApiFormat::OpenAI => &OpenAIFormat,
            ApiFormat::Anthropic => &AnthropicFormat,
        }
    }

    /// Attach auth and version headers for the configured format
    fn build_request(&self, url: &str, api_key: &str) -> RequestBuilder {
        let request = self
            .http
            .post(url)
            .header("content-type", "application/json");
        match self.config.api_format {
            ApiFormat::OpenAI => request.bearer_auth(api_key),
            ApiFormat::Anthropic => request
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        }
    }

    /// Turn non-success responses into `CompletionError::Status`
    async fn handle_error_response(&self, response: Response) -> Result<Response, CompletionError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(CompletionError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_once(&self, url: &str, api_key: &str, body: &Value) -> Result<Value, CompletionError> {
        let response = self.build_request(url, api_key).json(body).send().await?;
        let response = self.handle_error_response(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CompletionService for AiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Message, CompletionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(CompletionError::MissingApiKey)?;

        let handler = self.format_handler();
        let body = handler.build_body(&self.config, &request);
        let url = self.config.api_url();

        debug!(
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let json = with_retry(&self.config.retry, || self.send_once(&url, api_key, &body)).await?;
        let message = handler.parse_response(&json)?;

        debug!(
            tool_calls = message.tool_calls.len(),
            content_len = message.content.len(),
            "Received assistant turn"
        );
        Ok(message)
    }
}

impl IsRetryable for CompletionError {
    fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            CompletionError::Status { status, .. } => is_retryable_status(*status),
            CompletionError::InvalidResponse(_) | CompletionError::MissingApiKey => false,
        }
    }
}

//! AI Client configuration
//!
//! Provider-agnostic configuration for the completion HTTP client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ai::retry::RetryConfig;
use crate::constants;

/// Wire format spoken by the provider endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// chat/completions with function tools
    #[default]
    OpenAI,
    /// messages API with tool_use blocks
    Anthropic,
}

/// Configuration for the AI client
#[derive(Debug, Clone)]
pub struct AiClientConfig {
    /// Model ID to use for API calls
    pub model: String,
    /// Maximum output tokens
    pub max_tokens: usize,
    pub temperature: f32,
    /// Optional base URL override (defaults to the format's public endpoint)
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub api_format: ApiFormat,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for AiClientConfig {
    fn default() -> Self {
        Self {
            model: constants::ai::DEFAULT_MODEL.to_string(),
            max_tokens: constants::ai::MAX_OUTPUT_TOKENS,
            temperature: 0.0,
            base_url: None,
            api_key: None,
            api_format: ApiFormat::default(),
            timeout: Duration::from_secs(constants::ai::REQUEST_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

impl AiClientConfig {
    /// Get the API URL to use
    pub fn api_url(&self) -> String {
        if let Some(base) = &self.base_url {
            return base.clone();
        }
        match self.api_format {
            ApiFormat::OpenAI => constants::ai::OPENAI_API_URL.to_string(),
            ApiFormat::Anthropic => constants::ai::ANTHROPIC_API_URL.to_string(),
        }
    }
}

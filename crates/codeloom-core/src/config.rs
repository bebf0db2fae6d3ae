//! Application configuration
//!
//! Loaded from `~/.codeloom/config.toml`; a missing file means defaults.
//! Environment variables override the file, CLI flags override both.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentConfig, ToolFailurePolicy, DEFAULT_SYSTEM_PROMPT};
use crate::ai::client::{AiClientConfig, ApiFormat};
use crate::ai::retry::RetryConfig;
use crate::constants;
use crate::paths;
use crate::schema::SchemaConfig;

/// `[ai]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSection {
    pub format: ApiFormat,
    pub model: String,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Total attempts per request, including the first
    pub max_retries: u32,
}

impl Default for AiSection {
    fn default() -> Self {
        Self {
            format: ApiFormat::default(),
            model: constants::ai::DEFAULT_MODEL.to_string(),
            base_url: None,
            api_key: None,
            max_tokens: constants::ai::MAX_OUTPUT_TOKENS,
            temperature: 0.0,
            timeout_secs: constants::ai::REQUEST_TIMEOUT_SECS,
            max_retries: RetryConfig::default().max_attempts,
        }
    }
}

/// `[agent]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    pub max_steps: usize,
    pub tool_failure: ToolFailurePolicy,
    pub command_timeout_secs: u64,
    pub run_completion_command: bool,
    pub system_prompt: Option<String>,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_steps: constants::agent::MAX_STEPS,
            tool_failure: ToolFailurePolicy::default(),
            command_timeout_secs: constants::agent::COMMAND_TIMEOUT_SECS,
            run_completion_command: false,
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ai: AiSection,
    pub agent: AgentSection,
    pub schema: SchemaConfig,
}

impl AppConfig {
    /// Load `~/.codeloom/config.toml` and apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from_path(&paths::config_file())?;
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a specific path without environment overrides
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (the process environment in `load`).
    ///
    /// API key precedence: `CODELOOM_API_KEY`, then the provider variable
    /// for the configured format, then the file.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let provider_var = match self.ai.format {
            ApiFormat::OpenAI => "OPENAI_API_KEY",
            ApiFormat::Anthropic => "ANTHROPIC_API_KEY",
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("CODELOOM_API_KEY").or_else(|| non_empty(provider_var)) {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = non_empty("CODELOOM_MODEL") {
            self.ai.model = model;
        }
        if let Some(url) = non_empty("CODELOOM_BASE_URL") {
            self.ai.base_url = Some(url);
        }
    }

    pub fn client_config(&self) -> AiClientConfig {
        AiClientConfig {
            model: self.ai.model.clone(),
            max_tokens: self.ai.max_tokens,
            temperature: self.ai.temperature,
            base_url: self.ai.base_url.clone(),
            api_key: self.ai.api_key.clone(),
            api_format: self.ai.format,
            timeout: Duration::from_secs(self.ai.timeout_secs),
            retry: RetryConfig {
                max_attempts: self.ai.max_retries.max(1),
                ..Default::default()
            },
        }
    }

    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig {
            system_prompt: self
                .agent
                .system_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            max_steps: self.agent.max_steps,
            tool_failure: self.agent.tool_failure,
            command_timeout: Duration::from_secs(self.agent.command_timeout_secs),
            run_completion_command: self.agent.run_completion_command,
        }
    }
}

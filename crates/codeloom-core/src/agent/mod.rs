//! Coding agent loop
//!
//! Two nodes on the graph engine: `coding_llm` asks the model for its next
//! turn, `tools_invocation` executes the tool calls in that turn. The loop
//! ends when a turn carries no tool calls or calls `attempt_completion`.

mod coding;
pub mod completion;
pub mod state;

pub use coding::{route_after_model, CodingAgent, MODEL_NODE, TOOLS_NODE};
pub use completion::{completion_tool, AgentOutcome, CompletionSignal};
pub use state::AgentState;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// What happens when a tool call fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolFailurePolicy {
    /// The error aborts the invocation
    #[default]
    Abort,
    /// The error text goes back to the model as the tool result
    Report,
}

/// Configuration for an agent run
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub system_prompt: String,
    /// Graph steps allowed; each model turn and each tool turn is one step
    pub max_steps: usize,
    pub tool_failure: ToolFailurePolicy,
    pub command_timeout: Duration,
    /// Run the command from `attempt_completion` before returning
    pub run_completion_command: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_steps: constants::agent::MAX_STEPS,
            tool_failure: ToolFailurePolicy::default(),
            command_timeout: Duration::from_secs(constants::agent::COMMAND_TIMEOUT_SECS),
            run_completion_command: false,
        }
    }
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a software engineer working inside a project directory. Use the \
provided tools to inspect and change files and to run commands. All paths \
are relative to the project root. Work step by step, one tool call at a \
time. When the task is finished, call attempt_completion with a summary of \
the result and, if useful, a command that demonstrates it.";

//! The terminal completion signal and the loop's final outcome

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::state::AgentState;
use crate::ai::types::AiTool;
use crate::tools::TERMINAL_TOOL;

/// Signature of the terminal tool advertised next to the registry's tools
pub fn completion_tool() -> AiTool {
    AiTool {
        name: TERMINAL_TOOL.to_string(),
        description: "Signal that the task is complete. Provide a summary of the result and optionally a command that demonstrates it.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "result": {
                    "type": "string",
                    "description": "Summary of what was accomplished"
                },
                "command": {
                    "type": "string",
                    "description": "Optional shell command that showcases the result"
                }
            },
            "required": ["result"],
            "additionalProperties": false
        }),
    }
}

/// Arguments of the terminal tool call
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CompletionSignal {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub command: Option<String>,
}

/// What a finished agent run produced
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    /// Terminal tool's `result`, or the last assistant text when the model
    /// simply stopped calling tools
    pub summary: String,
    pub command: Option<String>,
    /// Output of `command` when the loop was configured to run it
    pub command_output: Option<String>,
    pub tool_calls_executed: usize,
    pub state: AgentState,
}

impl AgentOutcome {
    pub fn from_state(state: AgentState) -> Self {
        let signal = state.terminal_call().map(|call| {
            serde_json::from_value::<CompletionSignal>(call.arguments.clone()).unwrap_or_else(|e| {
                warn!(
                    call_id = %call.id,
                    error = %e,
                    "Malformed {} arguments, using assistant text as summary",
                    TERMINAL_TOOL
                );
                CompletionSignal::default()
            })
        });

        let fallback = state
            .last_assistant()
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let (summary, command) = match signal {
            Some(sig) if !sig.result.is_empty() => (sig.result, sig.command),
            Some(sig) => (fallback, sig.command),
            None => (fallback, None),
        };

        Self {
            summary,
            command: command.filter(|c| !c.trim().is_empty()),
            command_output: None,
            tool_calls_executed: state.tool_results(),
            state,
        }
    }
}

//! Agent loop state

use std::path::PathBuf;

use crate::ai::types::{AiToolCall, Message, Role};
use crate::tools::TERMINAL_TOOL;

/// Conversation plus the directory every tool call is scoped to
#[derive(Debug, Clone)]
pub struct AgentState {
    pub history: Vec<Message>,
    pub workspace_root: PathBuf,
}

impl AgentState {
    /// Fresh state holding only the task as the first user message
    pub fn new(task: impl Into<String>, workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            history: vec![Message::user(task)],
            workspace_root: workspace_root.into(),
        }
    }

    pub fn last_assistant(&self) -> Option<&Message> {
        self.history
            .last()
            .filter(|m| m.role == Role::Assistant)
    }

    /// The terminal tool call in the latest assistant turn, if any
    pub fn terminal_call(&self) -> Option<&AiToolCall> {
        self.last_assistant()?
            .tool_calls
            .iter()
            .find(|c| c.name == TERMINAL_TOOL)
    }

    /// Number of tool-role messages appended so far
    pub fn tool_results(&self) -> usize {
        self.history.iter().filter(|m| m.role == Role::Tool).count()
    }
}

//! Tool implementations
//!
//! - write_file: Create/overwrite files
//! - read_file: Read files
//! - list_files: List directory contents
//! - execute_command: Run shell commands in the workspace
//! - ask_followup_question: Ask the human a question

pub mod ask_followup;
pub mod execute_command;
pub mod list;
pub mod read;
pub mod write;

pub use ask_followup::AskFollowupQuestionTool;
pub use execute_command::ExecuteCommandTool;
pub use list::ListFilesTool;
pub use read::ReadFileTool;
pub use write::WriteFileTool;

use std::sync::Arc;

use crate::tools::answers::AnswerSource;
use crate::tools::registry::{ToolError, ToolRegistry};

/// Build the agent's closed registry of built-in tools
pub fn coding_tools(answers: Arc<dyn AnswerSource>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WriteFileTool))?;
    registry.register(Arc::new(ReadFileTool))?;
    registry.register(Arc::new(ListFilesTool))?;
    registry.register(Arc::new(ExecuteCommandTool))?;
    registry.register(Arc::new(AskFollowupQuestionTool::new(answers)))?;
    Ok(registry)
}

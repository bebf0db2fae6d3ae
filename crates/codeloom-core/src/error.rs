//! Workflow-level error type
//!
//! Every component has its own `thiserror` enum; `WorkflowError` is what a
//! graph invocation returns and simply wraps them.

use thiserror::Error;

use crate::ai::CompletionError;
use crate::graph::GraphError;
use crate::schema::SchemaError;
use crate::tools::ToolError;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

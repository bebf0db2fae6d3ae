//! read_file tool - Read file contents

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::fs;

use crate::tools::registry::{parse_params, Tool, ToolContext, ToolError};

/// Returned verbatim when the requested file is absent
pub const MISSING_FILE_MESSAGE: &str = "The file you are looking for does not exist.";

pub struct ReadFileTool;

#[derive(Deserialize)]
struct Params {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the full contents of a file in the workspace."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the file to read, relative to the workspace root"
                }
            },
            "required": ["path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let params: Params = parse_params(self.name(), params)?;
        let path = ctx.resolve_in_workspace(&params.path)?;

        if !path.is_file() {
            return Ok(MISSING_FILE_MESSAGE.to_string());
        }

        let bytes = fs::read(&path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

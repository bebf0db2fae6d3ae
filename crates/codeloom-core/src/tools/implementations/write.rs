//! write_file tool - Create or overwrite files

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::fs;
use tracing::info;

use crate::tools::registry::{parse_params, Tool, ToolContext, ToolError};

pub struct WriteFileTool;

#[derive(Deserialize)]
struct Params {
    path: String,
    content: String,
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Create a new file or overwrite an existing one with the given content. Creates parent directories if needed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path of the file to write, relative to the workspace root"
                },
                "content": {
                    "type": "string",
                    "description": "The full content to write to the file"
                }
            },
            "required": ["path", "content"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let params: Params = parse_params(self.name(), params)?;
        let path = ctx.resolve_in_workspace(&params.path)?;

        if let Some(parent) = path.parent().filter(|p| !p.exists()) {
            info!("write_file: creating parent directory {:?}", parent);
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, &params.content).await?;
        info!(path = %path.display(), bytes = params.content.len(), "Wrote file");
        Ok(format!("Wrote contents to {}.", params.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());

        let out = WriteFileTool
            .execute(json!({"path": "a/b/c.txt", "content": "hello"}), &ctx)
            .await
            .unwrap();

        assert_eq!(out, "Wrote contents to a/b/c.txt.");
        let written = std::fs::read_to_string(dir.path().join("a/b/c.txt")).unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("f.txt"), "old").unwrap();
        let ctx = ToolContext::new(dir.path());

        WriteFileTool
            .execute(json!({"path": "f.txt", "content": "new"}), &ctx)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("f.txt")).unwrap(), "new");
    }

    #[tokio::test]
    async fn refuses_to_escape_workspace() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path().join("inner"));
        std::fs::create_dir(dir.path().join("inner")).unwrap();

        let result = WriteFileTool
            .execute(json!({"path": "../outside.txt", "content": "x"}), &ctx)
            .await;
        assert!(matches!(result, Err(ToolError::OutsideWorkspace(_))));
        assert!(!dir.path().join("outside.txt").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn refuses_to_write_through_dangling_symlink() {
        let dir = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        let target = other.path().join("pwned.txt");
        std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();
        let ctx = ToolContext::new(dir.path());

        let result = WriteFileTool
            .execute(json!({"path": "link.txt", "content": "escaped"}), &ctx)
            .await;
        assert!(matches!(result, Err(ToolError::OutsideWorkspace(_))));
        assert!(!target.exists());
    }
}

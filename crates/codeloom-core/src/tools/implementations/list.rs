//! list_files tool - depth-first, name-sorted directory listing
//!
//! Output is one entry per line, indented one space per nesting level, with
//! directories suffixed by `/`. Dependency and build-output directories are
//! skipped at any depth.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use walkdir::WalkDir;

use crate::tools::registry::{parse_params, Tool, ToolContext, ToolError};

/// Directories never descended into or listed
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    "env",
    "venv",
    "target/dependency",
    "build/dependencies",
    "dist",
    "out",
    "bundle",
    "vendor",
    "tmp",
    "temp",
    "deps",
    "pkg",
    "Pods",
];

pub struct ListFilesTool;

fn default_recursive() -> bool {
    true
}

#[derive(Deserialize)]
struct Params {
    path: String,
    #[serde(default = "default_recursive")]
    recursive: bool,
}

fn is_excluded(path: &Path) -> bool {
    EXCLUDED_DIRS.iter().any(|entry| {
        if entry.contains('/') {
            path.ends_with(entry)
        } else {
            path.file_name().is_some_and(|name| name == *entry)
        }
    })
}

fn render_listing(root: &Path, recursive: bool) -> String {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut listing = String::new();

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && is_excluded(e.path())));

    // Unreadable entries are skipped rather than failing the listing
    for entry in walker.filter_map(Result::ok) {
        listing.push_str(&" ".repeat(entry.depth() - 1));
        listing.push_str(&entry.file_name().to_string_lossy());
        if entry.file_type().is_dir() {
            listing.push('/');
        }
        listing.push('\n');
    }
    listing
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List files and directories within a directory of the workspace, optionally recursively."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, relative to the workspace root (\".\" for the root)"
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Whether to list contents recursively (default: true)"
                }
            },
            "required": ["path"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String, ToolError> {
        let params: Params = parse_params(self.name(), params)?;
        let dir: PathBuf = ctx.resolve_in_workspace(&params.path)?;

        if !dir.is_dir() {
            return Ok(format!("The directory {} does not exist.", params.path));
        }

        let recursive = params.recursive;
        tokio::task::spawn_blocking(move || render_listing(&dir, recursive))
            .await
            .map_err(|e| ToolError::Io(std::io::Error::other(e)))
    }
}

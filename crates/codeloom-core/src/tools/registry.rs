//! Tool registry for the agent loop
//!
//! The registry is closed: tools are registered once while building it, and
//! every call is checked against the tool's declared parameter schema
//! before dispatch.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::ai::types::AiTool;
use crate::constants;
use crate::tools::path_utils;

/// Name of the model's "I'm done" signal. Handled by the agent loop, never
/// dispatched, and unavailable to registered tools.
pub const TERMINAL_TOOL: &str = "attempt_completion";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("path '{0}' is outside the workspace")]
    OutsideWorkspace(String),

    #[error("cannot register tool: {0}")]
    Registration(String),

    #[error("command timed out after {0} seconds")]
    Timeout(u64),

    #[error("no answer available: {0}")]
    NoAnswer(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse tool parameters into a typed struct
pub fn parse_params<T: serde::de::DeserializeOwned>(tool: &str, params: Value) -> Result<T, ToolError> {
    serde_json::from_value(params).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

/// Context for tool execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Every path a tool touches must resolve inside this directory
    pub workspace_root: PathBuf,
    pub command_timeout: Duration,
}

impl ToolContext {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            command_timeout: Duration::from_secs(constants::agent::COMMAND_TIMEOUT_SECS),
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Resolve a model-supplied path, rejecting anything that escapes the
    /// workspace root
    pub fn resolve_in_workspace(&self, path: &str) -> Result<PathBuf, ToolError> {
        path_utils::resolve_in_workspace(&self.workspace_root, path)
    }

    pub fn root(&self) -> &Path {
        &self.workspace_root
    }
}

/// Trait for tool implementations
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (id)
    fn name(&self) -> &str;

    /// Tool description for AI
    fn description(&self) -> &str;

    /// JSON schema for parameters; must be an object schema
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<String, ToolError>;
}

/// Closed set of tools available to one workflow
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Duplicate names, the terminal tool's name, and
    /// non-object schemas are rejected.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if name == TERMINAL_TOOL {
            return Err(ToolError::Registration(format!(
                "'{}' is reserved for the completion signal",
                name
            )));
        }
        if self.tools.contains_key(&name) {
            return Err(ToolError::Registration(format!(
                "'{}' is already registered",
                name
            )));
        }
        let schema = tool.parameters_schema();
        if schema.get("type").and_then(|t| t.as_str()) != Some("object") {
            return Err(ToolError::Registration(format!(
                "'{}' must declare an object parameter schema",
                name
            )));
        }
        tracing::debug!(tool = %name, "Registered tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Tool signatures in name order
    pub fn signatures(&self) -> Vec<AiTool> {
        self.tools
            .values()
            .map(|t| AiTool {
                name: t.name().to_string(),
                description: t.description().to_string(),
                input_schema: t.parameters_schema(),
            })
            .collect()
    }

    /// Validate arguments and run the named tool
    pub async fn execute(
        &self,
        name: &str,
        params: Value,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        validate_arguments(&tool.parameters_schema(), &params).map_err(|reason| {
            ToolError::InvalidArguments {
                tool: name.to_string(),
                reason,
            }
        })?;

        tracing::info!(tool = name, "Executing tool");
        let start = Instant::now();
        let result = tool.execute(params, ctx).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(output) => tracing::debug!(tool = name, elapsed_ms, output_len = output.len(), "Tool finished"),
            Err(e) => tracing::warn!(tool = name, elapsed_ms, error = %e, "Tool failed"),
        }
        result
    }
}

/// Check `args` against an object schema: required fields present, declared
/// primitive types respected, and no undeclared fields when
/// `additionalProperties` is false.
pub fn validate_arguments(schema: &Value, args: &Value) -> Result<(), String> {
    let Some(provided) = args.as_object() else {
        return Err("arguments must be a JSON object".to_string());
    };

    let empty = serde_json::Map::new();
    let properties = schema
        .get("properties")
        .and_then(|p| p.as_object())
        .unwrap_or(&empty);

    if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
        for field in required.iter().filter_map(|f| f.as_str()) {
            match provided.get(field) {
                None | Some(Value::Null) => {
                    return Err(format!("missing required field '{}'", field));
                }
                _ => {}
            }
        }
    }

    let closed = schema.get("additionalProperties") == Some(&Value::Bool(false));

    for (key, value) in provided {
        match properties.get(key) {
            Some(prop) => {
                if let Some(expected) = prop.get("type") {
                    if !type_matches(expected, value) {
                        return Err(format!("field '{}' must be of type {}", key, expected));
                    }
                }
            }
            None if closed => return Err(format!("unexpected field '{}'", key)),
            None => {}
        }
    }

    Ok(())
}

fn type_matches(expected: &Value, value: &Value) -> bool {
    match expected {
        Value::String(ty) => primitive_matches(ty, value),
        Value::Array(types) => types
            .iter()
            .filter_map(|t| t.as_str())
            .any(|ty| primitive_matches(ty, value)),
        _ => true,
    }
}

fn primitive_matches(ty: &str, value: &Value) -> bool {
    match ty {
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool {
        name: &'static str,
        schema: Value,
    }

    impl EchoTool {
        fn named(name: &'static str) -> Self {
            Self {
                name,
                schema: json!({
                    "type": "object",
                    "properties": {
                        "text": {"type": "string"},
                        "loud": {"type": "boolean"}
                    },
                    "required": ["text"],
                    "additionalProperties": false
                }),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            self.name
        }

        fn description(&self) -> &str {
            "Echo the text back"
        }

        fn parameters_schema(&self) -> Value {
            self.schema.clone()
        }

        async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<String, ToolError> {
            Ok(params["text"].as_str().unwrap_or_default().to_string())
        }
    }

    fn ctx() -> ToolContext {
        ToolContext::new(std::env::temp_dir())
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let result = registry.execute("nonexistent_tool", json!({}), &ctx()).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(name)) if name == "nonexistent_tool"));
    }

    #[tokio::test]
    async fn test_execute_valid_call() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::named("echo"))).unwrap();
        let out = registry
            .execute("echo", json!({"text": "hi", "loud": true}), &ctx())
            .await
            .unwrap();
        assert_eq!(out, "hi");
    }

    #[test]
    fn test_register_rejects_duplicates_and_reserved_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::named("echo"))).unwrap();
        assert!(matches!(
            registry.register(Arc::new(EchoTool::named("echo"))),
            Err(ToolError::Registration(_))
        ));
        assert!(matches!(
            registry.register(Arc::new(EchoTool::named(TERMINAL_TOOL))),
            Err(ToolError::Registration(_))
        ));
    }

    #[test]
    fn test_register_rejects_non_object_schema() {
        let mut registry = ToolRegistry::new();
        let tool = EchoTool {
            name: "bad",
            schema: json!({"type": "string"}),
        };
        assert!(registry.register(Arc::new(tool)).is_err());
    }

    #[test]
    fn test_signatures_sorted_by_name() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(Arc::new(EchoTool::named(name))).unwrap();
        }
        let names: Vec<String> = registry.signatures().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_invalid_arguments_rejected_before_dispatch() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool::named("echo"))).unwrap();

        for bad in [
            json!({}),
            json!({"text": 5}),
            json!({"text": "x", "extra": 1}),
            json!("not an object"),
        ] {
            let result = registry.execute("echo", bad, &ctx()).await;
            assert!(matches!(result, Err(ToolError::InvalidArguments { .. })));
        }
    }

    #[test]
    fn test_open_schema_allows_extra_fields() {
        let schema = json!({"type": "object", "properties": {"a": {"type": "integer"}}});
        assert!(validate_arguments(&schema, &json!({"a": 1, "b": "x"})).is_ok());
        assert!(validate_arguments(&schema, &json!({"a": 1.5})).is_err());
    }

    #[test]
    fn test_parse_params_invalid() {
        #[derive(serde::Deserialize, Debug)]
        struct Params {
            #[serde(rename = "name")]
            _name: String,
        }
        let result: Result<Params, ToolError> = parse_params("t", json!({"wrong": 1}));
        assert!(matches!(result, Err(ToolError::InvalidArguments { .. })));
    }
}

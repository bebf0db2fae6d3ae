//! Anthropic messages format handler
//!
//! Tool results travel as `tool_result` blocks inside a user message;
//! consecutive tool results are merged into one user turn.

use serde_json::{json, Value};

use super::{call_id_or_generated, FormatHandler};
use crate::ai::client::{AiClientConfig, CompletionError, CompletionRequest};
use crate::ai::types::{AiToolCall, Message, Role};

pub struct AnthropicFormat;

impl AnthropicFormat {
    fn system_prompt(request: &CompletionRequest) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(system) = &request.system {
            parts.push(system);
        }
        for msg in request.messages.iter().filter(|m| m.role == Role::System) {
            parts.push(&msg.content);
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    fn convert_messages(request: &CompletionRequest) -> Vec<Value> {
        let mut result: Vec<Value> = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => continue,
                Role::User => result.push(json!({"role": "user", "content": msg.content})),
                Role::Assistant => {
                    let mut blocks = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(json!({"type": "text", "text": msg.content}));
                    }
                    for call in &msg.tool_calls {
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments
                        }));
                    }
                    result.push(json!({"role": "assistant", "content": blocks}));
                }
                Role::Tool => {
                    let block = json!({
                        "type": "tool_result",
                        "tool_use_id": msg.tool_call_id.clone().unwrap_or_default(),
                        "content": msg.content
                    });
                    let merged = result
                        .last_mut()
                        .filter(|last| last["role"] == "user")
                        .and_then(|last| last["content"].as_array_mut())
                        .map(|blocks| blocks.push(block.clone()))
                        .is_some();
                    if !merged {
                        result.push(json!({"role": "user", "content": [block]}));
                    }
                }
            }
        }

        result
    }
}

impl FormatHandler for AnthropicFormat {
    fn build_body(&self, config: &AiClientConfig, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": config.model,
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "messages": Self::convert_messages(request),
        });

        if let Some(system) = Self::system_prompt(request) {
            body["system"] = Value::String(system);
        }

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }

        body
    }

    fn parse_response(&self, body: &Value) -> Result<Message, CompletionError> {
        let blocks = body
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| CompletionError::InvalidResponse("missing content array".into()))?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in blocks {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(chunk) = block.get("text").and_then(|t| t.as_str()) {
                        text.push_str(chunk);
                    }
                }
                Some("tool_use") => {
                    let name = block
                        .get("name")
                        .and_then(|n| n.as_str())
                        .ok_or_else(|| CompletionError::InvalidResponse("tool_use without name".into()))?;
                    tool_calls.push(AiToolCall {
                        id: call_id_or_generated(block.get("id").and_then(|i| i.as_str())),
                        name: name.to_string(),
                        arguments: block.get("input").cloned().unwrap_or_else(|| json!({})),
                    });
                }
                // Thinking and other block types are not part of the turn
                _ => {}
            }
        }

        Ok(Message::assistant_with_calls(text, tool_calls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consecutive_tool_results_merge_into_one_user_turn() {
        let request = CompletionRequest::new(vec![
            Message::user("go"),
            Message::assistant_with_calls(
                "",
                vec![
                    AiToolCall::new("a", "read_file", json!({"path": "1"})),
                    AiToolCall::new("b", "read_file", json!({"path": "2"})),
                ],
            ),
            Message::tool_result("a", "one"),
            Message::tool_result("b", "two"),
        ]);

        let body = AnthropicFormat.build_body(&AiClientConfig::default(), &request);
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2]["content"].as_array().unwrap().len(), 2);
        assert_eq!(messages[2]["content"][1]["tool_use_id"], "b");
    }

    #[test]
    fn system_messages_are_lifted_into_system_field() {
        let request =
            CompletionRequest::new(vec![Message::system("rules"), Message::user("hi")])
                .with_system("base");
        let body = AnthropicFormat.build_body(&AiClientConfig::default(), &request);
        assert_eq!(body["system"], "base\n\nrules");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn parses_text_and_tool_use_blocks() {
        let body = json!({
            "content": [
                {"type": "thinking", "thinking": "hmm", "signature": "s"},
                {"type": "text", "text": "Writing the file."},
                {"type": "tool_use", "id": "toolu_1", "name": "write_file", "input": {"path": "a", "content": "b"}}
            ]
        });
        let msg = AnthropicFormat.parse_response(&body).unwrap();
        assert_eq!(msg.content, "Writing the file.");
        assert_eq!(msg.tool_calls[0].id, "toolu_1");
        assert_eq!(msg.tool_calls[0].arguments["path"], "a");
    }
}

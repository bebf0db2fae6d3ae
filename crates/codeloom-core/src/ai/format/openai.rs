//! OpenAI chat/completions format handler

use serde_json::{json, Value};

use super::{call_id_or_generated, FormatHandler};
use crate::ai::client::{AiClientConfig, CompletionError, CompletionRequest};
use crate::ai::types::{AiToolCall, Message, Role};

pub struct OpenAIFormat;

impl OpenAIFormat {
    fn convert_messages(request: &CompletionRequest) -> Vec<Value> {
        let mut result = Vec::with_capacity(request.messages.len() + 1);

        if let Some(system) = &request.system {
            result.push(json!({"role": "system", "content": system}));
        }

        for msg in &request.messages {
            match msg.role {
                Role::Tool => result.push(json!({
                    "role": "tool",
                    "tool_call_id": msg.tool_call_id.clone().unwrap_or_default(),
                    "content": msg.content
                })),
                Role::Assistant if msg.has_tool_calls() => {
                    let tool_calls: Vec<Value> = msg
                        .tool_calls
                        .iter()
                        .map(|call| {
                            json!({
                                "id": call.id,
                                "type": "function",
                                "function": {
                                    "name": call.name,
                                    "arguments": call.arguments.to_string()
                                }
                            })
                        })
                        .collect();
                    let content = if msg.content.is_empty() {
                        Value::Null
                    } else {
                        Value::String(msg.content.clone())
                    };
                    result.push(json!({
                        "role": "assistant",
                        "content": content,
                        "tool_calls": tool_calls
                    }));
                }
                role => result.push(json!({"role": role.as_str(), "content": msg.content})),
            }
        }

        result
    }
}

impl FormatHandler for OpenAIFormat {
    fn build_body(&self, config: &AiClientConfig, request: &CompletionRequest) -> Value {
        let mut body = json!({
            "model": config.model,
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "messages": Self::convert_messages(request),
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema
                        }
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
        }

        body
    }

    fn parse_response(&self, body: &Value) -> Result<Message, CompletionError> {
        let message = body
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .ok_or_else(|| CompletionError::InvalidResponse("missing choices[0].message".into()))?;

        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message.get("tool_calls").and_then(|c| c.as_array()) {
            for call in calls {
                let function = call.get("function").ok_or_else(|| {
                    CompletionError::InvalidResponse("tool call without function".into())
                })?;
                let name = function
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| CompletionError::InvalidResponse("tool call without name".into()))?;
                // Arguments arrive as a JSON-encoded string
                let arguments = match function.get("arguments") {
                    Some(Value::String(raw)) if raw.trim().is_empty() => json!({}),
                    Some(Value::String(raw)) => serde_json::from_str(raw).map_err(|e| {
                        CompletionError::InvalidResponse(format!(
                            "arguments for '{}' are not valid JSON: {}",
                            name, e
                        ))
                    })?,
                    Some(other) => other.clone(),
                    None => json!({}),
                };
                tool_calls.push(AiToolCall {
                    id: call_id_or_generated(call.get("id").and_then(|i| i.as_str())),
                    name: name.to_string(),
                    arguments,
                });
            }
        }

        Ok(Message::assistant_with_calls(content, tool_calls))
    }
}

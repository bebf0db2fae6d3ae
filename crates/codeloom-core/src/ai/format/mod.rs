//! Provider request/response formats
//!
//! Each format converts a `CompletionRequest` into a JSON body and parses
//! the provider's JSON reply back into one assistant `Message`.

pub mod anthropic;
pub mod openai;

use serde_json::Value;

use crate::ai::client::{AiClientConfig, CompletionError, CompletionRequest};
use crate::ai::types::Message;

/// Conversion between engine messages and one provider wire format
pub trait FormatHandler: Send + Sync {
    fn build_body(&self, config: &AiClientConfig, request: &CompletionRequest) -> Value;

    fn parse_response(&self, body: &Value) -> Result<Message, CompletionError>;
}

/// Provider tool-call ids are optional in some compatible servers.
pub(crate) fn call_id_or_generated(id: Option<&str>) -> String {
    match id {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => format!("call_{}", uuid::Uuid::new_v4().simple()),
    }
}

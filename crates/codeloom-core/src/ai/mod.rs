//! AI layer: conversation types, the completion service boundary, and the
//! HTTP client that implements it.

pub mod client;
pub mod format;
pub mod retry;
pub mod types;

pub use client::{
    AiClient, AiClientConfig, ApiFormat, CompletionError, CompletionRequest, CompletionService,
};
pub use types::{AiTool, AiToolCall, Message, Role};

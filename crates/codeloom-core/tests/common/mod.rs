//! Shared fakes for integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use codeloom_core::ai::types::{AiToolCall, Message};
use codeloom_core::ai::{CompletionError, CompletionRequest, CompletionService};
use serde_json::Value;

/// Replays a fixed list of assistant turns and records every request
pub struct ScriptedService {
    turns: Mutex<VecDeque<Message>>,
    requests: Mutex<Vec<CompletionRequest>>,
    /// Returned once the script is exhausted
    fallback: Option<Message>,
}

impl ScriptedService {
    pub fn new(turns: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
            fallback: None,
        })
    }

    /// Repeat `turn` forever after the script runs out
    pub fn repeating(turns: Vec<Message>, turn: Message) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            requests: Mutex::new(Vec::new()),
            fallback: Some(turn),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for ScriptedService {
    async fn complete(&self, request: CompletionRequest) -> Result<Message, CompletionError> {
        self.requests.lock().unwrap().push(request);
        let next = self.turns.lock().unwrap().pop_front();
        next.or_else(|| self.fallback.clone())
            .ok_or_else(|| CompletionError::InvalidResponse("script exhausted".into()))
    }
}

pub fn call(id: &str, name: &str, arguments: Value) -> Message {
    Message::assistant_with_calls("", vec![AiToolCall::new(id, name, arguments)])
}

pub fn text(content: &str) -> Message {
    Message::assistant(content)
}

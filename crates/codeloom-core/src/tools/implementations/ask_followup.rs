//! ask_followup_question tool - get a clarifying answer from a human
//!
//! Where the answer comes from is decided by the `AnswerSource` the tool was
//! built with.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::answers::AnswerSource;
use crate::tools::registry::{parse_params, Tool, ToolContext, ToolError};

pub struct AskFollowupQuestionTool {
    answers: Arc<dyn AnswerSource>,
}

impl AskFollowupQuestionTool {
    pub fn new(answers: Arc<dyn AnswerSource>) -> Self {
        Self { answers }
    }
}

#[derive(Deserialize)]
struct Params {
    question: String,
}

#[async_trait]
impl Tool for AskFollowupQuestionTool {
    fn name(&self) -> &str {
        "ask_followup_question"
    }

    fn description(&self) -> &str {
        "Ask the user a follow-up question when the task cannot proceed without their input."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "question": {
                    "type": "string",
                    "description": "The question to ask the user"
                }
            },
            "required": ["question"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<String, ToolError> {
        let params: Params = parse_params(self.name(), params)?;
        let answer = self.answers.ask(&params.question).await?;
        Ok(format!("User response: {}", answer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::answers::answer_channel;

    #[tokio::test]
    async fn suspends_until_answer_arrives() {
        let (answers, mut handle) = answer_channel(1);
        let tool = AskFollowupQuestionTool::new(Arc::new(answers));
        let ctx = ToolContext::new(std::env::temp_dir());

        tokio::spawn(async move {
            if let Some(pending) = handle.next_question().await {
                pending.answer("use postgres");
            }
        });

        let out = tool
            .execute(json!({"question": "Which database?"}), &ctx)
            .await
            .unwrap();
        assert_eq!(out, "User response: use postgres");
    }
}

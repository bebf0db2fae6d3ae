//! Human answer sources
//!
//! `ask_followup_question` and operator-driven SQL correction both need a
//! human reply. `StdinAnswers` blocks on the terminal; `ChannelAnswers`
//! suspends the workflow until some other task (a UI, a web handler)
//! answers through the paired `AnswerHandle`.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::tools::registry::ToolError;

#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn ask(&self, question: &str) -> Result<String, ToolError>;
}

/// Single-operator terminal prompt
pub struct StdinAnswers;

#[async_trait]
impl AnswerSource for StdinAnswers {
    async fn ask(&self, question: &str) -> Result<String, ToolError> {
        let question = question.to_string();
        let answer = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
            let mut stdout = std::io::stdout();
            write!(stdout, "{} ", question)?;
            stdout.flush()?;
            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        })
        .await
        .map_err(|e| ToolError::NoAnswer(e.to_string()))??;
        Ok(answer)
    }
}

/// A question waiting on an external answer
#[derive(Debug)]
pub struct PendingQuestion {
    pub id: Uuid,
    pub question: String,
    reply: oneshot::Sender<String>,
}

impl PendingQuestion {
    /// Resume the suspended workflow. Returns false if it is no longer waiting.
    pub fn answer(self, text: impl Into<String>) -> bool {
        self.reply.send(text.into()).is_ok()
    }
}

/// Asking side of an answer channel
#[derive(Clone)]
pub struct ChannelAnswers {
    tx: mpsc::Sender<PendingQuestion>,
}

/// Answering side of an answer channel
pub struct AnswerHandle {
    rx: mpsc::Receiver<PendingQuestion>,
}

impl AnswerHandle {
    /// Wait for the next question. `None` once every asker is gone.
    pub async fn next_question(&mut self) -> Option<PendingQuestion> {
        self.rx.recv().await
    }
}

/// Create a connected asker/answerer pair
pub fn answer_channel(capacity: usize) -> (ChannelAnswers, AnswerHandle) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelAnswers { tx }, AnswerHandle { rx })
}

#[async_trait]
impl AnswerSource for ChannelAnswers {
    async fn ask(&self, question: &str) -> Result<String, ToolError> {
        let (reply, wait) = oneshot::channel();
        let pending = PendingQuestion {
            id: Uuid::new_v4(),
            question: question.to_string(),
            reply,
        };
        let id = pending.id;
        self.tx
            .send(pending)
            .await
            .map_err(|_| ToolError::NoAnswer("answer handle dropped".to_string()))?;
        tracing::info!(%id, "Waiting for human answer");
        wait.await
            .map_err(|_| ToolError::NoAnswer(format!("question {} was dropped unanswered", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_answers_resume_the_asker() {
        let (answers, mut handle) = answer_channel(1);

        let responder = tokio::spawn(async move {
            let pending = handle.next_question().await.unwrap();
            assert_eq!(pending.question, "Which port?");
            assert!(pending.answer("8080"));
        });

        let answer = answers.ask("Which port?").await.unwrap();
        assert_eq!(answer, "8080");
        responder.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_question_is_an_error() {
        let (answers, mut handle) = answer_channel(1);
        tokio::spawn(async move {
            let pending = handle.next_question().await.unwrap();
            drop(pending);
        });
        assert!(matches!(
            answers.ask("anything?").await,
            Err(ToolError::NoAnswer(_))
        ));
    }

    #[tokio::test]
    async fn dropped_handle_is_an_error() {
        let (answers, handle) = answer_channel(1);
        drop(handle);
        assert!(answers.ask("hello?").await.is_err());
    }
}

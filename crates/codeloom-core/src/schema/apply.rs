//! Applying a schema statement by statement with bounded correction
//!
//! Statements run one at a time with no surrounding transaction. When one
//! fails, only that statement is corrected and retried, up to
//! `max_attempts` corrections; after that it is abandoned and the batch
//! continues. Statements already applied stay applied.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::prompts;
use super::sql::{clean_sql_response, looks_like_sql};
use super::types::{SchemaResult, SqlDialect};
use crate::ai::client::CompletionService;
use crate::tools::AnswerSource;

/// Runs one SQL statement against a database
pub trait StatementExecutor: Send {
    fn execute(&mut self, statement: &str) -> anyhow::Result<()>;

    /// Flavor corrected statements must be written in
    fn dialect(&self) -> SqlDialect;
}

/// Who supplies corrected statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CorrectionMode {
    /// Ask the completion service
    #[default]
    Model,
    /// Ask a human through an answer source
    Operator,
}

/// Source of corrections, matching `CorrectionMode`
#[derive(Clone)]
pub enum Corrector {
    Model(Arc<dyn CompletionService>),
    Operator(Arc<dyn AnswerSource>),
}

/// What happened to one statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum StatementOutcome {
    Applied {
        statement: String,
    },
    Corrected {
        original: String,
        corrected: String,
        attempts: u32,
    },
    Abandoned {
        statement: String,
        error: String,
        attempts: u32,
    },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<StatementOutcome>,
}

impl ApplyReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Applied { .. }))
    }

    pub fn corrected(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Corrected { .. }))
    }

    pub fn abandoned(&self) -> usize {
        self.count(|o| matches!(o, StatementOutcome::Abandoned { .. }))
    }

    /// Every statement ended up in the database
    pub fn is_complete(&self) -> bool {
        self.abandoned() == 0
    }

    fn count(&self, pred: impl Fn(&StatementOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

enum Fix {
    Candidate(String),
    /// This attempt produced nothing usable
    Unusable,
    /// Stop correcting this statement
    GiveUp,
}

pub struct SchemaApplier<E: StatementExecutor> {
    executor: E,
    corrector: Corrector,
    max_attempts: u32,
}

impl<E: StatementExecutor> SchemaApplier<E> {
    pub fn new(executor: E, corrector: Corrector, max_attempts: u32) -> Self {
        Self {
            executor,
            corrector,
            max_attempts,
        }
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Apply CREATE statements, then ALTER statements
    pub async fn apply_result(&mut self, result: &SchemaResult) -> ApplyReport {
        let statements: Vec<String> = result.statements().map(|s| s.statement.clone()).collect();
        self.apply(&statements).await
    }

    pub async fn apply(&mut self, statements: &[String]) -> ApplyReport {
        let mut report = ApplyReport::default();
        for statement in statements {
            let outcome = self.apply_one(statement).await;
            report.outcomes.push(outcome);
        }
        info!(
            applied = report.applied(),
            corrected = report.corrected(),
            abandoned = report.abandoned(),
            "Schema apply finished"
        );
        report
    }

    async fn apply_one(&mut self, statement: &str) -> StatementOutcome {
        let mut error = match self.executor.execute(statement) {
            Ok(()) => {
                return StatementOutcome::Applied {
                    statement: statement.to_string(),
                }
            }
            Err(e) => format!("{:#}", e),
        };
        warn!(%error, "Statement failed, entering correction loop");

        let mut candidate = statement.to_string();
        let mut attempts = 0;

        while attempts < self.max_attempts {
            attempts += 1;
            match self.request_fix(&candidate, &error).await {
                Fix::Candidate(fixed) => match self.executor.execute(&fixed) {
                    Ok(()) => {
                        info!(attempts, "Corrected statement applied");
                        return StatementOutcome::Corrected {
                            original: statement.to_string(),
                            corrected: fixed,
                            attempts,
                        };
                    }
                    Err(e) => {
                        error = format!("{:#}", e);
                        warn!(attempts, %error, "Corrected statement failed");
                        candidate = fixed;
                    }
                },
                Fix::Unusable => warn!(attempts, "Correction attempt produced no SQL"),
                Fix::GiveUp => break,
            }
        }

        warn!(attempts, "Abandoning statement");
        StatementOutcome::Abandoned {
            statement: statement.to_string(),
            error,
            attempts,
        }
    }

    async fn request_fix(&self, statement: &str, error: &str) -> Fix {
        match &self.corrector {
            Corrector::Model(service) => {
                let system = prompts::fix_statement_system(self.executor.dialect());
                let user = prompts::fix_statement_user(statement, error);
                match service.complete_text(&system, &user).await {
                    Ok(reply) => {
                        let fixed = clean_sql_response(&reply);
                        if looks_like_sql(&fixed) {
                            Fix::Candidate(fixed)
                        } else {
                            Fix::Unusable
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Completion failed while correcting statement");
                        Fix::Unusable
                    }
                }
            }
            Corrector::Operator(answers) => {
                let question = prompts::operator_fix_question(statement, error);
                match answers.ask(&question).await {
                    Ok(answer) if !answer.trim().is_empty() => Fix::Candidate(answer.trim().to_string()),
                    Ok(_) => {
                        info!("Operator skipped the statement");
                        Fix::GiveUp
                    }
                    Err(e) => {
                        warn!(error = %e, "No operator answer");
                        Fix::GiveUp
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::{CompletionError, CompletionRequest};
    use crate::ai::types::Message;
    use crate::tools::answer_channel;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Fails any statement containing one of `poison`
    #[derive(Default)]
    struct FakeExecutor {
        poison: Vec<&'static str>,
        executed: Vec<String>,
    }

    impl StatementExecutor for FakeExecutor {
        fn execute(&mut self, statement: &str) -> anyhow::Result<()> {
            self.executed.push(statement.to_string());
            if let Some(p) = self.poison.iter().find(|p| statement.contains(**p)) {
                anyhow::bail!("syntax error near {}", p);
            }
            Ok(())
        }

        fn dialect(&self) -> SqlDialect {
            SqlDialect::MySql
        }
    }

    struct ScriptedFixes {
        replies: Mutex<VecDeque<String>>,
        calls: Mutex<usize>,
    }

    impl ScriptedFixes {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl CompletionService for ScriptedFixes {
        async fn complete(&self, _request: CompletionRequest) -> Result<Message, CompletionError> {
            *self.calls.lock().unwrap() += 1;
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| "CREATE TABLE still_broken BAD;".to_string());
            Ok(Message::assistant(reply))
        }
    }

    fn stmts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn clean_batch_applies_everything() {
        let service = ScriptedFixes::new(&[]);
        let mut applier = SchemaApplier::new(FakeExecutor::default(), Corrector::Model(service.clone()), 6);
        let report = applier.apply(&stmts(&["CREATE TABLE a (id INT);", "CREATE TABLE b (id INT);"])).await;
        assert_eq!(report.applied(), 2);
        assert!(report.is_complete());
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn failing_statement_is_corrected_alone() {
        let service = ScriptedFixes::new(&["```sql\nCREATE TABLE b (id INT);\n```"]);
        let executor = FakeExecutor {
            poison: vec!["BAD"],
            ..Default::default()
        };
        let mut applier = SchemaApplier::new(executor, Corrector::Model(service.clone()), 6);
        let report = applier
            .apply(&stmts(&["CREATE TABLE a (id INT);", "CREATE TABLE b (id BAD);", "CREATE TABLE c (id INT);"]))
            .await;

        assert_eq!(report.applied(), 2);
        assert_eq!(report.corrected(), 1);
        assert_eq!(
            report.outcomes[1],
            StatementOutcome::Corrected {
                original: "CREATE TABLE b (id BAD);".into(),
                corrected: "CREATE TABLE b (id INT);".into(),
                attempts: 1,
            }
        );
        let executed = applier.into_executor().executed;
        assert_eq!(executed.len(), 4);
        assert_eq!(executed[3], "CREATE TABLE c (id INT);");
    }

    #[tokio::test]
    async fn permanent_failure_is_bounded_then_skipped() {
        let service = ScriptedFixes::new(&[]);
        let executor = FakeExecutor {
            poison: vec!["BAD"],
            ..Default::default()
        };
        let mut applier = SchemaApplier::new(executor, Corrector::Model(service.clone()), 6);
        let report = applier
            .apply(&stmts(&["CREATE TABLE x (id BAD);", "CREATE TABLE y (id INT);"]))
            .await;

        assert_eq!(service.calls(), 6);
        assert!(matches!(
            report.outcomes[0],
            StatementOutcome::Abandoned { attempts: 6, .. }
        ));
        assert_eq!(
            report.outcomes[1],
            StatementOutcome::Applied {
                statement: "CREATE TABLE y (id INT);".into()
            }
        );
    }

    #[tokio::test]
    async fn non_sql_reply_uses_an_attempt() {
        let service = ScriptedFixes::new(&["Sorry, I can't help.", "CREATE TABLE z (id INT);"]);
        let executor = FakeExecutor {
            poison: vec!["BAD"],
            ..Default::default()
        };
        let mut applier = SchemaApplier::new(executor, Corrector::Model(service.clone()), 6);
        let report = applier.apply(&stmts(&["CREATE TABLE z (id BAD);"])).await;
        assert!(matches!(
            report.outcomes[0],
            StatementOutcome::Corrected { attempts: 2, .. }
        ));
    }

    #[tokio::test]
    async fn operator_empty_answer_abandons_statement() {
        let (answers, mut handle) = answer_channel(1);
        tokio::spawn(async move {
            while let Some(pending) = handle.next_question().await {
                pending.answer("");
            }
        });
        let executor = FakeExecutor {
            poison: vec!["BAD"],
            ..Default::default()
        };
        let mut applier = SchemaApplier::new(executor, Corrector::Operator(Arc::new(answers)), 6);
        let report = applier.apply(&stmts(&["CREATE TABLE q (id BAD);"])).await;
        assert!(matches!(
            report.outcomes[0],
            StatementOutcome::Abandoned { attempts: 1, .. }
        ));
    }

    #[tokio::test]
    async fn operator_fix_is_executed() {
        let (answers, mut handle) = answer_channel(1);
        tokio::spawn(async move {
            if let Some(pending) = handle.next_question().await {
                assert!(pending.question.contains("syntax error near BAD"));
                pending.answer("CREATE TABLE q (id INT);");
            }
        });
        let executor = FakeExecutor {
            poison: vec!["BAD"],
            ..Default::default()
        };
        let mut applier = SchemaApplier::new(executor, Corrector::Operator(Arc::new(answers)), 6);
        let report = applier.apply(&stmts(&["CREATE TABLE q (id BAD);"])).await;
        assert_eq!(report.corrected(), 1);
    }
}

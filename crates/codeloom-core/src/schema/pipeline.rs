//! The schema graph: validate → correct → generate → parse

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::{debug, info};
use uuid::Uuid;

use super::mermaid::{extract_entities, EntityBlock};
use super::prompts;
use super::sql::{clean_sql_response, parse_statements};
use super::types::{
    SchemaResult, SchemaState, SqlDialect, StatementKind, ValidationResult, ValidationStatus,
};
use super::{SchemaConfig, SchemaError};
use crate::ai::client::{CompletionError, CompletionService};
use crate::error::WorkflowError;
use crate::graph::{CompiledGraph, GraphError, Node, StateGraph, END};

/// Node names in execution order
pub const STAGES: [&str; 4] = ["validate", "correct", "generate", "parse"];

struct Validate {
    service: Arc<dyn CompletionService>,
}

#[async_trait]
impl Node<SchemaState> for Validate {
    async fn run(&self, mut state: SchemaState) -> Result<SchemaState, WorkflowError> {
        let reply = self
            .service
            .complete_text(prompts::VALIDATE_SYSTEM, &state.diagram)
            .await?;
        let validation = ValidationResult::from_response(&reply);
        info!(valid = validation.is_valid(), "Diagram validated");
        state.validation = Some(validation);
        Ok(state)
    }
}

struct Correct {
    service: Arc<dyn CompletionService>,
}

#[async_trait]
impl Node<SchemaState> for Correct {
    async fn run(&self, mut state: SchemaState) -> Result<SchemaState, WorkflowError> {
        let corrected = match &state.validation {
            None => return Err(SchemaError::MissingStage("validate").into()),
            Some(ValidationResult::Valid) => state.diagram.clone(),
            Some(ValidationResult::Issues(issues)) => {
                let user = prompts::correct_user(&state.diagram, issues);
                let reply = self
                    .service
                    .complete_text(prompts::CORRECT_SYSTEM, &user)
                    .await?;
                info!("Diagram corrected");
                reply.trim().to_string()
            }
        };
        state.corrected = Some(corrected);
        Ok(state)
    }
}

struct Generate {
    service: Arc<dyn CompletionService>,
    parallel: bool,
    dialect: SqlDialect,
}

impl Generate {
    async fn create_for(&self, entity: &EntityBlock) -> Result<String, CompletionError> {
        debug!(entity = %entity.name, "Requesting CREATE TABLE");
        let reply = self
            .service
            .complete_text(prompts::create_table_system(self.dialect), &entity.render())
            .await?;
        Ok(clean_sql_response(&reply))
    }
}

#[async_trait]
impl Node<SchemaState> for Generate {
    async fn run(&self, mut state: SchemaState) -> Result<SchemaState, WorkflowError> {
        let diagram = state
            .corrected
            .clone()
            .ok_or(SchemaError::MissingStage("correct"))?;

        let entities = extract_entities(&diagram);
        if entities.is_empty() {
            return Err(SchemaError::NoEntities.into());
        }
        info!(
            entities = entities.len(),
            parallel = self.parallel,
            dialect = self.dialect.name(),
            "Generating CREATE statements"
        );

        // try_join_all yields results in input order
        let creates = if self.parallel {
            try_join_all(entities.iter().map(|e| self.create_for(e))).await?
        } else {
            let mut creates = Vec::with_capacity(entities.len());
            for entity in &entities {
                creates.push(self.create_for(entity).await?);
            }
            creates
        };

        let alter = self
            .service
            .complete_text(prompts::alter_table_system(self.dialect), &diagram)
            .await?;

        state.create_sql = Some(creates.join("\n\n"));
        state.alter_sql = Some(clean_sql_response(&alter));
        Ok(state)
    }
}

struct Parse;

#[async_trait]
impl Node<SchemaState> for Parse {
    async fn run(&self, mut state: SchemaState) -> Result<SchemaState, WorkflowError> {
        let create_sql = state
            .create_sql
            .as_deref()
            .ok_or(SchemaError::MissingStage("generate"))?;
        let alter_sql = state.alter_sql.as_deref().unwrap_or_default();

        let (validation_status, errors) = match &state.validation {
            Some(ValidationResult::Issues(issues)) => {
                (ValidationStatus::Corrected, Some(vec![issues.clone()]))
            }
            _ => (ValidationStatus::Valid, None),
        };

        let result = SchemaResult {
            create_statements: parse_statements(create_sql, StatementKind::Create),
            alter_statements: parse_statements(alter_sql, StatementKind::Alter),
            validation_status,
            errors,
        };
        info!(
            creates = result.create_statements.len(),
            alters = result.alter_statements.len(),
            "Parsed schema"
        );
        state.result = Some(result);
        Ok(state)
    }
}

/// The compiled schema workflow
pub struct SchemaPipeline {
    graph: CompiledGraph<SchemaState>,
}

impl SchemaPipeline {
    pub fn new(
        service: Arc<dyn CompletionService>,
        config: &SchemaConfig,
    ) -> Result<Self, GraphError> {
        let [validate, correct, generate, parse] = STAGES;

        let mut graph = StateGraph::new();
        graph
            .add_node(
                validate,
                Validate {
                    service: service.clone(),
                },
            )
            .add_node(
                correct,
                Correct {
                    service: service.clone(),
                },
            )
            .add_node(
                generate,
                Generate {
                    service,
                    parallel: config.parallel_generation,
                    dialect: config.dialect,
                },
            )
            .add_node(parse, Parse)
            .add_edge(validate, correct)
            .add_edge(correct, generate)
            .add_edge(generate, parse)
            .add_edge(parse, END)
            .set_entry_point(validate);

        Ok(Self {
            graph: graph.compile()?,
        })
    }

    /// Run the full pipeline and return the final state
    pub async fn run_state(&self, diagram: impl Into<String>) -> Result<SchemaState, WorkflowError> {
        let run_id = Uuid::new_v4();
        info!(%run_id, "Schema pipeline started");
        let state = self.graph.invoke(SchemaState::new(diagram)).await?;
        info!(%run_id, "Schema pipeline finished");
        Ok(state)
    }

    pub async fn run(&self, diagram: impl Into<String>) -> Result<SchemaResult, WorkflowError> {
        let state = self.run_state(diagram).await?;
        state
            .result
            .ok_or_else(|| SchemaError::MissingStage("parse").into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::CompletionRequest;
    use crate::ai::types::Message;
    use std::sync::Mutex;

    /// Answers by stage, recording which system prompts were used
    struct StageService {
        validation_reply: String,
        corrected_diagram: String,
        calls: Mutex<Vec<&'static str>>,
    }

    impl StageService {
        fn new(validation_reply: &str, corrected_diagram: &str) -> Arc<Self> {
            Arc::new(Self {
                validation_reply: validation_reply.into(),
                corrected_diagram: corrected_diagram.into(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionService for StageService {
        async fn complete(&self, request: CompletionRequest) -> Result<Message, CompletionError> {
            let system = request.system.clone().unwrap_or_default();
            let user = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            let (stage, reply) = if system == prompts::VALIDATE_SYSTEM {
                ("validate", self.validation_reply.clone())
            } else if system == prompts::CORRECT_SYSTEM {
                ("correct", self.corrected_diagram.clone())
            } else if system == prompts::create_table_system(SqlDialect::MySql)
                || system == prompts::create_table_system(SqlDialect::Sqlite)
            {
                let name = user.split_whitespace().next().unwrap_or("t").to_lowercase();
                ("create", format!("```sql\nCREATE TABLE {} (id INT);\n```", name))
            } else {
                (
                    "alter",
                    "ALTER TABLE order ADD FOREIGN KEY (user_id) REFERENCES user(id);".to_string(),
                )
            };
            self.calls.lock().unwrap().push(stage);
            Ok(Message::assistant(reply))
        }
    }

    const DIAGRAM: &str = "erDiagram\n  USER {\n    uuid id PK\n  }\n  ORDER {\n    uuid id PK\n    uuid user_id\n  }\n  USER ||--o{ ORDER : places\n";

    #[tokio::test]
    async fn valid_diagram_skips_correction_call() {
        let service = StageService::new("VALID", "unused");
        let pipeline = SchemaPipeline::new(service.clone(), &SchemaConfig::default()).unwrap();
        let state = pipeline.run_state(DIAGRAM).await.unwrap();

        assert_eq!(state.corrected.as_deref(), Some(DIAGRAM));
        assert_eq!(service.calls(), vec!["validate", "create", "create", "alter"]);

        let result = state.result.unwrap();
        assert_eq!(result.validation_status, ValidationStatus::Valid);
        assert_eq!(result.create_statements.len(), 2);
        assert_eq!(result.create_statements[0].table_name.as_deref(), Some("user"));
        assert_eq!(result.create_statements[1].table_name.as_deref(), Some("order"));
        assert!(result.errors.is_none());
    }

    #[tokio::test]
    async fn parallel_generation_keeps_diagram_order() {
        let service = StageService::new("VALID", "unused");
        let config = SchemaConfig {
            parallel_generation: true,
            ..Default::default()
        };
        let pipeline = SchemaPipeline::new(service, &config).unwrap();
        let result = pipeline.run(DIAGRAM).await.unwrap();
        let names: Vec<_> = result
            .create_statements
            .iter()
            .filter_map(|s| s.table_name.as_deref())
            .collect();
        assert_eq!(names, vec!["user", "order"]);
    }

    #[tokio::test]
    async fn issues_route_through_correction() {
        let service = StageService::new("ORDER is missing a primary key", DIAGRAM);
        let pipeline = SchemaPipeline::new(service.clone(), &SchemaConfig::default()).unwrap();
        let result = pipeline
            .run("erDiagram\n  USER {\n    uuid id PK\n  }\n")
            .await
            .unwrap();

        assert_eq!(service.calls()[..2], ["validate", "correct"]);
        assert_eq!(result.validation_status, ValidationStatus::Corrected);
        assert_eq!(
            result.errors,
            Some(vec!["ORDER is missing a primary key".to_string()])
        );
        // Generation ran on the corrected diagram
        assert_eq!(result.create_statements.len(), 2);
    }

    #[tokio::test]
    async fn diagram_without_entities_fails() {
        let service = StageService::new("VALID", "unused");
        let pipeline = SchemaPipeline::new(service, &SchemaConfig::default()).unwrap();
        let err = pipeline.run("erDiagram\n").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Schema(SchemaError::NoEntities)));
    }
}

//! Schema pipeline
//!
//! Turns a Mermaid ER diagram into SQL on the graph engine
//! (`validate → correct → generate → parse`), renders the result as a
//! script, and applies it statement by statement with bounded correction.

pub mod apply;
pub mod mermaid;
mod pipeline;
pub mod prompts;
pub mod script;
pub mod sql;
pub mod sqlite;
pub mod types;

pub use apply::{
    ApplyReport, CorrectionMode, Corrector, SchemaApplier, StatementExecutor, StatementOutcome,
};
pub use mermaid::{extract_entities, EntityBlock};
pub use pipeline::{SchemaPipeline, STAGES};
pub use script::ScriptWriter;
pub use sql::{clean_sql_response, parse_statements, split_script};
pub use sqlite::SqliteExecutor;
pub use types::{
    SchemaResult, SchemaState, SqlDialect, SqlStatement, StatementKind, ValidationResult,
    ValidationStatus,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// A stage ran before the stage it depends on produced its output
    #[error("stage '{0}' is missing its input")]
    MissingStage(&'static str),

    #[error("no entities found in diagram")]
    NoEntities,

    #[error("database error: {0}")]
    Database(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Schema pipeline and apply settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Corrections tried per failing statement before it is abandoned
    pub max_fix_attempts: u32,
    /// Issue the per-entity CREATE requests concurrently
    pub parallel_generation: bool,
    /// Flavor of the generated DDL; must match the database it is applied to
    pub dialect: SqlDialect,
    pub correction_mode: CorrectionMode,
    /// Emit a `DROP/CREATE/USE DATABASE` preamble in written scripts
    pub database_name: Option<String>,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            max_fix_attempts: constants::schema::MAX_FIX_ATTEMPTS,
            parallel_generation: false,
            dialect: SqlDialect::default(),
            correction_mode: CorrectionMode::default(),
            database_name: None,
        }
    }
}

impl SchemaConfig {
    pub fn script_writer(&self) -> ScriptWriter {
        match &self.database_name {
            Some(name) => ScriptWriter::new().with_database(name.clone()),
            None => ScriptWriter::new(),
        }
    }
}

//! Schema pipeline data types

use serde::{Deserialize, Serialize};

/// Outcome of the validation stage. Issues are data, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "issues", rename_all = "lowercase")]
pub enum ValidationResult {
    Valid,
    Issues(String),
}

impl ValidationResult {
    /// Interpret a validator response.
    ///
    /// Valid only when the reply (or its first line) is the bare word VALID,
    /// ignoring case and surrounding punctuation. Anything else, including
    /// "INVALID" or "not valid", is an issue report.
    pub fn from_response(response: &str) -> Self {
        let is_sentinel = |text: &str| {
            text.trim()
                .trim_matches(|c: char| !c.is_alphanumeric())
                .eq_ignore_ascii_case("VALID")
        };
        let trimmed = response.trim();
        let first_line = trimmed.lines().next().unwrap_or_default();
        if is_sentinel(trimmed) || is_sentinel(first_line) {
            ValidationResult::Valid
        } else {
            ValidationResult::Issues(trimmed.to_string())
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// SQL flavor the generated statements must run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// Foreign keys added by `ALTER TABLE ... ADD FOREIGN KEY`
    #[default]
    MySql,
    /// Foreign key columns added by `ALTER TABLE ... ADD COLUMN ... REFERENCES`
    Sqlite,
}

impl SqlDialect {
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::MySql => "MySQL",
            SqlDialect::Sqlite => "SQLite",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementKind {
    Create,
    Alter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlStatement {
    pub kind: StatementKind,
    /// Full statement text including the trailing `;`
    pub statement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Valid,
    Corrected,
}

/// Final product of the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaResult {
    pub create_statements: Vec<SqlStatement>,
    pub alter_statements: Vec<SqlStatement>,
    pub validation_status: ValidationStatus,
    /// The validator's issue text when the diagram had to be corrected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl SchemaResult {
    /// CREATE statements followed by ALTER statements
    pub fn statements(&self) -> impl Iterator<Item = &SqlStatement> {
        self.create_statements.iter().chain(self.alter_statements.iter())
    }
}

/// State threaded through validate → correct → generate → parse
#[derive(Debug, Clone, Default)]
pub struct SchemaState {
    pub diagram: String,
    pub validation: Option<ValidationResult>,
    pub corrected: Option<String>,
    pub create_sql: Option<String>,
    pub alter_sql: Option<String>,
    pub result: Option<SchemaResult>,
}

impl SchemaState {
    pub fn new(diagram: impl Into<String>) -> Self {
        Self {
            diagram: diagram.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_variants_are_valid() {
        for reply in ["VALID", "valid", "  VALID.\n", "**VALID**", "VALID\nLooks good to me."] {
            assert_eq!(ValidationResult::from_response(reply), ValidationResult::Valid, "{reply:?}");
        }
    }

    #[test]
    fn invalid_is_not_valid() {
        for reply in ["INVALID", "Not VALID: missing PK", "The diagram is valid except for X"] {
            assert!(!ValidationResult::from_response(reply).is_valid(), "{reply:?}");
        }
    }

    #[test]
    fn issues_keep_trimmed_text() {
        assert_eq!(
            ValidationResult::from_response("  1. USER lacks a key\n"),
            ValidationResult::Issues("1. USER lacks a key".into())
        );
    }

    #[test]
    fn result_serializes_lowercase_status() {
        let result = SchemaResult {
            create_statements: vec![SqlStatement {
                kind: StatementKind::Create,
                statement: "CREATE TABLE a (id INT);".into(),
                table_name: Some("a".into()),
            }],
            alter_statements: vec![],
            validation_status: ValidationStatus::Valid,
            errors: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["validation_status"], "valid");
        assert_eq!(value["create_statements"][0]["kind"], "create");
        assert!(value.get("errors").is_none());
    }
}

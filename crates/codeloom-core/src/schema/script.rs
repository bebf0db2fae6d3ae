//! Schema script rendering

use std::path::Path;

use tracing::info;

use super::types::SchemaResult;
use super::SchemaError;

/// Serializes a `SchemaResult` into an executable script: optional database
/// preamble, CREATE statements, then ALTER statements.
#[derive(Debug, Clone, Default)]
pub struct ScriptWriter {
    database: Option<String>,
}

impl ScriptWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit `DROP DATABASE` / `CREATE DATABASE` / `USE` for `name` first
    pub fn with_database(mut self, name: impl Into<String>) -> Self {
        self.database = Some(name.into());
        self
    }

    pub fn render(&self, result: &SchemaResult) -> String {
        let mut script = String::new();

        if let Some(db) = &self.database {
            script.push_str(&format!(
                "DROP DATABASE IF EXISTS {db};\nCREATE DATABASE {db};\nUSE {db};\n\n"
            ));
        }

        script.push_str("-- Create Tables\n\n");
        for stmt in &result.create_statements {
            script.push_str(&stmt.statement);
            script.push_str("\n\n");
        }

        script.push_str("-- Add Foreign Key Constraints\n\n");
        for stmt in &result.alter_statements {
            script.push_str(&stmt.statement);
            script.push_str("\n\n");
        }

        script
    }

    pub async fn write_to(&self, result: &SchemaResult, path: &Path) -> Result<(), SchemaError> {
        let script = self.render(result);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &script).await?;
        info!(
            path = %path.display(),
            statements = result.create_statements.len() + result.alter_statements.len(),
            "Wrote schema script"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::sql::{parse_statements, split_script};
    use crate::schema::types::{StatementKind, ValidationStatus};

    fn sample() -> SchemaResult {
        SchemaResult {
            create_statements: parse_statements(
                "CREATE TABLE users (id INT);\nCREATE TABLE orders (id INT, user_id INT);",
                StatementKind::Create,
            ),
            alter_statements: parse_statements(
                "ALTER TABLE orders ADD FOREIGN KEY (user_id) REFERENCES users(id);",
                StatementKind::Alter,
            ),
            validation_status: ValidationStatus::Valid,
            errors: None,
        }
    }

    #[test]
    fn render_orders_sections() {
        let script = ScriptWriter::new().with_database("shop").render(&sample());
        let drop = script.find("DROP DATABASE IF EXISTS shop;").unwrap();
        let creates = script.find("-- Create Tables").unwrap();
        let users = script.find("CREATE TABLE users").unwrap();
        let alters = script.find("-- Add Foreign Key Constraints").unwrap();
        let fk = script.find("ALTER TABLE orders").unwrap();
        assert!(drop < creates && creates < users && users < alters && alters < fk);
    }

    #[test]
    fn rendered_script_splits_back_into_statements() {
        let script = ScriptWriter::new().render(&sample());
        let parts = split_script(&script);
        assert_eq!(parts.len(), 3);
        assert!(parts[0].starts_with("CREATE TABLE users"));
        assert!(parts[2].starts_with("ALTER TABLE orders"));
    }

    #[tokio::test]
    async fn write_to_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out/schema.sql");
        ScriptWriter::new().write_to(&sample(), &path).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("CREATE TABLE orders"));
    }
}

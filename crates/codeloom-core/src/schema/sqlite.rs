//! SQLite statement executor

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use super::apply::StatementExecutor;
use super::types::SqlDialect;

/// Executes schema statements against a SQLite database, one statement per
/// call and each in autocommit mode
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        Ok(Self { conn })
    }

    /// Names of user tables, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }
}

impl StatementExecutor for SqliteExecutor {
    fn execute(&mut self, statement: &str) -> Result<()> {
        debug!(statement, "Executing statement");
        self.conn.execute_batch(statement)?;
        Ok(())
    }

    fn dialect(&self) -> SqlDialect {
        SqlDialect::Sqlite
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn executes_statements_in_order() {
        let mut db = SqliteExecutor::in_memory().unwrap();
        db.execute("CREATE TABLE users (id INTEGER PRIMARY KEY);").unwrap();
        db.execute("CREATE TABLE orders (id INTEGER PRIMARY KEY, user_id INTEGER REFERENCES users(id));")
            .unwrap();
        assert_eq!(db.table_names().unwrap(), vec!["orders", "users"]);
    }

    #[test]
    fn syntax_errors_surface_as_errors() {
        let mut db = SqliteExecutor::in_memory().unwrap();
        let err = db.execute("CREATE TABLEE broken (id INT);").unwrap_err();
        assert!(format!("{:#}", err).contains("syntax error"));
    }

    #[test]
    fn failed_statement_leaves_earlier_ones_applied() {
        let mut db = SqliteExecutor::in_memory().unwrap();
        db.execute("CREATE TABLE kept (id INT);").unwrap();
        assert!(db.execute("CREATE TABLE kept (id INT);").is_err());
        assert_eq!(db.table_names().unwrap(), vec!["kept"]);
    }

    #[test]
    fn file_database_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.db");
        {
            let mut db = SqliteExecutor::open(&path).unwrap();
            db.execute("CREATE TABLE t (id INT);").unwrap();
        }
        let db = SqliteExecutor::open(&path).unwrap();
        assert_eq!(db.table_names().unwrap(), vec!["t"]);
    }

    #[test]
    fn foreign_key_column_added_by_alter_is_enforced() {
        let mut db = SqliteExecutor::in_memory().unwrap();
        db.execute("CREATE TABLE customer (id INTEGER PRIMARY KEY);").unwrap();
        db.execute("CREATE TABLE invoice (id INTEGER PRIMARY KEY);").unwrap();
        db.execute(
            "ALTER TABLE invoice ADD COLUMN customer_id INTEGER REFERENCES customer(id) ON DELETE CASCADE ON UPDATE CASCADE;",
        )
        .unwrap();

        db.execute("INSERT INTO customer (id) VALUES (1);").unwrap();
        db.execute("INSERT INTO invoice (id, customer_id) VALUES (1, 1);").unwrap();
        let err = db
            .execute("INSERT INTO invoice (id, customer_id) VALUES (2, 99);")
            .unwrap_err();
        assert!(format!("{:#}", err).contains("FOREIGN KEY constraint failed"));
    }

    #[test]
    fn constraint_alter_is_not_sqlite_grammar() {
        let mut db = SqliteExecutor::in_memory().unwrap();
        db.execute("CREATE TABLE customer (id INTEGER PRIMARY KEY);").unwrap();
        db.execute("CREATE TABLE invoice (id INTEGER PRIMARY KEY, customer_id INTEGER);").unwrap();
        assert!(db
            .execute("ALTER TABLE invoice ADD CONSTRAINT fk FOREIGN KEY (customer_id) REFERENCES customer(id);")
            .is_err());
        assert_eq!(db.dialect(), SqlDialect::Sqlite);
    }
}

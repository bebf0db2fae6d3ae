//! Prompts for the schema pipeline stages

use super::types::SqlDialect;

pub const VALIDATE_SYSTEM: &str = "You are an expert in Mermaid ER diagrams. Check the given diagram for errors. \
If it is correct, reply with the single word VALID and nothing else. Otherwise list the specific issues found.";

pub const CORRECT_SYSTEM: &str = "You are an expert in Mermaid ER diagrams. Fix the listed issues in the provided diagram. \
Return the COMPLETE corrected diagram with ALL tables and relationships, not just the corrected parts. \
The diagram uses 'erDiagram' syntax. Keep the original formatting. Return only the diagram.";

pub fn correct_user(diagram: &str, issues: &str) -> String {
    format!(
        "Original diagram:\n{}\n\nIssues to fix:\n{}",
        diagram, issues
    )
}

const MYSQL_CREATE_TABLE_SYSTEM: &str = "You are an expert MySQL developer. Generate one CREATE TABLE statement for the given ER entity.

Rules:
1. Include every attribute exactly as specified.
2. Map types: uuid -> CHAR(36), varchar -> VARCHAR(n) sized to the column's meaning, enum -> ENUM with values inferred from the column name, timestamp -> TIMESTAMP, date -> DATE, int -> INT.
3. Map constraints: PK -> PRIMARY KEY, not null -> NOT NULL, unique -> UNIQUE, indexed -> an INDEX, soft delete -> nullable TIMESTAMP.
4. Do not generate FOREIGN KEY constraints.
5. One column per line. End the statement with `;`.

Return only the SQL statement. No explanations, no placeholders.";

const SQLITE_CREATE_TABLE_SYSTEM: &str = "You are an expert SQLite developer. Generate one CREATE TABLE statement for the given ER entity.

Rules:
1. Include every attribute as specified, EXCEPT columns that reference another entity (such as customer_id); those are added later together with their foreign key.
2. Map types: uuid -> TEXT, varchar -> TEXT, enum -> TEXT with a CHECK (column IN (...)) constraint listing values inferred from the column name, timestamp and date -> TEXT, int -> INTEGER.
3. Map constraints: PK -> PRIMARY KEY, not null -> NOT NULL, unique -> UNIQUE, soft delete -> nullable TEXT.
4. Do not generate FOREIGN KEY constraints or separate index statements.
5. One column per line. End the statement with `;`.

Return only the SQL statement. No explanations, no placeholders.";

const MYSQL_ALTER_TABLE_SYSTEM: &str = "You are an expert MySQL developer. Generate ALTER TABLE statements adding a foreign key for EVERY relationship in the given ER diagram.

Rules:
1. Reference the exact column names of the entities.
2. Include ON DELETE CASCADE and ON UPDATE CASCADE.
3. For many-to-many relationships, constrain both sides of the junction table.
4. One constraint per ALTER TABLE statement. End each statement with `;`.

Return only SQL statements. No explanations, no placeholders.";

const SQLITE_ALTER_TABLE_SYSTEM: &str = "You are an expert SQLite developer. The tables of the given ER diagram already exist WITHOUT their foreign key columns. \
Generate one statement per foreign key column of the form:
ALTER TABLE child ADD COLUMN parent_id INTEGER REFERENCES parent(id) ON DELETE CASCADE ON UPDATE CASCADE;

Rules:
1. Use the exact column names from the diagram and the type the referenced key has.
2. SQLite cannot add constraints to existing columns: never use ADD CONSTRAINT or ADD FOREIGN KEY.
3. Do not give the new column a non-NULL default.
4. For many-to-many relationships, add both columns of the junction table.
5. End each statement with `;`.

Return only SQL statements. No explanations, no placeholders.";

pub fn create_table_system(dialect: SqlDialect) -> &'static str {
    match dialect {
        SqlDialect::MySql => MYSQL_CREATE_TABLE_SYSTEM,
        SqlDialect::Sqlite => SQLITE_CREATE_TABLE_SYSTEM,
    }
}

pub fn alter_table_system(dialect: SqlDialect) -> &'static str {
    match dialect {
        SqlDialect::MySql => MYSQL_ALTER_TABLE_SYSTEM,
        SqlDialect::Sqlite => SQLITE_ALTER_TABLE_SYSTEM,
    }
}

pub fn fix_statement_system(dialect: SqlDialect) -> String {
    format!(
        "You are a {} database expert fixing SQL execution errors. \
Return ONLY the corrected SQL statement, valid for {}, with no additional explanation.",
        dialect.name(),
        dialect.name()
    )
}

pub fn fix_statement_user(statement: &str, error: &str) -> String {
    format!(
        "The following SQL statement caused an error during execution:\n{}\n\nError:\n{}\n\nProvide ONLY the corrected SQL statement:",
        statement, error
    )
}

pub fn operator_fix_question(statement: &str, error: &str) -> String {
    format!(
        "SQL statement failed:\n{}\nError: {}\nEnter the corrected statement (leave empty to skip):",
        statement, error
    )
}

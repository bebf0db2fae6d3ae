//! SQL text handling: cleaning model output, splitting into statements

use once_cell::sync::Lazy;
use regex::Regex;

use super::types::{SqlStatement, StatementKind};

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```sql|```").expect("valid regex"));

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?is)^\s*(?:CREATE\s+(?:TEMPORARY\s+)?TABLE(?:\s+IF\s+NOT\s+EXISTS)?|ALTER\s+TABLE)\s+[`"\[]?(\w+)"#,
    )
    .expect("valid regex")
});

static SCRIPT_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*\n").expect("valid regex"));

static SQL_KEYWORDS: &[&str] = &["CREATE", "ALTER", "DROP", "INSERT", "UPDATE", "DELETE"];

/// Strip markdown code fences and `System: ` prefixes from a model reply
pub fn clean_sql_response(response: &str) -> String {
    CODE_FENCE
        .replace_all(response, "")
        .replace("System: ", "")
        .trim()
        .to_string()
}

/// Table a CREATE/ALTER statement targets, if recognizable
pub fn extract_table_name(statement: &str) -> Option<String> {
    // Leading comment lines are common in model output
    let body: String = statement
        .lines()
        .filter(|l| !l.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    TABLE_NAME
        .captures(&body)
        .map(|caps| caps[1].to_string())
}

/// Cut a fragment down to the line where its statement starts. Fragments
/// with no line opening on a SQL keyword (blank, comments, prose) yield `None`.
fn statement_body(fragment: &str) -> Option<&str> {
    let mut offset = 0;
    for line in fragment.split_inclusive('\n') {
        let first_word = line
            .trim_start()
            .split(|c: char| !c.is_ascii_alphabetic())
            .next()
            .unwrap_or_default();
        if SQL_KEYWORDS.iter().any(|kw| first_word.eq_ignore_ascii_case(kw)) {
            return Some(fragment[offset..].trim());
        }
        offset += line.len();
    }
    None
}

/// Split generated SQL on `;`, keeping only fragments that hold a statement.
/// Each statement keeps its terminator and is tagged with `kind`.
pub fn parse_statements(sql: &str, kind: StatementKind) -> Vec<SqlStatement> {
    clean_sql_response(sql)
        .split(';')
        .filter_map(statement_body)
        .map(|fragment| {
            let statement = format!("{};", fragment);
            SqlStatement {
                kind,
                table_name: extract_table_name(&statement),
                statement,
            }
        })
        .collect()
}

/// Split a schema script into executable statements on `;` followed by a
/// newline. Comment-only lines are dropped from each fragment.
pub fn split_script(script: &str) -> Vec<String> {
    SCRIPT_SEPARATOR
        .split(script)
        .map(|fragment| {
            fragment
                .lines()
                .filter(|l| !l.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether a reply plausibly contains a SQL statement
pub fn looks_like_sql(text: &str) -> bool {
    let upper = text.to_uppercase();
    SQL_KEYWORDS.iter().any(|kw| upper.contains(kw))
}

//! Prompt construction for LLM requests.
//!
//! Two templates: one asks for a single MySQL statement given the schema and
//! the conversation, the other asks for a short fix for a failed statement.

use crate::transcript::{Message, Role};

/// SQL-generation template. Placeholders: `{schema}`, `{chat_history}`, `{question}`.
pub const SQL_QUERY_PROMPT: &str = r#"You are a MySQL assistant. Based on the schema, generate a valid SQL query.
If the user asks to "add random data", "insert data", or "generate sample rows",
create an INSERT query with realistic random values for all columns.

<SCHEMA>{schema}</SCHEMA>
Conversation History: {chat_history}

User Request: {question}
SQL Query:"#;

/// Error-explanation template. Placeholders: `{query}`, `{error}`.
pub const ERROR_EXPLANATION_PROMPT: &str = r#"You are a database expert. The following query failed. Explain briefly how to fix it.
SQL Query: {query}
Error: {error}
Explanation:"#;

/// Renders messages as `Human: ...` / `AI: ...` lines.
pub fn format_chat_history(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| {
            let speaker = match message.role {
                Role::Human => "Human",
                Role::Ai => "AI",
            };
            format!("{speaker}: {}", message.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills the SQL-generation template.
pub fn build_sql_prompt(schema: &str, chat_history: &str, question: &str) -> String {
    fill_template(
        SQL_QUERY_PROMPT,
        &[
            ("schema", schema),
            ("chat_history", chat_history),
            ("question", question),
        ],
    )
}

/// Fills the error-explanation template.
pub fn build_error_prompt(query: &str, error: &str) -> String {
    fill_template(ERROR_EXPLANATION_PROMPT, &[("query", query), ("error", error)])
}

/// Replaces each `{name}` in `template` with its value in one pass.
///
/// Inserted values are copied as-is and never scanned for placeholders.
/// Unknown `{...}` tokens are left untouched.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let value = tail.find('}').and_then(|end| {
            let name = &tail[1..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match value {
            Some((value, end)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

//! End-to-end turns through the session with a mock model and gateway.

use pretty_assertions::assert_eq;
use sqlflow::chat::Rendered;
use sqlflow::config::Configuration;
use sqlflow::db::{
    Column, DatabaseBackend, MockDatabaseGateway, QueryResult, RowSet, Schema, SqliteGateway,
    Table,
};
use sqlflow::error::SqlFlowError;
use sqlflow::llm::MockLlmClient;
use sqlflow::session::{Readiness, SessionContext};
use sqlflow::transcript::{Message, Role};
use tempfile::NamedTempFile;

fn keyed() -> Configuration {
    Configuration {
        api_key: "test-key".to_string(),
        ..Default::default()
    }
}

async fn ready_session(gateway: MockDatabaseGateway, llm: MockLlmClient) -> SessionContext {
    let mut session = SessionContext::with_client(Configuration::default(), Box::new(gateway), llm);
    session.submit_configuration(keyed()).await.unwrap();
    assert_eq!(session.readiness(), Readiness::Ready);
    session
}

#[tokio::test]
async fn test_fenced_statement_reaches_gateway_without_fences() {
    let gateway = MockDatabaseGateway::new();
    let llm = MockLlmClient::new().with_response(
        "latest orders",
        "```sql\nSELECT * FROM orders ORDER BY created_at DESC LIMIT 5;\n```",
    );
    // The session owns the gateway, so keep a handle through the shared log.
    let mut session = ready_session(gateway.clone(), llm).await;

    let outcome = session.ask("show the latest orders").await.unwrap().unwrap();

    let executed = gateway.executed();
    assert_eq!(
        executed,
        vec!["SELECT * FROM orders ORDER BY created_at DESC LIMIT 5;".to_string()]
    );
    assert!(!executed[0].contains("```"));
    assert_eq!(outcome.sql.as_deref(), Some(executed[0].as_str()));
}

#[tokio::test]
async fn test_each_turn_adds_two_messages() {
    let mut session = ready_session(MockDatabaseGateway::new(), MockLlmClient::new()).await;

    for (turn, question) in ["show all users", "count the orders", "list tables"]
        .into_iter()
        .enumerate()
    {
        let before = session.transcript().len();
        session.ask(question).await.unwrap();
        assert_eq!(session.transcript().len(), before + 2, "turn {turn}");

        let messages = session.transcript().messages();
        assert_eq!(messages[before], Message::human(question));
        assert_eq!(messages[before + 1].role, Role::Ai);
    }
}

#[tokio::test]
async fn test_unknown_column_is_explained() {
    let gateway = MockDatabaseGateway::new().with_error("Unknown column 'x' in 'field list'");
    let llm = MockLlmClient::new()
        .with_response("x values", "SELECT x FROM t")
        .with_response(
            "unknown column 'x'",
            "Table t has no column named x. Try column a instead.",
        );
    let mut session = ready_session(gateway.clone(), llm.clone()).await;

    let outcome = session.ask("list the x values").await.unwrap().unwrap();

    assert_eq!(
        outcome.rendered,
        Rendered::Explanation {
            error: "Unknown column 'x' in 'field list'".to_string(),
            explanation: "Table t has no column named x. Try column a instead.".to_string(),
        }
    );
    assert_eq!(gateway.executed(), vec!["SELECT x FROM t".to_string()]);
    assert_eq!(
        session.transcript().last(),
        Some(&Message::ai(
            "Table t has no column named x. Try column a instead."
        ))
    );

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("SQL Query: SELECT x FROM t"));
}

#[tokio::test]
async fn test_schema_text_reaches_sql_prompt() {
    let mut notes = Table::new("notes");
    notes.columns = vec![
        Column::new("id", "int").nullable(false),
        Column::new("body", "text").with_default("'{chat_history}'"),
    ];
    notes.primary_key = vec!["id".to_string()];
    let schema = Schema {
        tables: vec![notes],
        ..Default::default()
    };
    let llm = MockLlmClient::new();
    let mut session = ready_session(MockDatabaseGateway::new().with_schema(schema), llm.clone()).await;

    session.ask("list the notes").await.unwrap();

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("<SCHEMA>CREATE TABLE notes (\n\tid int NOT NULL,"));
    assert!(prompts[0].contains("\tbody text DEFAULT '{chat_history}',"));
    assert!(prompts[0].contains("\tPRIMARY KEY (id)\n)</SCHEMA>"));
    assert!(prompts[0].contains("User Request: list the notes\n"));
}

#[tokio::test]
async fn test_missing_key_blocks_turns() {
    let mut session = SessionContext::with_client(
        Configuration::default(),
        Box::new(MockDatabaseGateway::new()),
        MockLlmClient::new(),
    );
    assert_eq!(session.readiness(), Readiness::NeedsApiKey);
    assert!(session.readiness().prompt().is_some());

    // Connecting without a key still leaves the session blocked.
    session
        .submit_configuration(Configuration::default())
        .await
        .unwrap();
    assert!(session.is_connected());
    assert_eq!(session.readiness(), Readiness::NeedsApiKey);

    let err = session.ask("show all users").await.unwrap_err();
    assert!(matches!(err, SqlFlowError::Llm(_)));
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn test_history_carries_previous_turns() {
    let llm = MockLlmClient::new();
    let mut session = ready_session(
        MockDatabaseGateway::new().with_result(QueryResult::Rows(RowSet::new())),
        llm.clone(),
    )
    .await;

    session.ask("show all users").await.unwrap();
    session.ask("count the orders").await.unwrap();

    let prompts = llm.prompts();
    assert!(prompts[1].contains("Human: show all users\nAI: SQL Query: SELECT * FROM users;"));
    assert!(prompts[1].contains("Human: count the orders"));
}

#[tokio::test]
async fn test_write_turn_against_sqlite() {
    let file = NamedTempFile::new().unwrap();
    let config = Configuration {
        backend: DatabaseBackend::Sqlite,
        database: file.path().to_string_lossy().into_owned(),
        api_key: "test-key".to_string(),
        ..Default::default()
    };
    let llm = MockLlmClient::new()
        .with_response("make", "CREATE TABLE users (email TEXT, name TEXT)")
        .with_response("how many", "```sql\nSELECT COUNT(*) AS n FROM users\n```");
    let mut session = SessionContext::with_client(config.clone(), Box::new(SqliteGateway::new()), llm);
    session.submit_configuration(config).await.unwrap();

    session.ask("make a users table").await.unwrap();
    let outcome = session.ask("add random data").await.unwrap().unwrap();
    assert_eq!(outcome.rendered, Rendered::Affected(1));

    let outcome = session.ask("how many users?").await.unwrap().unwrap();
    match outcome.rendered {
        Rendered::Rows(rows) => assert_eq!(rows.len(), 1),
        other => panic!("expected rows, got {other:?}"),
    }
    assert_eq!(session.transcript().len(), 7);
}

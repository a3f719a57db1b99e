//! Chat orchestration for SQLFlow.
//!
//! One turn walks a small state machine:
//!
//! ```text
//! Idle -> AwaitingModelSql -> AwaitingExecution -> Rendered
//!                 \                  \
//!                  +------------------+-> AwaitingErrorExplanation -> Rendered
//! ```
//!
//! A turn appends exactly one Human message and one AI message to the
//! transcript, whichever path it takes.

use crate::config::Configuration;
use crate::db::{DatabaseGateway, QueryResult, RowSet};
use crate::error::Result;
use crate::llm::prompt::{build_error_prompt, build_sql_prompt, format_chat_history};
use crate::llm::{strip_code_fences, LlmClient};
use crate::transcript::{Message, Transcript};
use tracing::{debug, info, warn};

/// What a finished turn shows the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Rows from a read-like statement (possibly none).
    Rows(RowSet),
    /// Affected-row count from a committed write.
    Affected(u64),
    /// The statement or the generation failed and the model explained why.
    Explanation { error: String, explanation: String },
}

/// Result of one completed turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub question: String,
    /// The statement sent to the database, if generation got that far.
    pub sql: Option<String>,
    pub rendered: Rendered,
}

/// States of a single turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    Idle,
    AwaitingModelSql,
    AwaitingExecution {
        sql: String,
    },
    AwaitingErrorExplanation {
        statement: Option<String>,
        error: String,
    },
    Rendered {
        sql: Option<String>,
        rendered: Rendered,
    },
}

impl TurnState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AwaitingModelSql => "AwaitingModelSql",
            Self::AwaitingExecution { .. } => "AwaitingExecution",
            Self::AwaitingErrorExplanation { .. } => "AwaitingErrorExplanation",
            Self::Rendered { .. } => "Rendered",
        }
    }
}

/// Drives turns over borrowed session parts.
pub struct Orchestrator<'a> {
    config: &'a Configuration,
    gateway: &'a dyn DatabaseGateway,
    llm: &'a dyn LlmClient,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a Configuration,
        gateway: &'a dyn DatabaseGateway,
        llm: &'a dyn LlmClient,
    ) -> Self {
        Self {
            config,
            gateway,
            llm,
        }
    }

    /// Asks the model for one SQL statement and strips code fences from it.
    pub async fn generate_sql(
        &self,
        schema_text: &str,
        chat_history: &str,
        question: &str,
    ) -> Result<String> {
        let prompt = build_sql_prompt(schema_text, chat_history, question);
        let reply = self.llm.complete(&prompt).await?;
        Ok(strip_code_fences(&reply))
    }

    /// Asks the model to explain why `failed_statement` failed.
    pub async fn explain_error(&self, failed_statement: &str, error_text: &str) -> Result<String> {
        let prompt = build_error_prompt(failed_statement, error_text);
        self.llm.complete(&prompt).await
    }

    /// Runs one turn for `question`.
    ///
    /// Blank input is ignored and returns `Ok(None)` without touching the
    /// transcript. A statement or generation failure still ends in `Ok`
    /// with an explanation; only a failure of the explanation call itself
    /// is returned as an error.
    pub async fn run_turn(
        &self,
        transcript: &mut Transcript,
        question: &str,
    ) -> Result<Option<TurnOutcome>> {
        let question = question.trim();
        if question.is_empty() {
            debug!("Ignoring blank input");
            return Ok(None);
        }

        info!("Starting turn");
        let mut state = TurnState::Idle;
        loop {
            state = match state {
                TurnState::Rendered { sql, rendered } => {
                    return Ok(Some(TurnOutcome {
                        question: question.to_string(),
                        sql,
                        rendered,
                    }));
                }
                current => {
                    let from = current.name();
                    let next = self.step(current, transcript, question).await?;
                    debug!(from, to = next.name(), "Turn transition");
                    next
                }
            };
        }
    }

    async fn step(
        &self,
        state: TurnState,
        transcript: &mut Transcript,
        question: &str,
    ) -> Result<TurnState> {
        match state {
            TurnState::Idle => {
                transcript.push(Message::human(question));
                Ok(TurnState::AwaitingModelSql)
            }

            TurnState::AwaitingModelSql => {
                let history = format_chat_history(transcript.messages());
                match self.request_sql(&history, question).await {
                    Ok(sql) => Ok(TurnState::AwaitingExecution { sql }),
                    Err(e) => {
                        warn!("SQL generation failed: {e}");
                        Ok(TurnState::AwaitingErrorExplanation {
                            statement: None,
                            error: e.message().to_string(),
                        })
                    }
                }
            }

            TurnState::AwaitingExecution { sql } => {
                match self.gateway.execute(self.config, &sql).await {
                    Ok(result) => {
                        transcript.push(Message::ai(format!("SQL Query: {sql}")));
                        let rendered = match result {
                            QueryResult::Rows(rows) => Rendered::Rows(rows),
                            QueryResult::Affected { rows_affected } => {
                                Rendered::Affected(rows_affected)
                            }
                        };
                        Ok(TurnState::Rendered {
                            sql: Some(sql),
                            rendered,
                        })
                    }
                    Err(e) => {
                        warn!("Statement failed: {e}");
                        Ok(TurnState::AwaitingErrorExplanation {
                            statement: Some(sql),
                            error: e.message().to_string(),
                        })
                    }
                }
            }

            TurnState::AwaitingErrorExplanation { statement, error } => {
                let failed = statement.as_deref().unwrap_or(question);
                match self.explain_error(failed, &error).await {
                    Ok(explanation) => {
                        transcript.push(Message::ai(explanation.clone()));
                        Ok(TurnState::Rendered {
                            sql: statement,
                            rendered: Rendered::Explanation { error, explanation },
                        })
                    }
                    Err(e) => {
                        warn!("Error explanation failed: {e}");
                        // Keeps every Human message paired with an AI reply.
                        transcript.push(Message::ai(e.to_string()));
                        Err(e)
                    }
                }
            }

            done @ TurnState::Rendered { .. } => Ok(done),
        }
    }

    /// Introspects the schema and asks the model for a statement.
    async fn request_sql(&self, history: &str, question: &str) -> Result<String> {
        let schema_text = self.gateway.table_info(self.config).await?;
        self.generate_sql(&schema_text, history, question).await
    }
}

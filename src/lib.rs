//! SQLFlow - conversational text-to-SQL in the terminal.
//!
//! This library exposes the core modules for use in integration tests.

pub mod chat;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod session;
pub mod transcript;
pub mod tui;

//! TUI widgets for SQLFlow.

pub mod chat;
pub mod form;
pub mod header;
pub mod input;
pub mod table;

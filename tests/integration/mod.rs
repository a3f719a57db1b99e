//! Integration tests for SQLFlow.

pub mod gateway_test;
pub mod mysql_test;
pub mod orchestrator_test;

//! Orchestrator: the HTTP/SSE surface of the runtime core (spec §2, §6).
//!
//! Owns nothing of the five components itself — `agent-runtime` drives the
//! graph, `stream-adapter` translates events to AG-UI SSE, `sandbox`
//! manages compute sandboxes, `mcp-client` proxies tool calls, and
//! `credit-ledger` debits usage. This crate wires them behind a shared
//! Postgres pool (`core::Core`) and exposes `/chat/stream` and
//! `/agent/sandboxes/*` over axum.

pub mod api;
pub mod auth;
pub mod config;
pub mod core;
pub mod db;
pub mod version;

pub use core::Core;

use thiserror::Error;

/// Orchestrator-level errors not already captured by `api::error::ApiError`
/// (startup/bootstrap failures, mainly).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ServerConfigError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;

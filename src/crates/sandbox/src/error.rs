//! Error taxonomy for sandbox operations, mapped to HTTP status by the
//! orchestrator's `handle_sandbox_exception` equivalent (spec §7):
//! `SandboxNotFound -> 404`, `SandboxNotInitialized -> 422`,
//! `SandboxAuth -> 401`, `SandboxTimeout -> 408`, else `500`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SandboxError>;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("sandbox not found: {0}")]
    NotFound(String),

    #[error("sandbox not initialized: {0}")]
    NotInitialized(String),

    #[error("sandbox authentication failed: {0}")]
    Auth(String),

    #[error("sandbox operation timed out: {0}")]
    Timeout(String),

    #[error("invalid sandbox state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: crate::model::SandboxStatus,
        to: crate::model::SandboxStatus,
    },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("queue error: {0}")]
    Queue(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

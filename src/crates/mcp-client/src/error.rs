//! Error types for MCP client operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, McpError>;

#[derive(Error, Debug)]
pub enum McpError {
    /// The client was asked to list/call tools before `set_credential` and
    /// `set_tool_server_url` completed. This is the "primary test the
    /// suite must cover" per spec §4.4 — skipping registration yields an
    /// empty tool list silently in the source, but is rejected loudly here.
    #[error("tool registration incomplete: {0}")]
    NotRegistered(&'static str),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool input failed schema validation: {0}")]
    SchemaInvalid(String),

    #[error("sandbox transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("sandbox endpoint returned {status}: {body}")]
    EndpointError { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("tool call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

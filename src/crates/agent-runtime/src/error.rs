//! Error taxonomy for the fixed chat graph (spec §7).

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExecutorError>;

#[derive(Error, Debug)]
pub enum ExecutorError {
    /// The checkpoint store is unreachable. Aborts the stream with no event
    /// past the last consistent checkpoint.
    #[error("checkpoint store unavailable: {0}")]
    CheckpointUnavailable(#[from] langgraph_checkpoint::error::CheckpointError),

    /// LLM or sandbox provider returned a retriable error. The caller may
    /// retry with the same thread_id; state is rolled back to the last
    /// successful checkpoint.
    #[error("provider error (transient): {0}")]
    ProviderTransient(String),

    /// Provider rejected the request permanently.
    #[error("provider error (fatal): {0}")]
    ProviderFatal(String),

    /// A tool returned an error payload. Not fatal to the stream; surfaced
    /// as a `tool_call_result` with error content.
    #[error("tool '{name}' failed: {message}")]
    ToolError { name: String, message: String },

    #[error("mcp error: {0}")]
    Mcp(#[from] mcp_client::McpError),

    /// Error surfaced by the underlying `ChatModel`. Treated as fatal unless
    /// the node explicitly classifies it as transient first (network
    /// timeouts, rate limits) via [`ExecutorError::provider_transient`].
    #[error("model error: {0}")]
    Model(#[from] langgraph_core::error::GraphError),

    /// `recursion_limit` reached without reaching END.
    #[error("recursion limit {limit} exhausted")]
    RecursionExhausted { limit: u32 },

    /// A `stream(..., Resume(decision))` call arrived for a thread with no
    /// pending interrupt, or the decision kind doesn't match what the
    /// suspended node is waiting on.
    #[error("invalid resume: {0}")]
    InvalidResume(String),

    /// Thread has no checkpoint and no fresh input was provided.
    #[error("thread '{0}' not found and no input given")]
    ThreadNotFound(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ExecutorError {
    /// Whether the caller may retry `stream()` with the same thread_id.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExecutorError::ProviderTransient(_))
    }

    /// Reclassifies a model-layer error as transient (spec §4.1 "Failure
    /// semantics": network timeouts and rate limits roll back and retry;
    /// everything else aborts the stream).
    pub fn provider_transient(message: impl Into<String>) -> Self {
        ExecutorError::ProviderTransient(message.into())
    }
}

//! Events a running graph emits (spec §4.2 "AG-UI event vocabulary").
//!
//! These are the executor's own vocabulary, one level below the AG-UI wire
//! format: `stream-adapter` attaches `thread_id` and frames each variant as
//! `event: <kind>\ndata: <json>\n\n`. Keeping `thread_id` out of this enum
//! means a `GraphExecutor` never has to know about the transport.

use langgraph_core::messages::MessageRole;
use langgraph_core::tool::ToolCall;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::hitl::InterruptRequest;

/// One reassembled-so-far tool call fragment, emitted incrementally as a
/// `tool_call_chunks` event (spec §4.1 chunk reassembly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallChunkDelta {
    pub index: u32,
    pub id: Option<String>,
    pub name: Option<String>,
    pub args_delta: Option<String>,
}

/// Why a stream ended, carried on the terminal event (spec §4.1 "Failure
/// semantics", §8 invariant 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// `human_feedback` approved and the graph reached `END`.
    Stop,
    /// The stream paused on an `interrupt` event; not a true terminal state,
    /// but no further events follow until resumed.
    Interrupt,
    /// A hard failure aborted the stream; no further events, no partial-step
    /// checkpoint is visible to a subsequent `get_state`.
    Error,
    /// Reserved for callers that want to distinguish "ended because the
    /// model asked for tools" from a plain stop; the fixed graph always
    /// loops tool calls back into `base` internally, so this currently only
    /// appears if a tool-authorization interrupt is rejected mid-call.
    ToolCalls,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ExecutorEvent {
    MessageChunk {
        message_id: String,
        role: MessageRole,
        delta: String,
    },
    ToolCallChunks {
        message_id: String,
        chunks: Vec<ToolCallChunkDelta>,
    },
    /// Emitted once per `base` turn after chunk reassembly completes, before
    /// any tool is invoked (spec §8 invariant 3: precedes `tool_call_result`).
    ToolCalls {
        message_id: String,
        tool_calls: Vec<ToolCall>,
    },
    ToolCallResult {
        tool_call_id: String,
        content: String,
        is_error: bool,
    },
    ReasoningStart {
        message_id: String,
    },
    ReasoningMessageStart {
        message_id: String,
        role: MessageRole,
    },
    ReasoningMessageContent {
        message_id: String,
        delta: String,
    },
    ReasoningMessageEnd {
        message_id: String,
    },
    ReasoningEnd {
        message_id: String,
    },
    Interrupt {
        id: String,
        value: InterruptRequest,
    },
    Error {
        message: String,
        retryable: bool,
    },
    Finish {
        reason: FinishReason,
        metadata: Option<Value>,
    },
}

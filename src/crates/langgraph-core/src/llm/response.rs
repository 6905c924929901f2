//! Response types returned by [`ChatModel`](super::traits::ChatModel) implementations.
//!
//! Split out from `traits.rs` so that provider crates can depend on the response
//! shapes without pulling in the trait itself.

use std::collections::HashMap;

use serde_json::Value;

use crate::llm_stream::MessageChunkStream;
use crate::messages::Message;

/// Token accounting for a single chat completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    /// Tokens consumed by the prompt (messages + tools + system prompt).
    pub input_tokens: usize,
    /// Tokens generated in the completion, excluding reasoning tokens.
    pub output_tokens: usize,
    /// Tokens spent on hidden reasoning/thinking, when the provider reports them.
    pub reasoning_tokens: Option<usize>,
    /// Sum of input, output and reasoning tokens.
    pub total_tokens: usize,
}

impl UsageMetadata {
    /// Build usage from prompt/completion token counts.
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            reasoning_tokens: None,
            total_tokens: input_tokens + output_tokens,
        }
    }

    /// Build usage including a reasoning-token count reported by a thinking model.
    pub fn with_reasoning(input_tokens: usize, output_tokens: usize, reasoning_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
            reasoning_tokens: Some(reasoning_tokens),
            total_tokens: input_tokens + output_tokens + reasoning_tokens,
        }
    }
}

/// Extracted chain-of-thought / thinking content, when a provider surfaces it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReasoningContent {
    /// The reasoning text itself (e.g. the contents of a `<think>` block).
    pub content: String,
}

impl ReasoningContent {
    /// Wrap raw reasoning text.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }
}

/// A complete (non-streaming) chat response.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant message produced by the model.
    pub message: Message,
    /// Token usage for the call, when the provider reports it.
    pub usage: Option<UsageMetadata>,
    /// Reasoning content, when requested and supported.
    pub reasoning: Option<ReasoningContent>,
    /// Provider-specific extra fields (model name, finish reason, request id, ...).
    pub metadata: HashMap<String, Value>,
}

/// A streaming chat response.
///
/// `stream` carries content and tool-call-argument deltas interleaved: a chunk with
/// non-empty `content` is a text delta, while a chunk whose `metadata` contains a
/// `"tool_call_chunk"` object carries a `{index, id?, name?, args_delta?}` fragment
/// (see `agent-runtime`'s chunk reassembly for how these are regrouped). `reasoning_stream`
/// carries thinking-token deltas for models that stream reasoning separately from content.
pub struct ChatStreamResponse {
    /// The primary content/tool-call-chunk stream.
    pub stream: MessageChunkStream,
    /// Optional separate stream of reasoning deltas.
    pub reasoning_stream: Option<MessageChunkStream>,
    /// Usage totals, resolved once the stream completes (providers that report usage
    /// only in a trailing frame populate this after `stream` is exhausted).
    pub usage: Option<UsageMetadata>,
}

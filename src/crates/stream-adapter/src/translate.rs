//! Executor event -> AG-UI event translation (spec §4.2 "AG-UI event kinds").
//!
//! Each `agent_runtime::ExecutorEvent` becomes exactly one [`SseFrame`]; the
//! thread id the caller is streaming is stamped onto every frame that the
//! table lists it for (everything except the `reasoning_*` family, which is
//! keyed by `message_id` alone).

use agent_runtime::event::{ExecutorEvent, ToolCallChunkDelta};
use langgraph_core::messages::MessageRole;
use serde_json::{json, Value};

use crate::frame::SseFrame;

pub fn translate(thread_id: &str, event: ExecutorEvent) -> SseFrame {
    match event {
        ExecutorEvent::MessageChunk {
            message_id,
            role,
            delta,
        } => SseFrame::new(
            "message_chunk",
            json!({
                "thread_id": thread_id,
                "message_id": message_id,
                "role": role_str(&role),
                "delta": delta,
            }),
        ),
        ExecutorEvent::ToolCallChunks { message_id, chunks } => SseFrame::new(
            "tool_call_chunks",
            json!({
                "thread_id": thread_id,
                "message_id": message_id,
                "tool_call_chunks": chunks.into_iter().map(chunk_delta_json).collect::<Vec<_>>(),
            }),
        ),
        ExecutorEvent::ToolCalls {
            message_id,
            tool_calls,
        } => SseFrame::new(
            "tool_calls",
            json!({
                "thread_id": thread_id,
                "message_id": message_id,
                "tool_calls": tool_calls,
            }),
        ),
        ExecutorEvent::ToolCallResult {
            tool_call_id,
            content,
            is_error,
        } => SseFrame::new(
            "tool_call_result",
            json!({
                "thread_id": thread_id,
                "tool_call_id": tool_call_id,
                "content": content,
                "is_error": is_error,
            }),
        ),
        ExecutorEvent::ReasoningStart { message_id } => {
            SseFrame::new("reasoning_start", json!({ "message_id": message_id }))
        }
        ExecutorEvent::ReasoningMessageStart { message_id, role } => SseFrame::new(
            "reasoning_message_start",
            json!({ "message_id": message_id, "role": role_str(&role) }),
        ),
        ExecutorEvent::ReasoningMessageContent { message_id, delta } => SseFrame::new(
            "reasoning_message_content",
            json!({ "message_id": message_id, "delta": delta }),
        ),
        ExecutorEvent::ReasoningMessageEnd { message_id } => SseFrame::new(
            "reasoning_message_end",
            json!({ "message_id": message_id }),
        ),
        ExecutorEvent::ReasoningEnd { message_id } => {
            SseFrame::new("reasoning_end", json!({ "message_id": message_id }))
        }
        ExecutorEvent::Interrupt { id, value } => {
            let options = value
                .allowed_decisions
                .iter()
                .map(|d| json!(d))
                .collect::<Vec<_>>();
            SseFrame::new(
                "interrupt",
                json!({
                    "thread_id": thread_id,
                    "id": id,
                    "role": "assistant",
                    "value": value,
                    "finish_reason": "interrupt",
                    "options": options,
                }),
            )
        }
        ExecutorEvent::Error { message, retryable } => SseFrame::new(
            "error",
            json!({
                "thread_id": thread_id,
                "message": sanitize(&message),
                "retryable": retryable,
            }),
        ),
        ExecutorEvent::Finish { reason, metadata } => SseFrame::new(
            "finish",
            json!({
                "thread_id": thread_id,
                "reason": reason,
                "metadata": metadata,
            }),
        ),
    }
}

fn chunk_delta_json(delta: ToolCallChunkDelta) -> Value {
    json!({
        "index": delta.index,
        "id": delta.id,
        "name": delta.name,
        "args_delta": delta.args_delta,
    })
}

fn role_str(role: &MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::Human => "human",
        MessageRole::Assistant => "assistant",
        MessageRole::Tool => "tool",
        MessageRole::Custom(_) => "assistant",
    }
}

/// Strips anything that looks like a stack trace or file path before an
/// error message reaches the client (spec §4.2: "error message
/// (sanitized; no stack traces)").
fn sanitize(message: &str) -> String {
    message
        .lines()
        .filter(|line| !line.trim_start().starts_with("at ") && !line.contains(".rs:"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_chunk_carries_thread_id_and_role() {
        let frame = translate(
            "t1",
            ExecutorEvent::MessageChunk {
                message_id: "m1".to_string(),
                role: MessageRole::Assistant,
                delta: "hi".to_string(),
            },
        );
        assert_eq!(frame.event, "message_chunk");
        assert_eq!(frame.data["thread_id"], "t1");
        assert_eq!(frame.data["role"], "assistant");
    }

    #[test]
    fn sanitize_drops_stack_trace_lines() {
        let sanitized = sanitize("boom\n   at foo.rs:42\nsrc/bar.rs:10: panic");
        assert_eq!(sanitized, "boom");
    }
}

//! Translates `agent-runtime` executor events into AG-UI SSE frames (spec
//! §4.2). This crate has no HTTP dependency of its own — the orchestrator
//! wires [`sse_body`] into whatever web framework it uses, applying
//! [`frame::RESPONSE_HEADERS`] to the response.

pub mod frame;
pub mod translate;

pub use frame::{SseFrame, RESPONSE_HEADERS};

use agent_runtime::event::ExecutorEvent;
use bytes::Bytes;
use futures::{Stream, StreamExt};

/// Adapts a raw executor event stream into the SSE byte stream a caller can
/// write straight to a response body. Dropping the returned stream (e.g. on
/// client disconnect) stops polling the underlying executor stream at its
/// next suspension point, which is how cancellation propagates back to the
/// `GraphExecutor`'s producer task (spec §4.2 "Cancellation").
pub fn sse_body(
    thread_id: impl Into<String>,
    events: impl Stream<Item = ExecutorEvent> + Send + 'static,
) -> impl Stream<Item = Bytes> + Send + 'static {
    let thread_id = thread_id.into();
    events.map(move |event| translate::translate(&thread_id, event).encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_runtime::event::FinishReason;

    #[tokio::test]
    async fn sse_body_frames_each_event() {
        let events = tokio_stream::iter(vec![
            ExecutorEvent::MessageChunk {
                message_id: "m1".to_string(),
                role: langgraph_core::messages::MessageRole::Assistant,
                delta: "hi".to_string(),
            },
            ExecutorEvent::Finish {
                reason: FinishReason::Stop,
                metadata: None,
            },
        ]);
        let frames: Vec<Bytes> = sse_body("t1", events).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames[0].starts_with(b"event: message_chunk\n"));
        assert!(frames[1].starts_with(b"event: finish\n"));
    }
}

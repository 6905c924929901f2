//! End-to-end tests against the fixed chat graph (spec §8 S1-S3).

use std::collections::VecDeque;
use std::sync::Arc;

use agent_runtime::config::GraphConfig;
use agent_runtime::event::{ExecutorEvent, FinishReason};
use agent_runtime::graph::{GraphExecutor, StreamInput};
use agent_runtime::hitl::Decision;
use agent_runtime::nodes::NodeDeps;
use async_trait::async_trait;
use futures::StreamExt;
use langgraph_checkpoint::memory::InMemoryCheckpointSaver;
use langgraph_core::error::Result as CoreResult;
use langgraph_core::llm::{ChatModel, ChatRequest, ChatResponse, ChatStreamResponse};
use langgraph_core::llm_stream::MessageChunk;
use langgraph_core::messages::Message;
use tokio::sync::Mutex;

/// A `ChatModel` that replays a scripted sequence of turns, one per
/// `stream()` call, in order.
struct ScriptedModel {
    turns: Mutex<VecDeque<Vec<MessageChunk>>>,
}

impl ScriptedModel {
    fn new(turns: Vec<Vec<MessageChunk>>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, _request: ChatRequest) -> CoreResult<ChatResponse> {
        unreachable!("the fixed chat graph only uses stream()")
    }

    async fn stream(&self, _request: ChatRequest) -> CoreResult<ChatStreamResponse> {
        let mut turns = self.turns.lock().await;
        let chunks = turns.pop_front().unwrap_or_default();
        Ok(ChatStreamResponse {
            stream: tokio_stream::iter(chunks).boxed(),
            reasoning_stream: None,
            usage: None,
        })
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        unimplemented!("never cloned in these tests")
    }
}

fn text_turn(text: &str) -> Vec<MessageChunk> {
    vec![MessageChunk::new(text).final_chunk()]
}

fn tool_call_turn(id: &str, name: &str, args: &str) -> Vec<MessageChunk> {
    vec![MessageChunk::new("").with_metadata(serde_json::json!({
        "tool_call_chunk": { "index": 0, "id": id, "name": name, "args_delta": args }
    }))]
}

async fn collect(
    executor: &GraphExecutor,
    input: StreamInput,
    config: GraphConfig,
    deps: NodeDeps,
) -> Vec<ExecutorEvent> {
    executor.stream(input, config, deps).collect().await
}

#[tokio::test]
async fn plain_chat_reaches_stop_without_tools() {
    let checkpointer = Arc::new(InMemoryCheckpointSaver::new());
    let executor = GraphExecutor::new(checkpointer);
    let model = Arc::new(ScriptedModel::new(vec![text_turn("Hello there")]));
    let deps = NodeDeps { model, mcp: None };
    let config = GraphConfig::new("thread-s1").with_auto_accepted_plan(true);

    let events = collect(
        &executor,
        StreamInput::Fresh(vec![Message::human("hi")]),
        config,
        deps,
    )
    .await;

    assert!(events
        .iter()
        .any(|e| matches!(e, ExecutorEvent::MessageChunk { delta, .. } if delta == "Hello there")));
    assert!(matches!(
        events.last(),
        Some(ExecutorEvent::Finish {
            reason: FinishReason::Stop,
            ..
        })
    ));
}

#[tokio::test]
async fn tool_call_without_mcp_client_surfaces_error_and_continues() {
    let checkpointer = Arc::new(InMemoryCheckpointSaver::new());
    let executor = GraphExecutor::new(checkpointer);
    let model = Arc::new(ScriptedModel::new(vec![
        tool_call_turn("t1", "echo", "{\"x\":1}"),
        text_turn("done"),
    ]));
    let deps = NodeDeps { model, mcp: None };
    let config = GraphConfig::new("thread-s2").with_auto_accepted_plan(true);

    let events = collect(
        &executor,
        StreamInput::Fresh(vec![Message::human("run echo")]),
        config,
        deps,
    )
    .await;

    let chunk_pos = events
        .iter()
        .position(|e| matches!(e, ExecutorEvent::ToolCallChunks { .. }))
        .expect("tool_call_chunks emitted");
    let calls_pos = events
        .iter()
        .position(|e| matches!(e, ExecutorEvent::ToolCalls { .. }))
        .expect("tool_calls emitted");
    let result_pos = events
        .iter()
        .position(|e| matches!(e, ExecutorEvent::ToolCallResult { .. }))
        .expect("tool_call_result emitted");

    // spec §8 invariant 3: chunks precede calls precede result.
    assert!(chunk_pos < calls_pos);
    assert!(calls_pos < result_pos);

    assert!(matches!(
        &events[result_pos],
        ExecutorEvent::ToolCallResult { is_error: true, .. }
    ));
    assert!(matches!(
        events.last(),
        Some(ExecutorEvent::Finish {
            reason: FinishReason::Stop,
            ..
        })
    ));
}

#[tokio::test]
async fn plan_review_pauses_then_resumes_on_approve() {
    let checkpointer = Arc::new(InMemoryCheckpointSaver::new());
    let executor = GraphExecutor::new(checkpointer);
    let model = Arc::new(ScriptedModel::new(vec![text_turn("draft answer")]));
    let deps = NodeDeps {
        model: model.clone(),
        mcp: None,
    };
    let config = GraphConfig::new("thread-s3");

    let first = collect(
        &executor,
        StreamInput::Fresh(vec![Message::human("plan this")]),
        config.clone(),
        deps,
    )
    .await;

    assert!(matches!(first.last(), Some(ExecutorEvent::Interrupt { .. })));

    let snapshot = executor
        .get_state("thread-s3")
        .await
        .unwrap()
        .expect("thread has a checkpoint");
    assert_eq!(snapshot.pending_node.as_deref(), Some("human_feedback"));

    let deps = NodeDeps { model, mcp: None };
    let resumed = collect(
        &executor,
        StreamInput::Resume(Decision::Approve),
        config,
        deps,
    )
    .await;

    assert!(matches!(
        resumed.last(),
        Some(ExecutorEvent::Finish {
            reason: FinishReason::Stop,
            ..
        })
    ));
    // spec §8 invariant 4: the resumed stream doesn't replay the first run's events.
    assert!(!resumed
        .iter()
        .any(|e| matches!(e, ExecutorEvent::MessageChunk { .. })));
}

#[tokio::test]
async fn plan_review_edit_sends_feedback_back_through_base() {
    let checkpointer = Arc::new(InMemoryCheckpointSaver::new());
    let executor = GraphExecutor::new(checkpointer);
    let model = Arc::new(ScriptedModel::new(vec![
        text_turn("first draft"),
        text_turn("revised draft"),
    ]));
    let deps = NodeDeps {
        model: model.clone(),
        mcp: None,
    };
    let config = GraphConfig::new("thread-s3b");

    let first = collect(
        &executor,
        StreamInput::Fresh(vec![Message::human("plan this")]),
        config.clone(),
        deps,
    )
    .await;
    assert!(matches!(first.last(), Some(ExecutorEvent::Interrupt { .. })));

    let deps = NodeDeps { model, mcp: None };
    let resumed = collect(
        &executor,
        StreamInput::Resume(Decision::Edit {
            feedback: "add more detail".to_string(),
            answers: None,
        }),
        config,
        deps,
    )
    .await;

    assert!(resumed
        .iter()
        .any(|e| matches!(e, ExecutorEvent::MessageChunk { delta, .. } if delta == "revised draft")));
    assert!(matches!(resumed.last(), Some(ExecutorEvent::Interrupt { .. })));
}

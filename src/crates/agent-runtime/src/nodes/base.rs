//! `base`: the single ReAct-style node that talks to the model, reassembles
//! any tool calls it asks for, runs them (pausing for approval when a tool
//! requires it), and loops back into itself until the model stops asking
//! for tools (spec §4.1 "Graph shape", "Tool-call streaming").

use futures::StreamExt;
use langgraph_core::llm::{ChatModel, ChatRequest, ReasoningMode};
use langgraph_core::llm::tools::ToolDefinition;
use langgraph_core::messages::{Message, MessageRole};
use langgraph_core::tool::ToolCall;
use mcp_client::registry::requires_confirmation;
use serde_json::Value;
use uuid::Uuid;

use crate::chunk::{ToolCallChunkAccumulator, ToolCallChunkFragment};
use crate::config::GraphConfig;
use crate::error::{ExecutorError, Result};
use crate::event::{ExecutorEvent, ToolCallChunkDelta};
use crate::hitl::{Decision, InterruptRequest};
use crate::nodes::{emit, EventSink, NodeDeps};
use crate::state::{ExtKey, GraphState};

pub enum BaseOutcome {
    /// A tool result was appended; re-enter `base` for another model turn.
    ToolLoop,
    /// A tool call needs approval before it can run.
    ToolInterrupt(InterruptRequest),
    /// The model produced a final assistant message with no tool calls.
    Done,
}

pub async fn run(
    state: &mut GraphState,
    config: &GraphConfig,
    deps: &NodeDeps,
    tx: &EventSink,
    resume_decision: Option<Decision>,
) -> Result<BaseOutcome> {
    if let Some(pending) = resume_pending_tool_call(state, config, deps, tx, resume_decision).await? {
        return Ok(pending);
    }

    let tools = bound_tool_definitions(deps).await;
    let reasoning = if config.flags.deep_thinking {
        ReasoningMode::Separated
    } else {
        ReasoningMode::Disabled
    };
    let mut request = ChatRequest::new(state.messages.clone()).with_reasoning(reasoning);
    if !tools.is_empty() {
        request = request.with_tools(tools);
    }

    let mut stream_response = deps.model.stream(request).await?;
    let message_id = Uuid::new_v4().to_string();
    let mut text = String::new();
    let mut chunks = ToolCallChunkAccumulator::new();

    // Drain reasoning to completion before the main content stream so
    // `reasoning_*` events for this message precede its `message_chunk`s
    // (spec §4.2 ordering guarantee). Thinking models emit their reasoning
    // before the final answer, so this mirrors real provider behavior
    // rather than forcing an artificial order.
    if let Some(mut reasoning_stream) = stream_response.reasoning_stream.take() {
        emit(tx, ExecutorEvent::ReasoningStart { message_id: message_id.clone() }).await;
        emit(
            tx,
            ExecutorEvent::ReasoningMessageStart {
                message_id: message_id.clone(),
                role: MessageRole::Assistant,
            },
        )
        .await;
        while let Some(chunk) = reasoning_stream.next().await {
            if !chunk.content.is_empty() {
                emit(
                    tx,
                    ExecutorEvent::ReasoningMessageContent {
                        message_id: message_id.clone(),
                        delta: chunk.content,
                    },
                )
                .await;
            }
        }
        emit(tx, ExecutorEvent::ReasoningMessageEnd { message_id: message_id.clone() }).await;
        emit(tx, ExecutorEvent::ReasoningEnd { message_id: message_id.clone() }).await;
    }

    while let Some(chunk) = stream_response.stream.next().await {
        if let Some(fragment) = extract_tool_call_chunk(&chunk.metadata) {
            let pos = chunks.push(fragment.clone());
            let group = chunks.group(pos).expect("just inserted");
            emit(
                tx,
                ExecutorEvent::ToolCallChunks {
                    message_id: message_id.clone(),
                    chunks: vec![ToolCallChunkDelta {
                        index: group.index,
                        id: fragment.id,
                        name: fragment.name,
                        args_delta: fragment.args,
                    }],
                },
            )
            .await;
            continue;
        }

        if !chunk.content.is_empty() {
            text.push_str(&chunk.content);
            emit(
                tx,
                ExecutorEvent::MessageChunk {
                    message_id: message_id.clone(),
                    role: MessageRole::Assistant,
                    delta: chunk.content,
                },
            )
            .await;
        }
    }

    let tool_calls = reassemble_tool_calls(chunks)?;

    let mut assistant = Message::assistant(text).with_id(message_id);
    if !tool_calls.is_empty() {
        assistant = assistant.with_tool_calls(tool_calls.clone());
    }
    state.messages.push(assistant);

    if tool_calls.is_empty() {
        return Ok(BaseOutcome::Done);
    }

    emit(
        tx,
        ExecutorEvent::ToolCalls {
            message_id: Uuid::new_v4().to_string(),
            tool_calls: tool_calls.clone(),
        },
    )
    .await;

    dispatch_tool_calls(state, config, deps, tx, tool_calls, 0, None).await
}

/// A resume landed back on `base` with a pending tool-authorization
/// interrupt already queued; apply the reviewer's decision instead of
/// asking the model again (spec §4.1 "Interrupt-before-tools": approve
/// proceeds with the call, reject substitutes a synthetic error
/// `ToolResult` carrying the rejection reason and the call never runs).
async fn resume_pending_tool_call(
    state: &mut GraphState,
    config: &GraphConfig,
    deps: &NodeDeps,
    tx: &EventSink,
    decision: Option<Decision>,
) -> Result<Option<BaseOutcome>> {
    let Some(pending) = state.get_ext(ExtKey::PendingToolCalls).cloned() else {
        return Ok(None);
    };
    let tool_calls: Vec<ToolCall> = serde_json::from_value(pending)?;
    let index = state
        .get_ext(ExtKey::PendingToolIndex)
        .and_then(Value::as_u64)
        .unwrap_or(0) as usize;

    state.clear_ext(ExtKey::PendingToolCalls);
    state.clear_ext(ExtKey::PendingToolIndex);

    if let Some(Decision::Reject { reason }) = decision {
        let call = &tool_calls[index];
        let message = reason.unwrap_or_else(|| "tool call rejected by reviewer".to_string());
        emit_tool_error(tx, state, &call.id, &message).await;
        return Ok(Some(
            dispatch_tool_calls(state, config, deps, tx, tool_calls, index + 1, None).await?,
        ));
    }

    // `Approve` (or a resume with no decision at all, e.g. an administrative
    // `update_state` replay): the paused call proceeds without re-raising
    // the same interrupt, since it was already cleared for this one call.
    Ok(Some(
        dispatch_tool_calls(state, config, deps, tx, tool_calls, index, Some(index)).await?,
    ))
}

async fn dispatch_tool_calls(
    state: &mut GraphState,
    config: &GraphConfig,
    deps: &NodeDeps,
    tx: &EventSink,
    tool_calls: Vec<ToolCall>,
    start: usize,
    skip_confirmation_at: Option<usize>,
) -> Result<BaseOutcome> {
    for (offset, call) in tool_calls.iter().enumerate().skip(start) {
        let Some(mcp) = &deps.mcp else {
            emit_tool_error(
                tx,
                state,
                &call.id,
                "no MCP client registered for this thread",
            )
            .await;
            continue;
        };

        let client = mcp.lock().await;
        let needs_confirmation = skip_confirmation_at != Some(offset)
            && client
                .registry()
                .find(&call.name)
                .map(|descriptor| requires_confirmation(descriptor, &config.interrupt_before_tools))
                .unwrap_or(false);

        if needs_confirmation {
            drop(client);
            state.set_ext(
                ExtKey::PendingToolCalls,
                serde_json::to_value(&tool_calls)?,
            );
            state.set_ext(ExtKey::PendingToolIndex, Value::from(offset as u64));
            return Ok(BaseOutcome::ToolInterrupt(InterruptRequest::tool_authorization(
                call.name.clone(),
                call.args.clone(),
            )));
        }

        let result = client.call_tool(&call.name, call.args.clone()).await;
        drop(client);

        match result {
            Ok(mcp_client::ToolResult::Text(content)) => {
                emit_tool_ok(tx, state, &call.id, &call.name, content).await;
            }
            Ok(mcp_client::ToolResult::Structured(value)) => {
                emit_tool_ok(tx, state, &call.id, &call.name, value.to_string()).await;
            }
            Err(e) => {
                emit_tool_error(tx, state, &call.id, &e.to_string()).await;
            }
        }
    }

    Ok(BaseOutcome::ToolLoop)
}

async fn emit_tool_ok(tx: &EventSink, state: &mut GraphState, tool_call_id: &str, name: &str, content: String) {
    emit(
        tx,
        ExecutorEvent::ToolCallResult {
            tool_call_id: tool_call_id.to_string(),
            content: content.clone(),
            is_error: false,
        },
    )
    .await;
    state
        .messages
        .push(Message::tool(content, tool_call_id).with_name(name));
}

async fn emit_tool_error(tx: &EventSink, state: &mut GraphState, tool_call_id: &str, message: &str) {
    emit(
        tx,
        ExecutorEvent::ToolCallResult {
            tool_call_id: tool_call_id.to_string(),
            content: message.to_string(),
            is_error: true,
        },
    )
    .await;
    state
        .messages
        .push(Message::tool(message.to_string(), tool_call_id));
}

async fn bound_tool_definitions(deps: &NodeDeps) -> Vec<ToolDefinition> {
    let Some(mcp) = &deps.mcp else {
        return Vec::new();
    };
    let client = mcp.lock().await;
    client
        .registry()
        .flatten()
        .into_iter()
        .map(|descriptor| {
            let mut def = ToolDefinition::new(descriptor.name, descriptor.description);
            def.parameters = Some(descriptor.input_schema);
            def
        })
        .collect()
}

fn extract_tool_call_chunk(metadata: &Option<Value>) -> Option<ToolCallChunkFragment> {
    let metadata = metadata.as_ref()?;
    let raw = metadata.get("tool_call_chunk")?;
    serde_json::from_value(raw.clone()).ok()
}

fn reassemble_tool_calls(chunks: ToolCallChunkAccumulator) -> Result<Vec<ToolCall>> {
    chunks
        .into_sorted_groups()
        .into_iter()
        .filter(|g| !g.name.is_empty())
        .map(|g| {
            let args = if g.args.is_empty() {
                Value::Object(Default::default())
            } else {
                serde_json::from_str(&g.args).map_err(ExecutorError::Serialization)?
            };
            Ok(ToolCall {
                id: if g.id.is_empty() {
                    Uuid::new_v4().to_string()
                } else {
                    g.id
                },
                name: g.name,
                args,
            })
        })
        .collect()
}

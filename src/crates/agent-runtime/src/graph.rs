//! `GraphExecutor`: drives the fixed chat graph for a single thread, one
//! checkpoint per node transition (spec §4.1, §9 "Coroutine control-flow ->
//! tasks + channels").
//!
//! `stream()` spawns a task that walks `background_investigator -> base ->
//! human_feedback -> {base|END}`, writing one [`ExecutorEvent`] at a time
//! into a bounded channel; the returned `Stream` is just the receiving end.
//! This mirrors how the source's async generator is reimplemented without a
//! language-level coroutine: a producer task plus a channel.

use std::collections::HashMap;
use std::sync::Arc;

use futures::Stream;
use langgraph_checkpoint::checkpoint::{
    Checkpoint, CheckpointConfig, CheckpointMetadata, CheckpointSource, ChannelVersion,
};
use langgraph_checkpoint::traits::CheckpointSaver;
use langgraph_core::messages::Message;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use crate::config::GraphConfig;
use crate::error::{ExecutorError, Result};
use crate::event::{ExecutorEvent, FinishReason};
use crate::hitl::{Decision, InterruptRequest};
use crate::nodes::{background_investigator, base, human_feedback, NodeDeps};
use crate::state::GraphState;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Fresh user input, or an answer to a previously-raised interrupt.
pub enum StreamInput {
    Fresh(Vec<Message>),
    Resume(Decision),
}

/// Which node a thread is currently paused on, returned by `get_state`.
#[derive(Debug, Clone)]
pub struct ThreadSnapshot {
    pub state: GraphState,
    pub pending_node: Option<String>,
    pub pending_interrupt: Option<InterruptRequest>,
}

pub struct GraphExecutor {
    checkpointer: Arc<dyn CheckpointSaver>,
}

impl GraphExecutor {
    pub fn new(checkpointer: Arc<dyn CheckpointSaver>) -> Self {
        Self { checkpointer }
    }

    /// Runs (or resumes) a thread's graph, returning a stream of events.
    /// Errors surfaced during the run arrive as a single `ExecutorEvent::Error`
    /// rather than through the `Result`, since by the time a node fails the
    /// stream has already started (spec §8 invariant: "once a stream starts,
    /// all its events arrive over the channel, including the failure").
    pub fn stream(
        &self,
        input: StreamInput,
        config: GraphConfig,
        deps: NodeDeps,
    ) -> impl Stream<Item = ExecutorEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let checkpointer = self.checkpointer.clone();
        let error_tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = run(checkpointer, input, config, deps, tx).await {
                let _ = error_tx
                    .send(ExecutorEvent::Error {
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                    })
                    .await;
            }
        });
        ReceiverStream::new(rx)
    }

    /// Loads a thread's current state and, if it's paused, which node and
    /// interrupt it's paused on.
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<ThreadSnapshot>> {
        let config = CheckpointConfig::new().with_thread_id(thread_id.to_string());
        let Some(tuple) = self.checkpointer.get_tuple(&config).await? else {
            return Ok(None);
        };
        let state = GraphState::from_channel_values(tuple.checkpoint.channel_values)?;
        let pending_node = tuple
            .metadata
            .extra
            .get("pending_node")
            .and_then(Value::as_str)
            .map(str::to_string);
        let pending_interrupt = tuple
            .metadata
            .extra
            .get("pending_interrupt")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?;
        Ok(Some(ThreadSnapshot {
            state,
            pending_node,
            pending_interrupt,
        }))
    }

    /// Applies an out-of-band edit to a thread's state (spec §4.1
    /// `update_state`), writing a new checkpoint with `source: Update` and
    /// clearing any pending interrupt — the caller is expected to redrive
    /// `stream()` with fresh input afterward rather than resume.
    pub async fn update_state(
        &self,
        thread_id: &str,
        patch: impl FnOnce(&mut GraphState),
    ) -> Result<()> {
        let config = CheckpointConfig::new().with_thread_id(thread_id.to_string());
        let mut state = match self.checkpointer.get_tuple(&config).await? {
            Some(tuple) => GraphState::from_channel_values(tuple.checkpoint.channel_values)?,
            None => return Err(ExecutorError::ThreadNotFound(thread_id.to_string())),
        };
        patch(&mut state);
        write_checkpoint(
            &self.checkpointer,
            thread_id,
            &state,
            0,
            CheckpointSource::Update,
            None,
            None,
        )
        .await?;
        Ok(())
    }
}

async fn run(
    checkpointer: Arc<dyn CheckpointSaver>,
    input: StreamInput,
    config: GraphConfig,
    deps: NodeDeps,
    tx: mpsc::Sender<ExecutorEvent>,
) -> Result<()> {
    let thread_config = CheckpointConfig::new().with_thread_id(config.thread_id.clone());
    let existing = checkpointer.get_tuple(&thread_config).await?;

    let (mut state, mut current, mut decision) = match (input, existing) {
        (StreamInput::Fresh(messages), Some(tuple)) => {
            let mut state = GraphState::from_channel_values(tuple.checkpoint.channel_values)?;
            state.messages.extend(messages);
            state.flags = config.flags;
            state.goto = None;
            (state, "background_investigator".to_string(), None)
        }
        (StreamInput::Fresh(messages), None) => {
            let mut state = GraphState::new(messages);
            state.flags = config.flags;
            (state, "background_investigator".to_string(), None)
        }
        (StreamInput::Resume(decision), Some(tuple)) => {
            let pending_node = tuple
                .metadata
                .extra
                .get("pending_node")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ExecutorError::InvalidResume(format!(
                        "thread '{}' has no pending interrupt",
                        config.thread_id
                    ))
                })?
                .to_string();
            let pending_interrupt: InterruptRequest = tuple
                .metadata
                .extra
                .get("pending_interrupt")
                .cloned()
                .map(serde_json::from_value)
                .transpose()?
                .ok_or_else(|| {
                    ExecutorError::InvalidResume("pending interrupt payload missing".to_string())
                })?;
            human_feedback::validate_decision(&pending_interrupt, &decision)?;
            let state = GraphState::from_channel_values(tuple.checkpoint.channel_values)?;
            (state, pending_node, Some(decision))
        }
        (StreamInput::Resume(_), None) => {
            return Err(ExecutorError::ThreadNotFound(config.thread_id.clone()));
        }
    };

    let mut remaining = config.recursion_limit();
    let mut step: i32 = 0;

    loop {
        if current == "__end__" {
            write_checkpoint(
                &checkpointer,
                &config.thread_id,
                &state,
                step,
                CheckpointSource::Loop,
                None,
                None,
            )
            .await?;
            crate::nodes::emit(
                &tx,
                ExecutorEvent::Finish {
                    reason: FinishReason::Stop,
                    metadata: None,
                },
            )
            .await;
            return Ok(());
        }

        if remaining == 0 {
            return Err(ExecutorError::RecursionExhausted {
                limit: config.recursion_limit(),
            });
        }
        remaining -= 1;
        step += 1;

        match current.as_str() {
            "background_investigator" => {
                background_investigator::run(&mut state, &deps, &tx).await?;
                write_checkpoint(
                    &checkpointer,
                    &config.thread_id,
                    &state,
                    step,
                    CheckpointSource::Loop,
                    None,
                    None,
                )
                .await?;
                current = "base".to_string();
            }
            "base" => match base::run(&mut state, &config, &deps, &tx, decision.take()).await? {
                base::BaseOutcome::ToolLoop => {
                    write_checkpoint(
                        &checkpointer,
                        &config.thread_id,
                        &state,
                        step,
                        CheckpointSource::Loop,
                        None,
                        None,
                    )
                    .await?;
                    current = "base".to_string();
                }
                base::BaseOutcome::ToolInterrupt(request) => {
                    write_checkpoint(
                        &checkpointer,
                        &config.thread_id,
                        &state,
                        step,
                        CheckpointSource::Loop,
                        Some("base"),
                        Some(&request),
                    )
                    .await?;
                    crate::nodes::emit(
                        &tx,
                        ExecutorEvent::Interrupt {
                            id: Uuid::new_v4().to_string(),
                            value: request,
                        },
                    )
                    .await;
                    return Ok(());
                }
                base::BaseOutcome::Done => {
                    write_checkpoint(
                        &checkpointer,
                        &config.thread_id,
                        &state,
                        step,
                        CheckpointSource::Loop,
                        None,
                        None,
                    )
                    .await?;
                    current = "human_feedback".to_string();
                }
            },
            "human_feedback" => {
                let decision = decision.take();
                match human_feedback::run(&mut state, &config, decision)? {
                    human_feedback::HumanFeedbackOutcome::Interrupted(request) => {
                        write_checkpoint(
                            &checkpointer,
                            &config.thread_id,
                            &state,
                            step,
                            CheckpointSource::Loop,
                            Some("human_feedback"),
                            Some(&request),
                        )
                        .await?;
                        crate::nodes::emit(
                            &tx,
                            ExecutorEvent::Interrupt {
                                id: Uuid::new_v4().to_string(),
                                value: request,
                            },
                        )
                        .await;
                        return Ok(());
                    }
                    human_feedback::HumanFeedbackOutcome::Goto(next) => {
                        write_checkpoint(
                            &checkpointer,
                            &config.thread_id,
                            &state,
                            step,
                            CheckpointSource::Loop,
                            None,
                            None,
                        )
                        .await?;
                        current = next.to_string();
                    }
                }
            }
            other => {
                return Err(ExecutorError::InvalidResume(format!(
                    "unknown node '{other}'"
                )))
            }
        }
    }
}

async fn write_checkpoint(
    checkpointer: &Arc<dyn CheckpointSaver>,
    thread_id: &str,
    state: &GraphState,
    step: i32,
    source: CheckpointSource,
    pending_node: Option<&str>,
    pending_interrupt: Option<&InterruptRequest>,
) -> Result<()> {
    let channel_values = state.to_channel_values()?;
    let versions: HashMap<String, ChannelVersion> = channel_values
        .keys()
        .map(|k| (k.clone(), ChannelVersion::Int(1)))
        .collect();
    let checkpoint = Checkpoint::new(
        Uuid::new_v4().to_string(),
        channel_values,
        versions.clone(),
        HashMap::new(),
    );

    let mut metadata = CheckpointMetadata::new()
        .with_source(source)
        .with_step(step);
    if let Some(node) = pending_node {
        metadata = metadata.with_extra("pending_node".to_string(), Value::String(node.to_string()));
    }
    if let Some(request) = pending_interrupt {
        metadata = metadata.with_extra("pending_interrupt".to_string(), serde_json::to_value(request)?);
    }

    let config = CheckpointConfig::new().with_thread_id(thread_id.to_string());
    checkpointer.put(&config, checkpoint, metadata, versions).await?;
    Ok(())
}

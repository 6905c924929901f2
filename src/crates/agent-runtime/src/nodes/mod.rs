//! The three fixed graph nodes (spec §4.1 "Graph shape"):
//! `background_investigator -> base -> human_feedback -> {base|END}`.

pub mod background_investigator;
pub mod base;
pub mod human_feedback;

use std::sync::Arc;

use langgraph_core::llm::ChatModel;
use mcp_client::McpClient;
use tokio::sync::{mpsc, Mutex};

use crate::event::ExecutorEvent;

/// Shared dependencies every node may need. Held behind `Arc`/`Mutex` so a
/// single `GraphExecutor` can drive many concurrent threads' node tasks
/// without cloning the underlying client/model.
#[derive(Clone)]
pub struct NodeDeps {
    pub model: Arc<dyn ChatModel>,
    /// `None` when the request carries no `mcp_settings` and no sandbox tools
    /// are available; nodes must treat a missing client as "no tools", not
    /// as an error.
    pub mcp: Option<Arc<Mutex<McpClient>>>,
}

pub(crate) type EventSink = mpsc::Sender<ExecutorEvent>;

pub(crate) async fn emit(tx: &EventSink, event: ExecutorEvent) {
    // The receiving end is dropped only when the caller stops polling the
    // stream (e.g. client disconnect); a send failure there is not an
    // executor error, just nothing left to tell.
    let _ = tx.send(event).await;
}

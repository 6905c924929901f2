//! The fixed chat graph: `background_investigator -> base -> human_feedback
//! -> {base|END}` (spec §3, §4.1). This crate owns `GraphState`, the
//! checkpoint-backed `GraphExecutor`, tool-call chunk reassembly, and the
//! human-in-the-loop interrupt/resume protocol. It does not know about HTTP
//! or SSE — that's `stream-adapter`'s job.

pub mod chunk;
pub mod config;
pub mod error;
pub mod event;
pub mod graph;
pub mod hitl;
pub mod nodes;
pub mod state;

pub use config::{GraphConfig, McpSettings, WorkflowFlags};
pub use error::{ExecutorError, Result};
pub use event::{ExecutorEvent, FinishReason, ToolCallChunkDelta};
pub use graph::{GraphExecutor, StreamInput, ThreadSnapshot};
pub use hitl::{ActionRequest, AllowedDecision, Decision, InterruptKind, InterruptRequest};
pub use nodes::NodeDeps;
pub use state::{ExtKey, GraphState};

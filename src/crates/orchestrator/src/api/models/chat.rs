//! `/chat/stream` request body (spec §6).

use agent_runtime::config::{McpSettings, WorkflowFlags};
use agent_runtime::hitl::Decision;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatStreamRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub thread_id: Option<String>,
    #[serde(default)]
    pub resources: Vec<Value>,
    #[serde(default = "default_max_plan_iterations")]
    pub max_plan_iterations: u32,
    #[serde(default = "default_max_step_num")]
    pub max_step_num: u32,
    #[serde(default)]
    pub auto_accepted_plan: bool,
    /// Present only when resuming a paused thread in response to an
    /// `interrupt` event (spec §4.1 human-in-the-loop).
    pub interrupt_feedback: Option<InterruptFeedback>,
    pub mcp_settings: Option<McpSettings>,
    #[serde(default)]
    pub enable_background_investigation: bool,
    #[serde(default)]
    pub enable_web_search: bool,
    #[serde(default)]
    pub enable_deep_thinking: bool,
    #[serde(default)]
    pub enable_clarification: bool,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub interrupt_before_tools: Vec<String>,
}

fn default_max_plan_iterations() -> u32 {
    1
}

fn default_max_step_num() -> u32 {
    3
}

fn default_locale() -> String {
    "en-US".to_string()
}

/// The caller's answer to a previously-raised interrupt, in wire form.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterruptFeedback {
    Approve,
    Edit {
        feedback: String,
        #[serde(default)]
        answers: Option<Value>,
    },
    Reject {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl From<InterruptFeedback> for Decision {
    fn from(feedback: InterruptFeedback) -> Self {
        match feedback {
            InterruptFeedback::Approve => Decision::Approve,
            InterruptFeedback::Edit { feedback, answers } => Decision::Edit { feedback, answers },
            InterruptFeedback::Reject { reason } => Decision::Reject { reason },
        }
    }
}

impl ChatStreamRequest {
    pub fn workflow_flags(&self) -> WorkflowFlags {
        WorkflowFlags {
            background_investigation: self.enable_background_investigation,
            web_search: self.enable_web_search,
            deep_thinking: self.enable_deep_thinking,
            clarification: self.enable_clarification,
        }
    }
}

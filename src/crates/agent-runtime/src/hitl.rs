//! Human-in-the-loop interrupt/resume protocol (spec §4.1 "Human-in-the-loop").
//!
//! `human_feedback` (and, for interrupt-before-tools, `base`) pause the graph
//! by returning an [`InterruptRequest`] instead of advancing. The caller
//! answers with a [`Decision`] on the next `GraphExecutor::stream` call,
//! which must target the same thread and land on the same node that raised
//! the interrupt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool invocation awaiting approval, carried on an [`InterruptRequest`]
/// raised for the `tool_authorization` kind (spec §4.1 "Interrupt-before-tools").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub tool_name: String,
    pub args: Value,
}

/// What kind of pause this is, so the caller's UI knows which affordances to
/// offer without inspecting `questions`/`action_request` itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterruptKind {
    /// `human_feedback`: review and either accept or send back for revision.
    PlanReview,
    /// `base`: a tool call matched `interrupt_before_tools` or its own
    /// `confirmation_policy`.
    ToolAuthorization,
}

/// The decisions a caller may legally answer a given interrupt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowedDecision {
    Approve,
    Edit,
    Reject,
}

/// Emitted as the payload of an `interrupt` event (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterruptRequest {
    pub kind: InterruptKind,
    /// Clarifying questions to surface to the user, if any (spec §3
    /// `clarification` flag); empty for a plain plan review.
    pub questions: Vec<String>,
    pub allowed_decisions: Vec<AllowedDecision>,
    pub action_request: Option<ActionRequest>,
    /// Opaque passthrough for UI rendering hints; never interpreted by the
    /// executor.
    pub review_config: Option<Value>,
}

impl InterruptRequest {
    pub fn plan_review() -> Self {
        Self {
            kind: InterruptKind::PlanReview,
            questions: Vec::new(),
            allowed_decisions: vec![
                AllowedDecision::Approve,
                AllowedDecision::Edit,
                AllowedDecision::Reject,
            ],
            action_request: None,
            review_config: None,
        }
    }

    pub fn tool_authorization(tool_name: impl Into<String>, args: Value) -> Self {
        Self {
            kind: InterruptKind::ToolAuthorization,
            questions: Vec::new(),
            allowed_decisions: vec![AllowedDecision::Approve, AllowedDecision::Reject],
            action_request: Some(ActionRequest {
                tool_name: tool_name.into(),
                args,
            }),
            review_config: None,
        }
    }

    pub fn with_questions(mut self, questions: Vec<String>) -> Self {
        self.questions = questions;
        self
    }

    pub fn allows(&self, decision: &Decision) -> bool {
        let kind = match decision {
            Decision::Approve => AllowedDecision::Approve,
            Decision::Edit { .. } => AllowedDecision::Edit,
            Decision::Reject { .. } => AllowedDecision::Reject,
        };
        self.allowed_decisions.contains(&kind)
    }
}

/// The caller's answer to a pending [`InterruptRequest`] (spec §4.1
/// "Valid decisions").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Proceed as-is. Routes to `END` from `human_feedback`, or to tool
    /// execution from `base`.
    Approve,
    /// Send back for revision. Routes to `base` with `feedback` folded into
    /// the conversation as a new human message; `answers` carries responses
    /// to `questions` verbatim for the node to incorporate.
    Edit {
        feedback: String,
        #[serde(default)]
        answers: Option<Value>,
    },
    /// Discard and stop. Routes to `END` from `human_feedback`; from
    /// `base`'s tool-authorization pause it instead substitutes a synthetic
    /// error `ToolResult` carrying `reason` and the node continues without
    /// ever invoking the tool (spec §4.1 "Interrupt-before-tools").
    Reject {
        #[serde(default)]
        reason: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_review_allows_all_three_decisions() {
        let req = InterruptRequest::plan_review();
        assert!(req.allows(&Decision::Approve));
        assert!(req.allows(&Decision::Edit {
            feedback: "add a step".into(),
            answers: None
        }));
        assert!(req.allows(&Decision::Reject { reason: None }));
    }

    #[test]
    fn tool_authorization_disallows_edit() {
        let req = InterruptRequest::tool_authorization("delete_file", serde_json::json!({}));
        assert!(!req.allows(&Decision::Edit {
            feedback: "no".into(),
            answers: None
        }));
        assert!(req.allows(&Decision::Approve));
    }
}

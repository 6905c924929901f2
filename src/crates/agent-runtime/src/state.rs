//! `GraphState` (spec §3, §9 "Dynamic state dict → tagged variant").
//!
//! The source keeps an untyped dict with a mix of stable fields (`messages`,
//! `resources`) and ad-hoc keys accumulated by nodes (`goto`, feedback
//! strings, plan iteration counters). Here the stable fields are real struct
//! fields; everything else lives in a bounded extension map keyed by
//! [`ExtKey`], a closed enum. `to_channel_values`/`from_channel_values` are
//! the checkpoint boundary: an unknown key in stored JSON is rejected rather
//! than silently carried forward, so the schema can't drift one checkpoint
//! at a time.

use std::collections::HashMap;

use langgraph_core::messages::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::WorkflowFlags;
use crate::error::{ExecutorError, Result};

/// Known extension keys carried on `GraphState` beyond its stable fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtKey {
    /// The `interrupt_feedback` string from the most recent resume (spec
    /// Open Question 2: folded into the last user message, not stored
    /// verbatim for replay).
    InterruptFeedback,
    /// Summary text produced by `background_investigator`, read by `base`.
    BackgroundInvestigationResults,
    /// How many planning iterations `base` has run, bounded by
    /// `max_plan_iterations`.
    PlanIterations,
    /// Tool calls awaiting dispatch while `base` is paused on a
    /// `tool_authorization` interrupt (spec §4.1 "Interrupt-before-tools").
    /// Cleared once the paused call resolves.
    PendingToolCalls,
    /// Index into `PendingToolCalls` of the call awaiting approval.
    PendingToolIndex,
}

impl ExtKey {
    fn as_str(&self) -> &'static str {
        match self {
            ExtKey::InterruptFeedback => "interrupt_feedback",
            ExtKey::BackgroundInvestigationResults => "background_investigation_results",
            ExtKey::PlanIterations => "plan_iterations",
            ExtKey::PendingToolCalls => "pending_tool_calls",
            ExtKey::PendingToolIndex => "pending_tool_index",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "interrupt_feedback" => Some(ExtKey::InterruptFeedback),
            "background_investigation_results" => Some(ExtKey::BackgroundInvestigationResults),
            "plan_iterations" => Some(ExtKey::PlanIterations),
            "pending_tool_calls" => Some(ExtKey::PendingToolCalls),
            "pending_tool_index" => Some(ExtKey::PendingToolIndex),
            _ => None,
        }
    }
}

/// The running state of a thread's agent graph (spec §3 `GraphState`).
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    pub messages: Vec<Message>,
    pub resources: Vec<Value>,
    pub flags: WorkflowFlags,
    /// Next node name, set by a node's `NodeResult`/interrupt decision.
    pub goto: Option<String>,
    extensions: HashMap<ExtKey, Value>,
}

impl GraphState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            resources: Vec::new(),
            flags: WorkflowFlags::default(),
            goto: None,
            extensions: HashMap::new(),
        }
    }

    pub fn get_ext(&self, key: ExtKey) -> Option<&Value> {
        self.extensions.get(&key)
    }

    pub fn set_ext(&mut self, key: ExtKey, value: Value) {
        self.extensions.insert(key, value);
    }

    pub fn clear_ext(&mut self, key: ExtKey) {
        self.extensions.remove(&key);
    }

    pub fn plan_iterations(&self) -> u32 {
        self.get_ext(ExtKey::PlanIterations)
            .and_then(Value::as_u64)
            .unwrap_or(0) as u32
    }

    pub fn increment_plan_iterations(&mut self) {
        let next = self.plan_iterations() + 1;
        self.set_ext(ExtKey::PlanIterations, Value::from(next));
    }

    /// Serializes to the channel-value map the checkpoint store persists
    /// (spec §3 Checkpoint: "channel+version-keyed payloads").
    pub fn to_channel_values(&self) -> Result<HashMap<String, Value>> {
        let mut out = HashMap::new();
        out.insert("messages".to_string(), serde_json::to_value(&self.messages)?);
        out.insert("resources".to_string(), serde_json::to_value(&self.resources)?);
        out.insert("flags".to_string(), serde_json::to_value(self.flags)?);
        out.insert("goto".to_string(), serde_json::to_value(&self.goto)?);
        for (key, value) in &self.extensions {
            out.insert(key.as_str().to_string(), value.clone());
        }
        Ok(out)
    }

    /// Reconstructs state from channel values, rejecting any key that isn't
    /// a stable field or a known `ExtKey`.
    pub fn from_channel_values(mut values: HashMap<String, Value>) -> Result<Self> {
        let messages = values
            .remove("messages")
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();
        let resources = values
            .remove("resources")
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();
        let flags = values
            .remove("flags")
            .map(serde_json::from_value)
            .transpose()?
            .unwrap_or_default();
        let goto = values
            .remove("goto")
            .map(serde_json::from_value)
            .transpose()?
            .flatten();

        let mut extensions = HashMap::new();
        for (key, value) in values {
            let ext_key = ExtKey::from_str(&key).ok_or_else(|| {
                ExecutorError::InvalidResume(format!("unknown checkpoint channel '{key}'"))
            })?;
            extensions.insert(ext_key, value);
        }

        Ok(Self {
            messages,
            resources,
            flags,
            goto,
            extensions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_channel_values() {
        let mut state = GraphState::new(vec![Message::human("hi")]);
        state.set_ext(ExtKey::PlanIterations, Value::from(2));
        state.goto = Some("base".to_string());

        let values = state.to_channel_values().unwrap();
        let restored = GraphState::from_channel_values(values).unwrap();

        assert_eq!(restored.messages.len(), 1);
        assert_eq!(restored.goto.as_deref(), Some("base"));
        assert_eq!(restored.plan_iterations(), 2);
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let mut values = HashMap::new();
        values.insert("messages".to_string(), serde_json::json!([]));
        values.insert("mystery_field".to_string(), serde_json::json!(true));
        let err = GraphState::from_channel_values(values).unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidResume(_)));
    }
}

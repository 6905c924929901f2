//! Per-stream configuration for a `GraphExecutor::stream` call (spec §4.1, §6).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default `recursion_limit` when the caller doesn't specify one.
pub const DEFAULT_RECURSION_LIMIT: u32 = 25;
/// Hard ceiling on `recursion_limit`, regardless of what the caller requests.
pub const MAX_RECURSION_LIMIT: u32 = 100;

/// MCP settings accepted on `/chat/stream`, passed through to the node's
/// `McpClient` bootstrap (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct McpSettings {
    pub servers: Vec<CustomMcpServerSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMcpServerSettings {
    pub name: String,
    pub config: mcp_client::CustomMcpConfig,
}

/// Workflow flags carried on `GraphState` (spec §3) and set from the request
/// body. `clarification` gates whether `base` may ask clarifying questions
/// before planning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct WorkflowFlags {
    pub background_investigation: bool,
    pub web_search: bool,
    pub deep_thinking: bool,
    pub clarification: bool,
}

/// Configuration for a single `stream()` call.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub thread_id: String,
    pub resources: Vec<Value>,
    pub max_plan_iterations: u32,
    pub max_step_num: u32,
    pub auto_accepted_plan: bool,
    pub flags: WorkflowFlags,
    pub locale: String,
    /// Tool names that must pause for HITL approval before invocation,
    /// in addition to each tool's own `confirmation_policy` (spec §4.1).
    pub interrupt_before_tools: Vec<String>,
    pub mcp_settings: Option<McpSettings>,
    recursion_limit: u32,
    pub extra: HashMap<String, Value>,
}

impl GraphConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            resources: Vec::new(),
            max_plan_iterations: 1,
            max_step_num: 3,
            auto_accepted_plan: false,
            flags: WorkflowFlags::default(),
            locale: "en-US".to_string(),
            interrupt_before_tools: Vec::new(),
            mcp_settings: None,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            extra: HashMap::new(),
        }
    }

    /// Sets the recursion limit, clamped to `MAX_RECURSION_LIMIT` (spec §4.1).
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit.min(MAX_RECURSION_LIMIT);
        self
    }

    pub fn recursion_limit(&self) -> u32 {
        self.recursion_limit
    }

    pub fn with_resources(mut self, resources: Vec<Value>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_flags(mut self, flags: WorkflowFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_auto_accepted_plan(mut self, auto: bool) -> Self {
        self.auto_accepted_plan = auto;
        self
    }

    pub fn with_interrupt_before_tools(mut self, tools: Vec<String>) -> Self {
        self.interrupt_before_tools = tools;
        self
    }

    pub fn with_mcp_settings(mut self, settings: McpSettings) -> Self {
        self.mcp_settings = Some(settings);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recursion_limit_clamps_to_max() {
        let cfg = GraphConfig::new("t1").with_recursion_limit(500);
        assert_eq!(cfg.recursion_limit(), MAX_RECURSION_LIMIT);
    }

    #[test]
    fn default_recursion_limit_is_25() {
        let cfg = GraphConfig::new("t1");
        assert_eq!(cfg.recursion_limit(), DEFAULT_RECURSION_LIMIT);
    }
}

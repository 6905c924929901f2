//! MCP Tool Descriptor and confirmation-policy routing (spec §3, §4.4).

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a tool call must be authorized before it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationPolicy {
    /// Run without interruption.
    Auto,
    /// Require HITL approval, surfacing the proposed edit.
    Edit,
    /// Require HITL approval, surfacing the shell command.
    Bash,
    /// Require HITL approval, surfacing the MCP tool call itself.
    Mcp,
}

impl ConfirmationPolicy {
    pub fn requires_interrupt(&self) -> bool {
        !matches!(self, ConfirmationPolicy::Auto)
    }
}

/// `(name, description, input_schema_json, read_only_flag, confirmation_policy)`.
/// Registered per-sandbox; names unique within a sandbox (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub read_only: bool,
    pub confirmation_policy: ConfirmationPolicy,
}

/// Decides whether a call to `tool_name` must route through HITL, per the
/// tool's own policy plus the session's `interrupt_before_tools` config
/// (spec §4.4: "For non-auto policies and when the session's config
/// includes the name").
pub fn requires_confirmation(tool: &ToolDescriptor, interrupt_before_tools: &[String]) -> bool {
    tool.confirmation_policy.requires_interrupt()
        || interrupt_before_tools.iter().any(|n| n == &tool.name)
}

/// A tool registry tree: the sandbox's own tools plus any nested custom-MCP
/// servers proxied behind it (spec §9 "Nested MCP proxy"). Tool names must
/// be unique across the merged tree or qualified by a server prefix.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
    children: Vec<(String, ToolRegistry)>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tools(&mut self, tools: Vec<ToolDescriptor>) {
        self.tools = tools;
    }

    /// Merges a nested registry under a server prefix, qualifying any name
    /// that collides with an already-registered name.
    pub fn merge_child(&mut self, server_prefix: &str, child: ToolRegistry) {
        self.children.push((server_prefix.to_string(), child));
    }

    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        if let Some(t) = self.tools.iter().find(|t| t.name == name) {
            return Some(t);
        }
        for (prefix, child) in &self.children {
            let qualified = format!("{prefix}.");
            if let Some(rest) = name.strip_prefix(&qualified) {
                if let Some(t) = child.find(rest) {
                    return Some(t);
                }
            }
        }
        None
    }

    /// Flattened view used by `list_tools`; names from nested children are
    /// prefixed with `<server>.` when they collide with an existing name.
    pub fn flatten(&self) -> Vec<ToolDescriptor> {
        let mut seen: std::collections::HashSet<String> =
            self.tools.iter().map(|t| t.name.clone()).collect();
        let mut out = self.tools.clone();

        for (prefix, child) in &self.children {
            for mut t in child.flatten() {
                if seen.contains(&t.name) {
                    t.name = format!("{prefix}.{}", t.name);
                }
                seen.insert(t.name.clone());
                out.push(t);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str, policy: ConfirmationPolicy) -> ToolDescriptor {
        ToolDescriptor {
            name: name.to_string(),
            description: String::new(),
            input_schema: serde_json::json!({"type": "object"}),
            read_only: false,
            confirmation_policy: policy,
        }
    }

    #[test]
    fn auto_policy_skips_confirmation_unless_configured() {
        let t = tool("echo", ConfirmationPolicy::Auto);
        assert!(!requires_confirmation(&t, &[]));
        assert!(requires_confirmation(&t, &["echo".to_string()]));
    }

    #[test]
    fn non_auto_policy_always_confirms() {
        let t = tool("apply_patch", ConfirmationPolicy::Edit);
        assert!(requires_confirmation(&t, &[]));
    }

    #[test]
    fn duplicate_names_qualified_by_server_prefix() {
        let mut root = ToolRegistry::new();
        root.set_tools(vec![tool("search", ConfirmationPolicy::Auto)]);
        let mut child = ToolRegistry::new();
        child.set_tools(vec![tool("search", ConfirmationPolicy::Auto)]);
        root.merge_child("custom", child);

        let flat = root.flatten();
        let names: Vec<&str> = flat.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"search"));
        assert!(names.contains(&"custom.search"));
    }
}

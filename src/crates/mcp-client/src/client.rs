//! MCP client: connects to a sandbox's MCP endpoint, registers credentials
//! and the tool server URL, lists tools, and invokes them.
//!
//! Ported from `MCPClient` (`tool_server/mcp/client.py`): the sequencing in
//! [`McpClient::bootstrap`] — `/credential` then `/tool-server-url` before
//! any `list_tools`/`call_tool` — is the critical invariant of spec §4.4.
//! Skipping it silently yields zero tools in the source; here it is a hard
//! error (`McpError::NotRegistered`).

use std::time::Duration;

use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{McpError, Result};
use crate::registry::{ToolDescriptor, ToolRegistry};

/// 30 minutes, per spec §4.4 step 5 and §5 timeouts.
pub const DEFAULT_TOOL_CALL_TIMEOUT: Duration = Duration::from_secs(1800);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct Credential {
    pub user_api_key: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomMcpConfig {
    pub transport: CustomMcpTransport,
    pub command: Option<String>,
    pub args: Option<Vec<String>>,
    pub env: Option<std::collections::HashMap<String, String>>,
    pub headers: Option<std::collections::HashMap<String, String>>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CustomMcpTransport {
    Stdio,
    Http,
}

#[derive(Debug, Clone)]
pub enum ToolResult {
    Text(String),
    Structured(Value),
}

#[derive(Default)]
struct RegistrationState {
    credential_set: bool,
    tool_server_url_set: bool,
}

pub struct McpClient {
    http: reqwest::Client,
    server_url: String,
    mcp_url: String,
    timeout: Duration,
    registration: RegistrationState,
    registry: ToolRegistry,
}

impl McpClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_timeout(server_url, DEFAULT_TOOL_CALL_TIMEOUT)
    }

    pub fn with_timeout(server_url: impl Into<String>, timeout: Duration) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        let mcp_url = format!("{server_url}/mcp");
        info!(server_url, "initializing MCP client");
        Self {
            http: reqwest::Client::new(),
            server_url,
            mcp_url,
            timeout,
            registration: RegistrationState::default(),
            registry: ToolRegistry::new(),
        }
    }

    pub fn mcp_url(&self) -> &str {
        &self.mcp_url
    }

    pub async fn health_check(&self) -> bool {
        match self
            .http
            .get(format!("{}/health", self.server_url))
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(error = %e, "MCP health check failed");
                false
            }
        }
    }

    /// Step 2 of spec §4.4: authorizes downstream outbound tool traffic.
    pub async fn set_credential(&mut self, credential: &Credential) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/credential", self.server_url))
            .json(credential)
            .send()
            .await?;
        Self::check_ok(resp, "set credential").await?;
        self.registration.credential_set = true;
        info!("credential set successfully");
        Ok(())
    }

    /// Step 3 of spec §4.4: triggers tool registration inside the sandbox.
    /// Must follow `set_credential`.
    pub async fn set_tool_server_url(&mut self, tool_server_url: &str) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/tool-server-url", self.server_url))
            .json(&serde_json::json!({ "tool_server_url": tool_server_url }))
            .send()
            .await?;
        Self::check_ok(resp, "set tool server url").await?;
        self.registration.tool_server_url_set = true;
        info!(tool_server_url, "tool server url set");
        Ok(())
    }

    pub async fn register_custom_mcp(&self, config: &CustomMcpConfig) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/custom-mcp", self.server_url))
            .json(config)
            .send()
            .await?;
        Self::check_ok(resp, "register custom mcp").await?;
        Ok(())
    }

    pub async fn register_codex(&self) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/register-codex", self.server_url))
            .send()
            .await?;
        Self::check_ok(resp, "register codex").await?;
        Ok(())
    }

    /// Convenience wrapper running steps 2 and 3 in order.
    pub async fn bootstrap(&mut self, credential: &Credential, tool_server_url: &str) -> Result<()> {
        self.set_credential(credential).await?;
        self.set_tool_server_url(tool_server_url).await?;
        Ok(())
    }

    fn require_registered(&self) -> Result<()> {
        if !self.registration.credential_set {
            return Err(McpError::NotRegistered(
                "set_credential must be called before listing or calling tools",
            ));
        }
        if !self.registration.tool_server_url_set {
            return Err(McpError::NotRegistered(
                "set_tool_server_url must be called before listing or calling tools",
            ));
        }
        Ok(())
    }

    /// Lists tools, validating each `input_schema` as a JSON Schema
    /// draft-7 object type (spec §4.4 step 4).
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        self.require_registered()?;

        let resp = self
            .http
            .get(format!("{}/mcp/tools", self.mcp_url))
            .send()
            .await?;
        let resp = Self::check_ok(resp, "list tools").await?;
        let tools: Vec<ToolDescriptor> = resp.json().await?;

        for tool in &tools {
            if let Err(e) = JSONSchema::compile(&tool.input_schema) {
                warn!(tool = %tool.name, error = %e, "tool input schema failed draft-7 validation");
            }
        }

        self.registry.set_tools(tools.clone());
        Ok(tools)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.registry.flatten().into_iter().map(|t| t.name).collect()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Validates `args` against the tool's schema, then calls it.
    pub async fn call_tool(&self, name: &str, args: Value) -> Result<ToolResult> {
        self.require_registered()?;

        let tool = self
            .registry
            .find(name)
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))?;

        let compiled = JSONSchema::compile(&tool.input_schema)
            .map_err(|e| McpError::SchemaInvalid(e.to_string()))?;
        if let Err(errors) = compiled.validate(&args) {
            let msg = errors.map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            return Err(McpError::SchemaInvalid(msg));
        }

        let resp = self
            .http
            .post(format!("{}/mcp/call", self.mcp_url))
            .timeout(self.timeout)
            .json(&serde_json::json!({ "name": name, "arguments": args }))
            .send()
            .await?;
        let resp = Self::check_ok(resp, "call tool").await?;
        let value: Value = resp.json().await?;

        match value.get("content") {
            Some(Value::Array(items)) => Ok(ToolResult::Text(
                items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect::<Vec<_>>()
                    .join("\n"),
            )),
            Some(other) => Ok(ToolResult::Structured(other.clone())),
            None => Ok(ToolResult::Structured(value)),
        }
    }

    async fn check_ok(resp: reqwest::Response, action: &str) -> Result<reqwest::Response> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!(action, status, %body, "MCP sideband call failed");
            Err(McpError::EndpointError { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_tools_before_registration_is_rejected() {
        let mut client = McpClient::new("http://localhost:6060");
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, McpError::NotRegistered(_)));
    }

    #[tokio::test]
    async fn calling_tools_before_registration_is_rejected() {
        let client = McpClient::new("http://localhost:6060");
        let err = client
            .call_tool("echo", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::NotRegistered(_)));
    }
}

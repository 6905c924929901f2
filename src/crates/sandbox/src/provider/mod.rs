//! The pluggable compute-sandbox provider interface (spec §4.3). This is a
//! consumed, not implemented, boundary: a concrete adapter (e.g. an E2B- or
//! Firecracker-backed implementation) lives outside the core and is
//! injected into the controller. Calls may block the underlying provider
//! SDK; implementations must offload blocking work (e.g. via
//! `tokio::task::spawn_blocking`) so they never block the async runtime.

use async_trait::async_trait;

use crate::error::Result;

pub mod http;
pub use http::HttpSandboxProvider;

#[derive(Debug, Clone)]
pub struct ProviderSandboxHandle {
    pub provider_sandbox_id: String,
    pub mcp_url: String,
    pub vscode_url: String,
}

#[async_trait]
pub trait SandboxProvider: Send + Sync {
    async fn create(&self, user_id: &str, template_id: &str) -> Result<ProviderSandboxHandle>;
    async fn connect(&self, provider_sandbox_id: &str) -> Result<ProviderSandboxHandle>;
    async fn pause(&self, provider_sandbox_id: &str) -> Result<()>;
    async fn resume(&self, provider_sandbox_id: &str) -> Result<ProviderSandboxHandle>;
    async fn delete(&self, provider_sandbox_id: &str) -> Result<()>;
    async fn expose_port(&self, provider_sandbox_id: &str, port: u16) -> Result<String>;
    async fn run_cmd(&self, provider_sandbox_id: &str, cmd: &str, background: bool) -> Result<String>;
    async fn read_file(&self, provider_sandbox_id: &str, path: &str) -> Result<String>;
    async fn write_file(&self, provider_sandbox_id: &str, path: &str, content: &str) -> Result<()>;
    async fn create_directory(&self, provider_sandbox_id: &str, path: &str) -> Result<()>;
    /// True once the provider reports `running` status for this instance.
    async fn is_running(&self, provider_sandbox_id: &str) -> Result<bool>;
}

//! Generic REST-backed [`SandboxProvider`].
//!
//! The actual compute backend (Daytona, E2B, Firecracker, ...) lives behind
//! whatever HTTP control plane the deployment points `base_url` at; this
//! adapter only assumes the operations in spec §4.3 map onto a conventional
//! REST surface. It exists so the orchestrator binary has a concrete
//! provider to construct a `SandboxController` with — swapping it for a
//! vendor SDK client is a deployment-time choice, not a core-library one.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::{Result, SandboxError};
use crate::provider::{ProviderSandboxHandle, SandboxProvider};

pub struct HttpSandboxProvider {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSandboxProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn map_status(resp: reqwest::Response) -> Result<reqwest::Response> {
        match resp.status() {
            s if s.is_success() => Ok(resp),
            reqwest::StatusCode::UNAUTHORIZED => {
                Err(SandboxError::Auth(resp.text().await.unwrap_or_default()))
            }
            reqwest::StatusCode::NOT_FOUND => {
                Err(SandboxError::NotFound(resp.text().await.unwrap_or_default()))
            }
            reqwest::StatusCode::REQUEST_TIMEOUT => {
                Err(SandboxError::Timeout(resp.text().await.unwrap_or_default()))
            }
            s => Err(SandboxError::Provider(format!(
                "provider returned {s}: {}",
                resp.text().await.unwrap_or_default()
            ))),
        }
    }
}

#[derive(Deserialize)]
struct CreateResp {
    provider_sandbox_id: String,
    mcp_url: String,
    vscode_url: String,
}

#[derive(Deserialize)]
struct StatusResp {
    running: bool,
}

#[derive(Deserialize)]
struct CmdResp {
    output: String,
}

#[derive(Deserialize)]
struct FileResp {
    content: String,
}

#[async_trait]
impl SandboxProvider for HttpSandboxProvider {
    async fn create(&self, user_id: &str, template_id: &str) -> Result<ProviderSandboxHandle> {
        let resp = self
            .http
            .post(self.url("/v1/sandboxes"))
            .json(&json!({ "user_id": user_id, "template_id": template_id }))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        let body: CreateResp = Self::map_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Ok(ProviderSandboxHandle {
            provider_sandbox_id: body.provider_sandbox_id,
            mcp_url: body.mcp_url,
            vscode_url: body.vscode_url,
        })
    }

    async fn connect(&self, provider_sandbox_id: &str) -> Result<ProviderSandboxHandle> {
        let resp = self
            .http
            .post(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/connect")))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        let body: CreateResp = Self::map_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Ok(ProviderSandboxHandle {
            provider_sandbox_id: body.provider_sandbox_id,
            mcp_url: body.mcp_url,
            vscode_url: body.vscode_url,
        })
    }

    async fn pause(&self, provider_sandbox_id: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/pause")))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Self::map_status(resp).await?;
        Ok(())
    }

    async fn resume(&self, provider_sandbox_id: &str) -> Result<ProviderSandboxHandle> {
        let resp = self
            .http
            .post(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/resume")))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        let body: CreateResp = Self::map_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Ok(ProviderSandboxHandle {
            provider_sandbox_id: body.provider_sandbox_id,
            mcp_url: body.mcp_url,
            vscode_url: body.vscode_url,
        })
    }

    async fn delete(&self, provider_sandbox_id: &str) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}")))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Self::map_status(resp).await?;
        Ok(())
    }

    async fn expose_port(&self, provider_sandbox_id: &str, port: u16) -> Result<String> {
        #[derive(Deserialize)]
        struct PortResp {
            public_url: String,
        }
        let resp = self
            .http
            .post(self.url(&format!(
                "/v1/sandboxes/{provider_sandbox_id}/expose-port"
            )))
            .json(&json!({ "port": port }))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        let body: PortResp = Self::map_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Ok(body.public_url)
    }

    async fn run_cmd(&self, provider_sandbox_id: &str, cmd: &str, background: bool) -> Result<String> {
        let resp = self
            .http
            .post(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/run-cmd")))
            .json(&json!({ "command": cmd, "background": background }))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        let body: CmdResp = Self::map_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Ok(body.output)
    }

    async fn read_file(&self, provider_sandbox_id: &str, path: &str) -> Result<String> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/file")))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        let body: FileResp = Self::map_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Ok(body.content)
    }

    async fn write_file(&self, provider_sandbox_id: &str, path: &str, content: &str) -> Result<()> {
        let resp = self
            .http
            .put(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/file")))
            .json(&json!({ "path": path, "content": content }))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Self::map_status(resp).await?;
        Ok(())
    }

    async fn create_directory(&self, provider_sandbox_id: &str, path: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/mkdir")))
            .json(&json!({ "path": path }))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Self::map_status(resp).await?;
        Ok(())
    }

    async fn is_running(&self, provider_sandbox_id: &str) -> Result<bool> {
        let resp = self
            .http
            .get(self.url(&format!("/v1/sandboxes/{provider_sandbox_id}/status")))
            .send()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let body: StatusResp = Self::map_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| SandboxError::Provider(e.to_string()))?;
        Ok(body.running)
    }
}

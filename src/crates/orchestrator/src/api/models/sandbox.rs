//! `/agent/sandboxes/*` request/response bodies (spec §6).

use sandbox::Sandbox;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateSandboxRequest {
    pub user_id: String,
    pub sandbox_template_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConnectSandboxRequest {
    pub sandbox_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RunCmdRequest {
    pub sandbox_id: String,
    pub command: String,
    #[serde(default)]
    pub background: bool,
}

#[derive(Debug, Serialize)]
pub struct RunCmdResponse {
    pub output: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteFileRequest {
    pub sandbox_id: String,
    pub file_path: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadFileRequest {
    pub sandbox_id: String,
    pub file_path: String,
}

#[derive(Debug, Serialize)]
pub struct ReadFileResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SandboxResponse {
    pub sandbox_id: String,
    pub provider_sandbox_id: Option<String>,
    pub mcp_url: Option<String>,
    pub vscode_url: Option<String>,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SandboxStatusResponse {
    pub sandbox_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct SandboxUrlsResponse {
    pub mcp_url: Option<String>,
    pub vscode_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleTimeoutRequest {
    pub sandbox_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ExposePortRequest {
    pub sandbox_id: String,
    pub port: u16,
}

#[derive(Debug, Serialize)]
pub struct ExposePortResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadFileRequest {
    pub sandbox_id: String,
    pub file_path: String,
    /// Base64-encoded file content.
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UploadFileFromUrlRequest {
    pub sandbox_id: String,
    pub file_path: String,
    pub source_url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadToPresignedUrlRequest {
    pub sandbox_id: String,
    pub file_path: String,
    pub presigned_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDirectoryRequest {
    pub sandbox_id: String,
    pub path: String,
}

impl From<Sandbox> for SandboxResponse {
    fn from(sandbox: Sandbox) -> Self {
        Self {
            sandbox_id: sandbox.sandbox_id,
            provider_sandbox_id: sandbox.provider_sandbox_id,
            mcp_url: sandbox.mcp_url,
            vscode_url: sandbox.vscode_url,
            status: serde_json::to_value(sandbox.status)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default(),
        }
    }
}

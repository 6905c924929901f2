//! `/agent/sandboxes/*` handlers (spec §6, §4.3).
//!
//! `sandbox_id` in request bodies always refers to the core's own id, not
//! the provider's; the controller resolves that internally.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiResult;
use crate::api::models::{
    ConnectSandboxRequest, CreateDirectoryRequest, CreateSandboxRequest,
    DownloadToPresignedUrlRequest, ExposePortRequest, ExposePortResponse, ReadFileRequest,
    ReadFileResponse, RunCmdRequest, RunCmdResponse, SandboxResponse, SandboxStatusResponse,
    SandboxUrlsResponse, ScheduleTimeoutRequest, UploadFileFromUrlRequest, UploadFileRequest,
    WriteFileRequest,
};
use crate::auth::AuthUser;
use crate::core::Core;

/// `POST /agent/sandboxes/create`. The spec's wire body carries `user_id`
/// explicitly rather than deriving it solely from the bearer token, but no
/// `session_id` — each user gets one reusable sandbox keyed by their own
/// id as the session key (see DESIGN.md for this Open Question decision).
pub async fn create(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<CreateSandboxRequest>,
) -> ApiResult<Json<SandboxResponse>> {
    let sandbox = core.sandboxes.get_or_create(&req.user_id, &req.user_id).await?;
    Ok(Json(sandbox.into()))
}

/// `POST /agent/sandboxes/connect`.
pub async fn connect(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<ConnectSandboxRequest>,
) -> ApiResult<Json<SandboxResponse>> {
    let sandbox = core.sandboxes.reconnect(&req.sandbox_id).await?;
    Ok(Json(sandbox.into()))
}

/// `POST /agent/sandboxes/run-cmd`.
pub async fn run_cmd(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<RunCmdRequest>,
) -> ApiResult<Json<RunCmdResponse>> {
    let output = core
        .sandboxes
        .run_cmd(&req.sandbox_id, &req.command, req.background)
        .await?;
    Ok(Json(RunCmdResponse { output }))
}

/// `POST /agent/sandboxes/write-file`.
pub async fn write_file(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<WriteFileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    core.sandboxes
        .write_file(&req.sandbox_id, &req.file_path, &req.content)
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// `POST /agent/sandboxes/read-file`.
pub async fn read_file(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<ReadFileRequest>,
) -> ApiResult<Json<ReadFileResponse>> {
    let content = core.sandboxes.read_file(&req.sandbox_id, &req.file_path).await?;
    Ok(Json(ReadFileResponse { content }))
}

/// `DELETE /agent/sandboxes/{id}`.
pub async fn delete(
    State(core): State<Core>,
    _auth: AuthUser,
    Path(sandbox_id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    core.sandboxes.delete(&sandbox_id).await?;
    Ok(Json(serde_json::json!({})))
}

/// `GET /agent/sandboxes/{id}/status`.
pub async fn status(
    State(core): State<Core>,
    _auth: AuthUser,
    Path(sandbox_id): Path<String>,
) -> ApiResult<Json<SandboxStatusResponse>> {
    let sandbox = core.sandboxes.get(&sandbox_id).await?;
    Ok(Json(SandboxStatusResponse {
        sandbox_id: sandbox.sandbox_id,
        status: serde_json::to_value(sandbox.status)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default(),
    }))
}

/// `GET /agent/sandboxes/{id}/info`.
pub async fn info(
    State(core): State<Core>,
    _auth: AuthUser,
    Path(sandbox_id): Path<String>,
) -> ApiResult<Json<SandboxResponse>> {
    let sandbox = core.sandboxes.get(&sandbox_id).await?;
    Ok(Json(sandbox.into()))
}

/// `GET /agent/sandboxes/{id}/urls`.
pub async fn urls(
    State(core): State<Core>,
    _auth: AuthUser,
    Path(sandbox_id): Path<String>,
) -> ApiResult<Json<SandboxUrlsResponse>> {
    let sandbox = core.sandboxes.get(&sandbox_id).await?;
    Ok(Json(SandboxUrlsResponse {
        mcp_url: sandbox.mcp_url,
        vscode_url: sandbox.vscode_url,
    }))
}

/// `POST /agent/sandboxes/schedule-timeout`.
pub async fn schedule_timeout(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<ScheduleTimeoutRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    core.sandboxes.schedule_timeout(&req.sandbox_id).await?;
    Ok(Json(serde_json::json!({})))
}

/// `POST /agent/sandboxes/{id}/pause`.
pub async fn pause(
    State(core): State<Core>,
    _auth: AuthUser,
    Path(sandbox_id): Path<String>,
) -> ApiResult<Json<SandboxResponse>> {
    let sandbox = core.sandboxes.pause(&sandbox_id).await?;
    Ok(Json(sandbox.into()))
}

/// `POST /agent/sandboxes/expose-port`.
pub async fn expose_port(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<ExposePortRequest>,
) -> ApiResult<Json<ExposePortResponse>> {
    let url = core.sandboxes.expose_port(&req.sandbox_id, req.port).await?;
    Ok(Json(ExposePortResponse { url }))
}

/// `POST /agent/sandboxes/upload-file`.
pub async fn upload_file(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<UploadFileRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    core.sandboxes
        .upload_file(&req.sandbox_id, &req.file_path, &req.content)
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// `POST /agent/sandboxes/upload-file-from-url`.
pub async fn upload_file_from_url(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<UploadFileFromUrlRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    core.sandboxes
        .upload_file_from_url(&req.sandbox_id, &req.file_path, &req.source_url)
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// `POST /agent/sandboxes/download-to-presigned-url`.
pub async fn download_to_presigned_url(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<DownloadToPresignedUrlRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    core.sandboxes
        .download_to_presigned_url(&req.sandbox_id, &req.file_path, &req.presigned_url)
        .await?;
    Ok(Json(serde_json::json!({})))
}

/// `POST /agent/sandboxes/create-directory`.
pub async fn create_directory(
    State(core): State<Core>,
    _auth: AuthUser,
    Json(req): Json<CreateDirectoryRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    core.sandboxes.create_directory(&req.sandbox_id, &req.path).await?;
    Ok(Json(serde_json::json!({})))
}

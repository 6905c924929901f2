//! `POST /chat/stream` (spec §6) — the SSE entry point that drives the
//! fixed chat graph and translates its events into AG-UI frames.

use std::sync::Arc;

use agent_runtime::config::GraphConfig;
use agent_runtime::graph::StreamInput;
use agent_runtime::nodes::NodeDeps;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use langgraph_core::messages::{Message, MessageRole};
use mcp_client::{Credential, McpClient};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::models::ChatStreamRequest;
use crate::auth::AuthUser;
use crate::core::Core;

/// Builds the node's MCP client for this request, if MCP was asked for and
/// is enabled. A session's sandbox doubles as its tool host (spec §4.4): we
/// reuse the caller's sandbox (keyed by their own user id, see
/// `api::handlers::sandboxes::create`) rather than accept a raw MCP URL
/// from the client.
async fn build_mcp_client(
    core: &Core,
    user_id: &str,
    thread_id: &str,
) -> ApiResult<Option<Arc<Mutex<McpClient>>>> {
    let sandbox = core.sandboxes.get_or_create(user_id, user_id).await?;
    let Some(mcp_url) = sandbox.mcp_url else {
        return Ok(None);
    };
    let mut client = McpClient::new(mcp_url);
    client
        .bootstrap(
            &Credential {
                user_api_key: user_id.to_string(),
                session_id: thread_id.to_string(),
            },
            &core.config.sandbox_provider_base_url,
        )
        .await
        .map_err(|e| ApiError::McpDisabled(e.to_string()))?;
    Ok(Some(Arc::new(Mutex::new(client))))
}

pub async fn chat_stream(
    State(core): State<Core>,
    auth: AuthUser,
    Json(req): Json<ChatStreamRequest>,
) -> ApiResult<Response> {
    if req.mcp_settings.is_some() && !core.config.agent_mcp_enabled {
        return Err(ApiError::McpDisabled(
            "mcp_settings provided but AGENT_MCP_ENABLED is false".to_string(),
        ));
    }

    core.credits.ensure_account(&auth.user_id, "free").await?;
    core.credits
        .deduct(
            &auth.user_id,
            core.config.chat_credit_cost,
            "chat turn",
            None,
            false,
        )
        .await?;

    let thread_id = req
        .thread_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mcp = if req.mcp_settings.is_some() && core.config.agent_mcp_enabled {
        build_mcp_client(&core, &auth.user_id, &thread_id).await?
    } else {
        None
    };

    let mut config = GraphConfig::new(thread_id.clone())
        .with_recursion_limit(core.config.agent_recursion_limit)
        .with_resources(req.resources.clone())
        .with_flags(req.workflow_flags())
        .with_auto_accepted_plan(req.auto_accepted_plan)
        .with_interrupt_before_tools(req.interrupt_before_tools.clone())
        .with_locale(req.locale.clone());
    config.max_plan_iterations = req.max_plan_iterations;
    config.max_step_num = req.max_step_num;
    if let Some(settings) = req.mcp_settings.clone() {
        config = config.with_mcp_settings(settings);
    }

    let input = match req.interrupt_feedback {
        Some(feedback) => StreamInput::Resume(feedback.into()),
        None => StreamInput::Fresh(
            req.messages
                .iter()
                .map(|m| Message::new(role_from_str(&m.role), m.content.clone()))
                .collect(),
        ),
    };

    let deps = NodeDeps {
        model: core.model.clone(),
        mcp,
    };

    let events = core.graph.stream(input, config, deps);
    let body = axum::body::Body::from_stream(stream_adapter::sse_body(thread_id, events).map(
        Ok::<_, std::convert::Infallible>,
    ));

    let mut response = Response::new(body);
    response
        .headers_mut()
        .insert(axum::http::header::CONTENT_TYPE, "text/event-stream".parse().unwrap());
    for (name, value) in stream_adapter::RESPONSE_HEADERS.iter().copied() {
        response
            .headers_mut()
            .insert(axum::http::HeaderName::from_static(name), value.parse().unwrap());
    }
    Ok(response.into_response())
}

fn role_from_str(role: &str) -> MessageRole {
    match role {
        "system" => MessageRole::System,
        "assistant" => MessageRole::Assistant,
        "tool" => MessageRole::Tool,
        "user" | "human" => MessageRole::Human,
        other => MessageRole::Custom(other.to_string()),
    }
}

//! `background_investigator`: the graph's unconditional entry node (spec
//! §4.1). When `flags.background_investigation` is set and a sandbox MCP
//! client is registered, it runs a single web-search-shaped tool call up
//! front and stashes the digest for `base` to read; otherwise it's a no-op
//! pass-through straight to `base`.

use crate::error::Result;
use crate::event::ExecutorEvent;
use crate::nodes::{emit, EventSink, NodeDeps};
use crate::state::{ExtKey, GraphState};

/// Tool name the source looks up on the sandbox's tool registry for this
/// step; absence is not an error, it just means the step is skipped.
const WEB_SEARCH_TOOL: &str = "web_search";

pub async fn run(state: &mut GraphState, deps: &NodeDeps, tx: &EventSink) -> Result<()> {
    if !state.flags.background_investigation {
        return Ok(());
    }

    let Some(mcp) = &deps.mcp else {
        return Ok(());
    };

    let query = state
        .messages
        .iter()
        .rev()
        .find_map(|m| m.text().map(str::to_string))
        .unwrap_or_default();
    if query.is_empty() {
        return Ok(());
    }

    let client = mcp.lock().await;
    if client.registry().find(WEB_SEARCH_TOOL).is_none() {
        return Ok(());
    }

    let result = client
        .call_tool(WEB_SEARCH_TOOL, serde_json::json!({ "query": query }))
        .await?;
    drop(client);

    let digest = match result {
        mcp_client::ToolResult::Text(text) => text,
        mcp_client::ToolResult::Structured(value) => value.to_string(),
    };

    emit(
        tx,
        ExecutorEvent::ToolCallResult {
            tool_call_id: "background_investigation".to_string(),
            content: digest.clone(),
            is_error: false,
        },
    )
    .await;

    state.set_ext(
        ExtKey::BackgroundInvestigationResults,
        serde_json::Value::String(digest),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowFlags;
    use langgraph_core::messages::Message;

    #[tokio::test]
    async fn skips_when_flag_is_off() {
        let mut state = GraphState::new(vec![Message::human("hi")]);
        state.flags = WorkflowFlags {
            background_investigation: false,
            ..Default::default()
        };
        let deps = NodeDeps {
            model: std::sync::Arc::new(NoopModel),
            mcp: None,
        };
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        run(&mut state, &deps, &tx).await.unwrap();
        assert!(state.get_ext(ExtKey::BackgroundInvestigationResults).is_none());
    }

    #[derive(Clone)]
    struct NoopModel;

    #[async_trait::async_trait]
    impl langgraph_core::llm::ChatModel for NoopModel {
        async fn chat(
            &self,
            _request: langgraph_core::llm::ChatRequest,
        ) -> langgraph_core::error::Result<langgraph_core::llm::ChatResponse> {
            unreachable!("not exercised by this test")
        }

        async fn stream(
            &self,
            _request: langgraph_core::llm::ChatRequest,
        ) -> langgraph_core::error::Result<langgraph_core::llm::ChatStreamResponse> {
            unreachable!("not exercised by this test")
        }

        fn clone_box(&self) -> Box<dyn langgraph_core::llm::ChatModel> {
            Box::new(self.clone())
        }
    }
}

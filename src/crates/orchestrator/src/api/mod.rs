//! REST API layer for the orchestrator core.
//!
//! Provides HTTP endpoints for streaming chat (`/chat/stream`, SSE/AG-UI)
//! and sandbox lifecycle management (`/agent/sandboxes/*`), plus health
//! checks.

pub mod error;
pub mod response;
pub mod middleware;
pub mod models;
pub mod handlers;
pub mod routes;

pub use error::{ApiError, ApiResult, ApiErrorResponse};
pub use response::{SuccessResponse, ErrorResponse, PaginatedResponse};
pub use routes::create_router;
pub use middleware::cors_layer;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::api::error::{ApiError, ApiResult};
    pub use crate::api::models::*;
    pub use crate::api::response::*;
}

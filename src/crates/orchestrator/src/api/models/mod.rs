//! API data transfer objects (DTOs) and response models
//!
//! Request/response structures for `/chat/stream` and `/agent/sandboxes/*`
//! (spec §6).

pub mod billing;
pub mod chat;
pub mod sandbox;

pub use billing::{BalanceResponse, CreditSummaryResponse, StripeWebhookRequest};
pub use chat::ChatStreamRequest;
pub use sandbox::{
    ConnectSandboxRequest, CreateDirectoryRequest, CreateSandboxRequest,
    DownloadToPresignedUrlRequest, ExposePortRequest, ExposePortResponse, ReadFileRequest,
    ReadFileResponse, RunCmdRequest, RunCmdResponse, SandboxResponse, SandboxStatusResponse,
    SandboxUrlsResponse, ScheduleTimeoutRequest, UploadFileFromUrlRequest, UploadFileRequest,
    WriteFileRequest,
};

/// System health response
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    /// Overall status
    pub status: String,

    /// Database connection status
    pub database: String,

    /// API version
    pub version: String,

    /// Current timestamp
    pub timestamp: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn new(status: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            database: database.into(),
            version: crate::version::VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response() {
        let health = HealthResponse::new("ok", "connected");
        assert_eq!(health.status, "ok");
        assert_eq!(health.database, "connected");
        assert!(!health.version.is_empty());
        assert!(!health.timestamp.is_empty());
    }
}

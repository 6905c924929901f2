//! SandboxController: session-sticky reuse, queue-driven timeouts, and
//! snapshot-accelerated creation over a pluggable provider (spec §4.3).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use chrono::Utc;
use sqlx::{PgPool, Row};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::error::{Result, SandboxError};
use crate::model::{transition, Sandbox, SandboxStatus};
use crate::provider::SandboxProvider;
use crate::queue::{is_stale, DelayQueue, TimeoutAction};

/// MCP and code-server default ports (spec §6 config table).
pub const DEFAULT_MCP_PORT: u16 = 6060;
pub const DEFAULT_CODE_SERVER_PORT: u16 = 9000;

const HEALTH_PROBE_DEADLINE: Duration = Duration::from_secs(60);
const HEALTH_PROBE_INTERVAL: Duration = Duration::from_millis(500);

pub struct SandboxControllerConfig {
    pub timeout_seconds: i64,
    pub pause_before_timeout_seconds: i64,
    pub mcp_port: u16,
    pub code_server_port: u16,
    pub default_template_id: String,
}

impl Default for SandboxControllerConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 1800,
            pause_before_timeout_seconds: 300,
            mcp_port: DEFAULT_MCP_PORT,
            code_server_port: DEFAULT_CODE_SERVER_PORT,
            default_template_id: "default".to_string(),
        }
    }
}

/// Keyed single-flight barrier: concurrent `get_or_create` calls for the
/// same `(user_id, session_id)` coalesce onto one in-flight create.
#[derive(Default)]
struct SingleFlight {
    locks: std::sync::Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SingleFlight {
    fn key_lock(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

pub struct SandboxController<P: SandboxProvider> {
    pool: PgPool,
    provider: P,
    queue: DelayQueue,
    config: SandboxControllerConfig,
    single_flight: SingleFlight,
    http: reqwest::Client,
}

impl<P: SandboxProvider> SandboxController<P> {
    pub fn new(pool: PgPool, provider: P, queue: DelayQueue, config: SandboxControllerConfig) -> Self {
        Self {
            pool,
            provider,
            queue,
            config,
            single_flight: SingleFlight::default(),
            http: reqwest::Client::new(),
        }
    }

    /// Reuse policy (spec §4.3): running -> connect; paused -> resume;
    /// stopped -> restart (fast path); otherwise create fresh. Concurrent
    /// callers for the same `(user_id, session_id)` coalesce into one
    /// create.
    pub async fn get_or_create(&self, user_id: &str, session_id: &str) -> Result<Sandbox> {
        let key = format!("{user_id}:{session_id}");
        let lock = self.single_flight.key_lock(&key);
        let _guard = lock.lock().await;

        if let Some(mut sandbox) = self.find_by_session(user_id, session_id).await? {
            sandbox = match sandbox.status {
                SandboxStatus::Running => sandbox,
                SandboxStatus::Paused => self.resume(&sandbox.sandbox_id).await?,
                SandboxStatus::Stopped => self.connect(&sandbox.sandbox_id).await?,
                SandboxStatus::Failed | SandboxStatus::Deleted => {
                    self.create(user_id, session_id).await?
                }
                SandboxStatus::Initializing | SandboxStatus::None => {
                    self.wait_for_ready(&sandbox.sandbox_id).await?
                }
            };
            self.schedule_timeouts(&sandbox).await?;
            return Ok(sandbox);
        }

        let sandbox = self.create(user_id, session_id).await?;
        self.schedule_timeouts(&sandbox).await?;
        Ok(sandbox)
    }

    /// Re-establishes a connection to an existing sandbox by id, applying
    /// the same reuse policy as `get_or_create` (spec §6
    /// `/agent/sandboxes/connect`).
    pub async fn reconnect(&self, sandbox_id: &str) -> Result<Sandbox> {
        let sandbox = self.get(sandbox_id).await?;
        let sandbox = match sandbox.status {
            SandboxStatus::Running => sandbox,
            SandboxStatus::Paused => self.resume(sandbox_id).await?,
            SandboxStatus::Stopped => self.connect(sandbox_id).await?,
            SandboxStatus::Initializing | SandboxStatus::None => {
                self.wait_for_ready(sandbox_id).await?
            }
            // A deleted sandbox is gone for good (spec §8 property 5): callers
            // must treat it the same as an id that was never issued, not as a
            // transition error, so no queued action can ever resurrect it.
            SandboxStatus::Deleted => return Err(SandboxError::NotFound(sandbox_id.to_string())),
            SandboxStatus::Failed => {
                return Err(SandboxError::InvalidTransition {
                    from: sandbox.status,
                    to: SandboxStatus::Running,
                });
            }
        };
        self.schedule_timeouts(&sandbox).await?;
        Ok(sandbox)
    }

    async fn create(&self, user_id: &str, session_id: &str) -> Result<Sandbox> {
        let sandbox_id = uuid::Uuid::new_v4().to_string();
        let mut sandbox = Sandbox::new(sandbox_id.clone(), user_id.to_string(), session_id.to_string());
        self.persist(&sandbox).await?;

        let handle = match self.provider.create(user_id, &self.config.default_template_id).await {
            Ok(h) => h,
            Err(e) => {
                sandbox.status = transition(sandbox.status, SandboxStatus::Failed)?;
                self.persist(&sandbox).await?;
                return Err(e);
            }
        };

        sandbox.provider_sandbox_id = Some(handle.provider_sandbox_id.clone());
        sandbox.mcp_url = Some(handle.mcp_url);
        sandbox.vscode_url = Some(handle.vscode_url);

        self.await_fresh_usable(&handle.provider_sandbox_id).await?;

        sandbox.status = transition(sandbox.status, SandboxStatus::Running)?;
        sandbox.touch();
        self.persist(&sandbox).await?;
        info!(sandbox_id = %sandbox.sandbox_id, "sandbox created and ready");
        Ok(sandbox)
    }

    async fn connect(&self, sandbox_id: &str) -> Result<Sandbox> {
        let mut sandbox = self.get(sandbox_id).await?;
        let provider_id = sandbox
            .provider_sandbox_id
            .clone()
            .ok_or_else(|| SandboxError::NotInitialized(sandbox_id.to_string()))?;

        self.provider.connect(&provider_id).await?;
        self.await_fresh_usable(&provider_id).await?;

        sandbox.status = transition(sandbox.status, SandboxStatus::Running)?;
        sandbox.touch();
        self.persist(&sandbox).await?;
        Ok(sandbox)
    }

    async fn resume(&self, sandbox_id: &str) -> Result<Sandbox> {
        let mut sandbox = self.get(sandbox_id).await?;
        let provider_id = sandbox
            .provider_sandbox_id
            .clone()
            .ok_or_else(|| SandboxError::NotInitialized(sandbox_id.to_string()))?;

        self.provider.resume(&provider_id).await?;
        self.await_fresh_usable(&provider_id).await?;

        sandbox.status = transition(sandbox.status, SandboxStatus::Running)?;
        sandbox.touch();
        self.persist(&sandbox).await?;
        Ok(sandbox)
    }

    pub async fn pause(&self, sandbox_id: &str) -> Result<Sandbox> {
        let mut sandbox = self.get(sandbox_id).await?;
        let provider_id = sandbox
            .provider_sandbox_id
            .clone()
            .ok_or_else(|| SandboxError::NotInitialized(sandbox_id.to_string()))?;

        self.provider.pause(&provider_id).await?;
        sandbox.status = transition(sandbox.status, SandboxStatus::Paused)?;
        self.persist(&sandbox).await?;

        let deliver_at = Utc::now() + chrono::Duration::seconds(self.config.timeout_seconds);
        self.queue
            .schedule(sandbox_id, TimeoutAction::Delete, deliver_at)
            .await?;
        Ok(sandbox)
    }

    pub async fn delete(&self, sandbox_id: &str) -> Result<()> {
        let mut sandbox = self.get(sandbox_id).await?;
        if let Some(provider_id) = &sandbox.provider_sandbox_id {
            self.provider.delete(provider_id).await?;
        }
        sandbox.status = transition(sandbox.status, SandboxStatus::Deleted)?;
        self.persist(&sandbox).await?;
        self.queue.cancel(sandbox_id, TimeoutAction::Pause).await?;
        self.queue.cancel(sandbox_id, TimeoutAction::Delete).await?;
        info!(sandbox_id, "sandbox deleted");
        Ok(())
    }

    /// Drains due pause/delete messages from the delay queue. Intended to
    /// be polled by a background task.
    pub async fn process_due_timeouts(&self) -> Result<()> {
        let due = self.queue.poll_due(Utc::now(), 100).await?;
        for msg in due {
            let sandbox = match self.get(&msg.sandbox_id).await {
                Ok(s) => s,
                Err(SandboxError::NotFound(_)) => continue,
                Err(e) => {
                    warn!(sandbox_id = %msg.sandbox_id, error = %e, "failed to load sandbox for timeout");
                    continue;
                }
            };

            if is_stale(&msg, sandbox.last_activity_at) {
                continue;
            }

            match msg.action {
                TimeoutAction::Pause if sandbox.status == SandboxStatus::Running => {
                    if let Err(e) = self.pause(&msg.sandbox_id).await {
                        warn!(sandbox_id = %msg.sandbox_id, error = %e, "scheduled pause failed");
                    }
                }
                TimeoutAction::Delete if sandbox.status == SandboxStatus::Paused => {
                    if let Err(e) = self.delete(&msg.sandbox_id).await {
                        warn!(sandbox_id = %msg.sandbox_id, error = %e, "scheduled delete failed");
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Called on every sandbox activity: reschedules the pause timer,
    /// canceling any prior one (spec §4.3 Timeout scheduling).
    pub async fn record_activity(&self, sandbox_id: &str) -> Result<()> {
        let mut sandbox = self.get(sandbox_id).await?;
        sandbox.touch();
        self.persist(&sandbox).await?;
        self.schedule_timeouts(&sandbox).await
    }

    async fn schedule_timeouts(&self, sandbox: &Sandbox) -> Result<()> {
        if sandbox.status != SandboxStatus::Running {
            return Ok(());
        }
        let pause_at = Utc::now()
            + chrono::Duration::seconds(
                self.config.timeout_seconds - self.config.pause_before_timeout_seconds,
            );
        self.queue
            .schedule(&sandbox.sandbox_id, TimeoutAction::Pause, pause_at)
            .await
    }

    pub async fn expose_port(&self, sandbox_id: &str, port: u16) -> Result<String> {
        let sandbox = self.get(sandbox_id).await?;
        let provider_id = sandbox
            .provider_sandbox_id
            .ok_or_else(|| SandboxError::NotInitialized(sandbox_id.to_string()))?;
        self.provider.expose_port(&provider_id, port).await
    }

    pub async fn get(&self, sandbox_id: &str) -> Result<Sandbox> {
        self.load(sandbox_id)
            .await?
            .ok_or_else(|| SandboxError::NotFound(sandbox_id.to_string()))
    }

    fn require_provider_id(sandbox: &Sandbox) -> Result<&str> {
        sandbox
            .provider_sandbox_id
            .as_deref()
            .ok_or_else(|| SandboxError::NotInitialized(sandbox.sandbox_id.clone()))
    }

    /// Runs a command inside the sandbox (spec §6 `/agent/sandboxes/run-cmd`).
    pub async fn run_cmd(&self, sandbox_id: &str, cmd: &str, background: bool) -> Result<String> {
        let sandbox = self.get(sandbox_id).await?;
        let provider_id = Self::require_provider_id(&sandbox)?;
        let output = self.provider.run_cmd(provider_id, cmd, background).await?;
        self.record_activity(sandbox_id).await?;
        Ok(output)
    }

    /// Reads a file from the sandbox (spec §6 `/agent/sandboxes/read-file`).
    pub async fn read_file(&self, sandbox_id: &str, path: &str) -> Result<String> {
        let sandbox = self.get(sandbox_id).await?;
        let provider_id = Self::require_provider_id(&sandbox)?;
        let content = self.provider.read_file(provider_id, path).await?;
        self.record_activity(sandbox_id).await?;
        Ok(content)
    }

    /// Writes a file to the sandbox (spec §6 `/agent/sandboxes/write-file`).
    pub async fn write_file(&self, sandbox_id: &str, path: &str, content: &str) -> Result<()> {
        let sandbox = self.get(sandbox_id).await?;
        let provider_id = Self::require_provider_id(&sandbox)?;
        self.provider.write_file(provider_id, path, content).await?;
        self.record_activity(sandbox_id).await
    }

    /// Creates a directory inside the sandbox.
    pub async fn create_directory(&self, sandbox_id: &str, path: &str) -> Result<()> {
        let sandbox = self.get(sandbox_id).await?;
        let provider_id = Self::require_provider_id(&sandbox)?;
        self.provider.create_directory(provider_id, path).await?;
        self.record_activity(sandbox_id).await
    }

    /// Writes a base64-encoded file into the sandbox (spec §6.1
    /// `/agent/sandboxes/upload-file`), a thin wrapper over `write_file` for
    /// callers sending binary content rather than the plain text accepted
    /// by `write-file`.
    pub async fn upload_file(&self, sandbox_id: &str, path: &str, content_b64: &str) -> Result<()> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(content_b64)
            .map_err(|e| SandboxError::Provider(format!("invalid base64 upload content: {e}")))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        self.write_file(sandbox_id, path, &content).await
    }

    /// Fetches `source_url` and writes the response body into the sandbox
    /// at `path` (spec §6.1 `/agent/sandboxes/upload-file-from-url`).
    pub async fn upload_file_from_url(&self, sandbox_id: &str, path: &str, source_url: &str) -> Result<()> {
        let resp = self
            .http
            .get(source_url)
            .send()
            .await
            .map_err(|e| SandboxError::Provider(format!("fetching upload source failed: {e}")))?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SandboxError::Provider(format!("reading upload source body failed: {e}")))?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        self.write_file(sandbox_id, path, &content).await
    }

    /// Reads a file from the sandbox and PUTs it to a caller-supplied
    /// presigned URL (spec §6.1 `/agent/sandboxes/download-to-presigned-url`).
    pub async fn download_to_presigned_url(
        &self,
        sandbox_id: &str,
        path: &str,
        presigned_url: &str,
    ) -> Result<()> {
        let content = self.read_file(sandbox_id, path).await?;
        let resp = self
            .http
            .put(presigned_url)
            .body(content)
            .send()
            .await
            .map_err(|e| SandboxError::Provider(format!("presigned upload failed: {e}")))?;
        if !resp.status().is_success() {
            return Err(SandboxError::Provider(format!(
                "presigned upload rejected with status {}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Explicitly (re)schedules this sandbox's pause timer without waiting
    /// for the next provider call to trigger it (spec §6.1
    /// `/agent/sandboxes/schedule-timeout`).
    pub async fn schedule_timeout(&self, sandbox_id: &str) -> Result<()> {
        let sandbox = self.get(sandbox_id).await?;
        self.schedule_timeouts(&sandbox).await
    }

    async fn wait_for_ready(&self, sandbox_id: &str) -> Result<Sandbox> {
        let deadline = tokio::time::Instant::now() + HEALTH_PROBE_DEADLINE;
        loop {
            let sandbox = self.get(sandbox_id).await?;
            if sandbox.status == SandboxStatus::Running {
                return Ok(sandbox);
            }
            if sandbox.status.is_terminal() || tokio::time::Instant::now() >= deadline {
                return Err(SandboxError::Timeout(sandbox_id.to_string()));
            }
            tokio::time::sleep(HEALTH_PROBE_INTERVAL).await;
        }
    }

    /// A sandbox is fresh-usable only after provider status is `running`
    /// AND the MCP endpoint answers a health probe, within 60s (spec
    /// §4.3 Reuse policy).
    async fn await_fresh_usable(&self, provider_sandbox_id: &str) -> Result<()> {
        let deadline = tokio::time::Instant::now() + HEALTH_PROBE_DEADLINE;
        loop {
            if self.provider.is_running(provider_sandbox_id).await? {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SandboxError::Timeout(provider_sandbox_id.to_string()));
            }
            tokio::time::sleep(HEALTH_PROBE_INTERVAL).await;
        }
    }

    async fn find_by_session(&self, user_id: &str, session_id: &str) -> Result<Option<Sandbox>> {
        let row = sqlx::query(
            r#"SELECT sandbox_id FROM sandboxes
               WHERE user_id = $1 AND session_id = $2
               ORDER BY created_at DESC LIMIT 1"#,
        )
        .bind(user_id)
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => self.load(r.get("sandbox_id")).await,
            None => Ok(None),
        }
    }

    async fn load(&self, sandbox_id: &str) -> Result<Option<Sandbox>> {
        let row = sqlx::query(
            r#"SELECT sandbox_id, provider_sandbox_id, user_id, session_id, status,
                      mcp_url, vscode_url, created_at, last_activity_at
               FROM sandboxes WHERE sandbox_id = $1"#,
        )
        .bind(sandbox_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Sandbox {
            sandbox_id: r.get("sandbox_id"),
            provider_sandbox_id: r.get("provider_sandbox_id"),
            user_id: r.get("user_id"),
            session_id: r.get("session_id"),
            status: serde_json::from_value(serde_json::Value::String(r.get("status")))
                .unwrap_or(SandboxStatus::Failed),
            mcp_url: r.get("mcp_url"),
            vscode_url: r.get("vscode_url"),
            created_at: r.get("created_at"),
            last_activity_at: r.get("last_activity_at"),
        }))
    }

    async fn persist(&self, sandbox: &Sandbox) -> Result<()> {
        let status = serde_json::to_value(sandbox.status)?
            .as_str()
            .unwrap()
            .to_string();

        sqlx::query(
            r#"INSERT INTO sandboxes
                 (sandbox_id, provider_sandbox_id, user_id, session_id, status,
                  mcp_url, vscode_url, created_at, last_activity_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT (sandbox_id) DO UPDATE SET
                 provider_sandbox_id = EXCLUDED.provider_sandbox_id,
                 status = EXCLUDED.status,
                 mcp_url = EXCLUDED.mcp_url,
                 vscode_url = EXCLUDED.vscode_url,
                 last_activity_at = EXCLUDED.last_activity_at"#,
        )
        .bind(&sandbox.sandbox_id)
        .bind(&sandbox.provider_sandbox_id)
        .bind(&sandbox.user_id)
        .bind(&sandbox.session_id)
        .bind(status)
        .bind(&sandbox.mcp_url)
        .bind(&sandbox.vscode_url)
        .bind(sandbox.created_at)
        .bind(sandbox.last_activity_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

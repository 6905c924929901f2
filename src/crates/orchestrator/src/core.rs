//! Wires the runtime core's five components onto one shared Postgres pool
//! (spec §2): a `Core` value is built once at startup and handed to every
//! handler through axum's `State`.

use std::sync::Arc;

use agent_runtime::GraphExecutor;
use credit_ledger::{CreditLedger, ExternalPaymentProvider, PgCreditLedger, Reconciler, ReconcilerConfig, WebhookStore};
use langgraph_checkpoint::postgres::PostgresCheckpointSaver;
use langgraph_core::llm::ChatModel;
use llm::remote::claude::ClaudeClient;
use llm::config::RemoteLlmConfig;
use sandbox::{DelayQueue, HttpSandboxProvider, SandboxController, SandboxControllerConfig};

use crate::config::ServerConfig;
use crate::db::DatabaseConnection;

/// Stands in for the real payment-provider lookup the orphan-recovery pass
/// needs; verifying a provider's out-of-band status is an external
/// collaborator's job (spec §1), so this always reports "not yet confirmed"
/// and leaves orphans for the webhook path or a future provider integration
/// to resolve.
struct NullPaymentProvider;

#[async_trait::async_trait]
impl ExternalPaymentProvider for NullPaymentProvider {
    async fn succeeded(&self, _external_event_id: &str) -> bool {
        false
    }
}

/// The runtime core, shared across every request handler.
#[derive(Clone)]
pub struct Core {
    pub db: DatabaseConnection,
    pub graph: Arc<GraphExecutor>,
    pub sandboxes: Arc<SandboxController<HttpSandboxProvider>>,
    pub credits: Arc<PgCreditLedger>,
    pub webhooks: Arc<WebhookStore>,
    pub reconciler: Arc<Reconciler<NullPaymentProvider>>,
    pub model: Arc<dyn ChatModel>,
    pub config: Arc<ServerConfig>,
}

impl Core {
    /// Connects the shared pool, runs migrations, and constructs every
    /// component over it. Called once from `main`.
    pub async fn bootstrap(config: ServerConfig) -> anyhow::Result<Self> {
        let db = DatabaseConnection::with_pool_config(
            &config.checkpoint_db_url,
            config.checkpoint_pool_min,
            config.checkpoint_pool_max,
            config.checkpoint_pool_timeout,
        )
        .await?;
        db.run_migrations().await?;

        let pool = db.pool_handle();

        let checkpointer = Arc::new(PostgresCheckpointSaver::new(pool.clone()));
        let graph = Arc::new(GraphExecutor::new(checkpointer));

        let queue = DelayQueue::connect(&config.sandbox_queue_redis_url).await?;
        let provider = HttpSandboxProvider::new(config.sandbox_provider_base_url.clone());
        let sandbox_config = SandboxControllerConfig {
            timeout_seconds: config.sandbox_timeout_seconds,
            pause_before_timeout_seconds: config.sandbox_pause_before_timeout_seconds,
            mcp_port: config.sandbox_mcp_server_port,
            code_server_port: config.sandbox_code_server_port,
            ..SandboxControllerConfig::default()
        };
        let sandboxes = Arc::new(SandboxController::new(
            pool.clone(),
            provider,
            queue,
            sandbox_config,
        ));

        let credits = Arc::new(PgCreditLedger::new(pool.clone()));
        let webhooks = Arc::new(WebhookStore::new(pool.clone()));
        let reconciler = Arc::new(Reconciler::new(
            pool,
            credits.clone() as Arc<dyn CreditLedger>,
            NullPaymentProvider,
            ReconcilerConfig {
                orphan_window_hours: config.reconcile_orphan_window_hours,
                ..ReconcilerConfig::default()
            },
        ));

        let model: Arc<dyn ChatModel> = Arc::new(ClaudeClient::new(RemoteLlmConfig::from_env(
            "ANTHROPIC_API_KEY",
            "https://api.anthropic.com",
            "claude-3-5-sonnet-20241022",
        )?));

        Ok(Self {
            db,
            graph,
            sandboxes,
            credits,
            webhooks,
            reconciler,
            model,
            config: Arc::new(config),
        })
    }

    /// Spawns the background task that drains due sandbox pause/delete
    /// timeouts from the delay queue (spec §4.3 Timeout scheduling).
    pub fn spawn_timeout_sweeper(&self) {
        let sandboxes = self.sandboxes.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(std::time::Duration::from_secs(15));
            loop {
                ticker.tick().await;
                if let Err(e) = sandboxes.process_due_timeouts().await {
                    tracing::warn!(error = %e, "sandbox timeout sweep failed");
                }
            }
        });
    }

    /// Spawns the periodic credit reconciler (spec §4.5/§9): orphan payment
    /// recovery, balance repair, duplicate detection, and expiry sweep.
    pub fn spawn_credit_reconciler(&self) {
        let reconciler = self.reconciler.clone();
        let interval = std::time::Duration::from_secs(self.config.reconcile_interval_seconds);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                reconciler.run().await;
            }
        });
    }
}

//! Database connection management
//!
//! Provides the shared Postgres connection pool used by the checkpoint
//! store, the credit ledger, the sandbox controller's metadata, and
//! webhook idempotency records. One pool, one set of migrations: the
//! orchestrator binary owns pool lifecycle and hands a clone to each
//! store at startup.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, Postgres};

/// Type alias for the database connection pool
pub type DatabasePool = sqlx::Pool<Postgres>;

/// Database connection pool statistics
#[derive(Debug, Clone)]
pub struct PoolStatistics {
    /// Number of currently idle connections
    pub idle_connections: u32,

    /// Number of currently active connections
    pub active_connections: u32,

    /// Maximum allowed connections
    pub max_connections: u32,

    /// Timestamp of the statistics collection (Unix timestamp in seconds)
    pub collected_at: u64,
}

/// Database connection wrapper
#[derive(Clone)]
pub struct DatabaseConnection {
    pool: Arc<DatabasePool>,
}

impl DatabaseConnection {
    /// Connect to Postgres with default pool sizing.
    ///
    /// `database_url` is a `postgresql://` DSN. The statement cache is
    /// disabled so the pool stays compatible with transaction-mode
    /// connection poolers (e.g. pgbouncer) placed in front of Postgres.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        Self::with_pool_config(database_url, 2, 10, Duration::from_secs(30)).await
    }

    /// Connect with an explicit pool configuration.
    ///
    /// # Arguments
    /// * `database_url` - Postgres connection string
    /// * `min_connections` - connections kept warm in the pool
    /// * `max_connections` - upper bound on concurrent connections
    /// * `acquire_timeout` - how long `acquire()` waits before giving up
    pub async fn with_pool_config(
        database_url: &str,
        min_connections: u32,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, sqlx::Error> {
        let connect_options: PgConnectOptions = database_url
            .parse::<PgConnectOptions>()?
            .statement_cache_capacity(0);

        let pool = PgPoolOptions::new()
            .min_connections(min_connections)
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Some(Duration::from_secs(30)))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Create a new database connection with a custom max pool size,
    /// using the default min connections (2) and acquire timeout (30s).
    pub async fn with_max_connections(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, sqlx::Error> {
        Self::with_pool_config(database_url, 2, max_connections, Duration::from_secs(30)).await
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Get a cheaply-cloneable handle to the pool, suitable for handing to
    /// the checkpoint saver, credit ledger, and sandbox controller.
    pub fn pool_handle(&self) -> DatabasePool {
        self.pool.as_ref().clone()
    }

    /// Run migrations on the database.
    ///
    /// Aggregates migrations from the orchestrator's own `./migrations`
    /// directory, which includes the checkpoint, credit-ledger, and
    /// sandbox table definitions copied in at build time.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
    }

    /// Perform a health check by running a simple query
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(())
    }

    /// Get connection pool statistics
    pub fn get_pool_statistics(&self) -> PoolStatistics {
        let pool_ref = self.pool.as_ref();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let idle = pool_ref.num_idle() as u32;
        let total = pool_ref.size();

        PoolStatistics {
            idle_connections: idle,
            active_connections: total.saturating_sub(idle),
            max_connections: pool_ref.options().get_max_connections(),
            collected_at: now,
        }
    }

    /// Check if the connection pool is healthy (not fully saturated)
    pub fn is_pool_healthy(&self) -> bool {
        let stats = self.get_pool_statistics();
        stats.active_connections < stats.max_connections
    }

    /// Close the connection pool gracefully. After this is called, the
    /// connection cannot be used anymore.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Wait for the pool to have at least one available connection
    pub async fn wait_for_connection(&self, timeout_secs: u64) -> Result<(), String> {
        let start = std::time::Instant::now();
        let timeout = Duration::from_secs(timeout_secs);

        loop {
            if self.get_pool_statistics().idle_connections > 0 {
                return Ok(());
            }

            if start.elapsed() > timeout {
                return Err(format!(
                    "Timeout waiting for connection after {} seconds",
                    timeout_secs
                ));
            }

            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These exercise pool construction against a local Postgres instance
    // reachable via `ORCHESTRATOR_TEST_DATABASE_URL`; skipped (not failed)
    // when that isn't set, since the crate has no embedded database.
    fn test_database_url() -> Option<String> {
        std::env::var("ORCHESTRATOR_TEST_DATABASE_URL").ok()
    }

    #[tokio::test]
    async fn test_create_connection() {
        let Some(url) = test_database_url() else {
            return;
        };
        let conn = DatabaseConnection::new(&url).await.unwrap();
        assert!(conn.pool().acquire().await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_success() {
        let Some(url) = test_database_url() else {
            return;
        };
        let conn = DatabaseConnection::new(&url).await.unwrap();
        assert!(conn.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_custom_max_connections() {
        let Some(url) = test_database_url() else {
            return;
        };
        let conn = DatabaseConnection::with_max_connections(&url, 10)
            .await
            .unwrap();

        let stats = conn.get_pool_statistics();
        assert_eq!(stats.max_connections, 10);
    }

    #[tokio::test]
    async fn test_pool_statistics_has_timestamp() {
        let Some(url) = test_database_url() else {
            return;
        };
        let conn = DatabaseConnection::new(&url).await.unwrap();
        let stats = conn.get_pool_statistics();
        assert!(stats.collected_at > 0);
    }
}

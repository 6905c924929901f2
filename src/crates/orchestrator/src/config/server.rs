//! Environment-driven runtime settings (spec §6 "Configuration (all
//! enumerated)"). Static config-file loading and CLI bootstrap are out of
//! scope for the core (spec §1) — the orchestrator binary reads the
//! process environment directly rather than a YAML/TOML layer.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings assembled from environment variables at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `CHECKPOINT_DB_URL`, mandatory, must be `postgresql://...`.
    pub checkpoint_db_url: String,
    pub checkpoint_pool_min: u32,
    pub checkpoint_pool_max: u32,
    pub checkpoint_pool_timeout: Duration,
    /// `AGENT_RECURSION_LIMIT`, capped at `agent_runtime::MAX_RECURSION_LIMIT` (100).
    pub agent_recursion_limit: u32,
    pub agent_mcp_enabled: bool,
    pub agent_mcp_timeout_seconds: u64,
    pub sandbox_timeout_seconds: i64,
    pub sandbox_pause_before_timeout_seconds: i64,
    pub sandbox_mcp_server_port: u16,
    pub sandbox_code_server_port: u16,
    /// Base URL of the REST sandbox provider backend.
    pub sandbox_provider_base_url: String,
    /// Redis URL backing the sandbox timeout delay queue.
    pub sandbox_queue_redis_url: String,
    /// Address the orchestrator HTTP server binds to.
    pub bind_addr: String,
    /// `RECONCILE_ORPHAN_WINDOW_HOURS` (see DESIGN.md Open Question decision).
    pub reconcile_orphan_window_hours: i64,
    /// How often the credit reconciler's four passes run.
    pub reconcile_interval_seconds: u64,
    /// Flat credit cost deducted per `/chat/stream` turn (spec §6.1; pricing
    /// plans themselves are a Non-goal, but some unit cost must be charged
    /// before the expensive operation begins).
    pub chat_credit_cost: rust_decimal::Decimal,
}

fn env_var(key: &'static str) -> Result<String, ServerConfigError> {
    std::env::var(key).map_err(|_| ServerConfigError::Missing(key))
}

fn env_var_or(key: &'static str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(
    key: &'static str,
    default: T,
) -> Result<T, ServerConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|_| ServerConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

impl ServerConfig {
    /// Loads settings from the process environment. `CHECKPOINT_DB_URL` is
    /// the only variable without a default; everything else falls back to
    /// the values documented in spec §6 / §4.1 / §4.3.
    pub fn from_env() -> Result<Self, ServerConfigError> {
        let checkpoint_db_url = env_var("CHECKPOINT_DB_URL")?;
        if !checkpoint_db_url.starts_with("postgresql://")
            && !checkpoint_db_url.starts_with("postgres://")
        {
            return Err(ServerConfigError::Invalid {
                key: "CHECKPOINT_DB_URL",
                value: checkpoint_db_url,
            });
        }

        Ok(Self {
            checkpoint_db_url,
            checkpoint_pool_min: env_parse_or("CHECKPOINT_POOL_MIN", 2)?,
            checkpoint_pool_max: env_parse_or("CHECKPOINT_POOL_MAX", 10)?,
            checkpoint_pool_timeout: Duration::from_secs(env_parse_or(
                "CHECKPOINT_POOL_TIMEOUT",
                60,
            )?),
            agent_recursion_limit: env_parse_or(
                "AGENT_RECURSION_LIMIT",
                agent_runtime::config::DEFAULT_RECURSION_LIMIT,
            )?
            .min(agent_runtime::config::MAX_RECURSION_LIMIT),
            agent_mcp_enabled: env_parse_or("AGENT_MCP_ENABLED", true)?,
            agent_mcp_timeout_seconds: env_parse_or("AGENT_MCP_TIMEOUT_SECONDS", 1800)?,
            sandbox_timeout_seconds: env_parse_or("SANDBOX_TIMEOUT_SECONDS", 1800)?,
            sandbox_pause_before_timeout_seconds: env_parse_or(
                "SANDBOX_PAUSE_BEFORE_TIMEOUT_SECONDS",
                300,
            )?,
            sandbox_mcp_server_port: env_parse_or("SANDBOX_MCP_SERVER_PORT", 6060)?,
            sandbox_code_server_port: env_parse_or("CODE_SERVER_PORT", 9000)?,
            sandbox_provider_base_url: env_var_or(
                "SANDBOX_PROVIDER_BASE_URL",
                "http://localhost:7000",
            ),
            sandbox_queue_redis_url: env_var_or("SANDBOX_QUEUE_REDIS_URL", "redis://localhost:6379"),
            bind_addr: env_var_or("ORCHESTRATOR_BIND_ADDR", "0.0.0.0:8080"),
            reconcile_orphan_window_hours: env_parse_or("RECONCILE_ORPHAN_WINDOW_HOURS", 24)?,
            reconcile_interval_seconds: env_parse_or("RECONCILE_INTERVAL_SECONDS", 3600)?,
            chat_credit_cost: env_parse_or(
                "AGENT_CHAT_CREDIT_COST",
                rust_decimal::Decimal::new(1, 0),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global, so these run serially within this test
    // binary by construction (no parallel test touches CHECKPOINT_DB_URL).

    #[test]
    fn rejects_non_postgres_dsn() {
        std::env::set_var("CHECKPOINT_DB_URL", "sqlite://local.db");
        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ServerConfigError::Invalid { key: "CHECKPOINT_DB_URL", .. }));
        std::env::remove_var("CHECKPOINT_DB_URL");
    }

    #[test]
    fn missing_dsn_is_an_error() {
        std::env::remove_var("CHECKPOINT_DB_URL");
        let err = ServerConfig::from_env().unwrap_err();
        assert!(matches!(err, ServerConfigError::Missing("CHECKPOINT_DB_URL")));
    }

    #[test]
    fn recursion_limit_clamps_to_max() {
        std::env::set_var("CHECKPOINT_DB_URL", "postgresql://localhost/test");
        std::env::set_var("AGENT_RECURSION_LIMIT", "500");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.agent_recursion_limit, agent_runtime::config::MAX_RECURSION_LIMIT);
        std::env::remove_var("CHECKPOINT_DB_URL");
        std::env::remove_var("AGENT_RECURSION_LIMIT");
    }

    #[test]
    fn defaults_applied_when_optional_vars_absent() {
        std::env::set_var("CHECKPOINT_DB_URL", "postgresql://localhost/test");
        std::env::remove_var("SANDBOX_TIMEOUT_SECONDS");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.sandbox_timeout_seconds, 1800);
        std::env::remove_var("CHECKPOINT_DB_URL");
    }
}

//! Orchestrator server binary.
//!
//! Bootstraps the runtime `Core` (checkpoint pool, graph executor, sandbox
//! controller, credit ledger, LLM client) over a single Postgres pool, then
//! serves the HTTP/SSE surface.

use orchestrator::api::routes::create_router;
use orchestrator::config::ServerConfig;
use orchestrator::core::Core;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("loading configuration from environment");
    let config = ServerConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    tracing::info!("bootstrapping runtime core");
    let core = Core::bootstrap(config).await?;
    core.spawn_timeout_sweeper();
    core.spawn_credit_reconciler();

    let app = create_router(core);

    tracing::info!("starting orchestrator server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("orchestrator server shut down gracefully");
    Ok(())
}

/// Waits for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL-C signal handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received CTRL-C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

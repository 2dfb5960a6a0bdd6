use anyhow::Context;
use tracing::info;

use catalog_api::app::{build_app, AppServices};
use catalog_infra::{AppConfig, Database};
use catalog_observability::LogConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let _ = dotenvy::dotenv();

    let log_guard = catalog_observability::init(&LogConfig::from_env())?;
    let config = AppConfig::from_env().context("failed to load configuration")?;

    let database = if config.use_persistent_stores {
        let db = Database::connect(&config.database).await?;
        db.migrate().await?;
        Some(db)
    } else {
        None
    };
    let services = match &database {
        Some(db) => AppServices::persistent(db),
        None => AppServices::in_memory(),
    };

    let app = build_app(services);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(db) = database {
        db.close().await;
    }
    info!("shutdown complete");
    log_guard.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}

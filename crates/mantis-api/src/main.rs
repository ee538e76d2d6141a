//! mantis-api - HTTP server entry point.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mantis_api::{error::set_expose_error_detail, router, AppState, CatalogService, ServerConfig};
use mantis_db::{log_pool_metrics, Database, MemoryCache, PoolConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, daily rotation)
    //   LOG_ANSI    - "true"/"false" override ANSI colors
    //   RUST_LOG    - env filter (default: "mantis_api=debug,mantis_db=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mantis_api=debug,mantis_db=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let path = std::path::Path::new(path);
        let file_dir = path.parent().unwrap_or(std::path::Path::new("."));
        let file_name = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("mantis-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = ServerConfig::from_env()?;
    set_expose_error_detail(!config.is_production());
    info!(
        subsystem = "api",
        environment = %config.environment,
        run_migrations = config.run_migrations,
        "Configuration loaded"
    );

    let pool_config = PoolConfig::new().max_connections(config.db_max_connections);
    let db = Database::connect_with_config(&config.database_url, pool_config).await?;
    log_pool_metrics(db.pool());

    if config.run_migrations {
        db.migrate().await?;
        info!(subsystem = "db", "Migrations applied");
    }

    let catalog = CatalogService::new(
        Arc::new(db.catalogs.clone()),
        Arc::new(MemoryCache::new()),
        config.catalog_cache_ttl,
    );

    let state = AppState {
        db: db.clone(),
        catalog,
    };
    let app = router(state, &config);

    let listener = config.bind_listener().await?;
    info!(
        subsystem = "api",
        host = %config.host,
        addr = %listener.local_addr()?,
        "Starting server"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool().close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, draining connections");
}

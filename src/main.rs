use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use beat_wellington::{
    api::{self, AppState},
    config::{Config, RulesBackend},
    db,
    forecast::ForecastClient,
    history::PgRecordStore,
    rules::{FileRulesStore, PgRulesStore, RulesStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent; env vars may be set externally)
    let _ = dotenvy::dotenv();

    // Initialise tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Load config
    let config = Config::from_env()?;

    // Connect to DB and run migrations
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    let rules: Arc<dyn RulesStore> = match config.rules_backend {
        RulesBackend::Postgres => Arc::new(PgRulesStore::new(pool.clone())),
        RulesBackend::File => Arc::new(FileRulesStore::new(config.rules_file.clone())),
    };
    info!(backend = ?config.rules_backend, fallback = ?config.rules_fallback, "Rules store ready");

    let forecast = ForecastClient::new(
        &config.forecast_base_url,
        config.location.clone(),
        config.forecast_dump_dir.clone(),
        Duration::from_secs(config.forecast_timeout_secs),
    )?;

    let state = AppState::new(
        forecast,
        rules,
        Arc::new(PgRecordStore::new(pool)),
        config.rules_fallback.clone(),
    );

    // Spawn refresh loop; the first tick fires immediately
    tokio::spawn(
        state
            .refresher
            .clone()
            .run(Duration::from_secs(config.refresh_interval_secs)),
    );

    // Start HTTP server
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

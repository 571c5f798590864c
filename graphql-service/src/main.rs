use graphql_service::{
    build_router,
    config::ServiceConfig,
    db,
    services::{AccountStore, EmailProvider, LogEmailService, PgStore, SmtpEmailService},
    AppState,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use service_core::error::AppError;
use service_core::observability::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // Load configuration - fail fast if invalid
    let config = ServiceConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting GraphQL service"
    );

    let metrics = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("Failed to install metrics recorder: {}", e))
    })?;

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::Error::new(e)))?;
    let store: Arc<dyn AccountStore> = Arc::new(PgStore::new(pool));

    let mailer: Arc<dyn EmailProvider> = if config.mail.enabled {
        Arc::new(SmtpEmailService::new(&config.mail)?)
    } else {
        tracing::info!("Mail delivery disabled, mails will be logged");
        Arc::new(LogEmailService)
    };

    let bind_address = config.common.bind_address();
    let state = AppState::new(config, store, mailer, metrics)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %bind_address, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

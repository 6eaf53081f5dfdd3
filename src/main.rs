use anyhow::Context;
use std::sync::Arc;
use storefront_api::{
    auth::AuthService,
    config::{self, AppConfig},
    db, events,
    handlers::AppServices,
    services::PaymentGateway,
    AppState,
};
use tokio::sync::mpsc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load_config().context("failed to load configuration")?;
    config::init_tracing(config.log_level(), config.log_json);

    info!(
        environment = %config.environment,
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let db = Arc::new(
        db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to the database")?,
    );

    if config.auto_migrate {
        db::run_migrations(&db)
            .await
            .context("failed to run migrations")?;
    }

    let (tx, rx) = mpsc::channel(config.event_channel_capacity);
    let event_sender = events::EventSender::new(tx);
    tokio::spawn(events::process_events(rx));

    let auth = Arc::new(AuthService::new(
        &config.jwt_secret,
        config.jwt_expiration_secs,
    ));
    let payments = PaymentGateway::new((&config).into())
        .context("failed to initialize the payment gateway")?;
    let services = AppServices::new(db.clone(), event_sender.clone(), payments);

    let state = AppState {
        db,
        config: config.clone(),
        event_sender,
        services,
        auth,
    };

    let app = storefront_api::app_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(&config)?);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Shutdown complete");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> anyhow::Result<CorsLayer> {
    match config.cors_allowed_origins.as_deref() {
        Some(origins) => {
            let parsed: Vec<axum::http::HeaderValue> = origins
                .split(',')
                .map(|origin| origin.trim().parse())
                .collect::<Result<_, _>>()
                .context("invalid origin in cors_allowed_origins")?;
            Ok(CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any))
        }
        None if config.is_development() => Ok(CorsLayer::permissive()),
        None => Ok(CorsLayer::new()),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl-c, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}

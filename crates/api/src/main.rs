use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vigil_ml::StubSource;
use vigil_pipeline::media::FfmpegExtractor;
use vigil_pipeline::processor::{AttributeSource, PipelineConfig};
use vigil_pipeline::registry::JobRegistry;

use vigil_api::config::ServerConfig;
use vigil_api::router::build_app_router;
use vigil_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vigil_api=debug,vigil_pipeline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = vigil_db::create_pool(&database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    vigil_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    vigil_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Media root ---
    tokio::fs::create_dir_all(config.uploads_dir())
        .await
        .expect("Failed to create media root");

    // --- Inference backends ---
    // Stub backends stand in for the detection/classification models;
    // STUB_SEED makes their output reproducible across runs.
    let seed: u64 = std::env::var("STUB_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let stub = Arc::new(StubSource::new(seed));
    let source = AttributeSource {
        detector: stub.clone(),
        classifier: stub.clone(),
        segmenter: stub,
    };

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        registry: Arc::new(JobRegistry::new()),
        pipeline: PipelineConfig::new(config.media_root.clone()),
        source,
        extractor: Arc::new(FfmpegExtractor),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

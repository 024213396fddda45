//! Server initialization and routing

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id, track_metrics};
use crate::routes::{api_info, health, nlp, not_found};
use crate::state::ServerState;
use crate::telemetry::{init_tracing, install_prometheus};
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use triage::TriageConfig;

/// Build the Axum router with all routes and middleware
///
/// Middleware stack (outermost last):
/// 1. Metrics
/// 2. Timeout
/// 3. Compression
/// 4. CORS
/// 5. Request logging
/// 6. Request ID tracking
/// 7. Tracing spans
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let nlp_routes = Router::new()
        .route("/api/nlp/analyze-report", post(nlp::analyze_report))
        .route("/api/nlp/pipeline", post(nlp::pipeline))
        .route("/api/nlp/embed", post(nlp::embed))
        .route("/api/nlp/find-duplicates", post(nlp::find_duplicates))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()));

    Router::new()
        .merge(public_routes)
        .merge(nlp_routes)
        .fallback(not_found)
        .layer(from_fn(track_metrics))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the triage HTTP server
///
/// Loads the pipeline config (file from `pipeline_config`, then
/// environment overrides), starts listening immediately and warms the
/// models in the background; `/ready` answers 503 until warm-up finishes.
/// Blocks until SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config.log_level);

    let triage_config = TriageConfig::load(config.pipeline_config.as_deref())?;
    let mut state = ServerState::from_triage_config(config.clone(), &triage_config)?;
    if config.metrics_enabled {
        state = state.with_prometheus(install_prometheus()?);
    }
    let state = Arc::new(state);

    spawn_warm_up(Arc::clone(&state));

    let app = build_router(state);
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        %addr,
        timeout_secs = config.timeout_secs,
        max_body_mb = config.max_body_size_mb,
        cors = config.enable_cors,
        metrics = config.metrics_enabled,
        embedding_model = %triage_config.semantic.model_name,
        use_gpu = triage_config.semantic.use_gpu,
        "starting triage server"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Runs warm-up off the request path, then flips readiness.
pub fn spawn_warm_up(state: Arc<ServerState>) {
    tokio::spawn(async move {
        if !state.config.warm_up {
            tracing::info!("warm-up disabled; ready immediately");
            state.mark_ready(None).await;
            return;
        }

        let report = state.pipeline.warm_up().await;
        tracing::info!(
            mandatory_ready = report.mandatory_ready(),
            embeddings_ready = report.embeddings_ready(),
            accelerator = report.accelerator.as_str(),
            "warm-up finished"
        );
        state.mark_ready(Some(report)).await;
    });
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

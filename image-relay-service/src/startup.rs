//! Application startup and lifecycle management.

use crate::config::RelayServiceConfig;
use crate::handlers::{self, generate::generate};
use crate::services::{GeminiUpstream, ImageUpstream, RelayHandler};
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::middleware::from_fn;
use axum::routing::{any, get};
use axum::Router;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    tracing::{http_request_span, request_id_middleware, REQUEST_ID_HEADER},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: RelayServiceConfig,
    pub relay: RelayHandler,
}

/// Build the HTTP router with all routes and layers.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.http.allowed_origins);
    let body_limit = DefaultBodyLimit::max(state.config.http.max_body_bytes);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/api/generate", any(generate))
        .layer(body_limit)
        .layer(cors)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(http_request_span::<Body>))
        // Outermost, so the span above already sees the request id.
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)]);

    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", origin, e);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: RelayServiceConfig) -> Result<Self, AppError> {
        let upstream: Arc<dyn ImageUpstream> =
            Arc::new(GeminiUpstream::new(config.gemini.upstream_config()).map_err(|e| {
                tracing::error!("Failed to create Gemini HTTP client: {}", e);
                AppError::InternalError(e)
            })?);

        let relay = RelayHandler::new(upstream, config.gemini.api_key.clone(), config.relay);

        if relay.has_credential() {
            tracing::info!(
                model = %config.gemini.model,
                strict_validation = relay.options().strict_validation,
                safety_settings = relay.options().include_safety_settings,
                timeout_secs = ?config.gemini.timeout_secs,
                "Initialized Gemini image relay"
            );
        } else {
            tracing::warn!(
                "GEMINI_API_KEY not configured - generation requests will fail until it is set"
            );
        }

        let state = AppState {
            config: config.clone(),
            relay,
        };
        let router = build_router(state);

        // Port 0 picks a random port for testing.
        let address = config.common.bind_address();
        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Image relay service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

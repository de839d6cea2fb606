//! # Inkcard HTTP API
//!
//! REST surface over the distribution facade, built on axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /public/cards/{id}` - Public card page data (records a view)
//! - `GET /cards/{id}/render` - Render tree
//! - `GET /cards/{id}/print` - Print layout with safety violations
//! - `GET /cards/{id}/vcard` - vCard download
//! - `GET /cards/{id}/share` - Public URL for the QR code
//! - `POST /cards/{id}/views` - Record a view
//! - `GET /cards/{id}/stats` - View counters
//! - `GET|PUT|PATCH|DELETE /cards/{id}` - Card records
//! - `GET /owners/{id}/cards` - Cards of one owner
//! - `GET /templates`, `PUT|DELETE /templates/{id}` - Template records
//!
//! CORS origins and the rate limit come from [`ServerConfig`].

mod handlers;
mod middleware;
mod types;

pub use handlers::{PeerAddr, status_for, viewer_from_headers, viewer_identity};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    CardListResponse, CardResponse, DeleteResponse, ErrorResponse, HealthResponse,
    LAYOUT_UNAVAILABLE, PrintResponse, PublicCardResponse, RenderResponse, ShareResponse,
    StatsResponse, TemplateListResponse, TemplateResponse, TemplateSummary, ViewRequest,
    ViewResponse, error_code,
};

use crate::config::ServerConfig;
use crate::distribution::Distribution;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Largest accepted request body. Templates are the biggest payloads.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub distribution: Arc<Distribution>,
}

impl AppState {
    #[must_use]
    pub fn new(distribution: Distribution) -> Self {
        Self {
            distribution: Arc::new(distribution),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// Build the CORS layer from `cors_origins`.
///
/// - `"*"`: any origin
/// - a comma-separated list: those origins
/// - unset, or nothing parseable: localhost only
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins.map(str::trim) {
        Some("*") => {
            tracing::warn!("CORS: allowing all origins");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!(origin, error = %e, "CORS: ignoring invalid origin");
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: no valid origins configured, using localhost only");
                build_localhost_cors()
            } else {
                tracing::info!(count = allowed.len(), "CORS: origins configured");
                CorsLayer::new()
                    .allow_origin(allowed)
                    .allow_methods(ALLOWED_METHODS)
                    .allow_headers([header::CONTENT_TYPE])
            }
        }
        None => build_localhost_cors(),
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|o| o.parse().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate limit.
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = build_cors_layer(server.cors_origins.as_deref());

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/public/cards/{id}", get(handlers::public_card_handler))
        .route(
            "/cards/{id}",
            get(handlers::get_card_handler)
                .put(handlers::put_card_handler)
                .patch(handlers::patch_card_handler)
                .delete(handlers::delete_card_handler),
        )
        .route("/owners/{id}/cards", get(handlers::owner_cards_handler))
        .route("/cards/{id}/render", get(handlers::render_handler))
        .route("/cards/{id}/print", get(handlers::print_handler))
        .route("/cards/{id}/vcard", get(handlers::vcard_handler))
        .route("/cards/{id}/share", get(handlers::share_handler))
        .route("/cards/{id}/views", post(handlers::record_view_handler))
        .route("/cards/{id}/stats", get(handlers::stats_handler))
        .route("/templates", get(handlers::list_templates_handler))
        .route(
            "/templates/{id}",
            put(handlers::put_template_handler).delete(handlers::delete_template_handler),
        );

    match create_rate_limiter(server.rate_limit) {
        Some(limiter) => {
            tracing::info!(rps = server.rate_limit, "Rate limiting enabled");
            router = router.layer(axum_middleware::from_fn_with_state(
                limiter,
                middleware::rate_limit_middleware,
            ));
        }
        None => tracing::info!("Rate limiting disabled"),
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind and serve until Ctrl+C.
pub async fn run_server(
    server: &ServerConfig,
    distribution: Distribution,
) -> Result<(), std::io::Error> {
    let router = create_router(AppState::new(distribution), server);
    let addr = server.bind_addr();

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, site_base = %server.site_base, "Inkcard HTTP server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

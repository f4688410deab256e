/// Vowmail API - HTTP service for the Vowmail guest email pipeline
///
/// This module contains the REST API handlers for webhook ingestion and the
/// admin send/schedule/cancel operations.
pub mod api;
pub mod context;
pub mod crypto;
pub mod error;

pub use context::ApiContext;
pub use error::ApiError;

use axum::{
    Router,
    http::{Method, header},
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Builds the application router with all routes under `/v1`.
pub fn router(ctx: Arc<ApiContext>) -> Router {
    let v1_router = Router::new()
        // Health endpoint
        .route("/health", get(api::health::handler))
        // Provider webhook ingestion
        .route("/webhooks/provider", post(api::webhook::provider))
        // Admin email endpoints
        .route("/weddings/{id}/emails/send", post(api::emails::send))
        .route("/weddings/{id}/emails/queue", post(api::emails::queue))
        .route("/weddings/{id}/emails/schedule", post(api::emails::schedule))
        .route("/weddings/{id}/emails", get(api::emails::list))
        .route("/weddings/{id}/emails/stats", get(api::emails::stats))
        .route("/weddings/{id}/emails/scheduled", get(api::emails::scheduled))
        .route("/emails/scheduled/{id}", delete(api::emails::cancel));

    Router::new()
        .nest("/v1", v1_router)
        // CORS for the admin dashboard
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
        .with_state(ctx)
}

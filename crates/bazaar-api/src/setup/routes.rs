//! Route configuration and setup

use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use bazaar_core::Config;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Largest request body the router accepts: a full budget of images, one
/// part of slack for multipart framing, and the drain allowance for excess parts.
pub fn request_body_limit(config: &Config) -> usize {
    let drain = usize::try_from(config.upload_drain_limit_bytes()).unwrap_or(usize::MAX);
    config
        .max_file_size_bytes()
        .saturating_mul(config.max_listing_images().saturating_add(1))
        .saturating_add(drain)
}

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Router<()> {
    let body_limit = request_body_limit(config);
    tracing::info!(body_limit_bytes = body_limit, "Request body limit configured");

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            &format!("{}/uploads/progress/{{token}}", API_PREFIX),
            get(handlers::progress::upload_progress),
        )
        .route(
            &format!("{}/uploads/{{media}}/{{media_id}}", API_PREFIX),
            post(handlers::upload::upload_images),
        )
        .route(
            &format!("{}/images/{{name}}", API_PREFIX),
            delete(handlers::images::delete_image),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::PipelineConfig;

    #[test]
    fn test_request_body_limit() {
        let config = Config::from(PipelineConfig {
            max_file_size_bytes: 100,
            max_listing_images: 3,
            upload_drain_limit_bytes: 1000,
            ..PipelineConfig::default()
        });
        assert_eq!(request_body_limit(&config), 1400);
    }
}

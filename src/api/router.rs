//! Service router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Route paths follow the original service contract; CORS is permissive so
//! the form-based client can be served from a different origin.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the service router with all endpoints.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/patients",
            post(endpoints::patients::create).get(endpoints::patients::list),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route(
            "/patients/:id/consultations",
            get(endpoints::consultations::list_for_patient),
        )
        .route(
            "/generate_observation",
            post(endpoints::generate::from_history),
        )
        .route(
            "/upload_pdf_and_generate_observation",
            post(endpoints::generate::from_document),
        )
        // Room for the largest accepted PDF plus multipart framing.
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

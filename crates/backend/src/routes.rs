use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::get,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::{api::handlers, state::AppState};

// Embedded data-URL images make record payloads large; match the original
// deployment's 2 MiB body cap.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// All application routes.
pub fn configure_routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/api/goats",
            get(handlers::goats::list).post(handlers::goats::create),
        )
        .route(
            "/api/goats/:id",
            get(handlers::goats::get_by_id)
                .patch(handlers::goats::update)
                .delete(handlers::goats::delete),
        )
        .fallback_service(ServeDir::new("public"))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

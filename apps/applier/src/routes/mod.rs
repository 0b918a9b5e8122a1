pub mod health;

use axum::{routing::get, Router};

use crate::state::AppState;
use crate::tracker::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Application report API (read-only)
        .route(
            "/api/v1/applications",
            get(handlers::handle_list_applications),
        )
        .route(
            "/api/v1/applications/stats",
            get(handlers::handle_application_stats),
        )
        .route(
            "/api/v1/applications/search",
            get(handlers::handle_search_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(handlers::handle_get_application),
        )
        .with_state(state)
}

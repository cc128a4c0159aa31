use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::cases::handlers;
use crate::features::cases::services::CaseService;

/// Create routes for the cases feature
///
/// Note: This feature requires authentication
pub fn routes(service: Arc<CaseService>) -> Router {
    Router::new()
        .route(
            "/api/cases",
            get(handlers::list_cases).post(handlers::create_case),
        )
        .route("/api/cases/stats", get(handlers::get_stats))
        .route(
            "/api/cases/{id}",
            get(handlers::get_case).put(handlers::update_case),
        )
        .with_state(service)
}

use std::sync::Arc;

use axum::{
    routing::{delete, get, put},
    Router,
};

use crate::features::admin::handlers::{self, AdminState};
use crate::features::cases::services::CaseService;
use crate::features::users::services::UserService;

/// Create admin routes (all require admin access)
///
/// Nested under `/api/admin` by the caller
pub fn routes(user_service: Arc<UserService>, case_service: Arc<CaseService>) -> Router {
    let state = AdminState {
        user_service,
        case_service,
    };

    Router::new()
        .route(
            "/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/users/{id}", delete(handlers::delete_user))
        .route("/cases/{id}/severity", put(handlers::assign_severity))
        .with_state(state)
}

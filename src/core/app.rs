//! Router assembly shared by the server binary and the router tests.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, Router};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::core::config::{AppConfig, SwaggerConfig};
use crate::core::middleware;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::features::admin::routes as admin_routes;
use crate::features::auth::routes as auth_routes;
use crate::features::auth::AuthService;
use crate::features::cases::{routes as cases_routes, CaseService};
use crate::features::users::UserService;

/// Services the HTTP layer dispatches to
#[derive(Clone)]
pub struct AppServices {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub case_service: Arc<CaseService>,
}

// Simple health check endpoint (no auth required)
async fn health_check() -> axum::http::StatusCode {
    axum::http::StatusCode::OK
}

fn swagger_routes(swagger: &SwaggerConfig) -> Router {
    let swagger_modifier = SwaggerInfoModifier {
        title: swagger.title.clone(),
        version: swagger.version.clone(),
        description: swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    if let Some(credentials) = swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::docs_basic_auth,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    }
}

/// Build the application router with all layers applied
pub fn build_router(services: AppServices, app: &AppConfig, swagger: &SwaggerConfig) -> Router {
    // Protected routes (require JWT authentication)
    let protected_routes = Router::new()
        .merge(auth_routes::protected_routes(Arc::clone(
            &services.auth_service,
        )))
        .merge(cases_routes::routes(Arc::clone(&services.case_service)))
        .nest(
            "/api/admin",
            admin_routes::routes(
                Arc::clone(&services.user_service),
                Arc::clone(&services.case_service),
            ),
        )
        .route_layer(from_fn_with_state(
            Arc::clone(&services.auth_service),
            middleware::auth_middleware,
        ));

    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    // Public routes (no auth required)
    let public_routes = Router::new().merge(auth_routes::public_routes(services.auth_service));

    Router::new()
        .merge(swagger_routes(swagger))
        .merge(protected_routes)
        .merge(public_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(app.max_request_body_size))
        .layer(middleware::cors_layer(&app.cors_allowed_origins))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::RequestSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::RequestIdV7))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{DateTime, Utc};
    use serde_json::json;

    use crate::features::auth::dtos::AuthResponseDto;
    use crate::features::cases::dtos::{CaseResponseDto, CaseStatsDto};
    use crate::features::cases::models::{CaseStatus, Severity, SlaStatus};
    use crate::features::users::dtos::UserResponseDto;
    use crate::features::users::models::Role;
    use crate::shared::test_helpers::TestApp;
    use crate::shared::types::ApiResponse;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    async fn report_case(app: &TestApp, token: &str) -> CaseResponseDto {
        let response = app
            .server
            .post("/api/cases")
            .authorization_bearer(token)
            .json(&json!({
                "case_title": "VPN down",
                "problem_description": "Cannot connect to the office VPN"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response
            .json::<ApiResponse<CaseResponseDto>>()
            .data
            .unwrap()
    }

    async fn assign(
        app: &TestApp,
        token: &str,
        id: uuid::Uuid,
        severity: &str,
    ) -> CaseResponseDto {
        let response = app
            .server
            .put(&format!("/api/admin/cases/{}/severity", id))
            .authorization_bearer(token)
            .json(&json!({ "severity": severity }))
            .await;
        response.assert_status_ok();
        response
            .json::<ApiResponse<CaseResponseDto>>()
            .data
            .unwrap()
    }

    async fn set_status(
        app: &TestApp,
        token: &str,
        id: uuid::Uuid,
        status: &str,
    ) -> CaseResponseDto {
        let response = app
            .server
            .put(&format!("/api/cases/{}", id))
            .authorization_bearer(token)
            .json(&json!({ "status": status, "solution_details": "Restarted the gateway" }))
            .await;
        response.assert_status_ok();
        response
            .json::<ApiResponse<CaseResponseDto>>()
            .data
            .unwrap()
    }

    async fn fetch(app: &TestApp, token: &str, id: uuid::Uuid) -> CaseResponseDto {
        let response = app
            .server
            .get(&format!("/api/cases/{}", id))
            .authorization_bearer(token)
            .await;
        response.assert_status_ok();
        response
            .json::<ApiResponse<CaseResponseDto>>()
            .data
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        app.server.get("/health").await.assert_status_ok();
    }

    #[tokio::test]
    async fn test_new_case_is_pending_assignment() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (user, token) = app.create_user("user1", Role::User).await;

        let case = report_case(&app, &token).await;

        assert_eq!(case.status, CaseStatus::Open);
        assert_eq!(case.severity, None);
        assert_eq!(case.due_date, None);
        assert_eq!(case.sla_status, SlaStatus::PendingAssignment);
        assert_eq!(case.reported_by, user.full_name);
    }

    #[tokio::test]
    async fn test_critical_case_goes_overdue() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, user_token) = app.create_user("user1", Role::User).await;
        let (admin, admin_token) = app.create_user("admin", Role::Admin).await;

        let case = report_case(&app, &user_token).await;
        let assigned = assign(&app, &admin_token, case.id, "Critical").await;

        assert_eq!(assigned.severity, Some(Severity::Critical));
        assert_eq!(assigned.due_date, Some(ts("2025-01-02T00:00:00Z")));
        assert_eq!(assigned.assigned_by_user_id, Some(admin.id));
        assert_eq!(assigned.sla_status, SlaStatus::InProgress);

        app.clock.set(ts("2025-01-03T00:00:00Z"));
        let fetched = fetch(&app, &user_token, case.id).await;
        assert_eq!(fetched.status, CaseStatus::Open);
        assert_eq!(fetched.sla_status, SlaStatus::Overdue);
    }

    #[tokio::test]
    async fn test_resolution_before_due_date_meets_sla() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, user_token) = app.create_user("user1", Role::User).await;
        let (_, admin_token) = app.create_user("admin", Role::Admin).await;

        let case = report_case(&app, &user_token).await;
        assign(&app, &admin_token, case.id, "Critical").await;

        app.clock.set(ts("2025-01-01T12:00:00Z"));
        let resolved = set_status(&app, &user_token, case.id, "Resolved").await;
        assert_eq!(resolved.resolved_at, Some(ts("2025-01-01T12:00:00Z")));
        assert_eq!(
            resolved.solution_details.as_deref(),
            Some("Restarted the gateway")
        );
        assert_eq!(resolved.sla_status, SlaStatus::Met);

        // The label is frozen once resolved
        app.clock.set(ts("2025-02-01T00:00:00Z"));
        assert_eq!(fetch(&app, &user_token, case.id).await.sla_status, SlaStatus::Met);
    }

    #[tokio::test]
    async fn test_late_resolution_breaches_sla() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, user_token) = app.create_user("user1", Role::User).await;
        let (_, admin_token) = app.create_user("admin", Role::Admin).await;

        let case = report_case(&app, &user_token).await;
        assign(&app, &admin_token, case.id, "Major").await;

        app.clock.set(ts("2025-01-02T00:00:00Z"));
        let in_progress = set_status(&app, &user_token, case.id, "In Progress").await;
        assert_eq!(in_progress.status, CaseStatus::InProgress);
        assert_eq!(in_progress.resolved_at, None);

        app.clock.set(ts("2025-01-05T00:00:00Z"));
        let resolved = set_status(&app, &user_token, case.id, "Resolved").await;
        assert_eq!(resolved.sla_status, SlaStatus::Breached);
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, user_token) = app.create_user("user1", Role::User).await;
        let (_, admin_token) = app.create_user("admin", Role::Admin).await;

        let first = report_case(&app, &user_token).await;
        app.clock.set(ts("2025-01-01T01:00:00Z"));
        let second = report_case(&app, &user_token).await;
        assign(&app, &admin_token, first.id, "Critical").await;

        app.clock.set(ts("2025-01-03T00:00:00Z"));
        let response = app
            .server
            .get("/api/cases")
            .authorization_bearer(&user_token)
            .await;
        response.assert_status_ok();
        let body = response.json::<ApiResponse<Vec<CaseResponseDto>>>();
        let ids: Vec<_> = body.data.unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(body.meta.map(|m| m.total), Some(2));

        let stats = app
            .server
            .get("/api/cases/stats")
            .authorization_bearer(&user_token)
            .await
            .json::<ApiResponse<CaseStatsDto>>()
            .data
            .unwrap();
        assert_eq!(
            stats,
            CaseStatsDto {
                total: 2,
                open: 2,
                overdue: 1,
                resolved: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_cases_require_token() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));

        app.server
            .get("/api/cases")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.server
            .get("/api/cases")
            .authorization_bearer("not-a-jwt")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_severity_requires_admin() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, user_token) = app.create_user("user1", Role::User).await;

        let case = report_case(&app, &user_token).await;
        app.server
            .put(&format!("/api/admin/cases/{}/severity", case.id))
            .authorization_bearer(&user_token)
            .json(&json!({ "severity": "Critical" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        assert_eq!(fetch(&app, &user_token, case.id).await.severity, None);
    }

    #[tokio::test]
    async fn test_invalid_enum_values_are_rejected() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, user_token) = app.create_user("user1", Role::User).await;
        let (_, admin_token) = app.create_user("admin", Role::Admin).await;
        let case = report_case(&app, &user_token).await;

        app.server
            .put(&format!("/api/admin/cases/{}/severity", case.id))
            .authorization_bearer(&admin_token)
            .json(&json!({ "severity": "Urgent" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        app.server
            .put(&format!("/api/cases/{}", case.id))
            .authorization_bearer(&user_token)
            .json(&json!({ "status": "Closed" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bad_pagination_is_rejected() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, token) = app.create_user("user1", Role::User).await;

        app.server
            .get("/api/cases")
            .add_query_param("page", "first")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_far_past_the_end_is_empty() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, token) = app.create_user("user1", Role::User).await;
        report_case(&app, &token).await;

        let response = app
            .server
            .get("/api/cases")
            .add_query_param("page", i64::MAX)
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let body = response.json::<ApiResponse<Vec<CaseResponseDto>>>();
        assert!(body.data.unwrap().is_empty());
        assert_eq!(body.meta.map(|m| m.total), Some(1));
    }

    #[tokio::test]
    async fn test_unknown_case_is_not_found() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, token) = app.create_user("user1", Role::User).await;

        app.server
            .get(&format!("/api/cases/{}", uuid::Uuid::now_v7()))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_register_login_and_me() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));

        let registered = app
            .server
            .post("/api/register")
            .json(&json!({
                "username": "newuser",
                "password": "secret123",
                "full_name": "New User"
            }))
            .await;
        registered.assert_status(StatusCode::CREATED);
        let registered = registered.json::<ApiResponse<AuthResponseDto>>().data.unwrap();
        assert_eq!(registered.user.role, Role::User);

        app.server
            .post("/api/login")
            .json(&json!({ "username": "newuser", "password": "wrong-password" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let login = app
            .server
            .post("/api/login")
            .json(&json!({ "username": "newuser", "password": "secret123" }))
            .await;
        login.assert_status_ok();
        let login = login.json::<ApiResponse<AuthResponseDto>>().data.unwrap();
        assert_eq!(login.token_type, "Bearer");

        let me = app
            .server
            .get("/api/me")
            .authorization_bearer(&login.token)
            .await;
        me.assert_status_ok();
        let me = me.json::<ApiResponse<serde_json::Value>>().data.unwrap();
        assert_eq!(me["username"], "newuser");
        assert_eq!(me["role"], "user");
    }

    #[tokio::test]
    async fn test_admin_manages_users_but_not_itself() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (admin, admin_token) = app.create_user("admin", Role::Admin).await;

        let created = app
            .server
            .post("/api/admin/users")
            .authorization_bearer(&admin_token)
            .json(&json!({
                "username": "user2",
                "password": "user123",
                "full_name": "Second User",
                "role": "user"
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let created = created.json::<ApiResponse<UserResponseDto>>().data.unwrap();

        app.server
            .delete(&format!("/api/admin/users/{}", admin.id))
            .authorization_bearer(&admin_token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(app.users.count().await.unwrap(), 2);

        app.server
            .delete(&format!("/api/admin/users/{}", created.id))
            .authorization_bearer(&admin_token)
            .await
            .assert_status_ok();

        let listed = app
            .server
            .get("/api/admin/users")
            .authorization_bearer(&admin_token)
            .await
            .json::<ApiResponse<Vec<UserResponseDto>>>();
        assert_eq!(listed.meta.map(|m| m.total), Some(1));
    }

    #[tokio::test]
    async fn test_token_of_deleted_account_is_rejected() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (admin, admin_token) = app.create_user("admin", Role::Admin).await;
        let (other_admin, other_token) = app.create_user("admin2", Role::Admin).await;
        let (user, user_token) = app.create_user("user1", Role::User).await;
        let case = report_case(&app, &user_token).await;

        app.users.delete(admin.id, user.id).await.unwrap();
        app.users.delete(admin.id, other_admin.id).await.unwrap();

        app.server
            .post("/api/cases")
            .authorization_bearer(&user_token)
            .json(&json!({
                "case_title": "Printer jam",
                "problem_description": "Paper stuck in tray 2"
            }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.server
            .get("/api/me")
            .authorization_bearer(&user_token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        app.server
            .put(&format!("/api/admin/cases/{}/severity", case.id))
            .authorization_bearer(&other_token)
            .json(&json!({ "severity": "Minor" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        assert_eq!(fetch(&app, &admin_token, case.id).await.severity, None);
    }

    #[tokio::test]
    async fn test_admin_routes_reject_regular_users() {
        let app = TestApp::new(ts("2025-01-01T00:00:00Z"));
        let (_, user_token) = app.create_user("user1", Role::User).await;

        app.server
            .get("/api/admin/users")
            .authorization_bearer(&user_token)
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::app::{build_router, AppServices};
use crate::core::clock::Clock;
use crate::core::config::{AppConfig, AuthConfig, SwaggerConfig};
use crate::core::error::{AppError, Result};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::{AuthService, TokenService};
use crate::features::cases::models::{Case, NewCase, SeverityAssignment, StatusChange};
use crate::features::cases::repository::CaseRepository;
use crate::features::cases::CaseService;
use crate::features::users::dtos::CreateUserDto;
use crate::features::users::models::{NewUser, Role, User};
use crate::features::users::repository::UserRepository;
use crate::features::users::UserService;

/// Clock pinned to a settable instant
#[derive(Debug)]
pub struct FixedClock(Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.0.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

pub fn admin_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::now_v7(),
        username: "admin".to_string(),
        full_name: "Somchai Admin".to_string(),
        role: Role::Admin,
    }
}

pub fn regular_user() -> AuthenticatedUser {
    AuthenticatedUser {
        id: Uuid::now_v7(),
        username: "user1".to_string(),
        full_name: "Somying Rakngan".to_string(),
        role: Role::User,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCaseRepository {
    cases: Mutex<Vec<Case>>,
}

impl InMemoryCaseRepository {
    fn modify(&self, id: Uuid, f: impl FnOnce(&mut Case)) -> Option<Case> {
        let mut cases = self.cases.lock().unwrap();
        let case = cases.iter_mut().find(|c| c.id == id)?;
        f(case);
        Some(case.clone())
    }

    fn newest_first(&self) -> Vec<Case> {
        let mut cases = self.cases.lock().unwrap().clone();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        cases
    }
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn get(&self, id: Uuid) -> Result<Option<Case>> {
        Ok(self
            .cases
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn list_page(&self, offset: i64, limit: i64) -> Result<(Vec<Case>, i64)> {
        let cases = self.newest_first();
        let total = cases.len() as i64;
        let page = cases
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }

    async fn list_all(&self) -> Result<Vec<Case>> {
        Ok(self.newest_first())
    }

    async fn insert(&self, data: NewCase, now: DateTime<Utc>) -> Result<Case> {
        let case = Case::new(data, now);
        self.cases.lock().unwrap().push(case.clone());
        Ok(case)
    }

    async fn update_status(
        &self,
        id: Uuid,
        change: &StatusChange,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>> {
        Ok(self.modify(id, |case| case.apply_status_change(change, now)))
    }

    async fn assign_severity(
        &self,
        id: Uuid,
        assignment: &SeverityAssignment,
        now: DateTime<Utc>,
    ) -> Result<Option<Case>> {
        Ok(self.modify(id, |case| case.assign_severity(assignment, now)))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(users)
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.users.lock().unwrap().len() as i64)
    }

    async fn insert(&self, data: NewUser, now: DateTime<Utc>) -> Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.username == data.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                data.username
            )));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: data.username,
            password_hash: data.password_hash,
            full_name: data.full_name,
            role: data.role,
            created_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.users.lock().unwrap().remove(&id).is_some())
    }
}

/// Full router backed by in-memory repositories
pub struct TestApp {
    pub server: TestServer,
    pub clock: Arc<FixedClock>,
    pub users: Arc<UserService>,
    pub tokens: Arc<TokenService>,
}

impl TestApp {
    pub fn new(now: DateTime<Utc>) -> Self {
        let clock = Arc::new(FixedClock::at(now));
        let tokens = Arc::new(TokenService::new(&AuthConfig {
            jwt_secret: "test-secret-that-is-at-least-32-bytes".to_string(),
            issuer: "casedesk-test".to_string(),
            token_ttl: Duration::from_secs(3600),
            jwt_leeway: Duration::from_secs(0),
        }));
        let users = Arc::new(UserService::new(
            Arc::new(InMemoryUserRepository::default()),
            clock.clone(),
        ));
        let cases = Arc::new(CaseService::new(
            Arc::new(InMemoryCaseRepository::default()),
            clock.clone(),
        ));

        let services = AppServices {
            auth_service: Arc::new(AuthService::new(users.clone(), tokens.clone())),
            user_service: users.clone(),
            case_service: cases,
        };
        let app = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_allowed_origins: vec!["*".to_string()],
            max_request_body_size: 1024 * 1024,
        };
        let swagger = SwaggerConfig {
            username: None,
            password: None,
            title: "Casedesk API".to_string(),
            version: "0.1.0".to_string(),
            description: "Test".to_string(),
        };

        let server = TestServer::new(build_router(services, &app, &swagger)).unwrap();

        Self {
            server,
            clock,
            users,
            tokens,
        }
    }

    /// Create an account directly and return it with a bearer token
    pub async fn create_user(&self, username: &str, role: Role) -> (User, String) {
        let created = self
            .users
            .create(CreateUserDto {
                username: username.to_string(),
                password: "secret123".to_string(),
                full_name: format!("{} Test", username),
                role,
            })
            .await
            .unwrap();
        let user = self.users.find_by_id(created.id).await.unwrap();
        let token = self.tokens.issue_token(&user).unwrap().access_token;
        (user, token)
    }
}

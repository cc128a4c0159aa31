use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    AuthResponseDto, AuthUserDto, LoginRequestDto, RegisterRequestDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::services::TokenService;
use crate::features::users::dtos::CreateUserDto;
use crate::features::users::models::{Role, User};
use crate::features::users::UserService;

/// Service for authentication operations (register, login)
pub struct AuthService {
    users: Arc<UserService>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<UserService>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    /// Self-service signup; always creates a regular user
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        let created = self
            .users
            .create(CreateUserDto {
                username: dto.username,
                password: dto.password,
                full_name: dto.full_name,
                role: Role::User,
            })
            .await?;

        let user = self.users.find_by_id(created.id).await?;
        self.respond_with_token(&user)
    }

    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = self
            .users
            .authenticate(&dto.username, &dto.password)
            .await?
            .ok_or_else(|| {
                tracing::info!("Failed login attempt for username={}", dto.username);
                AppError::Unauthorized("Invalid username or password".to_string())
            })?;

        tracing::info!("User logged in: username={}", user.username);

        self.respond_with_token(&user)
    }

    /// Validate a bearer token and load the caller's current account.
    ///
    /// A token for a deleted account is rejected even before it expires, and the
    /// role comes from the stored account rather than the token.
    pub async fn resolve_token(&self, token: &str) -> Result<AuthenticatedUser> {
        let claimed = self.tokens.validate_token(token)?;

        match self.users.find_by_id(claimed.id).await {
            Ok(user) => Ok(AuthenticatedUser::from(&user)),
            Err(AppError::NotFound(_)) => {
                tracing::info!("Token presented for deleted user id={}", claimed.id);
                Err(AppError::Unauthorized("Account no longer exists".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn current_user(&self, user: AuthenticatedUser) -> AuthUserDto {
        user.into()
    }

    fn respond_with_token(&self, user: &User) -> Result<AuthResponseDto> {
        let issued = self.tokens.issue_token(user)?;

        Ok(AuthResponseDto {
            token: issued.access_token,
            token_type: "Bearer".to_string(),
            expires_in: issued.expires_in,
            user: AuthenticatedUser::from(user).into(),
        })
    }
}

use std::sync::Arc;
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::error::{AppError, Result};
use crate::features::auth::password;
use crate::features::users::dtos::{CreateUserDto, UserResponseDto};
use crate::features::users::models::{NewUser, Role, User};
use crate::features::users::repository::UserRepository;

/// Service for account management
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn list(&self) -> Result<Vec<UserResponseDto>> {
        let users = self.repo.list().await?;
        Ok(users.into_iter().map(UserResponseDto::from).collect())
    }

    #[allow(dead_code)]
    pub async fn count(&self) -> Result<i64> {
        self.repo.count().await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User '{}' not found", id)))
    }

    pub async fn create(&self, dto: CreateUserDto) -> Result<UserResponseDto> {
        let password_hash = password::hash_password(&dto.password)?;

        let user = self
            .repo
            .insert(
                NewUser {
                    username: dto.username,
                    password_hash,
                    full_name: dto.full_name,
                    role: dto.role,
                },
                self.clock.now(),
            )
            .await?;

        tracing::info!("User created: username={}, role={}", user.username, user.role);

        Ok(user.into())
    }

    /// Delete `target_id` on behalf of `actor_id`; deleting yourself is rejected
    pub async fn delete(&self, actor_id: Uuid, target_id: Uuid) -> Result<()> {
        if actor_id == target_id {
            return Err(AppError::BadRequest(
                "You cannot delete your own account".to_string(),
            ));
        }

        if !self.repo.delete(target_id).await? {
            return Err(AppError::NotFound(format!("User '{}' not found", target_id)));
        }

        tracing::info!("User deleted: id={}, by={}", target_id, actor_id);

        Ok(())
    }

    /// Check a username/password pair; `None` when either part is wrong
    pub async fn authenticate(
        &self,
        username: &str,
        password_input: &str,
    ) -> Result<Option<User>> {
        let Some(user) = self.repo.find_by_username(username).await? else {
            return Ok(None);
        };

        if password::verify_password(password_input, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Provision an admin account unless the username already exists
    pub async fn ensure_admin(
        &self,
        username: &str,
        password_input: &str,
        full_name: &str,
    ) -> Result<()> {
        if self.repo.find_by_username(username).await?.is_some() {
            tracing::info!("Bootstrap admin '{}' already present", username);
            return Ok(());
        }

        let password_hash = password::hash_password(password_input)?;
        let result = self
            .repo
            .insert(
                NewUser {
                    username: username.to_string(),
                    password_hash,
                    full_name: full_name.to_string(),
                    role: Role::Admin,
                },
                self.clock.now(),
            )
            .await;

        match result {
            Ok(user) => {
                tracing::info!("Bootstrap admin created: username={}", user.username);
                Ok(())
            }
            // Another instance won the race
            Err(AppError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

//! Staff account management

use validator::Validate;

use super::auth::hash_password;
use crate::{
    error::{AppError, AppResult},
    models::user::{CreateUser, Identity, Role, UpdateUser, User},
    repository::Repository,
};

/// The first administrator, never deleted
const PRIMARY_ADMIN_ID: i32 = 1;

/// Whether `caller` may delete the account `id`
pub fn check_deletable(caller: &Identity, id: i32) -> AppResult<()> {
    if id == PRIMARY_ADMIN_ID {
        return Err(AppError::Conflict(
            "The primary administrator cannot be deleted".to_string(),
        ));
    }
    if id == caller.user_id {
        return Err(AppError::Conflict(
            "You cannot delete your own account".to_string(),
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<User>> {
        self.repository.users.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn create(&self, user: &CreateUser) -> AppResult<User> {
        user.validate()?;
        let hash = hash_password(&user.password)?;
        let created = self
            .repository
            .users
            .create(
                &user.username,
                &hash,
                &user.full_name,
                user.email.as_deref(),
                user.role,
            )
            .await?;
        tracing::info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }

    pub async fn update(&self, id: i32, user: &UpdateUser) -> AppResult<User> {
        user.validate()?;
        let hash = user.password.as_deref().map(hash_password).transpose()?;
        let updated = self
            .repository
            .users
            .update(id, user, hash.as_deref())
            .await?;
        tracing::info!(user_id = id, "User updated");
        Ok(updated)
    }

    pub async fn delete(&self, caller: &Identity, id: i32) -> AppResult<()> {
        check_deletable(caller, id)?;
        self.repository.users.delete(id).await?;
        tracing::info!(user_id = id, deleted_by = caller.user_id, "User deleted");
        Ok(())
    }

    /// Create the `admin` account on an empty user table.
    /// Returns whether an account was created.
    pub async fn ensure_bootstrap_admin(&self, password: Option<&str>) -> AppResult<bool> {
        if self.repository.users.count().await? > 0 {
            return Ok(false);
        }
        let Some(password) = password else {
            tracing::warn!("No users exist and no bootstrap admin password is configured");
            return Ok(false);
        };

        let hash = hash_password(password)?;
        self.repository
            .users
            .create("admin", &hash, "Administrator", None, Role::Admin)
            .await?;
        tracing::info!("Bootstrap administrator account created");
        Ok(true)
    }
}

//! Authentication: password hashing, token issuing and identity resolution

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{Identity, User, UserClaims},
    repository::Repository,
};

/// Resolves a request credential to the caller's identity.
///
/// Handlers only ever see the [`Identity`]; how tokens are issued and
/// stored is up to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve(&self, token: &str) -> AppResult<Identity>;
}

/// Stateless HS256 bearer tokens
#[derive(Clone)]
pub struct JwtIdentityProvider {
    secret: String,
    expiration_hours: i64,
}

impl JwtIdentityProvider {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration_hours: config.jwt_expiration_hours as i64,
        }
    }

    /// Create JWT token for a user
    pub fn issue(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            full_name: user.full_name.clone(),
            role: user.role,
            exp: now + self.expiration_hours * 3600,
            iat: now,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn resolve(&self, token: &str) -> AppResult<Identity> {
        let data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Authentication(e.to_string()))?;
        Ok(data.claims.into())
    }
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    tokens: JwtIdentityProvider,
}

impl AuthService {
    pub fn new(repository: Repository, tokens: JwtIdentityProvider) -> Self {
        Self { repository, tokens }
    }

    /// Authenticate an active user and return a bearer token
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let invalid = || AppError::Authentication("Invalid username or password".to_string());

        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(invalid)?;

        if !verify_password(&user.password_hash, password)? {
            tracing::warn!(username = %user.username, "Rejected login");
            return Err(invalid());
        }

        self.repository.users.touch_last_login(user.id).await?;
        let token = self.tokens.issue(&user)?;

        tracing::info!(user_id = user.id, role = %user.role, "User logged in");
        Ok((token, user))
    }
}

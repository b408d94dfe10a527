//! API handlers for BiblioSys REST endpoints

pub mod auth;
pub mod books;
pub mod catalog;
pub mod health;
pub mod inventory;
pub mod lendings;
pub mod openapi;
pub mod orders;
pub mod settings;
pub mod students;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::Serialize;

use crate::{
    error::{AppError, AppResult},
    models::user::Identity,
    AppState,
};

/// Extractor for the caller's identity, resolved from the bearer token
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Authentication("Invalid authorization header format".to_string())
            })?;

        let identity = state.identity.resolve(token).await?;
        Ok(AuthenticatedUser(identity))
    }
}

/// Success envelope: every JSON body carries `success` and `message`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Self::with_message(data, "OK")
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
        })
    }
}

pub type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::{
        config::AppConfig,
        models::user::Role,
        repository::Repository,
        services::{
            auth::{JwtIdentityProvider, MockIdentityProvider},
            Services,
        },
    };

    fn state(identity: MockIdentityProvider) -> AppState {
        let config = AppConfig::default();
        // Never connects; the extractor does not touch the store
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/bibliosys_unused")
            .unwrap();
        let services = Services::new(
            Repository::new(pool),
            &config,
            JwtIdentityProvider::new(&config.auth),
        );
        AppState {
            config: Arc::new(config),
            services: Arc::new(services),
            identity: Arc::new(identity),
        }
    }

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/books");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_bearer_token_is_resolved() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_resolve()
            .withf(|token| token == "abc123")
            .times(1)
            .returning(|_| {
                Ok(Identity {
                    user_id: 2,
                    username: "bib".into(),
                    full_name: "Frau Bibliothek".into(),
                    role: Role::Librarian,
                })
            });
        let state = state(identity);

        let mut parts = parts(Some("Bearer abc123"));
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(user.user_id, 2);
        assert!(user.require_staff().is_ok());
    }

    #[tokio::test]
    async fn test_missing_or_malformed_header_rejected() {
        let mut identity = MockIdentityProvider::new();
        identity.expect_resolve().never();
        let state = state(identity);

        for header in [None, Some("Basic dXNlcjpwdw=="), Some("Bearer ")] {
            let mut parts = parts(header);
            let result = AuthenticatedUser::from_request_parts(&mut parts, &state).await;
            assert!(matches!(result, Err(AppError::Authentication(_))));
        }
    }

    #[tokio::test]
    async fn test_provider_rejection_propagates() {
        let mut identity = MockIdentityProvider::new();
        identity
            .expect_resolve()
            .returning(|_| Err(AppError::Authentication("expired".into())));
        let state = state(identity);

        let mut parts = parts(Some("Bearer stale"));
        let result = AuthenticatedUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AppError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_role_checked_before_store_access() {
        use axum::{body::Body, http::StatusCode, routing::get, Router};
        use tower::ServiceExt;

        let mut identity = MockIdentityProvider::new();
        identity.expect_resolve().returning(|_| {
            Ok(Identity {
                user_id: 7,
                username: "lehrer".into(),
                full_name: "Herr Lehrer".into(),
                role: Role::User,
            })
        });
        let app = Router::new()
            .route("/books", get(books::list_books))
            .with_state(state(identity));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/books")
                    .header(AUTHORIZATION, "Bearer t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(Request::builder().uri("/books").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

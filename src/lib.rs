//! BiblioSys school library server
//!
//! REST JSON API for the book catalog, students, lendings, supplier orders
//! with barcode issuance, and roster/inventory reconciliation.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Resolves bearer tokens for the auth extractor
    pub identity: Arc<dyn services::auth::IdentityProvider>,
}

//! Business logic services

pub mod auth;
pub mod catalog;
pub mod lending;
pub mod orders;
pub mod quick_return;
pub mod reconciliation;
pub mod settings;
pub mod students;
pub mod users;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub students: students::StudentsService,
    pub lending: lending::LendingService,
    pub quick_return: quick_return::QuickReturnService,
    pub orders: orders::OrdersService,
    pub reconciliation: reconciliation::ReconciliationService,
    pub users: users::UsersService,
    pub settings: settings::SettingsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig, tokens: auth::JwtIdentityProvider) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), tokens),
            catalog: catalog::CatalogService::new(repository.clone()),
            students: students::StudentsService::new(repository.clone()),
            lending: lending::LendingService::new(repository.clone(), config.lending.clone()),
            quick_return: quick_return::QuickReturnService::new(repository.clone()),
            orders: orders::OrdersService::new(repository.clone(), config.orders.clone()),
            reconciliation: reconciliation::ReconciliationService::new(repository.clone()),
            users: users::UsersService::new(repository.clone()),
            settings: settings::SettingsService::new(repository.clone()),
            repository,
        }
    }

    /// Store connectivity, for the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

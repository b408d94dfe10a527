//! Repository layer for database operations

pub mod books;
pub mod catalog;
pub mod lendings;
pub mod orders;
pub mod settings;
pub mod students;
pub mod table;
pub mod users;

use sqlx::{Pool, Postgres, Transaction};

use crate::error::{AppError, AppResult};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub students: students::StudentsRepository,
    pub lendings: lendings::LendingsRepository,
    pub orders: orders::OrdersRepository,
    pub categories: catalog::CategoriesRepository,
    pub suppliers: catalog::SuppliersRepository,
    pub users: users::UsersRepository,
    pub settings: settings::SettingsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            students: students::StudentsRepository::new(pool.clone()),
            lendings: lendings::LendingsRepository::new(pool.clone()),
            orders: orders::OrdersRepository::new(pool.clone()),
            categories: catalog::CategoriesRepository::new(pool.clone()),
            suppliers: catalog::SuppliersRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            settings: settings::SettingsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the store, used by the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Roll back explicitly, then surface the business error that aborted the
/// transaction.
pub(crate) async fn abort<T>(tx: Transaction<'_, Postgres>, err: AppError) -> AppResult<T> {
    tx.rollback().await?;
    Err(err)
}

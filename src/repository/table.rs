//! Generic table access shared by every catalog entity.
//!
//! Entity-specific repositories keep their own writes and joins; lookups,
//! paginated search and deletes by key are implemented once here.

use std::fmt::Display;
use std::marker::PhantomData;

use sqlx::{postgres::PgRow, Encode, FromRow, Pool, Postgres, QueryBuilder, Type};

use crate::{
    error::{AppError, AppResult},
    models::{Page, PageQuery},
};

/// A row type living in one table (aliased `t` in generated SQL)
pub trait Record: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    /// Human-readable entity name used in error messages
    const LABEL: &'static str;
    const TABLE: &'static str;
    /// Primary key column
    const KEY: &'static str;
    /// Selected columns; joined tables may add computed fields
    const COLUMNS: &'static str = "t.*";
    const JOINS: &'static str = "";
    /// Columns matched case-insensitively by the search term
    const SEARCH_COLUMNS: &'static [&'static str];
    const ORDER_BY: &'static str;
}

/// Extra equality filter for [`Table::search`]
#[derive(Debug, Clone)]
pub enum Filter {
    Text(&'static str, String),
    Int(&'static str, i32),
}

pub struct Table<T> {
    pool: Pool<Postgres>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Table<T> {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    fn select() -> String {
        format!("SELECT {} FROM {} t {}", T::COLUMNS, T::TABLE, T::JOINS)
    }

    /// Find a row by primary key
    pub async fn find<K>(&self, key: K) -> AppResult<Option<T>>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send,
    {
        let sql = format!("{} WHERE t.{} = $1", Self::select(), T::KEY);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Get a row by primary key, `NotFound` when absent
    pub async fn get<K>(&self, key: K) -> AppResult<T>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + Display,
    {
        let label = key.to_string();
        self.find(key)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {} not found", T::LABEL, label)))
    }

    /// Check whether a key exists
    pub async fn exists<K>(&self, key: K) -> AppResult<bool>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send,
    {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1)",
            T::TABLE,
            T::KEY
        );
        let exists: bool = sqlx::query_scalar(&sql)
            .bind(key)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    fn filtered<'a>(
        head: &str,
        pattern: &'a Option<String>,
        filters: &'a [Filter],
    ) -> QueryBuilder<'a, Postgres> {
        let mut builder = QueryBuilder::new(head);
        builder.push(" WHERE TRUE");

        if let Some(pattern) = pattern {
            builder.push(" AND (FALSE");
            for column in T::SEARCH_COLUMNS {
                builder.push(" OR ");
                builder.push(*column);
                builder.push("::text ILIKE ");
                builder.push_bind(pattern.as_str());
            }
            builder.push(")");
        }

        for filter in filters {
            match filter {
                Filter::Text(column, value) => {
                    builder.push(" AND ").push(*column).push(" = ");
                    builder.push_bind(value.as_str());
                }
                Filter::Int(column, value) => {
                    builder.push(" AND ").push(*column).push(" = ");
                    builder.push_bind(*value);
                }
            }
        }

        builder
    }

    /// Paginated search over `SEARCH_COLUMNS` plus equality filters
    pub async fn search(&self, query: &PageQuery, filters: &[Filter]) -> AppResult<Page<T>> {
        let pattern = query.pattern();

        let count_head = format!("SELECT COUNT(*) FROM {} t {}", T::TABLE, T::JOINS);
        let total: i64 = Self::filtered(&count_head, &pattern, filters)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let select = Self::select();
        let mut builder = Self::filtered(&select, &pattern, filters);
        builder
            .push(" ORDER BY ")
            .push(T::ORDER_BY)
            .push(" LIMIT ")
            .push_bind(query.per_page())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let items = builder.build_query_as::<T>().fetch_all(&self.pool).await?;

        Ok(Page {
            items,
            total,
            page: query.page(),
            per_page: query.per_page(),
        })
    }

    /// Delete a row by primary key, `NotFound` when nothing was deleted
    pub async fn delete<K>(&self, key: K) -> AppResult<()>
    where
        K: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + Display,
    {
        let label = key.to_string();
        let sql = format!("DELETE FROM {} WHERE {} = $1", T::TABLE, T::KEY);
        let result = sqlx::query(&sql).bind(key).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} {} not found", T::LABEL, label)));
        }
        Ok(())
    }
}

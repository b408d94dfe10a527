//! Integration tests. Both suites need PostgreSQL and are ignored by default:
//!
//! - `store_tests`: `DATABASE_URL=... cargo test -- --ignored` (one fresh
//!   database per test, migrations applied)
//! - `api_tests`: additionally a running server on `BASE_URL`

mod api_tests;
mod store_tests;

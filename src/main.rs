//! BiblioSys Server - School Library Management System
//!
//! REST API server for a school library: catalog, lending, orders and
//! roster reconciliation.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bibliosys_server::{
    api,
    config::AppConfig,
    error::set_detailed_errors,
    repository::Repository,
    services::{auth::JwtIdentityProvider, Services},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bibliosys_server={},tower_http=debug", config.logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting BiblioSys Server v{}", env!("CARGO_PKG_VERSION"));
    set_detailed_errors(config.server.detailed_errors);

    // Create database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .context("Invalid host address")?,
        config.server.port,
    );

    let repository = Repository::new(pool);
    let tokens = JwtIdentityProvider::new(&config.auth);
    let services = Services::new(repository, &config, tokens.clone());

    services
        .users
        .ensure_bootstrap_admin(config.auth.bootstrap_admin_password.as_deref())
        .await
        .context("Failed to create bootstrap administrator")?;

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
        identity: Arc::new(tokens),
    };

    let app = create_router(state);

    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        .route("/ready", get(api::health::readiness_check))
        // Authentication
        .route("/auth/login", post(api::auth::login))
        .route("/auth/me", get(api::auth::me))
        // Books
        .route("/books", get(api::books::list_books).post(api::books::create_book))
        .route("/books/batch", delete(api::books::delete_books))
        .route("/books/isbn/:isbn", get(api::books::books_by_isbn))
        .route(
            "/books/:barcode",
            get(api::books::get_book)
                .put(api::books::update_book)
                .delete(api::books::delete_book),
        )
        .route("/books/:barcode/cover", put(api::books::set_cover))
        // Categories and suppliers
        .route(
            "/categories",
            get(api::catalog::list_categories).post(api::catalog::create_category),
        )
        .route("/categories/:id", delete(api::catalog::delete_category))
        .route(
            "/suppliers",
            get(api::catalog::list_suppliers).post(api::catalog::create_supplier),
        )
        .route(
            "/suppliers/:id",
            put(api::catalog::update_supplier).delete(api::catalog::delete_supplier),
        )
        // Students
        .route(
            "/students",
            get(api::students::list_students).post(api::students::create_student),
        )
        .route("/students/import", post(api::students::import_students))
        .route("/students/sync/preview", post(api::students::preview_sync))
        .route("/students/sync/execute", post(api::students::execute_sync))
        .route(
            "/students/:id",
            get(api::students::get_student)
                .put(api::students::update_student)
                .delete(api::students::delete_student),
        )
        .route("/students/:id/photo", put(api::students::set_photo))
        .route("/students/:id/lendings", get(api::students::student_lendings))
        .route("/classes", get(api::students::list_classes))
        .route("/classes/:class/students", get(api::students::class_students))
        .route("/universal-search/:term", get(api::catalog::universal_search))
        // Lendings
        .route("/lendings", post(api::lendings::create_lending))
        .route("/lendings/filter", post(api::lendings::filter_lendings))
        .route("/lendings/overdue", get(api::lendings::overdue_lendings))
        .route("/lendings/extend", post(api::lendings::extend_lendings))
        .route("/lendings/quick-return", post(api::lendings::quick_return))
        .route("/lendings/undo-return", post(api::lendings::undo_return))
        .route("/lendings/import", post(api::lendings::import_lendings))
        .route("/lendings/:id/return", post(api::lendings::return_lending))
        // Orders
        .route(
            "/orders",
            get(api::orders::list_orders).post(api::orders::create_order),
        )
        .route("/orders/:id", get(api::orders::get_order))
        .route("/order-items/:id/receive", post(api::orders::receive_item))
        .route("/order-items/:id/barcodes", get(api::orders::item_barcodes))
        .route("/order/:token", get(api::orders::public_order))
        // Inventory
        .route("/inventory/check", post(api::inventory::inventory_check))
        // Settings
        .route("/settings", put(api::settings::put_setting))
        .route("/settings/:key", get(api::settings::get_setting))
        // Users
        .route(
            "/users",
            get(api::users::list_users).post(api::users::create_user),
        )
        .route(
            "/users/:id",
            get(api::users::get_user)
                .put(api::users::update_user)
                .delete(api::users::delete_user),
        )
        .with_state(state);

    // OpenAPI documentation
    let openapi = api::openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

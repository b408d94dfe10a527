//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    auth, books, catalog, health, inventory, lendings, orders, settings, students, users,
};

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BiblioSys API",
        version = "1.0.0",
        description = "School library lending, inventory and ordering REST API"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        auth::me,
        // Books
        books::list_books,
        books::get_book,
        books::books_by_isbn,
        books::create_book,
        books::update_book,
        books::set_cover,
        books::delete_book,
        books::delete_books,
        // Categories and suppliers
        catalog::list_categories,
        catalog::create_category,
        catalog::delete_category,
        catalog::list_suppliers,
        catalog::create_supplier,
        catalog::update_supplier,
        catalog::delete_supplier,
        catalog::universal_search,
        // Students
        students::list_students,
        students::get_student,
        students::student_lendings,
        students::create_student,
        students::update_student,
        students::set_photo,
        students::delete_student,
        students::list_classes,
        students::class_students,
        students::import_students,
        students::preview_sync,
        students::execute_sync,
        // Lendings
        lendings::create_lending,
        lendings::return_lending,
        lendings::filter_lendings,
        lendings::overdue_lendings,
        lendings::extend_lendings,
        lendings::quick_return,
        lendings::undo_return,
        lendings::import_lendings,
        // Orders
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::receive_item,
        orders::item_barcodes,
        orders::public_order,
        // Inventory
        inventory::inventory_check,
        // Settings
        settings::get_setting,
        settings::put_setting,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::Identity,
            crate::models::user::Role,
            // Books
            books::DeletedBooks,
            crate::models::book::Book,
            crate::models::book::BookStatus,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            crate::models::book::UpdateCover,
            crate::models::book::BatchDeleteBooks,
            // Categories and suppliers
            crate::models::catalog::Category,
            crate::models::catalog::CategoryWithCounts,
            crate::models::catalog::CreateCategory,
            crate::models::catalog::Supplier,
            crate::models::catalog::SupplierWithCounts,
            crate::models::catalog::SupplierInput,
            crate::models::catalog::SearchHit,
            // Students
            crate::models::student::Student,
            crate::models::student::StudentStatus,
            crate::models::student::StudentDetails,
            crate::models::student::BorrowedBook,
            crate::models::student::CreateStudent,
            crate::models::student::UpdateStudent,
            crate::models::student::UpdatePhoto,
            crate::models::workbook::Workbook,
            crate::models::reconciliation::RosterEntry,
            crate::models::reconciliation::PreviousValues,
            crate::models::reconciliation::StudentUpdate,
            crate::models::reconciliation::StudentSyncPlan,
            crate::models::reconciliation::StudentSyncResult,
            crate::models::reconciliation::RosterImportResult,
            // Lendings
            crate::models::lending::Lending,
            crate::models::lending::LendingStatus,
            crate::models::lending::CreateLending,
            crate::models::lending::ReturnLending,
            crate::models::lending::QuickReturnRequest,
            crate::models::lending::QuickReturnReceipt,
            crate::models::lending::UndoReturnRequest,
            crate::models::lending::ExtendLendings,
            crate::models::lending::ExtendResult,
            crate::models::lending::LendingFilter,
            crate::models::lending::ActiveLending,
            crate::models::lending::OverdueLending,
            crate::models::lending::LendingImportResult,
            // Orders
            crate::models::order::Order,
            crate::models::order::OrderStatus,
            crate::models::order::OrderSummary,
            crate::models::order::OrderItem,
            crate::models::order::OrderLine,
            crate::models::order::CreateOrder,
            crate::models::order::CreatedOrder,
            crate::models::order::OrderDetails,
            crate::models::order::PublicOrder,
            crate::models::order::PublicOrderItem,
            crate::models::order::ReceiveDelivery,
            // Inventory
            crate::models::reconciliation::InventoryBook,
            crate::models::reconciliation::InventoryScan,
            crate::models::reconciliation::InventoryReport,
            // Settings
            crate::models::settings::Setting,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "catalog", description = "Categories and suppliers"),
        (name = "students", description = "Students, roster import and sync"),
        (name = "lendings", description = "Lending, returns and extensions"),
        (name = "orders", description = "Purchase orders and deliveries"),
        (name = "inventory", description = "Stock-taking"),
        (name = "settings", description = "Application settings"),
        (name = "users", description = "Staff accounts")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_paths_reference_registered_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/lendings/quick-return"));
        assert!(doc.paths.paths.contains_key("/order/{token}"));
        assert!(doc.paths.paths.contains_key("/universal-search/{term}"));
        assert!(doc.paths.paths.contains_key("/order-items/{id}/barcodes"));
        assert!(components.schemas.contains_key("SearchHit"));
    }
}

//! Lending, ordering and reconciliation against a real database

use chrono::{Duration, Local};
use serde_json::json;
use sqlx::PgPool;
use tokio_stream::StreamExt;

use bibliosys_server::{
    config::AppConfig,
    error::AppError,
    models::{
        book::{BookStatus, CreateBook},
        catalog::{CreateCategory, SearchHit},
        lending::{
            ActiveLending, CreateLending, ExtendLendings, LendingFilter, LendingStatus,
            ReturnLending,
        },
        order::{CreateOrder, OrderLine, ReceiveDelivery},
        student::{CreateStudent, StudentStatus},
        user::{Identity, Role},
        workbook::Workbook,
    },
    repository::Repository,
    services::{auth::JwtIdentityProvider, lending::today, Services},
};

fn services(pool: PgPool) -> Services {
    let config = AppConfig::default();
    Services::new(
        Repository::new(pool),
        &config,
        JwtIdentityProvider::new(&config.auth),
    )
}

async fn librarian(services: &Services) -> Identity {
    let user = services
        .users
        .create(&bibliosys_server::models::user::CreateUser {
            username: "desk".to_string(),
            password: "desk-password".to_string(),
            full_name: "Front Desk".to_string(),
            email: None,
            role: Role::Librarian,
        })
        .await
        .unwrap();
    Identity {
        user_id: user.id,
        username: user.username,
        full_name: user.full_name,
        role: user.role,
    }
}

async fn student(services: &Services, id: &str, name: &str, class: &str) {
    services
        .students
        .create(&CreateStudent {
            id: id.to_string(),
            name: name.to_string(),
            class: class.to_string(),
        })
        .await
        .unwrap();
}

async fn book(services: &Services, barcode: &str, title: &str) {
    services
        .catalog
        .create_book(&CreateBook {
            barcode: barcode.to_string(),
            isbn: None,
            title: title.to_string(),
            author: None,
            publisher: None,
            signature: None,
            category_id: None,
        })
        .await
        .unwrap();
}

fn borrow(student_id: &str, barcode: &str) -> CreateLending {
    CreateLending {
        student_id: student_id.to_string(),
        book_barcode: barcode.to_string(),
        due_date: None,
        notes: None,
    }
}

async fn next_book_id(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT counter_value FROM app_counters WHERE counter_key = 'next_book_id'")
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
#[ignore]
async fn test_borrow_and_return_cycle(pool: PgPool) {
    let services = services(pool);
    let desk = librarian(&services).await;
    student(&services, "1001", "Anna Weber", "5a").await;
    student(&services, "1002", "Ben Koch", "5b").await;
    book(&services, "buch-1", "Momo").await;

    let lending = services.lending.borrow(&borrow("1001", "buch-1")).await.unwrap();
    assert_eq!(lending.status, LendingStatus::Active);
    assert_eq!(
        lending.due_date,
        Local::now().date_naive() + Duration::days(14)
    );
    let lent = services.catalog.get_book("buch-1").await.unwrap();
    assert_eq!(lent.status, BookStatus::Lent);
    assert_eq!(lent.borrower_name.as_deref(), Some("Anna Weber"));

    let again = services.lending.borrow(&borrow("1001", "buch-1")).await;
    assert!(matches!(again, Err(AppError::DuplicateLoan(_))));

    let other = services.lending.borrow(&borrow("1002", "buch-1")).await;
    assert!(matches!(other, Err(AppError::Conflict(_))));

    let returned = services
        .lending
        .return_lending(
            &desk,
            lending.id,
            &ReturnLending {
                notes: Some("Cover torn".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(returned.status, LendingStatus::Returned);
    assert_eq!(returned.returned_by, Some(desk.user_id));
    assert!(returned.return_date.is_some());
    assert!(returned.notes.unwrap().contains("Cover torn"));

    let available = services.catalog.get_book("buch-1").await.unwrap();
    assert_eq!(available.status, BookStatus::Available);
    assert!(available.borrower_name.is_none());

    let twice = services
        .lending
        .return_lending(&desk, lending.id, &ReturnLending::default())
        .await;
    assert!(matches!(twice, Err(AppError::NotFound(_))));
}

#[sqlx::test]
#[ignore]
async fn test_borrow_rejects_unknown_and_graduated(pool: PgPool) {
    let services = services(pool.clone());
    student(&services, "2001", "Clara Fuchs", "10c").await;
    book(&services, "buch-2", "Krabat").await;

    let missing_book = services.lending.borrow(&borrow("2001", "buch-404")).await;
    assert!(matches!(missing_book, Err(AppError::NotFound(_))));

    let missing_student = services.lending.borrow(&borrow("9999", "buch-2")).await;
    assert!(matches!(missing_student, Err(AppError::NotFound(_))));

    sqlx::query("UPDATE students SET status = 'graduated' WHERE id = '2001'")
        .execute(&pool)
        .await
        .unwrap();
    let graduated = services.lending.borrow(&borrow("2001", "buch-2")).await;
    assert!(matches!(graduated, Err(AppError::Conflict(_))));

    let book = services.catalog.get_book("buch-2").await.unwrap();
    assert_eq!(book.status, BookStatus::Available);
}

#[sqlx::test]
#[ignore]
async fn test_quick_return_and_undo(pool: PgPool) {
    let services = services(pool.clone());
    let desk = librarian(&services).await;
    student(&services, "3001", "Dana Roth", "7a").await;
    book(&services, "buch-3", "Die Welle").await;

    let lending = services.lending.borrow(&borrow("3001", "buch-3")).await.unwrap();

    let receipt = services
        .quick_return
        .quick_return(&desk, " buch-3 ")
        .await
        .unwrap();
    assert_eq!(receipt.lending_id, lending.id);
    assert_eq!(receipt.student_name, "Dana Roth");
    assert_eq!(receipt.book_title, "Die Welle");
    assert_eq!(receipt.returned_by_name, "Front Desk");

    let repository = Repository::new(pool);
    assert!(repository
        .lendings
        .find_active_by_barcode("buch-3")
        .await
        .unwrap()
        .is_none());

    let restored = services.quick_return.undo(&desk, lending.id).await.unwrap();
    assert_eq!(restored.status, LendingStatus::Active);
    assert!(restored.return_date.is_none());
    assert!(restored.returned_by.is_none());
    assert_eq!(restored.due_date, lending.due_date);

    let stored = repository.lendings.get_by_id(lending.id).await.unwrap();
    assert_eq!(stored, restored);
    let book = services.catalog.get_book("buch-3").await.unwrap();
    assert_eq!(book.status, BookStatus::Lent);

    let nothing = services.quick_return.quick_return(&desk, "buch-404").await;
    assert!(matches!(nothing, Err(AppError::NotFound(_))));
}

#[sqlx::test]
#[ignore]
async fn test_undo_refused_once_copy_lent_again(pool: PgPool) {
    let services = services(pool);
    let desk = librarian(&services).await;
    student(&services, "3101", "Emil Sand", "6b").await;
    student(&services, "3102", "Fiona Berg", "6b").await;
    book(&services, "buch-4", "Tintenherz").await;

    let first = services.lending.borrow(&borrow("3101", "buch-4")).await.unwrap();
    services.quick_return.quick_return(&desk, "buch-4").await.unwrap();
    services.lending.borrow(&borrow("3102", "buch-4")).await.unwrap();

    let undo = services.quick_return.undo(&desk, first.id).await;
    assert!(matches!(undo, Err(AppError::Conflict(_))));
}

#[sqlx::test]
#[ignore]
async fn test_extend_resets_due_date_of_active_lendings(pool: PgPool) {
    let services = services(pool.clone());
    let desk = librarian(&services).await;
    student(&services, "4001", "Greta Lang", "8a").await;
    book(&services, "buch-5", "Tschick").await;
    book(&services, "buch-6", "Emil und die Detektive").await;

    let active = services.lending.borrow(&borrow("4001", "buch-5")).await.unwrap();
    let returned = services.lending.borrow(&borrow("4001", "buch-6")).await.unwrap();
    services
        .lending
        .return_lending(&desk, returned.id, &ReturnLending::default())
        .await
        .unwrap();

    let result = services
        .lending
        .extend(&ExtendLendings {
            lending_ids: vec![active.id, returned.id],
            days: 30,
        })
        .await
        .unwrap();
    assert_eq!(result.extended, 1);
    assert_eq!(result.new_due_date, today() + Duration::days(30));

    let stored = Repository::new(pool).lendings.get_by_id(active.id).await.unwrap();
    assert_eq!(stored.due_date, result.new_due_date);
    let untouched = services.lending.student_lendings("4001").await.unwrap();
    assert_eq!(untouched.len(), 1);
    assert!(!untouched[0].is_overdue);

    let zero_days = services
        .lending
        .extend(&ExtendLendings {
            lending_ids: vec![active.id],
            days: 0,
        })
        .await;
    assert!(matches!(zero_days, Err(AppError::Validation(_))));
}

#[sqlx::test]
#[ignore]
async fn test_concurrent_orders_never_share_barcodes(pool: PgPool) {
    let services = services(pool.clone());
    let desk = librarian(&services).await;
    let start = next_book_id(&pool).await;

    let order = |title: &str, quantity: u32| CreateOrder {
        order_date: Local::now().date_naive(),
        supplier_id: None,
        items: vec![OrderLine {
            isbn: None,
            title: title.to_string(),
            author: None,
            quantity,
        }],
    };
    let first = order("Der kleine Prinz", 3);
    let second = order("Die unendliche Geschichte", 5);

    let (a, b) = tokio::join!(
        services.orders.create(&desk, &first),
        services.orders.create(&desk, &second)
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.generated_ids.len(), 3);
    assert_eq!(b.generated_ids.len(), 5);
    let mut all: Vec<String> = a.generated_ids.iter().chain(&b.generated_ids).cloned().collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 8);
    assert_eq!(next_book_id(&pool).await, start + 8);
    assert_ne!(a.public_token, b.public_token);

    let public = services.orders.get_by_token(&a.public_token).await.unwrap();
    assert_eq!(public.order_id, a.order_id);
    assert_eq!(public.items.len(), 3);
}

#[sqlx::test]
#[ignore]
async fn test_receive_delivery_creates_book_once(pool: PgPool) {
    let services = services(pool);
    let desk = librarian(&services).await;

    let created = services
        .orders
        .create(
            &desk,
            &CreateOrder {
                order_date: Local::now().date_naive(),
                supplier_id: None,
                items: vec![OrderLine {
                    isbn: Some("978-3-522-20210-1".to_string()),
                    title: "Jim Knopf".to_string(),
                    author: Some("Michael Ende".to_string()),
                    quantity: 2,
                }],
            },
        )
        .await
        .unwrap();

    let details = services.orders.get(created.order_id).await.unwrap();
    let item = &details.items[0];

    let delivery = ReceiveDelivery {
        category_id: None,
        signature: Some("END".to_string()),
    };
    let book = services.orders.receive(item.id, &delivery).await.unwrap();
    assert_eq!(book.barcode, item.library_barcode_id);
    assert_eq!(book.status, BookStatus::Available);
    assert_eq!(book.signature.as_deref(), Some("END"));

    let again = services.orders.receive(item.id, &delivery).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    let unknown_category = services
        .orders
        .receive(
            details.items[1].id,
            &ReceiveDelivery {
                category_id: Some(9999),
                signature: None,
            },
        )
        .await;
    assert!(matches!(unknown_category, Err(AppError::NotFound(_))));
}

#[sqlx::test]
#[ignore]
async fn test_roster_sync_converges(pool: PgPool) {
    let services = services(pool);
    student(&services, "5001", "Hanna Wolf", "9a").await;
    student(&services, "5002", "Ida Brandt", "9a").await;
    student(&services, "5003", "Jonas Graf", "9b").await;

    let workbook: Workbook = serde_json::from_value(json!({
        "sheets": {
            "Schüler": [
                { "id": 5001, "name": "Hanna Wolf", "class": "10a" },
                { "id": "5002", "name": "Ida Brandt", "class": "9a" },
                { "id": "5004", "name": "Karl Sommer", "class": "5c" }
            ]
        }
    }))
    .unwrap();

    let plan = services.reconciliation.analyze_sync(&workbook).await.unwrap();
    assert_eq!(plan.to_create.len(), 1);
    assert_eq!(plan.to_update.len(), 1);
    assert_eq!(plan.to_update[0].old.class, "9a");
    assert_eq!(plan.to_deactivate.len(), 1);
    assert_eq!(plan.to_deactivate[0].id, "5003");

    let result = services.reconciliation.execute_sync(&plan).await.unwrap();
    assert_eq!((result.created, result.updated, result.deactivated), (1, 1, 1));

    let second = services.reconciliation.analyze_sync(&workbook).await.unwrap();
    assert!(second.is_empty());

    let graduated = services.students.get_details("5003").await.unwrap();
    assert_eq!(graduated.student.status, StudentStatus::Graduated);
}

#[sqlx::test]
#[ignore]
async fn test_inventory_groups_are_disjoint(pool: PgPool) {
    let services = services(pool);
    student(&services, "6001", "Lea Vogel", "4a").await;
    book(&services, "buch-10", "Pippi Langstrumpf").await;
    book(&services, "buch-11", "Das Sams").await;
    book(&services, "buch-12", "Räuber Hotzenplotz").await;
    services.lending.borrow(&borrow("6001", "buch-12")).await.unwrap();

    let scanned = vec![
        "buch-10".to_string(),
        "buch-12".to_string(),
        "buch-99".to_string(),
    ];
    let report = services.reconciliation.inventory_check(&scanned).await.unwrap();

    let barcodes = |books: &[bibliosys_server::models::reconciliation::InventoryBook]| {
        books.iter().map(|b| b.barcode.clone()).collect::<Vec<_>>()
    };
    assert_eq!(barcodes(&report.found_correctly), vec!["buch-10"]);
    assert_eq!(barcodes(&report.missing_in_reality), vec!["buch-11"]);
    assert_eq!(barcodes(&report.found_unexpectedly), vec!["buch-12"]);
    assert_eq!(report.unknown_barcodes, vec!["buch-99"]);
}

#[sqlx::test]
#[ignore]
async fn test_delete_guards(pool: PgPool) {
    let services = services(pool);
    student(&services, "7001", "Mia Hahn", "3a").await;
    book(&services, "buch-20", "Der Grüffelo").await;
    book(&services, "buch-21", "Die kleine Hexe").await;
    services.lending.borrow(&borrow("7001", "buch-20")).await.unwrap();

    let lent = services.catalog.delete_book("buch-20").await;
    assert!(matches!(lent, Err(AppError::Conflict(_))));

    let batch = services
        .catalog
        .delete_books(&["buch-21".to_string(), "buch-20".to_string()])
        .await;
    assert!(matches!(batch, Err(AppError::Conflict(_))));
    assert!(services.catalog.get_book("buch-21").await.is_ok());

    let holder = services.students.delete("7001").await;
    assert!(matches!(holder, Err(AppError::Conflict(_))));
}

#[sqlx::test]
#[ignore]
async fn test_batch_delete_waits_for_concurrent_borrow(pool: PgPool) {
    let services = services(pool.clone());
    student(&services, "7101", "Nico Lorenz", "4b").await;
    book(&services, "buch-30", "Die Olchis").await;

    // A desk is in the middle of lending the copy
    let mut lending_tx = pool.begin().await.unwrap();
    sqlx::query("SELECT status FROM books WHERE barcode = 'buch-30' FOR UPDATE")
        .execute(&mut *lending_tx)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO lendings (student_id, book_barcode, due_date, status) \
         VALUES ('7101', 'buch-30', CURRENT_DATE + 14, 'active')",
    )
    .execute(&mut *lending_tx)
    .await
    .unwrap();
    sqlx::query("UPDATE books SET status = 'lent' WHERE barcode = 'buch-30'")
        .execute(&mut *lending_tx)
        .await
        .unwrap();

    let deleting = services.clone();
    let delete = tokio::spawn(async move {
        deleting
            .catalog
            .delete_books(&["buch-30".to_string()])
            .await
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    lending_tx.commit().await.unwrap();

    let result = delete.await.unwrap();
    assert!(matches!(result, Err(AppError::Conflict(_))));

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lendings WHERE book_barcode = 'buch-30' AND status = 'active'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active, 1);
    let book = services.catalog.get_book("buch-30").await.unwrap();
    assert_eq!(book.status, BookStatus::Lent);
}

#[sqlx::test]
#[ignore]
async fn test_overdue_report_lists_past_due_oldest_first(pool: PgPool) {
    let services = services(pool.clone());
    let desk = librarian(&services).await;
    student(&services, "8001", "Olga Peters", "6c").await;
    for barcode in ["buch-40", "buch-41", "buch-42", "buch-43"] {
        book(&services, barcode, "Ronja Räubertochter").await;
    }

    let slightly = services.lending.borrow(&borrow("8001", "buch-40")).await.unwrap();
    let long_ago = services.lending.borrow(&borrow("8001", "buch-41")).await.unwrap();
    let on_time = services.lending.borrow(&borrow("8001", "buch-42")).await.unwrap();
    let returned = services.lending.borrow(&borrow("8001", "buch-43")).await.unwrap();

    let today = Local::now().date_naive();
    for (id, days_ago) in [(slightly.id, 2), (long_ago.id, 10), (returned.id, 30)] {
        sqlx::query("UPDATE lendings SET due_date = $2 WHERE id = $1")
            .bind(id)
            .bind(today - Duration::days(days_ago))
            .execute(&pool)
            .await
            .unwrap();
    }
    services
        .lending
        .return_lending(&desk, returned.id, &ReturnLending::default())
        .await
        .unwrap();

    let overdue = services.lending.overdue().await.unwrap();
    let ids: Vec<i32> = overdue.iter().map(|o| o.lending_id).collect();
    assert_eq!(ids, vec![long_ago.id, slightly.id]);
    assert_eq!(overdue[0].days_overdue, 10);
    assert_eq!(overdue[1].days_overdue, 2);
    assert_eq!(overdue[0].student_name, "Olga Peters");
    assert!(!ids.contains(&on_time.id));
}

#[sqlx::test]
#[ignore]
async fn test_active_lendings_filter_and_restart(pool: PgPool) {
    let services = services(pool);
    student(&services, "8101", "Paul Winter", "7b").await;
    let fantasy = services
        .catalog
        .create_category(&CreateCategory {
            name: "Fantasy".to_string(),
        })
        .await
        .unwrap();

    let shelved = |barcode: &str, signature: &str, category_id: Option<i32>| CreateBook {
        barcode: barcode.to_string(),
        isbn: None,
        title: format!("Titel {}", barcode),
        author: None,
        publisher: None,
        signature: Some(signature.to_string()),
        category_id,
    };
    for request in [
        shelved("buch-50", "FAN", Some(fantasy.id)),
        shelved("buch-51", "FAN", None),
        shelved("buch-52", "KRI", Some(fantasy.id)),
        shelved("buch-53", "KRI", None),
    ] {
        services.catalog.create_book(&request).await.unwrap();
    }
    for barcode in ["buch-50", "buch-51", "buch-52"] {
        services.lending.borrow(&borrow("8101", barcode)).await.unwrap();
    }

    let collect = |filter: LendingFilter| {
        let services = services.clone();
        async move {
            let rows: Result<Vec<ActiveLending>, AppError> =
                services.lending.active(&filter).collect().await;
            let mut barcodes: Vec<String> =
                rows.unwrap().into_iter().map(|r| r.barcode).collect();
            barcodes.sort();
            barcodes
        }
    };

    let everything = collect(LendingFilter::default()).await;
    assert_eq!(everything, vec!["buch-50", "buch-51", "buch-52"]);
    assert_eq!(collect(LendingFilter::default()).await, everything);

    let by_signature = collect(LendingFilter {
        signature: Some("FAN".to_string()),
        category_id: None,
    })
    .await;
    assert_eq!(by_signature, vec!["buch-50", "buch-51"]);

    let by_category = collect(LendingFilter {
        signature: None,
        category_id: Some(fantasy.id),
    })
    .await;
    assert_eq!(by_category, vec!["buch-50", "buch-52"]);

    let both = collect(LendingFilter {
        signature: Some("KRI".to_string()),
        category_id: Some(fantasy.id),
    })
    .await;
    assert_eq!(both, vec!["buch-52"]);
}

#[sqlx::test]
#[ignore]
async fn test_lending_import_is_all_or_nothing(pool: PgPool) {
    let services = services(pool.clone());
    student(&services, "8201", "Quirin Maier", "9c").await;
    student(&services, "8202", "Rosa Schulz", "9c").await;
    book(&services, "buch-60", "Der Vorleser").await;
    book(&services, "buch-61", "Nathan der Weise").await;

    let due = (Local::now().date_naive() + Duration::days(7)).to_string();
    let broken: Workbook = serde_json::from_value(json!({
        "sheets": {
            "Ausleihen": [
                { "student_id": 8201, "book_barcode": "buch-60", "due_date": due },
                { "student_id": "9999", "book_barcode": "buch-61", "due_date": due }
            ]
        }
    }))
    .unwrap();
    let rejected = services.lending.import(&broken).await;
    assert!(matches!(rejected, Err(AppError::Validation(_))));

    let lendings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lendings")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(lendings, 0);
    let first = services.catalog.get_book("buch-60").await.unwrap();
    assert_eq!(first.status, BookStatus::Available);

    let valid: Workbook = serde_json::from_value(json!({
        "sheets": {
            "Ausleihen": [
                { "student_id": 8201, "book_barcode": "buch-60", "due_date": due },
                { "student_id": "8202", "book_barcode": "buch-61", "due_date": due }
            ]
        }
    }))
    .unwrap();
    let result = services.lending.import(&valid).await.unwrap();
    assert_eq!(result.created, 2);
    assert_eq!(result.books_marked_lent, 2);

    let holder = services.catalog.get_book("buch-61").await.unwrap();
    assert_eq!(holder.status, BookStatus::Lent);
    assert_eq!(holder.borrower_name.as_deref(), Some("Rosa Schulz"));
}

#[sqlx::test]
#[ignore]
async fn test_universal_search_resolution_order(pool: PgPool) {
    let services = services(pool);
    student(&services, "8301", "Sophie Krämer", "8b").await;
    student(&services, "8302", "Sophia Engel", "8b").await;
    book(&services, "buch-70", "Momo").await;
    book(&services, "buch-71", "Krabat").await;
    services.lending.borrow(&borrow("8301", "buch-71")).await.unwrap();

    match services.catalog.universal_search("8302").await.unwrap() {
        SearchHit::StudentDetails(details) => assert_eq!(details.student.id, "8302"),
        other => panic!("expected student details, got {:?}", other),
    }

    match services.catalog.universal_search("buch-70").await.unwrap() {
        SearchHit::BookDetails(book) => assert_eq!(book.barcode, "buch-70"),
        other => panic!("expected book details, got {:?}", other),
    }

    match services.catalog.universal_search(" buch-71 ").await.unwrap() {
        SearchHit::StudentDetails(details) => {
            assert_eq!(details.student.id, "8301");
            assert_eq!(details.borrowed_books.len(), 1);
            assert_eq!(details.borrowed_books[0].barcode, "buch-71");
        }
        other => panic!("expected the borrower, got {:?}", other),
    }

    match services.catalog.universal_search("Sophi").await.unwrap() {
        SearchHit::StudentList(students) => assert_eq!(students.len(), 2),
        other => panic!("expected a student list, got {:?}", other),
    }

    let nothing = services.catalog.universal_search("Zacharias").await;
    assert!(matches!(nothing, Err(AppError::NotFound(_))));
}

#[sqlx::test]
#[ignore]
async fn test_order_item_lists_received_books(pool: PgPool) {
    let services = services(pool);
    let desk = librarian(&services).await;

    let created = services
        .orders
        .create(
            &desk,
            &CreateOrder {
                order_date: Local::now().date_naive(),
                supplier_id: None,
                items: vec![OrderLine {
                    isbn: None,
                    title: "Oh, wie schön ist Panama".to_string(),
                    author: Some("Janosch".to_string()),
                    quantity: 1,
                }],
            },
        )
        .await
        .unwrap();
    let item = services.orders.get(created.order_id).await.unwrap().items[0].clone();

    assert!(services.orders.item_books(item.id).await.unwrap().is_empty());

    services
        .orders
        .receive(item.id, &ReceiveDelivery::default())
        .await
        .unwrap();
    let books = services.orders.item_books(item.id).await.unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].barcode, item.library_barcode_id);

    let unknown = services.orders.item_books(999_999).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
}

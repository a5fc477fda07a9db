//! Database-backed tests for the catalog, borrowing ledger, wishlist and users.
//!
//! Each test gets a fresh database with migrations applied and the
//! `library` fixture loaded. Run with: DATABASE_URL=... cargo test -- --ignored

use chrono::{Duration, Utc};
use sqlx::{Pool, Postgres};

use lms_server::{
    config::AppConfig,
    models::{
        book::{BookCategory, BookQuery, BookStatus, CreateBook, UpdateBook},
        borrowing::{BorrowRequest, BorrowingQuery, BorrowingStatus},
        user::{Role, UpdateUser, User, UserClaims, UserQuery},
    },
    repository::Repository,
    services::Services,
    AppError,
};

const ADA: i32 = 2;
const BOB: i32 = 3;
const EVE: i32 = 4;

const DUNE: i32 = 1;
const LAST_COPY: i32 = 2;
const GONE: i32 = 3;
const COSMOS: i32 = 4;

fn services(pool: Pool<Postgres>) -> Services {
    Services::new(Repository::new(pool), &AppConfig::default())
}

fn borrow_request(book_id: i32) -> BorrowRequest {
    BorrowRequest {
        book_id,
        due_date: None,
    }
}

async fn available(services: &Services, book_id: i32) -> i32 {
    services
        .catalog
        .get_book(book_id)
        .await
        .unwrap()
        .available_copies
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn borrow_unavailable_book_is_rejected(pool: Pool<Postgres>) {
    let services = services(pool);

    let err = services.borrowing.borrow(ADA, borrow_request(GONE)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    assert_eq!(available(&services, GONE).await, 0);
    let mine = services
        .borrowing
        .list_mine(ADA, &BorrowingQuery::default())
        .await
        .unwrap();
    assert!(mine.is_empty());
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn borrow_missing_book_is_not_found(pool: Pool<Postgres>) {
    let services = services(pool);

    let err = services.borrowing.borrow(ADA, borrow_request(999)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn borrow_and_return_round_trip(pool: Pool<Postgres>) {
    let services = services(pool);

    let borrowing = services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();
    assert_eq!(borrowing.status, BorrowingStatus::Active);
    assert_eq!(borrowing.book_title, "Dune");
    assert!(!borrowing.is_overdue);
    assert!(borrowing.due_date > Utc::now() + Duration::days(13));
    assert_eq!(available(&services, DUNE).await, 2);

    let returned = services.borrowing.return_book(ADA, borrowing.id).await.unwrap();
    assert_eq!(returned.status, BorrowingStatus::Returned);
    assert!(returned.returned_date.is_some());
    assert_eq!(available(&services, DUNE).await, 3);

    // A second return finds no active borrowing
    let err = services.borrowing.return_book(ADA, borrowing.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
    assert_eq!(available(&services, DUNE).await, 3);

    // Returned books can be borrowed again
    services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();
    assert_eq!(available(&services, DUNE).await, 2);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn duplicate_active_borrowing_is_rejected(pool: Pool<Postgres>) {
    let services = services(pool);

    services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();
    let err = services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);
    assert_eq!(available(&services, DUNE).await, 2);

    // Another reader is unaffected
    services.borrowing.borrow(BOB, borrow_request(DUNE)).await.unwrap();
    assert_eq!(available(&services, DUNE).await, 1);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn past_due_date_is_rejected(pool: Pool<Postgres>) {
    let services = services(pool);

    let request = BorrowRequest {
        book_id: DUNE,
        due_date: Some(Utc::now() - Duration::days(1)),
    };
    let err = services.borrowing.borrow(ADA, request).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    assert_eq!(available(&services, DUNE).await, 3);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn concurrent_borrows_of_last_copy(pool: Pool<Postgres>) {
    let services = services(pool);

    let (first, second) = tokio::join!(
        services.borrowing.borrow(ADA, borrow_request(LAST_COPY)),
        services.borrowing.borrow(BOB, borrow_request(LAST_COPY)),
    );

    let successes = [first.is_ok(), second.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);

    let failure = first.err().or(second.err()).unwrap();
    assert!(matches!(failure, AppError::Conflict(_)), "got {:?}", failure);

    assert_eq!(available(&services, LAST_COPY).await, 0);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn only_the_borrower_can_return(pool: Pool<Postgres>) {
    let services = services(pool);

    let borrowing = services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();

    let err = services.borrowing.return_book(BOB, borrowing.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
    assert_eq!(available(&services, DUNE).await, 2);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn overdue_filter_includes_lapsed_active_borrowings(pool: Pool<Postgres>) {
    sqlx::query(
        "INSERT INTO borrowings (book_id, user_id, borrowed_date, due_date, status)
         VALUES ($1, $2, NOW() - INTERVAL '30 days', NOW() - INTERVAL '2 days', 'active')",
    )
    .bind(COSMOS)
    .bind(ADA)
    .execute(&pool)
    .await
    .unwrap();

    let services = services(pool);
    services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();

    let overdue = services
        .borrowing
        .list_mine(ADA, &BorrowingQuery { status: Some("overdue".to_string()) })
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].book_id, COSMOS);
    assert!(overdue[0].is_overdue);

    let all = services
        .borrowing
        .list_mine(ADA, &BorrowingQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    // Newest first
    assert_eq!(all[0].book_id, DUNE);

    let err = services
        .borrowing
        .list_mine(ADA, &BorrowingQuery { status: Some("lost".to_string()) })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn wishlist_add_list_remove(pool: Pool<Postgres>) {
    let services = services(pool);

    let item = services.wishlist.add(ADA, COSMOS).await.unwrap();
    assert_eq!(item.book_title, "Cosmos");
    assert_eq!(item.book_status, BookStatus::LowStock);
    assert_eq!(item.book_category, BookCategory::Science);

    let err = services.wishlist.add(ADA, COSMOS).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "got {:?}", err);

    let err = services.wishlist.add(ADA, 999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    // Entries are private to their owner
    assert!(services.wishlist.list(BOB).await.unwrap().is_empty());
    let err = services.wishlist.remove(BOB, item.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    services.wishlist.remove(ADA, item.id).await.unwrap();
    assert!(services.wishlist.list(ADA).await.unwrap().is_empty());
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn deleting_a_book_cascades(pool: Pool<Postgres>) {
    let services = services(pool);

    services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();
    services.wishlist.add(BOB, DUNE).await.unwrap();

    services.catalog.delete_book(DUNE).await.unwrap();

    let err = services.catalog.get_book(DUNE).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
    assert!(services
        .borrowing
        .list_mine(ADA, &BorrowingQuery::default())
        .await
        .unwrap()
        .is_empty());
    assert!(services.wishlist.list(BOB).await.unwrap().is_empty());

    let err = services.catalog.delete_book(DUNE).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn catalog_filters_and_invariants(pool: Pool<Postgres>) {
    let services = services(pool);

    let science = services
        .catalog
        .list_books(&BookQuery {
            category: Some("Science".to_string()),
            search: None,
        })
        .await
        .unwrap();
    assert_eq!(science.len(), 1);
    assert_eq!(science[0].id, COSMOS);

    let search = services
        .catalog
        .list_books(&BookQuery {
            category: Some("all".to_string()),
            search: Some("herbert".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].id, DUNE);

    let all = services.catalog.list_books(&BookQuery::default()).await.unwrap();
    let ids: Vec<i32> = all.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![DUNE, LAST_COPY, GONE, COSMOS]);

    let err = services
        .catalog
        .list_books(&BookQuery {
            category: Some("poetry".to_string()),
            search: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);

    let duplicate = CreateBook {
        title: "Dune Again".to_string(),
        author: "Frank Herbert".to_string(),
        isbn: "9780441013593".to_string(),
        description: None,
        total_copies: Some(1),
        available_copies: None,
        category: None,
        cover_image: None,
    };
    let err = services.catalog.create_book(duplicate).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);

    let err = services
        .catalog
        .update_book(
            DUNE,
            UpdateBook {
                available_copies: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    assert_eq!(available(&services, DUNE).await, 3);

    let updated = services
        .catalog
        .update_book(
            DUNE,
            UpdateBook {
                total_copies: Some(5),
                available_copies: Some(5),
                description: Some(Some("Desert planet".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.total_copies, 5);
    assert_eq!(updated.description.as_deref(), Some("Desert planet"));
    assert_eq!(updated.title, "Dune");
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn return_after_total_copies_lowered(pool: Pool<Postgres>) {
    let services = services(pool);

    let borrowing = services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();
    assert_eq!(available(&services, DUNE).await, 2);

    services
        .catalog
        .update_book(
            DUNE,
            UpdateBook {
                total_copies: Some(2),
                available_copies: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let returned = services.borrowing.return_book(ADA, borrowing.id).await.unwrap();
    assert_eq!(returned.status, BorrowingStatus::Returned);

    let book = services.catalog.get_book(DUNE).await.unwrap();
    assert_eq!(book.total_copies, 2);
    assert_eq!(book.available_copies, 2);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn partial_user_update_keeps_other_fields(pool: Pool<Postgres>) {
    let services = services(pool);
    let before = services.repository.users.get_by_id(ADA).await.unwrap();

    let updated = services
        .users
        .update_user(
            ADA,
            UpdateUser {
                role: Some(Role::Admin),
                is_active: Some(false),
                password: Some("newpassword1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert!(!updated.is_active);
    assert_eq!(updated.username, "ada");
    assert_eq!(updated.email, "ada@library.test");

    let after = services.repository.users.get_by_id(ADA).await.unwrap();
    assert_ne!(after.password_hash, before.password_hash);
    assert!(after.password_hash.starts_with("$argon2"));

    // No fields at all leaves the row as it was
    let unchanged = services
        .users
        .update_user(ADA, UpdateUser::default())
        .await
        .unwrap();
    assert_eq!(unchanged.role, Role::Admin);
    assert_eq!(unchanged.username, "ada");
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn user_update_rejects_taken_email(pool: Pool<Postgres>) {
    let services = services(pool);

    let err = services
        .users
        .update_user(
            ADA,
            UpdateUser {
                email: Some("bob@library.test".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    assert_eq!(services.users.get_user(ADA).await.unwrap().email, "ada@library.test");

    // Keeping one's own email is not a conflict
    let same = services
        .users
        .update_user(
            ADA,
            UpdateUser {
                email: Some("ada@library.test".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(same.email, "ada@library.test");
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn user_deletion_rules(pool: Pool<Postgres>) {
    let services = services(pool);
    const ADMIN: i32 = 1;

    let err = services.users.delete_user(ADMIN, ADMIN).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)), "got {:?}", err);
    services.users.get_user(ADMIN).await.unwrap();

    services.borrowing.borrow(BOB, borrow_request(DUNE)).await.unwrap();
    services.users.delete_user(ADMIN, BOB).await.unwrap();
    let err = services.users.get_user(BOB).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);

    let err = services.users.delete_user(ADMIN, 999).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "got {:?}", err);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn user_details_count_active_borrowings(pool: Pool<Postgres>) {
    let services = services(pool);
    assert_eq!(services.users.get_user(ADA).await.unwrap().borrowing_count, 0);

    let borrowing = services.borrowing.borrow(ADA, borrow_request(DUNE)).await.unwrap();
    services.borrowing.borrow(ADA, borrow_request(COSMOS)).await.unwrap();
    assert_eq!(services.users.get_user(ADA).await.unwrap().borrowing_count, 2);

    services.borrowing.return_book(ADA, borrowing.id).await.unwrap();
    assert_eq!(services.users.get_user(ADA).await.unwrap().borrowing_count, 1);

    let found = services
        .users
        .list_users(&UserQuery {
            search: Some("ada".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, ADA);
    assert_eq!(found[0].borrowing_count, 1);
}

#[sqlx::test(fixtures("library"))]
#[ignore]
async fn authenticate_checks_account_state(pool: Pool<Postgres>) {
    let services = services(pool);
    let repository = &services.repository;

    let ada: User = repository.users.get_by_id(ADA).await.unwrap();
    let token = services.identity.issue_token(&ada).unwrap();
    let caller = services.identity.authenticate(&token).await.unwrap();
    assert_eq!(caller.id, ADA);
    assert_eq!(caller.role, Role::Reader);

    let eve: User = repository.users.get_by_id(EVE).await.unwrap();
    let token = services.identity.issue_token(&eve).unwrap();
    let err = services.identity.authenticate(&token).await.unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)), "got {:?}", err);

    // Tokens outlive deleted accounts but no longer authenticate
    let mut ghost = ada.clone();
    ghost.id = 999;
    let claims = UserClaims::for_user(&ghost, Duration::minutes(5));
    let token = claims
        .create_token(&AppConfig::default().auth.jwt_secret)
        .unwrap();
    let err = services.identity.authenticate(&token).await.unwrap_err();
    assert!(matches!(err, AppError::Authentication(_)), "got {:?}", err);
}

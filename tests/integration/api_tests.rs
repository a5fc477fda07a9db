//! API integration tests against a running server.
//!
//! Requires `LMS_TEST_ADMIN_TOKEN` (a token for an active admin) and the
//! server's `JWT_SECRET`. Run with: cargo test --test api_tests -- --ignored

use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use lms_server::models::user::{Role, User, UserClaims};

const BASE_URL: &str = "http://localhost:8000/api/v1";

fn admin_token() -> String {
    std::env::var("LMS_TEST_ADMIN_TOKEN").expect("LMS_TEST_ADMIN_TOKEN not set")
}

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").expect("JWT_SECRET not set")
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

/// 13 digits derived from the clock, unique per run
fn unique_isbn() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{:013}", nanos % 10_000_000_000_000)
}

/// Create a reader through the admin API and sign a token for them
async fn reader_token(client: &Client) -> String {
    let email = format!("{}@library.test", unique("reader"));
    let response = client
        .post(format!("{}/users", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({
            "username": "test reader",
            "email": email,
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to create reader");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    let id = body["id"].as_i64().expect("No id in response") as i32;

    let user = User {
        id,
        username: "test reader".to_string(),
        email,
        password_hash: String::new(),
        role: Role::Reader,
        is_active: true,
        date_joined: Utc::now(),
    };
    UserClaims::for_user(&user, Duration::minutes(5))
        .create_token(&jwt_secret())
        .expect("Failed to sign token")
}

async fn create_book(client: &Client, copies: i32) -> i32 {
    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({
            "title": "Integration Testing",
            "author": "Test Author",
            "isbn": unique_isbn(),
            "total_copies": copies,
            "category": "science"
        }))
        .send()
        .await
        .expect("Failed to create book");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No id in response") as i32
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_me_with_cookie() {
    let client = Client::new();

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Cookie", format!("access_token={}", admin_token()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_reader_cannot_manage_catalog() {
    let client = Client::new();
    let token = reader_token(&client).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "title": "Forbidden",
            "author": "Nobody",
            "isbn": "0000000000"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_admin_cannot_borrow() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;

    let response = client
        .post(format!("{}/reader/borrow", BASE_URL))
        .bearer_auth(admin_token())
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore]
async fn test_borrow_and_return_flow() {
    let client = Client::new();
    let book_id = create_book(&client, 1).await;
    let token = reader_token(&client).await;

    let response = client
        .post(format!("{}/reader/borrow", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let borrowing: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(borrowing["status"], "active");

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["available_copies"], 0);
    assert_eq!(book["status"], "Unavailable");

    // No copy left
    let other = reader_token(&client).await;
    let response = client
        .post(format!("{}/reader/borrow", BASE_URL))
        .bearer_auth(&other)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "Conflict");

    let response = client
        .post(format!("{}/reader/return", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "borrowing_id": borrowing["id"] }))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);

    let mine: Value = client
        .get(format!("{}/reader/my-books?status=returned", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(mine.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore]
async fn test_wishlist_flow() {
    let client = Client::new();
    let book_id = create_book(&client, 2).await;
    let token = reader_token(&client).await;

    let response = client
        .post(format!("{}/reader/wishlist/add", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let item: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(item["book_status"], "Available");

    let response = client
        .post(format!("{}/reader/wishlist/add", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = client
        .delete(format!("{}/reader/wishlist/{}", BASE_URL, item["id"]))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_list_books_rejects_unknown_category() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books?category=poetry", BASE_URL))
        .bearer_auth(admin_token())
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
